//! Line sinks: where diagnostic runs deliver their output.
//!
//! Every result of a run, including every failure, arrives as a text line
//! pushed into a [`LineSink`]. The TUI renders a bounded [`LogBuffer`] per tab;
//! streaming mode prints through [`StdoutSink`].

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receiver of log lines produced by a run
pub trait LineSink: Send + Sync {
    fn push(&self, line: String);
}

/// Append-only log with a fixed maximum number of retained lines.
///
/// When a push would exceed the capacity the oldest line is evicted.
#[derive(Debug)]
pub struct LogBuffer {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    total_pushed: AtomicU64,
}

impl LogBuffer {
    /// Create a buffer retaining at most `capacity` lines (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            total_pushed: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Copy of the retained lines, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }

    /// Copy of the newest `n` retained lines, oldest first
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines = self.lines.lock();
        let skip = lines.len().saturating_sub(n);
        lines.iter().skip(skip).cloned().collect()
    }

    /// Number of lines ever pushed, including evicted and cleared ones
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl LineSink for LogBuffer {
    fn push(&self, line: String) {
        let mut lines = self.lines.lock();
        lines.push_back(line);
        if lines.len() > self.capacity {
            lines.pop_front();
        }
        self.total_pushed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Prints every line to stdout as it arrives, optionally labelled.
///
/// Used when several runs stream to the same terminal at once.
#[derive(Debug, Default)]
pub struct StdoutSink {
    label: Option<String>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

impl LineSink for StdoutSink {
    fn push(&self, line: String) {
        let mut out = std::io::stdout().lock();
        // Write errors (closed pipe) are ignored
        let _ = match self.label {
            Some(ref label) => writeln!(out, "[{}] {}", label, line),
            None => writeln!(out, "{}", line),
        };
    }
}
