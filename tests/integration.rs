//! Integration tests for the validate -> run -> sink pipeline
//!
//! These go through the public operations the front ends use. Commands that
//! need the network are replaced by `sh` scripts or a fake DNS backend, except
//! for the loopback ping test which is ignored by default.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netassist::config::Config;
use netassist::diag::{Diagnostics, INVALID_HOST_LINE, validate};
use netassist::dns::{DnsBackend, LookupError, RecordKind, Resolver};
use netassist::sink::{LineSink, LogBuffer};
use netassist::stream::{CommandLine, TIMEOUT_LINE, stream_command};

/// Answers A and MX only
struct PartialBackend;

#[async_trait]
impl DnsBackend for PartialBackend {
    async fn query(&self, _name: &str, kind: RecordKind) -> Result<Vec<String>, LookupError> {
        match kind {
            RecordKind::A => Ok(vec!["192.0.2.10".into()]),
            RecordKind::Mx => Ok(vec!["10 mx.example.org.".into()]),
            other => Err(LookupError::NoAnswer(other)),
        }
    }
}

fn sh(script: &str) -> CommandLine {
    CommandLine::new("sh").arg("-c").arg(script)
}

#[test]
fn test_validator_examples() {
    for host in ["example.com", "8.8.8.8", "::1", "a-b.example.co.uk"] {
        assert!(validate(host), "{} should be valid", host);
    }
    for host in ["", "-bad.com", "bad-.com", "a..b", "exa mple.com"] {
        assert!(!validate(host), "{:?} should be invalid", host);
    }
    assert!(!validate(&"a".repeat(254)));
}

#[test]
fn test_sink_keeps_newest_lines() {
    let log = LogBuffer::new(3);
    for i in 0..5 {
        log.push(format!("line {}", i));
    }
    assert_eq!(log.snapshot(), vec!["line 2", "line 3", "line 4"]);
    assert_eq!(log.total_pushed(), 5);
}

#[tokio::test]
async fn test_missing_binary() {
    let log = LogBuffer::new(10);
    stream_command(
        &CommandLine::new("nonexistent-binary-xyz"),
        &log,
        Duration::from_secs(5),
    )
    .await;
    assert_eq!(log.snapshot(), vec!["Command not found: nonexistent-binary-xyz"]);
}

#[tokio::test]
async fn test_stalled_command_times_out() {
    let log = LogBuffer::new(10);
    let started = std::time::Instant::now();
    stream_command(&sh("echo first; exec sleep 30"), &log, Duration::from_millis(300)).await;

    assert_eq!(log.snapshot(), vec!["first", TIMEOUT_LINE]);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_independent_runs() {
    let first = LogBuffer::new(10);
    let second = LogBuffer::new(10);
    let cmd_a = sh("echo a1; echo a2");
    let cmd_b = sh("echo b1");
    let run_a = stream_command(&cmd_a, &first, Duration::from_secs(5));
    let run_b = stream_command(&cmd_b, &second, Duration::from_secs(5));
    tokio::join!(run_a, run_b);

    assert_eq!(first.snapshot(), vec!["a1", "a2"]);
    assert_eq!(second.snapshot(), vec!["b1"]);
}

#[tokio::test]
async fn test_dns_partial_answers_in_type_order() {
    let diag = Diagnostics::new(Config::default(), Resolver::ready(PartialBackend));
    let log = Arc::new(LogBuffer::new(50));
    let handle = diag.stream_dns("example.org", log.clone()).unwrap();
    handle.await.unwrap();

    assert_eq!(
        log.snapshot(),
        vec![
            "DNS Lookup for example.org",
            "A: 192.0.2.10",
            "AAAA: no AAAA records in the response",
            "MX: 10 mx.example.org.",
            "NS: no NS records in the response",
            "TXT: no TXT records in the response",
            "SOA: no SOA records in the response",
        ]
    );
}

#[tokio::test]
async fn test_invalid_host_spawns_nothing() {
    let diag = Diagnostics::new(Config::default(), Resolver::Unavailable("offline".into()));
    let log = Arc::new(LogBuffer::new(10));
    assert!(diag.stream_ping("not a host", 4, log.clone()).is_none());
    assert!(diag.stream_traceroute("-bad.com", log.clone()).is_none());
    assert_eq!(log.snapshot(), vec![INVALID_HOST_LINE, INVALID_HOST_LINE]);
}

#[tokio::test]
#[ignore = "needs a usable ping binary and ICMP permission"]
async fn test_loopback_ping() {
    let diag = Diagnostics::new(Config::default(), Resolver::Unavailable("offline".into()));
    let log = Arc::new(LogBuffer::new(100));
    let handle = diag.stream_ping("127.0.0.1", 2, log.clone()).unwrap();
    handle.await.unwrap();

    let lines = log.snapshot();
    assert_eq!(lines[0], "PING 127.0.0.1 (count=2)");
    assert!(lines.iter().filter(|l| !l.is_empty()).count() >= 2);
    assert!(!lines.iter().any(|l| l == TIMEOUT_LINE));
}
