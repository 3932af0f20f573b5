use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

use crate::diag::{INVALID_HOST_LINE, NO_DOMAIN_LINE};
use crate::sink::LogBuffer;
use crate::stream::{EXIT_TIMEOUT_LINE, TIMEOUT_LINE};
use crate::tui::theme::Theme;

/// How a log line is colored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// First line of a run
    Header,
    /// Timeout, launch failure, invalid input
    Diagnostic,
    /// Verbatim command or resolver output
    Output,
}

const DIAGNOSTIC_PREFIXES: [&str; 5] = [
    "Command not found: ",
    "Error running command: ",
    "DNS resolver unavailable",
    TIMEOUT_LINE,
    EXIT_TIMEOUT_LINE,
];

const HEADER_PREFIXES: [&str; 3] = ["PING ", "Traceroute ", "DNS Lookup for "];

pub fn classify_line(line: &str) -> LineKind {
    if line == INVALID_HOST_LINE
        || line == NO_DOMAIN_LINE
        || DIAGNOSTIC_PREFIXES.iter().any(|p| line.starts_with(p))
    {
        LineKind::Diagnostic
    } else if HEADER_PREFIXES.iter().any(|p| line.starts_with(p)) {
        LineKind::Header
    } else {
        LineKind::Output
    }
}

/// Strip control characters so command output cannot inject terminal
/// escape sequences. Tabs become spaces.
pub(crate) fn sanitize_display(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Bordered pane showing the tail of a tab's log
pub struct LogView<'a> {
    log: &'a LogBuffer,
    title: &'a str,
    running: bool,
    scroll: usize,
    theme: &'a Theme,
}

impl<'a> LogView<'a> {
    pub fn new(log: &'a LogBuffer, title: &'a str, theme: &'a Theme) -> Self {
        Self {
            log,
            title,
            running: false,
            scroll: 0,
            theme,
        }
    }

    pub fn running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }

    /// Lines scrolled up from the newest
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for LogView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut title = vec![Span::styled(
            format!(" {} ", self.title),
            Style::default().fg(self.theme.header),
        )];
        title.push(Span::styled(
            format!("\u{2500} {}/{} lines ", self.log.len(), self.log.capacity()),
            Style::default().fg(self.theme.text_dim),
        ));
        if self.running {
            title.push(Span::styled(
                "\u{2500} running ",
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if self.scroll > 0 {
            title.push(Span::styled(
                format!("\u{2500} scrolled {} ", self.scroll),
                Style::default().fg(self.theme.text_dim),
            ));
        }

        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));

        let inner = block.inner(area);
        block.render(area, buf);

        let height = inner.height as usize;
        let lines: Vec<Line> = self
            .log
            .tail(height + self.scroll)
            .into_iter()
            .take(height)
            .map(|line| {
                let style = match classify_line(&line) {
                    LineKind::Header => Style::default()
                        .fg(self.theme.success)
                        .add_modifier(Modifier::BOLD),
                    LineKind::Diagnostic => Style::default()
                        .fg(self.theme.error)
                        .add_modifier(Modifier::BOLD),
                    LineKind::Output => Style::default().fg(self.theme.text),
                };
                Line::from(Span::styled(sanitize_display(&line), style))
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
