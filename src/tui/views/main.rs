use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Widget};

use crate::sink::LogBuffer;
use crate::tui::app::{Field, Tab, UiState};
use crate::tui::theme::Theme;
use crate::tui::views::LogView;

/// Tab bar, input fields and the selected tab's log
pub struct MainView<'a> {
    ui_state: &'a UiState,
    log: &'a LogBuffer,
    running: bool,
    theme: &'a Theme,
}

/// Screen regions of the main view
struct Regions {
    tabs: Rect,
    target: Rect,
    count: Option<Rect>,
    log: Rect,
}

impl<'a> MainView<'a> {
    pub fn new(ui_state: &'a UiState, log: &'a LogBuffer, running: bool, theme: &'a Theme) -> Self {
        Self {
            ui_state,
            log,
            running,
            theme,
        }
    }

    fn regions(&self, area: Rect) -> Regions {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let (target, count) = if self.ui_state.tab == Tab::Ping {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(12)])
                .split(rows[1]);
            (cols[0], Some(cols[1]))
        } else {
            (rows[1], None)
        };

        Regions {
            tabs: rows[0],
            target,
            count,
            log: rows[2],
        }
    }

    /// Where the terminal cursor belongs: end of the focused input
    pub fn cursor_position(&self, area: Rect) -> Option<Position> {
        let regions = self.regions(area);
        let (rect, text) = match self.ui_state.focus {
            Field::Count => (regions.count?, &self.ui_state.count_input),
            Field::Target => (regions.target, &self.ui_state.target_input),
        };
        if rect.width < 3 || rect.height < 3 {
            return None;
        }
        let offset = u16::try_from(text.chars().count())
            .unwrap_or(u16::MAX)
            .min(rect.width - 3);
        Some(Position::new(rect.x + 1 + offset, rect.y + 1))
    }

    fn render_input(&self, rect: Rect, title: &str, text: &str, focused: bool, buf: &mut Buffer) {
        let border = if focused {
            self.theme.border_focused
        } else {
            self.theme.border
        };
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        // Keep the end of long input visible
        let visible = rect.width.saturating_sub(3) as usize;
        let len = text.chars().count();
        let shown: String = text.chars().skip(len.saturating_sub(visible)).collect();

        Paragraph::new(shown)
            .style(Style::default().fg(self.theme.text))
            .block(block)
            .render(rect, buf);
    }
}

impl Widget for MainView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let regions = self.regions(area);

        let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
        Tabs::new(titles)
            .select(self.ui_state.tab.index())
            .style(Style::default().fg(self.theme.text_dim))
            .highlight_style(
                Style::default()
                    .fg(self.theme.header)
                    .bg(self.theme.highlight_bg)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .title(format!(" netassist {} ", env!("CARGO_PKG_VERSION")))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border)),
            )
            .render(regions.tabs, buf);

        let target_title = match self.ui_state.tab {
            Tab::Dns => "Domain",
            Tab::Ping | Tab::Traceroute => "Host or IP",
        };
        self.render_input(
            regions.target,
            target_title,
            &self.ui_state.target_input,
            self.ui_state.focus == Field::Target,
            buf,
        );
        if let Some(rect) = regions.count {
            self.render_input(
                rect,
                "Count",
                &self.ui_state.count_input,
                self.ui_state.focus == Field::Count,
                buf,
            );
        }

        LogView::new(self.log, self.ui_state.tab.title(), self.theme)
            .running(self.running)
            .scroll(self.ui_state.scroll)
            .render(regions.log, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(buf: &Buffer) -> String {
        let area = buf.area;
        (area.y..area.y + area.height)
            .map(|y| {
                (area.x..area.x + area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_ping_tab_shows_count_field() {
        let state = UiState {
            target_input: "example.com".into(),
            count_input: "4".into(),
            ..Default::default()
        };
        let log = LogBuffer::new(10);
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        MainView::new(&state, &log, false, &theme).render(area, &mut buf);

        let text = screen(&buf);
        assert!(text.contains("Host or IP"));
        assert!(text.contains("Count"));
        assert!(text.contains("example.com"));
        assert!(text.contains("Traceroute"));
    }

    #[test]
    fn test_dns_tab_has_domain_field_only() {
        let state = UiState {
            tab: Tab::Dns,
            ..Default::default()
        };
        let log = LogBuffer::new(10);
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        MainView::new(&state, &log, true, &theme).render(area, &mut buf);

        let text = screen(&buf);
        assert!(text.contains("Domain"));
        assert!(!text.contains("Count"));
        assert!(text.contains("running"));
    }

    #[test]
    fn test_cursor_follows_focus() {
        let mut state = UiState {
            target_input: "abc".into(),
            count_input: "12".into(),
            ..Default::default()
        };
        let log = LogBuffer::new(10);
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 12);

        let pos = MainView::new(&state, &log, false, &theme).cursor_position(area).unwrap();
        assert_eq!(pos, Position::new(4, 4));

        state.focus = Field::Count;
        let pos = MainView::new(&state, &log, false, &theme).cursor_position(area).unwrap();
        assert_eq!(pos, Position::new(48 + 1 + 2, 4));
    }

    #[test]
    fn test_cursor_stays_inside_field_for_huge_input() {
        // 65536 chars would wrap to 0 if truncated to u16
        let state = UiState {
            target_input: "a".repeat(65_536),
            ..Default::default()
        };
        let log = LogBuffer::new(10);
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 12);

        let pos = MainView::new(&state, &log, false, &theme).cursor_position(area).unwrap();
        assert_eq!(pos, Position::new(1 + 45, 4));
    }
}
