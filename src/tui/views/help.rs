use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::tui::theme::Theme;

const KEYS: [(&str, &str); 12] = [
    ("Enter     ", "Run the current tab"),
    ("Tab       ", "Next tab"),
    ("S-Tab     ", "Previous tab"),
    ("Up/Down   ", "Switch host / count field"),
    ("Backspace ", "Delete character"),
    ("^U        ", "Clear field"),
    ("PgUp/PgDn ", "Scroll log"),
    ("End       ", "Jump to newest line"),
    ("^L        ", "Clear log"),
    ("^E        ", "Export log to file"),
    ("^T        ", "Cycle theme"),
    ("Esc/^C    ", "Quit"),
];

/// Help overlay
pub struct HelpView<'a> {
    theme: &'a Theme,
}

impl<'a> HelpView<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for HelpView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Calculate centered popup area
        let popup_width = 46.min(area.width.saturating_sub(4));
        let popup_height = (KEYS.len() as u16 + 5).min(area.height.saturating_sub(4));
        let popup_x = (area.width - popup_width) / 2 + area.x;
        let popup_y = (area.height - popup_height) / 2 + area.y;
        let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

        Clear.render(popup_area, buf);

        let block = Block::default()
            .title(format!(" Help - netassist {} ", env!("CARGO_PKG_VERSION")))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));

        let inner = block.inner(popup_area);
        block.render(popup_area, buf);

        let mut lines = vec![Line::from("")];
        lines.extend(KEYS.iter().map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("  {}", key), Style::default().fg(self.theme.shortcut)),
                Span::styled(*desc, Style::default().fg(self.theme.text)),
            ])
        }));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Press any key to close",
            Style::default().fg(self.theme.text_dim),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}
