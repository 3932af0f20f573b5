use anyhow::Result;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Paragraph;
use scopeguard::defer;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::diag::{Diagnostics, parse_count};
use crate::export::export_log_file;
use crate::sink::LogBuffer;
use crate::tui::theme::Theme;
use crate::tui::views::{HelpView, MainView};

/// Diagnostic tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Ping,
    Traceroute,
    Dns,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Ping, Tab::Traceroute, Tab::Dns];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Ping => "Ping",
            Self::Traceroute => "Traceroute",
            Self::Dns => "DNS Lookup",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Ping => 0,
            Self::Traceroute => 1,
            Self::Dns => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Input field with keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Target,
    Count,
}

/// What a key press asks the app to do beyond editing UI state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Run,
    ClearLog,
    Export,
}

/// UI state
#[derive(Debug, Default)]
pub struct UiState {
    /// Selected tab
    pub tab: Tab,
    /// Focused input field
    pub focus: Field,
    /// Host, IP or domain being edited
    pub target_input: String,
    /// Ping count being edited
    pub count_input: String,
    /// Lines scrolled up from the bottom of the log
    pub scroll: usize,
    /// Show help overlay
    pub show_help: bool,
    /// Status message to display
    pub status_message: Option<(String, Instant)>,
    /// Current theme index
    pub theme_index: usize,
}

impl UiState {
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    pub fn clear_old_status(&mut self) {
        if let Some((_, time)) = &self.status_message
            && time.elapsed() > Duration::from_secs(3)
        {
            self.status_message = None;
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Field::Target => &mut self.target_input,
            Field::Count => &mut self.count_input,
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.scroll = 0;
        if tab != Tab::Ping {
            self.focus = Field::Target;
        }
    }

    /// Apply a key press. Editing and navigation happen here; anything that
    /// touches runs, logs or files is returned as an [`Action`].
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.show_help {
            self.show_help = false;
            return Action::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('l') if ctrl => Action::ClearLog,
            KeyCode::Char('e') if ctrl => Action::Export,
            KeyCode::Char('t') if ctrl => {
                self.theme_index = (self.theme_index + 1) % Theme::list().len();
                self.set_status(format!("Theme: {}", Theme::list()[self.theme_index]));
                Action::None
            }
            KeyCode::Char('u') if ctrl => {
                self.focused_input().clear();
                Action::None
            }
            KeyCode::F(1) => {
                self.show_help = true;
                Action::None
            }
            KeyCode::Tab => {
                self.switch_tab(self.tab.next());
                Action::None
            }
            KeyCode::BackTab => {
                self.switch_tab(self.tab.prev());
                Action::None
            }
            KeyCode::Up | KeyCode::Down => {
                if self.tab == Tab::Ping {
                    self.focus = match self.focus {
                        Field::Target => Field::Count,
                        Field::Count => Field::Target,
                    };
                }
                Action::None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_add(10);
                Action::None
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_sub(10);
                Action::None
            }
            KeyCode::End => {
                self.scroll = 0;
                Action::None
            }
            KeyCode::Enter => Action::Run,
            KeyCode::Backspace => {
                self.focused_input().pop();
                Action::None
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                match self.focus {
                    Field::Target if !c.is_control() => self.target_input.push(c),
                    Field::Count if c.is_ascii_digit() || c == '-' => self.count_input.push(c),
                    _ => {}
                }
                Action::None
            }
            _ => Action::None,
        }
    }
}

/// One tab's log and the run currently feeding it
pub struct Panel {
    pub log: Arc<LogBuffer>,
    run: Option<JoinHandle<()>>,
}

impl Panel {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: Arc::new(LogBuffer::new(capacity)),
            run: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn abort(&mut self) {
        if let Some(handle) = self.run.take() {
            handle.abort();
        }
    }
}

/// The three tab panels
pub struct Panels {
    pub ping: Panel,
    pub traceroute: Panel,
    pub dns: Panel,
}

impl Panels {
    pub fn new(diag: &Diagnostics) -> Self {
        let config = diag.config();
        Self {
            ping: Panel::new(config.ping_log_lines),
            traceroute: Panel::new(config.traceroute_log_lines),
            dns: Panel::new(config.dns_log_lines),
        }
    }

    pub fn get(&self, tab: Tab) -> &Panel {
        match tab {
            Tab::Ping => &self.ping,
            Tab::Traceroute => &self.traceroute,
            Tab::Dns => &self.dns,
        }
    }

    pub fn get_mut(&mut self, tab: Tab) -> &mut Panel {
        match tab {
            Tab::Ping => &mut self.ping,
            Tab::Traceroute => &mut self.traceroute,
            Tab::Dns => &mut self.dns,
        }
    }

    fn abort_all(&mut self) {
        for tab in Tab::ALL {
            self.get_mut(tab).abort();
        }
    }
}

/// Values worth remembering once the TUI exits
#[derive(Debug, Clone)]
pub struct TuiOutcome {
    pub theme: String,
    pub target: String,
    pub count: u32,
}

/// Start the current tab's operation unless one is already in flight
pub fn start_run(diag: &Diagnostics, panels: &mut Panels, ui_state: &mut UiState) {
    let tab = ui_state.tab;
    let panel = panels.get_mut(tab);
    if panel.is_running() {
        ui_state.set_status(format!("{} already running", tab.title()));
        return;
    }

    let log = panel.log.clone();
    let target = ui_state.target_input.clone();
    panel.run = match tab {
        Tab::Ping => {
            let count = parse_count(&ui_state.count_input, diag.config().ping_count);
            diag.stream_ping(&target, count as i64, log)
        }
        Tab::Traceroute => diag.stream_traceroute(&target, log),
        Tab::Dns => diag.stream_dns(&target, log),
    };
    ui_state.scroll = 0;
}

/// Run the TUI application. Returns what should be persisted to prefs.
pub async fn run_tui(
    diag: Diagnostics,
    initial_target: String,
    initial_theme: Theme,
    cancel: CancellationToken,
) -> Result<TuiOutcome> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    // Ensure terminal is restored on any exit (success, error, or panic)
    defer! {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let theme_names = Theme::list();
    let initial_index = theme_names
        .iter()
        .position(|&name| name == initial_theme.name())
        .unwrap_or(0);

    let mut ui_state = UiState {
        target_input: initial_target,
        count_input: diag.config().ping_count.to_string(),
        theme_index: initial_index,
        ..Default::default()
    };
    let mut panels = Panels::new(&diag);
    let tick_rate = Duration::from_millis(100);

    let result = run_app(
        &mut terminal,
        &diag,
        &mut panels,
        &mut ui_state,
        cancel,
        tick_rate,
    )
    .await;

    // Runs die with their tasks; the streamer kills any child still alive
    panels.abort_all();
    result?;

    Ok(TuiOutcome {
        theme: theme_names[ui_state.theme_index].to_string(),
        count: parse_count(&ui_state.count_input, diag.config().ping_count),
        target: ui_state.target_input,
    })
}

async fn run_app<B>(
    terminal: &mut Terminal<B>,
    diag: &Diagnostics,
    panels: &mut Panels,
    ui_state: &mut UiState,
    cancel: CancellationToken,
    tick_rate: Duration,
) -> Result<()>
where
    B: ratatui::backend::Backend,
{
    let theme_names = Theme::list();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        ui_state.clear_old_status();
        let theme = Theme::by_name(theme_names[ui_state.theme_index]);

        terminal.draw(|f| draw_ui(f, panels, ui_state, &theme))?;

        // Handle input with timeout
        if event::poll(tick_rate)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match ui_state.handle_key(key) {
                Action::None => {}
                Action::Quit => {
                    cancel.cancel();
                    break;
                }
                Action::Run => start_run(diag, panels, ui_state),
                Action::ClearLog => {
                    panels.get(ui_state.tab).log.clear();
                    ui_state.scroll = 0;
                    ui_state.set_status("Log cleared");
                }
                Action::Export => {
                    let tab = ui_state.tab;
                    let lines = panels.get(tab).log.snapshot();
                    match export_log_file(std::path::Path::new("."), tab.title(), &lines) {
                        Ok(filename) => ui_state.set_status(format!("Exported to {}", filename)),
                        Err(e) => ui_state.set_status(format!("Export failed: {}", e)),
                    }
                }
            }
        }

        // Let runs make progress between frames
        tokio::task::yield_now().await;
    }

    Ok(())
}

fn draw_ui(f: &mut ratatui::Frame, panels: &Panels, ui_state: &UiState, theme: &Theme) {
    let area = f.area();

    // Layout: main view + status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let panel = panels.get(ui_state.tab);
    let main_view = MainView::new(ui_state, &panel.log, panel.is_running(), theme);
    let cursor = main_view.cursor_position(chunks[0]);
    f.render_widget(main_view, chunks[0]);
    if !ui_state.show_help
        && let Some(position) = cursor
    {
        f.set_cursor_position(position);
    }

    // Status bar
    let status_text = if let Some((ref msg, _)) = ui_state.status_message {
        msg.clone()
    } else {
        "Esc quit | Enter run | Tab next tab | ^L clear | ^E export | ^T theme | F1 help".to_string()
    };

    let status_bar = Paragraph::new(status_text).style(Style::default().fg(theme.text_dim));
    f.render_widget(status_bar, chunks[1]);

    if ui_state.show_help {
        f.render_widget(HelpView::new(theme), area);
    }
}
