//! Full-screen dashboard: track info box, lyric area, key help.
//!
//! The event loop uses `tokio::select!` to handle:
//! - state snapshots from the engine
//! - keyboard input forwarded from a dedicated reader thread

use crate::player::{PlayerCommand, control};
use crate::pool::EngineHandle;
use crate::state::Update;
use crate::ui::styles::DashboardStyles;
use crossterm::{
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Padding, Paragraph},
};
use std::error::Error;
use std::io::{self, Stdout};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

const BOX_WIDTH: u16 = 60;

type BoxError = Box<dyn Error + Send + Sync>;

/// Restores the terminal on drop, including on error paths.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What the dashboard shows, plus the presenter-local scroll position.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub update: Update,
    pub scroll: usize,
    /// Largest useful scroll offset, recomputed on every draw.
    max_scroll: usize,
    pub should_exit: bool,
}

impl DashboardState {
    pub fn apply(&mut self, update: Update) {
        if update.track != self.update.track || update.lyrics != self.update.lyrics {
            self.scroll = 0;
        }
        self.update = update;
    }

    fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta).min(self.max_scroll);
    }
}

/// Keys the dashboard reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Player(PlayerCommand),
    Refresh,
    Scroll(isize),
}

pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('p') => Some(Action::Player(PlayerCommand::PlayPause)),
        KeyCode::Char('n') => Some(Action::Player(PlayerCommand::Next)),
        KeyCode::Char('b') => Some(Action::Player(PlayerCommand::Previous)),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Scroll(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Scroll(-1)),
        KeyCode::PageDown => Some(Action::Scroll(10)),
        KeyCode::PageUp => Some(Action::Scroll(-10)),
        _ => None,
    }
}

/// Run the dashboard until the user quits or the engine stops.
pub async fn display_dashboard(
    mut handle: EngineHandle,
    styles: DashboardStyles,
    player: Option<String>,
) -> Result<(), BoxError> {
    let mut guard = TerminalGuard::enter()?;
    let mut state = DashboardState::default();

    // Crossterm reads block, so they live on their own OS thread.
    let (key_tx, mut key_rx) = mpsc::channel(32);
    thread::spawn(move || {
        loop {
            match crossterm::event::poll(Duration::from_millis(100)) {
                Ok(true) => match crossterm::event::read() {
                    Ok(ev) => {
                        if key_tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "terminal read failed"),
                },
                Ok(false) => {
                    if key_tx.is_closed() {
                        break;
                    }
                }
                Err(_) => thread::sleep(Duration::from_millis(100)),
            }
        }
    });

    draw(&mut guard.terminal, &mut state, &styles)?;
    while !state.should_exit {
        tokio::select! {
            update = handle.next_update() => match update {
                Some(update) => state.apply(update),
                None => state.should_exit = true,
            },
            Some(event) = key_rx.recv() => {
                if let Event::Key(key) = event
                    && let Some(action) = action_for_key(key)
                {
                    match action {
                        Action::Quit => state.should_exit = true,
                        Action::Player(cmd) => control::dispatch(cmd, player.clone()),
                        Action::Refresh => handle.refresh(),
                        Action::Scroll(delta) => state.scroll_by(delta),
                    }
                }
            }
        }
        draw(&mut guard.terminal, &mut state, &styles)?;
    }

    handle.shutdown().await;
    drop(guard);
    Ok(())
}

fn draw<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut DashboardState,
    styles: &DashboardStyles,
) -> Result<(), BoxError> {
    terminal.draw(|f| render(f, state, styles))?;
    Ok(())
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

/// Rows the track box wants for `content` lines, capped at `available`.
fn box_height(content: usize, chrome: u16, available: u16) -> u16 {
    u16::try_from(content)
        .unwrap_or(u16::MAX)
        .saturating_add(chrome)
        .min(available)
}

fn track_lines(update: &Update, styles: &DashboardStyles) -> Vec<Line<'static>> {
    if let Some(err) = update.err {
        return vec![Line::styled(format!("Error: {err}"), styles.error)];
    }
    let Some(track) = &update.track else {
        return vec![Line::styled("Waiting for player...", styles.text)];
    };
    let status = update.status.to_string();
    [("Title: ", track.title.as_str()), ("Artist:", track.artist.as_str()), ("Status:", status.as_str())]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(label, styles.label),
                Span::raw(" "),
                Span::styled(value.to_string(), styles.text),
            ])
        })
        .collect()
}

/// Shown when a track is playing but nothing is loaded or loading for it.
fn idle_hint(update: &Update) -> Option<String> {
    update.track.as_ref()?;
    let hint = if update.fetching {
        "Finishing the previous lookup..."
    } else {
        "Press r to fetch lyrics"
    };
    Some(hint.to_string())
}

/// Lyric area contents wrapped to `width` columns.
fn lyric_lines(update: &Update, width: usize) -> Vec<String> {
    if update.err.is_some() {
        return Vec::new();
    }
    let Some(text) = update.lyric_text().or_else(|| idle_hint(update)) else {
        return Vec::new();
    };
    let mut out = vec![String::new()];
    if update.lyrics.is_some() && !update.fetching_current() {
        out.push("Lyrics:".to_string());
    }
    for line in text.lines() {
        out.extend(textwrap::wrap(line, width.max(1)).into_iter().map(|l| l.into_owned()));
    }
    out
}

fn render(f: &mut Frame, state: &mut DashboardState, styles: &DashboardStyles) {
    let area = f.area();
    let [main, help] = Layout::vertical([Constraint::Min(0), Constraint::Length(2)]).areas(area);

    let width = BOX_WIDTH.min(main.width);
    // borders + padding
    let inner_width = width.saturating_sub(2 + 4) as usize;
    let header = track_lines(&state.update, styles);
    let lyrics = lyric_lines(&state.update, inner_width);

    // borders + vertical padding
    let chrome: u16 = 2 + 2;
    let height = box_height(header.len() + lyrics.len(), chrome, main.height);
    let visible_lyrics = (height.saturating_sub(chrome) as usize).saturating_sub(header.len());
    state.max_scroll = lyrics.len().saturating_sub(visible_lyrics);
    state.scroll = state.scroll.min(state.max_scroll);

    let mut lines = header;
    lines.extend(
        lyrics
            .into_iter()
            .skip(state.scroll)
            .take(visible_lyrics)
            .map(|l| Line::styled(l, styles.text)),
    );

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(styles.border)
        .padding(Padding::new(2, 2, 1, 1))
        .title(Line::styled("Now Playing", styles.title).centered());
    f.render_widget(Paragraph::new(lines).block(block), centered(main, width, height));

    let keys = [
        ("Play/Pause: ", "p"),
        ("  Next: ", "n"),
        ("  Previous: ", "b"),
        ("  Refresh Lyrics: ", "r"),
        ("  Scroll: ", "j/k"),
        ("  Quit: ", "q"),
    ];
    let help_line = Line::from(
        keys.iter()
            .flat_map(|(label, key)| [Span::raw(*label), Span::styled(*key, styles.key)])
            .collect::<Vec<_>>(),
    )
    .centered();
    f.render_widget(Paragraph::new(vec![Line::raw(""), help_line]), help);
}
