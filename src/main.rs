use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::{
    fs::File,
    io::{stdout, Stdout},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use blockfall::{
    config::{DEFAULT_CLEAR_DELAY_MS, DEFAULT_GRAVITY_MS, DEFAULT_SOFT_DROP_MS},
    pieces::MASK_SIZE,
    playfield::{FIELD_HEIGHT, FIELD_WIDTH},
    Cell, EdgeDetector, Game, GameConfig, PieceKind, Signal, SignalSet,
};

// ============================================================================
// Command Line
// ============================================================================

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(name = "blockfall", version)]
struct Args {
    /// Milliseconds between gravity steps.
    #[arg(long, default_value_t = DEFAULT_GRAVITY_MS, value_name = "MS",
          value_parser = clap::value_parser!(u64).range(1..))]
    gravity_ms: u64,

    /// Milliseconds between gravity steps while soft drop is held.
    #[arg(long, default_value_t = DEFAULT_SOFT_DROP_MS, value_name = "MS",
          value_parser = clap::value_parser!(u64).range(1..))]
    soft_drop_ms: u64,

    /// Milliseconds that cleared rows stay visible before the stack collapses.
    #[arg(long, default_value_t = DEFAULT_CLEAR_DELAY_MS, value_name = "MS")]
    clear_delay_ms: u64,

    /// Fixed seed for piece selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let config = GameConfig::from_millis(self.gravity_ms, self.soft_drop_ms, self.clear_delay_ms);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

// ============================================================================
// Visual Constants
// ============================================================================

const FRAME_TIME: Duration = Duration::from_millis(16);

const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const CLEARING_CHAR: &str = "==";

const SIDE_PANEL_WIDTH: u16 = 16;
const PREVIEW_HEIGHT: u16 = MASK_SIZE as u16 + 2;

fn piece_color(kind: PieceKind) -> Color {
    match kind {
        PieceKind::I => Color::Cyan,
        PieceKind::L => Color::Rgb(255, 165, 0),
        PieceKind::J => Color::Blue,
        PieceKind::T => Color::Magenta,
        PieceKind::O => Color::Yellow,
        PieceKind::Z => Color::Red,
        PieceKind::S => Color::Green,
    }
}

fn cell_span(cell: Cell) -> Span<'static> {
    match cell {
        Cell::Empty => Span::raw(EMPTY_CHAR),
        Cell::Wall => Span::styled(BLOCK_CHAR, Style::default().fg(Color::Gray)),
        Cell::Occupied(kind) => Span::styled(BLOCK_CHAR, Style::default().fg(piece_color(kind))),
        Cell::Clearing => Span::styled(CLEARING_CHAR, Style::default().fg(Color::White)),
    }
}

// ============================================================================
// Input
// ============================================================================

enum Command {
    Quit,
    Pause,
    Restart,
    Signal(Signal),
}

fn command_for(code: KeyCode) -> Option<Command> {
    let command = match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        KeyCode::Char('p') | KeyCode::Char('P') => Command::Pause,
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Restart,
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('z') | KeyCode::Char(' ') => {
            Command::Signal(Signal::Rotate)
        }
        KeyCode::Left | KeyCode::Char('a') => Command::Signal(Signal::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') => Command::Signal(Signal::MoveRight),
        KeyCode::Down | KeyCode::Char('s') => Command::Signal(Signal::SoftDrop),
        _ => return None,
    };
    Some(command)
}

/// Without release reports, a fresh press stays held this long so the
/// terminal's initial auto-repeat delay does not read as a release.
const FIRST_REPEAT_WINDOW: Duration = Duration::from_millis(700);
/// Once auto-repeat is running, a key stays held this long after each repeat.
const REPEAT_WINDOW: Duration = Duration::from_millis(150);

#[derive(Clone, Copy)]
struct HeldKey {
    pressed_at: Instant,
    last_seen: Instant,
}

/// Turns press/repeat/release key events into a held-signal set.
///
/// When the terminal reports releases a key is held until its release
/// arrives. Otherwise holding is inferred from the auto-repeat stream.
struct KeyLatch {
    reports_release: bool,
    keys: [Option<HeldKey>; 4],
}

impl KeyLatch {
    fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            keys: [None; 4],
        }
    }

    fn press(&mut self, signal: Signal, now: Instant) {
        if self.is_held(signal, now) {
            if let Some(key) = &mut self.keys[signal as usize] {
                key.last_seen = now;
            }
        } else {
            self.keys[signal as usize] = Some(HeldKey {
                pressed_at: now,
                last_seen: now,
            });
        }
    }

    fn release(&mut self, signal: Signal) {
        self.keys[signal as usize] = None;
    }

    fn is_held(&self, signal: Signal, now: Instant) -> bool {
        let Some(key) = self.keys[signal as usize] else {
            return false;
        };
        if self.reports_release {
            return true;
        }
        if key.last_seen == key.pressed_at {
            now.duration_since(key.pressed_at) < FIRST_REPEAT_WINDOW
        } else {
            now.duration_since(key.last_seen) < REPEAT_WINDOW
        }
    }

    fn held(&self, now: Instant) -> SignalSet {
        Signal::ALL
            .into_iter()
            .filter(|&signal| self.is_held(signal, now))
            .collect()
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();
    let board_width = FIELD_WIDTH as u16 * 2 + 2;
    let board_height = FIELD_HEIGHT as u16 + 2;

    let screen = centered(area, board_width + SIDE_PANEL_WIDTH, board_height + 1);
    let [play_area, controls_area] =
        Layout::vertical([Constraint::Length(board_height), Constraint::Length(1)]).areas(screen);
    let [board_area, side_area] = Layout::horizontal([
        Constraint::Length(board_width),
        Constraint::Length(SIDE_PANEL_WIDTH),
    ])
    .areas(play_area);
    let [preview_area, info_area] =
        Layout::vertical([Constraint::Length(PREVIEW_HEIGHT), Constraint::Fill(1)])
            .areas(side_area);

    render_board(frame, game, board_area);
    render_preview(frame, game.next_piece, preview_area);
    render_info(frame, game, info_area);
    frame.render_widget(
        Paragraph::new("←→/AD move  ↑/W/Space rotate  ↓/S drop  P pause  Q quit")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        controls_area,
    );

    if game.is_game_over() {
        let body = vec![
            Line::from(format!("Score: {}", game.score)),
            Line::from(format!("Lines: {}", game.lines_cleared)),
            Line::from(""),
            hint("R: play again  Q: quit"),
        ];
        render_popup(frame, area, " Game Over ", Color::Red, body);
    } else if game.is_paused() {
        let body = vec![hint("P: continue")];
        render_popup(frame, area, " Paused ", Color::Yellow, body);
    }
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
}

fn render_board(frame: &mut Frame, game: &Game, area: Rect) {
    let lines: Vec<Line> = game
        .render_grid()
        .iter()
        .map(|row| Line::from(row.iter().copied().map(cell_span).collect::<Vec<_>>()))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(titled(" Blockfall ")), area);
}

fn render_preview(frame: &mut Frame, kind: PieceKind, area: Rect) {
    let mask = kind.mask();
    let solid = Span::styled(BLOCK_CHAR, Style::default().fg(piece_color(kind)));

    let lines: Vec<Line> = (0..MASK_SIZE)
        .map(|y| {
            let spans: Vec<Span> = (0..MASK_SIZE)
                .map(|x| {
                    if mask.is_set(x, y, 0) {
                        solid.clone()
                    } else {
                        Span::raw(EMPTY_CHAR)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let preview = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(titled(" Next "));
    frame.render_widget(preview, area);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let label =
        |text: &'static str, color: Color| Line::from(Span::styled(text, Style::default().fg(color)));
    let gravity_ms = game.config().gravity_interval.as_millis();

    let lines = vec![
        label("Score", Color::Yellow),
        Line::from(game.score.to_string()),
        label("Lines", Color::Cyan),
        Line::from(game.lines_cleared.to_string()),
        label("Gravity", Color::Green),
        Line::from(format!("{gravity_ms} ms")),
    ];

    let info = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(titled(" Info "));
    frame.render_widget(info, area);
}

/// A bordered message box drawn over the middle of `area`.
fn render_popup(frame: &mut Frame, area: Rect, title: &str, accent: Color, body: Vec<Line>) {
    let height = body.len() as u16 + 2;
    let popup = centered(area, 26, height);

    frame.render_widget(Clear, popup);
    let block = titled(title)
        .border_style(Style::default().fg(accent))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(
        Paragraph::new(body).alignment(Alignment::Center).block(block),
        popup,
    );
}

/// The largest rect of at most `width` by `height` centred in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Applies one key event; returns false when the player asked to quit.
fn handle_key(key: KeyEvent, game: &mut Game, latch: &mut KeyLatch, now: Instant) -> bool {
    let Some(command) = command_for(key.code) else {
        return true;
    };
    match (command, key.kind) {
        (Command::Signal(signal), KeyEventKind::Release) => latch.release(signal),
        (Command::Signal(signal), _) => latch.press(signal, now),
        (_, KeyEventKind::Release | KeyEventKind::Repeat) => {}
        (Command::Quit, _) => return false,
        (Command::Pause, _) => game.toggle_pause(),
        (Command::Restart, _) => {
            game.restart();
        }
    }
    true
}

/// Raw mode, the alternate screen and (where supported) key release
/// reporting. Dropping it puts the terminal back however `main` exits.
struct TerminalSession {
    reports_release: bool,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut session = Self {
            reports_release: false,
        };

        stdout()
            .execute(EnterAlternateScreen)
            .context("failed to enter alternate screen")?;
        if supports_keyboard_enhancement().unwrap_or(false) {
            stdout()
                .execute(PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
                ))
                .context("failed to enable key release reporting")?;
            session.reports_release = true;
        }
        log::debug!("key release reporting: {}", session.reports_release);
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.reports_release {
            if let Err(err) = stdout().execute(PopKeyboardEnhancementFlags) {
                log::warn!("failed to restore keyboard flags: {err}");
            }
        }
        if let Err(err) = stdout().execute(LeaveAlternateScreen) {
            log::warn!("failed to leave alternate screen: {err}");
        }
        if let Err(err) = disable_raw_mode() {
            log::warn!("failed to disable raw mode: {err}");
        }
    }
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    game: &mut Game,
    reports_release: bool,
) -> Result<()> {
    let mut latch = KeyLatch::new(reports_release);
    let mut edges = EdgeDetector::new();
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, game))?;

        let deadline = last_frame + FRAME_TIME;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if !event::poll(timeout)? {
                break;
            }
            if let Event::Key(key) = event::read()? {
                if !handle_key(key, game, &mut latch, Instant::now()) {
                    return Ok(());
                }
            }
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_frame);
        last_frame = now;

        let input = edges.sample(latch.held(now));
        game.update(&input, elapsed);
        for event in game.take_events() {
            log::trace!("{event:?}");
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut game = Game::new(args.game_config());

    let session = TerminalSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))
        .context("failed to initialise terminal")?;
    let result = run(&mut terminal, &mut game, session.reports_release);
    drop(terminal);
    drop(session);

    log::info!("exited with score {}", game.score);
    result
}
