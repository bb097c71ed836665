use std::time::Duration;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::input::{Input, Signal};
use crate::line_clear::{self, LineClear};
use crate::pieces::PieceKind;
use crate::playfield::{Cell, Playfield, Row, FIELD_HEIGHT, INTERIOR_COLUMNS};

// ============================================================================
// Configuration
// ============================================================================

/// Mask origin of every freshly spawned piece.
pub const SPAWN_X: i32 = 4;
pub const SPAWN_Y: i32 = 0;

/// Locking anything into this row ends the game.
pub const GAME_OVER_ROW: usize = 2;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// The falling piece: its kind, rotation and the field position of its
/// mask's top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: u8,
    pub position: Position,
}

impl ActivePiece {
    pub fn spawn(kind: PieceKind) -> Self {
        Self::new_at(kind, SPAWN_X, SPAWN_Y)
    }

    pub fn new_at(kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            rotation: 0,
            position: Position { x, y },
        }
    }

    /// Field positions of the piece's solid cells.
    pub fn blocks(&self) -> impl Iterator<Item = Position> + '_ {
        self.kind
            .mask()
            .cells(self.rotation)
            .map(move |(dx, dy)| Position {
                x: self.position.x + dx as i32,
                y: self.position.y + dy as i32,
            })
    }

    pub fn fits(&self, field: &Playfield) -> bool {
        field.fits(self.kind, self.rotation, self.position.x, self.position.y)
    }

    fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            position: Position {
                x: self.position.x + dx,
                y: self.position.y + dy,
            },
            ..*self
        }
    }

    /// One clockwise step, pivot correction applied from the current rotation.
    fn rotated(&self) -> Self {
        let (dx, dy) = self.kind.pivot_correction(self.rotation);
        Self {
            rotation: self.kind.next_rotation(self.rotation),
            ..self.moved(dx, dy)
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// A piece is under player control and gravity.
    Falling,
    /// Completed rows are on display; input and gravity wait for `remaining`.
    Clearing { clear: LineClear, remaining: Duration },
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLocked,
    PieceSpawned(PieceKind),
    LinesMarked(u32),
    LinesCleared(u32),
    Paused,
    Unpaused,
    GameRestarted,
    GameOver,
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> PieceKind;
}

/// Uniform choice over the seven kinds.
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        PieceKind::random(&mut self.rng)
    }
}

/// Replays a fixed list of kinds, wrapping around at the end.
pub struct SequencePieceProvider {
    pieces: Vec<PieceKind>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<PieceKind>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    pub field: Playfield,
    pub current_piece: ActivePiece,
    pub next_piece: PieceKind,
    pub score: u32,
    pub lines_cleared: u32,
    phase: Phase,
    paused: bool,
    gravity_elapsed: Duration,
    config: GameConfig,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

// ============================================================================
// Game Logic
// ============================================================================

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let provider = RandomPieceProvider::new(config.seed);
        Self::with_provider(config, Box::new(provider))
    }

    pub fn with_provider(config: GameConfig, mut provider: Box<dyn PieceProvider>) -> Self {
        let current = provider.next_piece();
        let next = provider.next_piece();
        debug!("new game: current {current:?}, next {next:?}");

        Self {
            field: Playfield::new(),
            current_piece: ActivePiece::spawn(current),
            next_piece: next,
            score: 0,
            lines_cleared: 0,
            phase: Phase::Falling,
            paused: false,
            gravity_elapsed: Duration::ZERO,
            config,
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    /// A game already in progress: `piece` falling over a prepared `field`.
    pub fn with_field(
        config: GameConfig,
        field: Playfield,
        piece: ActivePiece,
        mut provider: Box<dyn PieceProvider>,
    ) -> Self {
        let next = provider.next_piece();

        Self {
            field,
            current_piece: piece,
            next_piece: next,
            score: 0,
            lines_cleared: 0,
            phase: Phase::Falling,
            paused: false,
            gravity_elapsed: Duration::ZERO,
            config,
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_clearing(&self) -> bool {
        matches!(self.phase, Phase::Clearing { .. })
    }

    /// Advances the game by one frame that lasted `elapsed`.
    pub fn update(&mut self, input: &Input, elapsed: Duration) {
        if self.paused {
            return;
        }
        match self.phase {
            Phase::GameOver => {}
            Phase::Clearing { clear, remaining } => {
                if elapsed >= remaining {
                    self.finish_clear(clear);
                } else {
                    self.phase = Phase::Clearing {
                        clear,
                        remaining: remaining - elapsed,
                    };
                }
            }
            Phase::Falling => self.fall(input, elapsed),
        }
    }

    fn fall(&mut self, input: &Input, elapsed: Duration) {
        if input.pressed(Signal::Rotate) {
            self.rotate_piece();
        }
        if input.pressed(Signal::MoveLeft) {
            self.move_piece(-1, 0);
        } else if input.pressed(Signal::MoveRight) {
            self.move_piece(1, 0);
        }

        self.gravity_elapsed += elapsed;
        let interval = self.config.gravity_for(input.held(Signal::SoftDrop));
        if self.gravity_elapsed >= interval {
            self.gravity_elapsed = Duration::ZERO;
            self.tick();
        }
    }

    fn accepts_moves(&self) -> bool {
        !self.paused && self.phase == Phase::Falling
    }

    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        if !self.accepts_moves() {
            return false;
        }
        let moved = self.current_piece.moved(dx, dy);
        if moved.fits(&self.field) {
            self.current_piece = moved;
            self.events.push(GameEvent::PieceMoved);
            true
        } else {
            trace!("move ({dx}, {dy}) rejected at {:?}", self.current_piece.position);
            false
        }
    }

    pub fn rotate_piece(&mut self) -> bool {
        if !self.accepts_moves() {
            return false;
        }
        let rotated = self.current_piece.rotated();
        if rotated.fits(&self.field) {
            self.current_piece = rotated;
            self.events.push(GameEvent::PieceRotated);
            true
        } else {
            trace!("rotation rejected at {:?}", self.current_piece.position);
            false
        }
    }

    /// One gravity step: fall a row, or lock where the piece stands.
    pub fn tick(&mut self) {
        if !self.accepts_moves() {
            return;
        }
        if !self.move_piece(0, 1) {
            self.lock_piece();
        }
    }

    fn lock_piece(&mut self) {
        let piece = self.current_piece;
        let mut bottom_row = 0;
        for block in piece.blocks() {
            let (x, y) = (block.x as usize, block.y as usize);
            self.field.set_occupied(x, y, piece.kind);
            bottom_row = bottom_row.max(y);
        }
        self.events.push(GameEvent::PieceLocked);
        debug!(
            "locked {:?} rotation {} at {:?}",
            piece.kind, piece.rotation, piece.position
        );

        if !self.field.is_row_empty(GAME_OVER_ROW) {
            self.end_game();
            return;
        }

        match line_clear::detect(&self.field, bottom_row) {
            Some(clear) => {
                self.field.mark_clearing(&clear);
                self.events.push(GameEvent::LinesMarked(clear.line_count as u32));
                debug!(
                    "{} full row(s) ending at row {}",
                    clear.line_count, clear.first_full_line
                );
                self.phase = Phase::Clearing {
                    clear,
                    remaining: self.config.clear_delay,
                };
            }
            None => self.spawn_next_piece(),
        }
    }

    fn finish_clear(&mut self, clear: LineClear) {
        self.field.compact(&clear);
        let points = clear.score();
        self.score += points;
        self.lines_cleared += clear.line_count as u32;
        self.events.push(GameEvent::LinesCleared(clear.line_count as u32));
        info!(
            "cleared {} line(s) for {points} points, score {}",
            clear.line_count, self.score
        );

        self.phase = Phase::Falling;
        self.spawn_next_piece();
    }

    pub fn spawn_next_piece(&mut self) {
        let kind = self.next_piece;
        self.next_piece = self.piece_provider.next_piece();
        self.current_piece = ActivePiece::spawn(kind);
        self.gravity_elapsed = Duration::ZERO;

        if !self.current_piece.fits(&self.field) {
            debug!("spawn of {kind:?} blocked");
            self.end_game();
            return;
        }
        self.events.push(GameEvent::PieceSpawned(kind));
    }

    fn end_game(&mut self) {
        self.phase = Phase::GameOver;
        self.events.push(GameEvent::GameOver);
        info!(
            "game over: score {}, lines {}",
            self.score, self.lines_cleared
        );
    }

    pub fn toggle_pause(&mut self) {
        if self.is_game_over() {
            return;
        }
        self.paused = !self.paused;
        self.events.push(if self.paused {
            GameEvent::Paused
        } else {
            GameEvent::Unpaused
        });
    }

    /// Starts a fresh game once the current one is over.
    pub fn restart(&mut self) -> bool {
        if !self.is_game_over() {
            return false;
        }
        self.field = Playfield::new();
        self.score = 0;
        self.lines_cleared = 0;
        self.paused = false;
        self.gravity_elapsed = Duration::ZERO;
        self.events.clear();

        let current = self.piece_provider.next_piece();
        self.next_piece = self.piece_provider.next_piece();
        self.current_piece = ActivePiece::spawn(current);
        self.phase = Phase::Falling;

        self.events.push(GameEvent::GameRestarted);
        info!("new game started");
        true
    }

    /// The field with the falling piece drawn in, as the display should show it.
    pub fn render_grid(&self) -> [Row; FIELD_HEIGHT] {
        let mut visual_grid = *self.field.rows();

        if self.phase == Phase::Falling {
            for block in self.current_piece.blocks() {
                visual_grid[block.y as usize][block.x as usize] =
                    Cell::Occupied(self.current_piece.kind);
            }
        }

        visual_grid
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn empty_field() -> Playfield {
        Playfield::new()
    }

    pub fn sequence(pieces: &[PieceKind]) -> Box<dyn PieceProvider> {
        Box::new(SequencePieceProvider::new(pieces.to_vec()))
    }

    pub fn fill_row(field: &mut Playfield, y: usize) {
        fill_row_except(field, y, &[]);
    }

    pub fn fill_row_with_gap(field: &mut Playfield, y: usize, gap_x: usize) {
        fill_row_except(field, y, &[gap_x]);
    }

    pub fn fill_row_except(field: &mut Playfield, y: usize, gaps: &[usize]) {
        for x in INTERIOR_COLUMNS {
            if !gaps.contains(&x) {
                field.set_occupied(x, y, PieceKind::T);
            }
        }
    }
}
