//! Falling-block puzzle engine: a bordered playfield, seven four-cell pieces,
//! fit checking, row clearing and the per-frame state machine that drives
//! them. Rendering and input polling live in the binary.

pub mod config;
pub mod game;
pub mod input;
pub mod line_clear;
pub mod pieces;
pub mod playfield;

pub use config::GameConfig;
pub use game::{ActivePiece, Game, GameEvent, Phase};
pub use input::{EdgeDetector, Input, Signal, SignalSet};
pub use pieces::PieceKind;
pub use playfield::{Cell, Playfield};
