//! Core game logic: board, pieces, rotation, randomizer and the
//! single-match rules engine. Everything here is synchronous and free of
//! I/O; the session layer supplies timers, locking and transport.

pub mod bag;
pub mod board;
pub mod game;
pub mod pieces;

pub use bag::Bag;
pub use board::Board;
pub use game::{Game, GameStatus, Snapshot, StepOutcome, PREVIEW_COUNT};
pub use pieces::{base_minos, rotated_minos, try_rotate};
