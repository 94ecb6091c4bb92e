//! Game module - single-match rules engine
//!
//! Pure state machine for one match: board, falling piece, bag, score and
//! level. Holds no timers, locks or channels; the session layer wraps it
//! in an actor that drives gravity ticks and broadcasts snapshots. Every
//! operation here mutates synchronously and reports what happened so the
//! caller can decide whether to emit a state update.

use crate::core::bag::Bag;
use crate::core::board::Board;
use crate::core::pieces::try_rotate;
use crate::types::{Piece, PieceKind, Point};

/// Number of upcoming pieces exposed in each snapshot.
pub const PREVIEW_COUNT: usize = 3;

/// Lines needed per level step.
const LINES_PER_LEVEL: i32 = 10;

/// Match lifecycle. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Waiting,
    Running,
    Finished,
}

/// Result of a mutating operation, used by the actor to decide whether a
/// state update or a terminal event should go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing changed (blocked move, failed rotation, wrong status).
    Ignored,
    /// The falling piece moved or rotated.
    Moved,
    /// The piece locked; a fresh piece spawned successfully.
    Locked,
    /// The piece locked and the next spawn collided. The match is over.
    GameOver,
}

impl StepOutcome {
    /// Whether this outcome changed observable state.
    pub fn changed(self) -> bool {
        self != StepOutcome::Ignored
    }
}

/// Snapshot of observable match state, produced after every successful
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub score: i32,
    pub level: i32,
    pub grid: Vec<u8>,
    pub current_piece: Piece,
    pub next_pieces: Vec<PieceKind>,
}

/// One match's authoritative state.
#[derive(Debug)]
pub struct Game {
    board: Board,
    current_piece: Piece,
    bag: Bag,
    score: i32,
    level: i32,
    lines: i32,
    status: GameStatus,
}

impl Game {
    pub fn new() -> Self {
        Self::with_bag(Bag::new())
    }

    /// Construct with a caller-supplied bag, for deterministic sequences.
    pub fn with_bag(bag: Bag) -> Self {
        Self::with_board_and_bag(Board::new(), bag)
    }

    /// Construct with a caller-supplied board and bag, for scripted
    /// scenarios such as garbage prefills.
    pub fn with_board_and_bag(board: Board, bag: Bag) -> Self {
        Self {
            board,
            current_piece: Piece::new(PieceKind::None, Point::new(0, 0), 0),
            bag,
            score: 0,
            level: 0,
            lines: 0,
            status: GameStatus::Waiting,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn lines(&self) -> i32 {
        self.lines
    }

    pub fn current_piece(&self) -> Piece {
        self.current_piece
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Waiting -> Running; spawns the first piece. No effect in any other
    /// status.
    pub fn start(&mut self) {
        if self.status != GameStatus::Waiting {
            return;
        }
        self.status = GameStatus::Running;
        self.current_piece = self.spawn_piece();
    }

    /// Force the terminal status. Idempotent; used for external stop.
    pub fn finish(&mut self) {
        self.status = GameStatus::Finished;
    }

    fn spawn_piece(&mut self) -> Piece {
        Piece::spawn(self.bag.next())
    }

    fn try_translate(&mut self, dx: i32, dy: i32) -> StepOutcome {
        let mut next = self.current_piece;
        next.position.x += dx;
        next.position.y += dy;
        if self.board.has_collision(next) {
            return StepOutcome::Ignored;
        }
        self.current_piece = next;
        StepOutcome::Moved
    }

    pub fn move_left(&mut self) -> StepOutcome {
        if self.status != GameStatus::Running {
            return StepOutcome::Ignored;
        }
        self.try_translate(-1, 0)
    }

    pub fn move_right(&mut self) -> StepOutcome {
        if self.status != GameStatus::Running {
            return StepOutcome::Ignored;
        }
        self.try_translate(1, 0)
    }

    /// Rotate one step in `direction` via the kick search. A failed
    /// rotation leaves the piece untouched.
    pub fn rotate(&mut self, direction: i32) -> StepOutcome {
        if self.status != GameStatus::Running {
            return StepOutcome::Ignored;
        }
        match try_rotate(&self.board, self.current_piece, direction) {
            Some(rotated) => {
                self.current_piece = rotated;
                StepOutcome::Moved
            }
            None => StepOutcome::Ignored,
        }
    }

    /// One gravity step: move the piece down, or lock it and spawn the
    /// next one if it is resting. Also serves soft drop.
    pub fn apply_gravity(&mut self) -> StepOutcome {
        if self.status != GameStatus::Running {
            return StepOutcome::Ignored;
        }
        match self.try_translate(0, 1) {
            StepOutcome::Moved => StepOutcome::Moved,
            _ => self.lock_and_spawn(),
        }
    }

    /// Drop straight down and lock, as one atomic step with no
    /// intermediate observable states.
    pub fn hard_drop(&mut self) -> StepOutcome {
        if self.status != GameStatus::Running {
            return StepOutcome::Ignored;
        }
        while self.try_translate(0, 1) == StepOutcome::Moved {}
        self.lock_and_spawn()
    }

    fn lock_and_spawn(&mut self) -> StepOutcome {
        self.board.lock_piece(self.current_piece);

        let cleared = self.board.clear_lines().len() as i32;
        self.update_score(cleared);

        self.current_piece = self.spawn_piece();

        if self.board.has_collision(self.current_piece) {
            self.status = GameStatus::Finished;
            StepOutcome::GameOver
        } else {
            StepOutcome::Locked
        }
    }

    /// Line-clear rewards at the pre-clear level, then level advancement
    /// at one level per 10 total lines.
    fn update_score(&mut self, cleared: i32) {
        let base = match cleared {
            1 => 40,
            2 => 100,
            3 => 300,
            4 => 1200,
            _ => 0,
        };
        self.score += base * (self.level + 1);
        self.lines += cleared;
        self.level = self.lines / LINES_PER_LEVEL;
    }

    /// Observable state for broadcasting. Needs `&mut self` because the
    /// bag may extend its buffer to serve the preview.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot {
            score: self.score,
            level: self.level,
            grid: self.board.to_bytes(),
            current_piece: self.current_piece,
            next_pieces: self.bag.peek(PREVIEW_COUNT),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
