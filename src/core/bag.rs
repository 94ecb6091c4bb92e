//! Bag module - 7-bag random piece generation
//!
//! Implements the "7-bag" randomization used in modern Tetris: every run
//! of 7 consecutive draws contains each playable piece exactly once. The
//! bag keeps a buffer of shuffled 7-piece sets and a head cursor, so a
//! preview of upcoming pieces can be served without consuming anything.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::types::PieceKind;

const ALL_KINDS: [PieceKind; 7] = [
    PieceKind::I,
    PieceKind::O,
    PieceKind::T,
    PieceKind::S,
    PieceKind::Z,
    PieceKind::J,
    PieceKind::L,
];

/// 7-bag piece generator with a stable preview window.
#[derive(Debug, Clone)]
pub struct Bag {
    buf: Vec<PieceKind>,
    head: usize,
    rng: StdRng,
}

impl Bag {
    /// Create a bag seeded from system entropy. Two full sets are queued
    /// up front so a preview is available before the first draw.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a bag with a fixed seed. Same seed, same piece sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut bag = Self {
            buf: Vec::with_capacity(14),
            head: 0,
            rng,
        };
        bag.push_set();
        bag.push_set();
        bag
    }

    /// Append one freshly shuffled set of all 7 kinds to the buffer.
    fn push_set(&mut self) {
        let mut set = ALL_KINDS;
        set.shuffle(&mut self.rng);
        self.buf.extend_from_slice(&set);
    }

    fn available(&self) -> usize {
        self.buf.len() - self.head
    }

    /// Draw the next piece. The buffer is topped up before the draw so
    /// `peek` stays valid for at least a full set, and consumed entries
    /// are compacted away once a whole set has been drawn.
    pub fn next(&mut self) -> PieceKind {
        if self.available() < 7 {
            self.push_set();
        }

        let kind = self.buf[self.head];
        self.head += 1;

        if self.head >= 7 {
            self.buf.drain(..self.head);
            self.head = 0;
        }

        kind
    }

    /// Preview the next `n` pieces without consuming them. Extends the
    /// buffer as needed; calling `peek` twice in a row yields the same
    /// sequence, and the next `n` draws return exactly these values.
    pub fn peek(&mut self, n: usize) -> Vec<PieceKind> {
        while self.available() < n {
            self.push_set();
        }
        self.buf[self.head..self.head + n].to_vec()
    }
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}
