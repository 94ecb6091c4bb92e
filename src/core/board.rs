//! Board module - manages the game grid
//!
//! The board is a 10x22 grid (20 visible rows plus 2 hidden spawn rows at
//! the top). Uses a flat array for cache locality and zero allocation on
//! the hot paths. Coordinates: (x, y) with x in 0..10 left to right and
//! y in 0..22 top to bottom; gravity moves pieces toward higher y.

use arrayvec::ArrayVec;

use crate::core::pieces::rotated_minos;
use crate::types::{Piece, PieceKind, Point, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board.
const BOARD_SIZE: usize = (BOARD_WIDTH * BOARD_HEIGHT) as usize;

/// The game board - 10 columns x 22 rows using flat row-major storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [PieceKind; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [PieceKind::None; BOARD_SIZE],
        }
    }

    #[inline(always)]
    fn index(p: Point) -> usize {
        (p.y * BOARD_WIDTH + p.x) as usize
    }

    /// Bounds test against the full grid, hidden rows included.
    pub fn is_inside(&self, p: Point) -> bool {
        p.x >= 0 && p.x < BOARD_WIDTH && p.y >= 0 && p.y < BOARD_HEIGHT
    }

    /// Get the cell at `p`. Out-of-grid probes return `PieceKind::None`
    /// rather than an error so callers can scan hidden rows and edges
    /// without bounds-checking first.
    pub fn get(&self, p: Point) -> PieceKind {
        if !self.is_inside(p) {
            return PieceKind::None;
        }
        self.cells[Self::index(p)]
    }

    /// Set the cell at `p`. Out-of-grid writes are a no-op.
    pub fn set(&mut self, p: Point, kind: PieceKind) {
        if !self.is_inside(p) {
            return;
        }
        self.cells[Self::index(p)] = kind;
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.cells = [PieceKind::None; BOARD_SIZE];
    }

    /// Collision test for a candidate piece. A piece collides when any of
    /// its rotated+translated cells leaves the horizontal bounds, passes
    /// the bottom bound, or overlaps a filled cell at y >= 0. Cells above
    /// row 0 never collide: pieces may spawn partially above the grid.
    pub fn has_collision(&self, piece: Piece) -> bool {
        for mino in rotated_minos(piece.kind, piece.rotation) {
            let absolute = piece.position.add(mino);
            if absolute.x < 0 || absolute.x >= BOARD_WIDTH || absolute.y >= BOARD_HEIGHT {
                return true;
            }
            if absolute.y >= 0 && self.get(absolute) != PieceKind::None {
                return true;
            }
        }
        false
    }

    /// Write the piece's kind into every one of its cells. The caller must
    /// have validated that the piece does not collide.
    pub fn lock_piece(&mut self, piece: Piece) {
        for mino in rotated_minos(piece.kind, piece.rotation) {
            self.set(piece.position.add(mino), piece.kind);
        }
    }

    fn is_row_full(&self, y: i32) -> bool {
        let start = (y * BOARD_WIDTH) as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|&c| c != PieceKind::None)
    }

    /// Remove every full row, compacting the rows above downward while
    /// preserving their relative order. Single pass, bottom to top, with
    /// one write cursor and one read cursor. Returns the cleared row
    /// indices, bottom-most first (at most 4 for any locked piece).
    pub fn clear_lines(&mut self) -> ArrayVec<i32, 4> {
        let mut cleared = ArrayVec::new();
        let width = BOARD_WIDTH as usize;
        let mut write_y = BOARD_HEIGHT - 1;

        for read_y in (0..BOARD_HEIGHT).rev() {
            if self.is_row_full(read_y) {
                // A locked piece spans at most 4 rows, so no single call
                // can find a fifth full row.
                debug_assert!(!cleared.is_full(), "more than 4 full rows");
                if !cleared.is_full() {
                    cleared.push(read_y);
                }
            } else {
                if write_y != read_y {
                    let src = (read_y * BOARD_WIDTH) as usize;
                    let dst = (write_y * BOARD_WIDTH) as usize;
                    self.cells.copy_within(src..src + width, dst);
                }
                write_y -= 1;
            }
        }

        // Rows vacated at the top become empty.
        for y in 0..=write_y {
            let start = (y * BOARD_WIDTH) as usize;
            for cell in &mut self.cells[start..start + width] {
                *cell = PieceKind::None;
            }
        }

        cleared
    }

    /// Serialize the grid for the wire: one byte per cell, row-major,
    /// numeric kind values with 0 = empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.as_u8()).collect()
    }

    /// Borrow the raw cells (row-major).
    pub fn cells(&self) -> &[PieceKind] {
        &self.cells
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
