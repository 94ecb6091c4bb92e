//! Tetromino shapes and SRS rotation
//!
//! Shapes are given as four mino offsets around a rotation center, in the
//! board's y-down convention. Rotation uses the standard wall-kick tables:
//! five candidate offsets per (from-state, direction) pair tried in order,
//! with the identity offset (0,0) always first so an unobstructed rotation
//! never kicks.

use crate::core::board::Board;
use crate::types::{Piece, PieceKind, Point, ROTATE_CCW};

/// Mino offsets for each playable kind at rotation state 0.
const MINOS_I: [Point; 4] = [
    Point { x: -1, y: 0 },
    Point { x: 0, y: 0 },
    Point { x: 1, y: 0 },
    Point { x: 2, y: 0 },
];
const MINOS_J: [Point; 4] = [
    Point { x: -1, y: 1 },
    Point { x: -1, y: 0 },
    Point { x: 0, y: 0 },
    Point { x: 1, y: 0 },
];
const MINOS_L: [Point; 4] = [
    Point { x: 1, y: 1 },
    Point { x: -1, y: 0 },
    Point { x: 0, y: 0 },
    Point { x: 1, y: 0 },
];
const MINOS_O: [Point; 4] = [
    Point { x: 0, y: 1 },
    Point { x: 1, y: 1 },
    Point { x: 0, y: 0 },
    Point { x: 1, y: 0 },
];
const MINOS_S: [Point; 4] = [
    Point { x: 0, y: 1 },
    Point { x: 1, y: 1 },
    Point { x: -1, y: 0 },
    Point { x: 0, y: 0 },
];
const MINOS_T: [Point; 4] = [
    Point { x: 0, y: 1 },
    Point { x: -1, y: 0 },
    Point { x: 0, y: 0 },
    Point { x: 1, y: 0 },
];
const MINOS_Z: [Point; 4] = [
    Point { x: -1, y: 1 },
    Point { x: 0, y: 1 },
    Point { x: 0, y: 0 },
    Point { x: 1, y: 0 },
];

/// Base (rotation 0) mino offsets for a kind. Non-playable kinds have no
/// shape and yield an empty slice.
pub fn base_minos(kind: PieceKind) -> &'static [Point] {
    match kind {
        PieceKind::I => &MINOS_I,
        PieceKind::J => &MINOS_J,
        PieceKind::L => &MINOS_L,
        PieceKind::O => &MINOS_O,
        PieceKind::S => &MINOS_S,
        PieceKind::T => &MINOS_T,
        PieceKind::Z => &MINOS_Z,
        PieceKind::None | PieceKind::Garbage => &[],
    }
}

/// Mino offsets for a kind at the given rotation state (0..4), rotated
/// clockwise `rotation` times around the center. The identity of the four
/// cells is what matters; order is stable but not meaningful.
pub fn rotated_minos(kind: PieceKind, rotation: i32) -> [Point; 4] {
    let mut minos = [Point::new(0, 0); 4];
    for (slot, &base) in minos.iter_mut().zip(base_minos(kind).iter()) {
        let mut p = base;
        for _ in 0..rotation.rem_euclid(4) {
            p = p.rotate_cw();
        }
        *slot = p;
    }
    minos
}

/// Wall-kick offsets for J, L, S, T and Z, indexed by kick slot
/// (from-state * 2, +1 for counter-clockwise). Offsets are in the y-down
/// convention.
const KICKS_JLSTZ: [[Point; 5]; 8] = [
    // 0 -> R
    [
        Point { x: 0, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: -1, y: -1 },
        Point { x: 0, y: 2 },
        Point { x: -1, y: 2 },
    ],
    // 0 -> L
    [
        Point { x: 0, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: 1, y: -1 },
        Point { x: 0, y: 2 },
        Point { x: 1, y: 2 },
    ],
    // R -> 2
    [
        Point { x: 0, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: 1, y: 1 },
        Point { x: 0, y: -2 },
        Point { x: 1, y: -2 },
    ],
    // R -> 0
    [
        Point { x: 0, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: 1, y: 1 },
        Point { x: 0, y: -2 },
        Point { x: 1, y: -2 },
    ],
    // 2 -> L
    [
        Point { x: 0, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: 1, y: -1 },
        Point { x: 0, y: 2 },
        Point { x: 1, y: 2 },
    ],
    // 2 -> R
    [
        Point { x: 0, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: -1, y: -1 },
        Point { x: 0, y: 2 },
        Point { x: -1, y: 2 },
    ],
    // L -> 0
    [
        Point { x: 0, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: -1, y: 1 },
        Point { x: 0, y: -2 },
        Point { x: -1, y: -2 },
    ],
    // L -> 2
    [
        Point { x: 0, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: -1, y: 1 },
        Point { x: 0, y: -2 },
        Point { x: -1, y: -2 },
    ],
];

/// Wall-kick offsets for the I piece, same slot layout as above.
const KICKS_I: [[Point; 5]; 8] = [
    // 0 -> R
    [
        Point { x: 0, y: 0 },
        Point { x: -2, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: -2, y: 1 },
        Point { x: 1, y: -2 },
    ],
    // 0 -> L
    [
        Point { x: 0, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: 2, y: 0 },
        Point { x: -1, y: -2 },
        Point { x: 2, y: 1 },
    ],
    // R -> 2
    [
        Point { x: 0, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: 2, y: 0 },
        Point { x: -1, y: -2 },
        Point { x: 2, y: 1 },
    ],
    // R -> 0
    [
        Point { x: 0, y: 0 },
        Point { x: 2, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: 2, y: -1 },
        Point { x: -1, y: 2 },
    ],
    // 2 -> L
    [
        Point { x: 0, y: 0 },
        Point { x: 2, y: 0 },
        Point { x: -1, y: 0 },
        Point { x: 2, y: -1 },
        Point { x: -1, y: 2 },
    ],
    // 2 -> R
    [
        Point { x: 0, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: -2, y: 0 },
        Point { x: 1, y: 2 },
        Point { x: -2, y: -1 },
    ],
    // L -> 0
    [
        Point { x: 0, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: -2, y: 0 },
        Point { x: 1, y: 2 },
        Point { x: -2, y: -1 },
    ],
    // L -> 2
    [
        Point { x: 0, y: 0 },
        Point { x: -2, y: 0 },
        Point { x: 1, y: 0 },
        Point { x: -2, y: 1 },
        Point { x: 1, y: -2 },
    ],
];

/// Kick slot for a (from-state, direction) pair: `from * 2` for clockwise,
/// `from * 2 + 1` for counter-clockwise.
fn kick_slot(from: i32, direction: i32) -> usize {
    let base = (from.rem_euclid(4) * 2) as usize;
    if direction == ROTATE_CCW {
        base + 1
    } else {
        base
    }
}

/// Attempt to rotate `piece` one step in `direction` (`ROTATE_CW` or
/// `ROTATE_CCW`), trying each wall-kick offset in priority order against
/// the board. Returns the first non-colliding candidate, or `None` if
/// every kick fails; the caller keeps its original piece on failure.
/// O has no kick table and rotates unconditionally in place. Never
/// mutates the board.
pub fn try_rotate(board: &Board, piece: Piece, direction: i32) -> Option<Piece> {
    if !piece.kind.playable() {
        return None;
    }
    let next_rotation = (piece.rotation + direction).rem_euclid(4);
    if piece.kind == PieceKind::O {
        return Some(Piece::new(piece.kind, piece.position, next_rotation));
    }
    let table: &[[Point; 5]; 8] = if piece.kind == PieceKind::I {
        &KICKS_I
    } else {
        &KICKS_JLSTZ
    };
    for &kick in &table[kick_slot(piece.rotation, direction)] {
        let candidate = Piece::new(piece.kind, piece.position.add(kick), next_rotation);
        if !board.has_collision(candidate) {
            return Some(candidate);
        }
    }
    None
}
