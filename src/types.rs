//! Core types shared across the engine, session layer and gateway.
//! Pure data types with no external dependencies.

/// Board dimensions. The playfield is 20 visible rows plus 2 hidden spawn
/// rows at the top (rows 0 and 1). y grows downward; gravity is y + 1.
pub const HIDDEN_ROWS: i32 = 2;
pub const BOARD_WIDTH: i32 = 10;
pub const BOARD_HEIGHT: i32 = 20 + HIDDEN_ROWS;

/// Rotation directions accepted by the SRS resolver.
pub const ROTATE_CW: i32 = 1;
pub const ROTATE_CCW: i32 = -1;

/// Default gravity tick. Treated as configuration on the match actor,
/// not a rules constant.
pub const DEFAULT_TICK_MS: u64 = 500;

/// Capacity of a match's outward event channel. Overflow drops the stale
/// snapshot instead of blocking the mutation path.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Cell/piece kinds. `None` is an empty cell; `Garbage` is a filled cell
/// that does not belong to any shape table. The discriminants are the wire
/// encoding (one byte per cell, 0 = empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceKind {
    None = 0,
    I = 1,
    O = 2,
    T = 3,
    S = 4,
    Z = 5,
    J = 6,
    L = 7,
    Garbage = 8,
}

impl PieceKind {
    /// The 7 playable kinds, in discriminant order.
    pub fn playable_kinds() -> [PieceKind; 7] {
        [
            PieceKind::I,
            PieceKind::O,
            PieceKind::T,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::J,
            PieceKind::L,
        ]
    }

    /// Whether this kind has a shape table and can fall.
    pub fn playable(self) -> bool {
        !matches!(self, PieceKind::None | PieceKind::Garbage)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<PieceKind> {
        match v {
            0 => Some(PieceKind::None),
            1 => Some(PieceKind::I),
            2 => Some(PieceKind::O),
            3 => Some(PieceKind::T),
            4 => Some(PieceKind::S),
            5 => Some(PieceKind::Z),
            6 => Some(PieceKind::J),
            7 => Some(PieceKind::L),
            8 => Some(PieceKind::Garbage),
            _ => None,
        }
    }
}

/// Integer offset / board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    /// 90 degrees clockwise: (x, y) -> (-y, x).
    pub fn rotate_cw(self) -> Point {
        Point::new(-self.y, self.x)
    }

    /// 90 degrees counter-clockwise: (x, y) -> (y, -x).
    pub fn rotate_ccw(self) -> Point {
        Point::new(self.y, -self.x)
    }
}

/// A falling piece: kind, pivot position in board coordinates and rotation
/// state in 0..4. Immutable value; move/rotate attempts build a candidate
/// and accept it only after collision validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub position: Point,
    pub rotation: i32,
}

impl Piece {
    pub fn new(kind: PieceKind, position: Point, rotation: i32) -> Self {
        Self {
            kind,
            position,
            rotation,
        }
    }

    /// Spawn location for new pieces: top-center, in the hidden rows.
    pub fn spawn(kind: PieceKind) -> Self {
        Self::new(kind, Point::new(4, 0), 0)
    }
}
