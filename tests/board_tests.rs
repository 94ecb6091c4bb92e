//! Board behavior tests exercised through the public API.

use tetris_online::core::Board;
use tetris_online::types::{Piece, PieceKind, Point, BOARD_HEIGHT, BOARD_WIDTH};

#[test]
fn t_shaped_hole_clears_exactly_the_filled_rows() {
    let mut board = Board::new();
    let bottom = BOARD_HEIGHT - 1;

    // Bottom two rows full except a T-shaped hole: three cells wide at
    // the upper row, one cell below the middle.
    for x in 0..BOARD_WIDTH {
        if x != 4 {
            board.set(Point::new(x, bottom), PieceKind::Garbage);
        }
        if !(3..=5).contains(&x) {
            board.set(Point::new(x, bottom - 1), PieceKind::Garbage);
        }
    }
    // A distinctive partial row above the hole.
    board.set(Point::new(0, bottom - 2), PieceKind::I);
    board.set(Point::new(7, bottom - 2), PieceKind::J);

    // T at rotation 0 occupies (-1,0),(0,0),(1,0) and (0,1): exactly the
    // hole when centered at (4, bottom-1).
    let piece = Piece::new(PieceKind::T, Point::new(4, bottom - 1), 0);
    assert!(!board.has_collision(piece));
    board.lock_piece(piece);

    let cleared = board.clear_lines();
    assert_eq!(cleared.len(), 2);

    // The partial row shifted down by exactly the cleared count,
    // preserving left-to-right order.
    assert_eq!(board.get(Point::new(0, bottom)), PieceKind::I);
    assert_eq!(board.get(Point::new(7, bottom)), PieceKind::J);
    for x in 0..BOARD_WIDTH {
        if x != 0 && x != 7 {
            assert_eq!(board.get(Point::new(x, bottom)), PieceKind::None);
        }
        assert_eq!(board.get(Point::new(x, bottom - 1)), PieceKind::None);
        assert_eq!(board.get(Point::new(x, bottom - 2)), PieceKind::None);
    }
}

#[test]
fn pieces_may_overhang_the_hidden_top() {
    let board = Board::new();
    // An I standing upright with cells above row 0 does not collide.
    let piece = Piece::new(PieceKind::I, Point::new(4, 0), 1);
    assert!(!board.has_collision(piece));
}

#[test]
fn lock_then_clear_leaves_no_full_rows() {
    let mut board = Board::new();
    let bottom = BOARD_HEIGHT - 1;
    for x in 0..BOARD_WIDTH {
        if x != 0 && x != 1 {
            board.set(Point::new(x, bottom), PieceKind::Garbage);
        }
    }
    // O fills the remaining two cells of the bottom row plus the row
    // above.
    let piece = Piece::new(PieceKind::O, Point::new(0, bottom - 1), 0);
    board.lock_piece(piece);
    let cleared = board.clear_lines();
    assert_eq!(cleared.len(), 1);

    for y in 0..BOARD_HEIGHT {
        let full = (0..BOARD_WIDTH).all(|x| board.get(Point::new(x, y)) != PieceKind::None);
        assert!(!full, "row {} is still full", y);
    }
    // The O's top half survived.
    assert_eq!(board.get(Point::new(0, bottom)), PieceKind::O);
    assert_eq!(board.get(Point::new(1, bottom)), PieceKind::O);
}
