//! Session handler tests over an in-memory duplex pipe.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tetris_online::core::{rotated_minos, Bag, Board, Game};
use tetris_online::session::{handle_session, MatchRegistry};
use tetris_online::types::{PieceKind, Point, BOARD_HEIGHT, BOARD_WIDTH};

const SLOW_TICK: Duration = Duration::from_secs(60);

async fn send_line<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, line: &str) {
    writer.write_all(line.as_bytes()).await.unwrap();
    writer.write_all(b"\n").await.unwrap();
    writer.flush().await.unwrap();
}

async fn next_json<R: tokio::io::AsyncBufRead + Unpin>(
    lines: &mut tokio::io::Lines<R>,
) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timed out waiting for a server line")
        .unwrap()
        .expect("stream closed unexpectedly");
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn session_join_yields_state_updates() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let registry = Arc::new(MatchRegistry::new());
    let session = tokio::spawn(handle_session(server, SLOW_TICK, Arc::clone(&registry)));

    let (read_half, mut write_half) = tokio::io::split(client);
    let mut lines = BufReader::new(read_half).lines();

    send_line(&mut write_half, r#"{"type":"join","match_id":"room-1"}"#).await;

    let update = next_json(&mut lines).await;
    assert_eq!(update["type"], "state_update");
    assert_eq!(update["score"], 0);
    assert_eq!(update["grid"].as_array().unwrap().len(), 220);
    assert_eq!(update["current_piece"]["x"], 4);
    assert_eq!(update["current_piece"]["y"], 0);
    assert_eq!(update["next_pieces"].as_array().unwrap().len(), 3);

    // An input produces a fresh snapshot.
    send_line(&mut write_half, r#"{"type":"input","input":"LEFT"}"#).await;
    let update = next_json(&mut lines).await;
    assert_eq!(update["type"], "state_update");
    assert_eq!(update["current_piece"]["x"], 3);

    drop(write_half);
    drop(lines);
    let result = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session did not end after disconnect")
        .unwrap();
    assert!(result.is_ok());
    assert!(registry.is_empty());
}

#[tokio::test]
async fn session_rejects_non_join_first_message() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let registry = Arc::new(MatchRegistry::new());
    let session = tokio::spawn(handle_session(server, SLOW_TICK, Arc::clone(&registry)));

    let (read_half, mut write_half) = tokio::io::split(client);
    let mut lines = BufReader::new(read_half).lines();

    send_line(&mut write_half, r#"{"type":"input","input":"LEFT"}"#).await;

    let reject = next_json(&mut lines).await;
    assert_eq!(reject["type"], "error");

    // The session ends with an error and the stream closes.
    let result = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session did not end")
        .unwrap();
    assert!(result.is_err());
    let closed = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("stream did not close")
        .unwrap();
    assert_eq!(closed, None);
    // No match was created for the rejected session.
    assert!(registry.is_empty());
}

#[tokio::test]
async fn session_rejects_malformed_first_message() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let session = tokio::spawn(handle_session(
        server,
        SLOW_TICK,
        Arc::new(MatchRegistry::new()),
    ));

    let (_read_half, mut write_half) = tokio::io::split(client);
    send_line(&mut write_half, "this is not json").await;

    let result = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session did not end")
        .unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn session_ends_when_client_disconnects_while_output_idle() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let registry = Arc::new(MatchRegistry::new());
    let session = tokio::spawn(handle_session(server, SLOW_TICK, Arc::clone(&registry)));

    let (read_half, mut write_half) = tokio::io::split(client);
    let mut lines = BufReader::new(read_half).lines();

    send_line(&mut write_half, r#"{"type":"join","match_id":"room-1"}"#).await;
    let _ = next_json(&mut lines).await;

    // Keep the read half open so the write direction stays idle, and
    // shut down only the inbound direction.
    write_half.shutdown().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("read-side disconnect did not end the session")
        .unwrap();
    assert!(result.is_ok());
    // The match was released; no ticker outlives its session.
    assert!(registry.is_empty());
}

#[tokio::test]
async fn session_drops_malformed_lines_after_join() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let _session = tokio::spawn(handle_session(
        server,
        SLOW_TICK,
        Arc::new(MatchRegistry::new()),
    ));

    let (read_half, mut write_half) = tokio::io::split(client);
    let mut lines = BufReader::new(read_half).lines();

    send_line(&mut write_half, r#"{"type":"join","match_id":"room-1"}"#).await;
    let _ = next_json(&mut lines).await;

    // Garbage and unknown inputs are dropped without killing the stream.
    send_line(&mut write_half, "garbage").await;
    send_line(&mut write_half, r#"{"type":"input","input":"TELEPORT"}"#).await;
    send_line(&mut write_half, r#"{"type":"input","input":"RIGHT"}"#).await;

    let update = next_json(&mut lines).await;
    assert_eq!(update["type"], "state_update");
    assert_eq!(update["current_piece"]["x"], 5);
}

#[tokio::test]
async fn session_hard_drops_reach_game_over() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let session = tokio::spawn(handle_session(
        server,
        Duration::from_secs(60),
        Arc::new(MatchRegistry::new()),
    ));

    let (read_half, mut write_half) = tokio::io::split(client);
    let mut lines = BufReader::new(read_half).lines();

    send_line(&mut write_half, r#"{"type":"join","match_id":"room-1"}"#).await;

    // Stack pieces at the spawn column until the match tops out. The
    // session may close mid-burst once the match finishes, so write
    // failures here are expected and ignored.
    for _ in 0..60 {
        let _ = write_half
            .write_all(b"{\"type\":\"input\",\"input\":\"HARD_DROP\"}\n")
            .await;
        let _ = write_half.flush().await;
    }

    let mut saw_game_over = false;
    loop {
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .expect("timed out waiting for game over")
            .unwrap();
        match line {
            Some(line) => {
                let value: serde_json::Value = serde_json::from_str(&line).unwrap();
                if value["type"] == "game_event" {
                    assert_eq!(value["event"], "GAME_OVER");
                    saw_game_over = true;
                }
            }
            // Stream closes after the terminal event.
            None => break,
        }
    }
    assert!(saw_game_over);

    drop(write_half);
    let result = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session did not end after game over")
        .unwrap();
    assert!(result.is_ok());
}

/// Game whose first hard drop completes the bottom row, whatever kind
/// the seeded bag deals first: the row is prefilled except exactly the
/// columns where that piece's lowest cells will land.
fn clearing_game(seed: u64) -> Game {
    let mut bag = Bag::seeded(seed);
    let first = bag.peek(1)[0];
    let minos = rotated_minos(first, 0);
    let lowest = minos.iter().map(|m| m.y).max().unwrap();
    let landing: Vec<i32> = minos
        .iter()
        .filter(|m| m.y == lowest)
        .map(|m| 4 + m.x)
        .collect();

    let mut board = Board::new();
    let bottom = BOARD_HEIGHT - 1;
    for x in 0..BOARD_WIDTH {
        if !landing.contains(&x) {
            board.set(Point::new(x, bottom), PieceKind::Garbage);
        }
    }
    Game::with_board_and_bag(board, bag)
}

fn bottom_row_filled(grid: &serde_json::Value) -> usize {
    let cells = grid.as_array().unwrap();
    cells[cells.len() - BOARD_WIDTH as usize..]
        .iter()
        .filter(|c| c.as_u64().unwrap() != 0)
        .count()
}

#[tokio::test]
async fn session_hard_drop_clears_a_line_over_the_wire() {
    let registry = Arc::new(MatchRegistry::with_factory(|| clearing_game(11)));
    let (client, server) = tokio::io::duplex(64 * 1024);
    let session = tokio::spawn(handle_session(server, SLOW_TICK, Arc::clone(&registry)));

    let (read_half, mut write_half) = tokio::io::split(client);
    let mut lines = BufReader::new(read_half).lines();

    send_line(&mut write_half, r#"{"type":"join","match_id":"room-1"}"#).await;
    let before = next_json(&mut lines).await;
    assert_eq!(before["type"], "state_update");
    assert_eq!(before["score"], 0);
    let filled_before = bottom_row_filled(&before["grid"]);
    assert!(filled_before >= 6);

    send_line(&mut write_half, r#"{"type":"input","input":"HARD_DROP"}"#).await;
    let after = next_json(&mut lines).await;
    assert_eq!(after["type"], "state_update");
    // One line cleared at level 0.
    assert_eq!(after["score"], 40);
    assert_eq!(after["level"], 0);
    assert!(bottom_row_filled(&after["grid"]) < filled_before);

    drop(write_half);
    let _ = tokio::time::timeout(Duration::from_secs(2), session).await;
}

#[tokio::test]
async fn second_join_to_a_running_match_is_rejected() {
    let registry = Arc::new(MatchRegistry::new());

    let (first_client, first_server) = tokio::io::duplex(64 * 1024);
    let _first = tokio::spawn(handle_session(
        first_server,
        SLOW_TICK,
        Arc::clone(&registry),
    ));
    let (first_read, mut first_write) = tokio::io::split(first_client);
    let mut first_lines = BufReader::new(first_read).lines();
    send_line(&mut first_write, r#"{"type":"join","match_id":"room-1"}"#).await;
    let update = next_json(&mut first_lines).await;
    assert_eq!(update["type"], "state_update");

    // A second session naming the same match cannot share the stream.
    let (second_client, second_server) = tokio::io::duplex(64 * 1024);
    let second = tokio::spawn(handle_session(
        second_server,
        SLOW_TICK,
        Arc::clone(&registry),
    ));
    let (second_read, mut second_write) = tokio::io::split(second_client);
    let mut second_lines = BufReader::new(second_read).lines();
    send_line(&mut second_write, r#"{"type":"join","match_id":"room-1"}"#).await;

    let reject = next_json(&mut second_lines).await;
    assert_eq!(reject["type"], "error");
    let result = tokio::time::timeout(Duration::from_secs(2), second)
        .await
        .expect("rejected session did not end")
        .unwrap();
    assert!(result.is_err());

    // The original match is untouched by the rejected join.
    assert_eq!(registry.len(), 1);
    send_line(&mut first_write, r#"{"type":"input","input":"LEFT"}"#).await;
    let update = next_json(&mut first_lines).await;
    assert_eq!(update["current_piece"]["x"], 3);
}
