//! Protocol module - JSON message types for the session stream
//!
//! Line-delimited JSON over a persistent duplex connection. The first
//! client message must be a join; everything after is input. Server
//! messages are state snapshots and terminal game events. Grid cells and
//! piece kinds travel as their numeric values (0 = empty).

use serde::{Deserialize, Serialize};

use crate::core::Snapshot;

// ============== Client -> Server Messages ==============

/// Player input, mapped one-to-one onto match operations. Unknown values
/// deserialize as `Unspecified` and are dropped without closing the
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputType {
    #[serde(rename = "LEFT")]
    Left,
    #[serde(rename = "RIGHT")]
    Right,
    #[serde(rename = "ROTATE_CW")]
    RotateCw,
    #[serde(rename = "ROTATE_CCW")]
    RotateCcw,
    #[serde(rename = "SOFT_DROP")]
    SoftDrop,
    #[serde(rename = "HARD_DROP")]
    HardDrop,
    #[serde(rename = "UNSPECIFIED")]
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Must be the first message on a new stream. Binds the stream to one
    /// match, creating it if absent.
    Join {
        match_id: String,
        #[serde(default)]
        token: String,
    },
    Input { input: InputType },
}

// ============== Server -> Client Messages ==============

/// Falling-piece descriptor inside a state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceState {
    pub kind: u8,
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "GAME_OVER")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateUpdate {
        score: i32,
        level: i32,
        /// One byte per cell, row-major, numeric kind values.
        grid: Vec<u8>,
        current_piece: PieceState,
        next_pieces: Vec<u8>,
    },
    GameEvent { event: EventType, message: String },
    /// Session rejection, sent once before the stream is closed.
    Error { message: String },
}

impl ServerMessage {
    /// Build a state update from an engine snapshot.
    pub fn state_update(snapshot: &Snapshot) -> Self {
        ServerMessage::StateUpdate {
            score: snapshot.score,
            level: snapshot.level,
            grid: snapshot.grid.clone(),
            current_piece: PieceState {
                kind: snapshot.current_piece.kind.as_u8(),
                x: snapshot.current_piece.position.x,
                y: snapshot.current_piece.position.y,
                rotation: snapshot.current_piece.rotation,
            },
            next_pieces: snapshot.next_pieces.iter().map(|k| k.as_u8()).collect(),
        }
    }

    pub fn game_over() -> Self {
        ServerMessage::GameEvent {
            event: EventType::GameOver,
            message: "Game Over".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// Parse one line of the inbound stream.
pub fn parse_client_message(json: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(json)
}
