//! Server-authoritative multiplayer falling-block engine.
//!
//! The `core` module holds the rules: board, pieces, SRS rotation, the
//! 7-bag randomizer and the match state machine. The `session` module
//! runs one match per connection behind a line-delimited JSON protocol,
//! and the `gateway` module bridges browser websockets onto that
//! protocol.

pub mod core;
pub mod gateway;
pub mod session;
pub mod types;
