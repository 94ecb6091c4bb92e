//! Session layer: the per-match actor, the wire protocol and the TCP
//! server that runs one duplex session per connection.

pub mod actor;
pub mod protocol;
pub mod server;

pub use actor::{Match, MatchEvent, MatchRegistry};
pub use protocol::{ClientMessage, InputType, ServerMessage};
pub use server::{handle_session, run_engine, EngineConfig};
