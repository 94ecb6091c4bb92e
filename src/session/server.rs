//! Server module - TCP listener and per-session duplex loop
//!
//! Each connection carries one session: a join handshake binds it to a
//! match, then two tasks run until either fails. The read task forwards
//! inputs into the match; the write task forwards match events out. The
//! first terminal failure on either side stops both and releases the
//! match, so no ticker task outlives its session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::session::actor::{MatchEvent, MatchRegistry};
use crate::session::protocol::{parse_client_message, ClientMessage, ServerMessage};
use crate::types::DEFAULT_TICK_MS;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    pub tick: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl EngineConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("TETRIS_ENGINE_HOST").unwrap_or(defaults.host);
        let port = env::var("TETRIS_ENGINE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let tick = env::var("TETRIS_ENGINE_TICK_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick);

        Self { host, port, tick }
    }
}

/// Start the engine's TCP server. Sends the bound address through
/// `ready_tx` once listening, so callers can bind port 0.
pub async fn run_engine(
    config: EngineConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    info!(%bound, "engine listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let registry = Arc::new(MatchRegistry::new());
    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "client connected");
        let tick = config.tick;
        let registry = Arc::clone(&registry);

        tokio::spawn(async move {
            if let Err(e) = handle_session(socket, tick, registry).await {
                warn!(%peer, error = %e, "session ended with error");
            }
            info!(%peer, "client disconnected");
        });
    }
}

/// Serialize one server message onto the stream as a JSON line.
async fn write_message<W>(writer: &mut W, msg: &ServerMessage) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(msg)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Run one session over any duplex byte stream. Generic over the
/// transport so tests can drive it with an in-memory duplex pipe.
pub async fn handle_session<S>(
    stream: S,
    tick: Duration,
    registry: Arc<MatchRegistry>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    // The first message must be a join; anything else is a protocol
    // violation and no match is created.
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(());
    }
    let match_id = match parse_client_message(line.trim()) {
        Ok(ClientMessage::Join { match_id, .. }) => match_id,
        _ => {
            let reject = ServerMessage::error("first message must be join");
            let _ = write_message(&mut writer, &reject).await;
            anyhow::bail!("protocol violation: first message must be join");
        }
    };

    let game_match = registry.join(&match_id);
    let mut events = match game_match.start(tick) {
        Some(events) => events,
        None => {
            let reject = ServerMessage::error("match is already in progress");
            let _ = write_message(&mut writer, &reject).await;
            anyhow::bail!("join rejected: match {} is already in progress", match_id);
        }
    };
    info!(%match_id, "player joined");

    // Outbound: match events to the wire. Ends when the event stream
    // closes or a write fails.
    let mut write_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let msg = match event {
                MatchEvent::StateUpdate(snapshot) => ServerMessage::state_update(&snapshot),
                MatchEvent::GameOver { .. } => ServerMessage::game_over(),
            };
            write_message(&mut writer, &msg).await?;
        }
        Ok::<(), anyhow::Error>(())
    });

    // Inbound: wire lines to match inputs. Ends on EOF or a read error.
    let input_match = Arc::clone(&game_match);
    let mut read_task = tokio::spawn(async move {
        let mut line = String::new();
        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                return Ok::<(), anyhow::Error>(());
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_client_message(trimmed) {
                Ok(ClientMessage::Input { input }) => input_match.handle_input(input),
                Ok(ClientMessage::Join { .. }) => {
                    debug!("ignoring join on an established stream");
                }
                Err(e) => debug!(error = %e, "dropping malformed line"),
            }
        }
    });

    // First failure wins: whichever direction finishes first cancels the
    // other, then the match is released.
    let result = tokio::select! {
        r = &mut write_task => {
            read_task.abort();
            r
        }
        r = &mut read_task => {
            write_task.abort();
            r
        }
    };
    game_match.stop();
    registry.release(&game_match);

    match result {
        Ok(inner) => inner,
        Err(join_err) if join_err.is_cancelled() => Ok(()),
        Err(join_err) => Err(join_err.into()),
    }
}
