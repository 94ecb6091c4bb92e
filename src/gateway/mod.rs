//! Gateway - websocket bridge onto the session protocol
//!
//! Accepts browser websocket connections and translates them
//! message-for-message into a TCP session with the engine: a minimal JSON
//! command vocabulary maps onto the session protocol's client messages,
//! and engine lines are forwarded to the browser verbatim. No game
//! semantics live here. Failure in either direction ends both.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::session::protocol::{ClientMessage, InputType};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Address of the engine's session endpoint.
    pub engine_addr: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            engine_addr: "127.0.0.1:50051".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("TETRIS_GATEWAY_HOST").unwrap_or(defaults.host);
        let port = env::var("TETRIS_GATEWAY_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let engine_addr = env::var("TETRIS_ENGINE_ADDR").unwrap_or(defaults.engine_addr);

        Self {
            host,
            port,
            engine_addr,
        }
    }
}

/// Browser command vocabulary. Anything unrecognized maps to an
/// unspecified input and is dropped.
#[derive(Debug, Deserialize)]
struct BrowserCommand {
    cmd: String,
    #[serde(default)]
    match_id: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// Translate one browser text frame into a session protocol line.
/// Returns `None` for frames that should be dropped.
fn translate_command(text: &str) -> Option<String> {
    let command: BrowserCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "dropping malformed browser frame");
            return None;
        }
    };

    let msg = match command.cmd.as_str() {
        "join" => ClientMessage::Join {
            match_id: command.match_id.unwrap_or_else(|| "room-1".to_string()),
            token: command.token.unwrap_or_default(),
        },
        "left" => input(InputType::Left),
        "right" => input(InputType::Right),
        "rotate" => input(InputType::RotateCw),
        "rotate_ccw" => input(InputType::RotateCcw),
        "soft" => input(InputType::SoftDrop),
        "drop" => input(InputType::HardDrop),
        other => {
            debug!(cmd = other, "dropping unrecognized browser command");
            return None;
        }
    };

    serde_json::to_string(&msg).ok()
}

fn input(input: InputType) -> ClientMessage {
    ClientMessage::Input { input }
}

/// Start the gateway's websocket listener. Sends the bound address
/// through `ready_tx` once listening.
pub async fn run_gateway(
    config: GatewayConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    info!(%bound, engine = %config.engine_addr, "gateway listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "browser connected");
        let engine_addr = config.engine_addr.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_bridge(stream, &engine_addr).await {
                warn!(%peer, error = %e, "bridge ended with error");
            }
            info!(%peer, "browser disconnected");
        });
    }
}

/// Bridge one websocket connection to one engine session. Runs until
/// either side fails or closes; dropping the engine connection tears the
/// session down on the engine side.
async fn handle_bridge(stream: TcpStream, engine_addr: &str) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let engine = TcpStream::connect(engine_addr).await?;
    let (engine_read, mut engine_write) = engine.into_split();

    // Line reader task feeding a channel keeps the select loop
    // cancel-safe.
    let mut engine_lines = BufReader::new(engine_read).lines();
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Ok(Some(line)) = engine_lines.next_line().await {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                match line {
                    Some(line) => ws_tx.send(Message::Text(line)).await?,
                    None => break,
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(line) = translate_command(&text) {
                            engine_write.write_all(line.as_bytes()).await?;
                            engine_write.write_all(b"\n").await?;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
        }
    }

    let _ = engine_write.shutdown().await;
    let _ = ws_tx.close().await;
    Ok(())
}
