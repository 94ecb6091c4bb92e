use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tetris_online::gateway::{run_gateway, GatewayConfig};
use tetris_online::session::{run_engine, EngineConfig};

/// Server-authoritative multiplayer Tetris: match engine and websocket
/// gateway.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the match engine (TCP session endpoint).
    Engine {
        /// Listen port; overrides TETRIS_ENGINE_PORT.
        #[arg(long)]
        port: Option<u16>,
        /// Gravity tick in milliseconds; overrides TETRIS_ENGINE_TICK_MS.
        #[arg(long)]
        tick_ms: Option<u64>,
    },
    /// Run the browser-facing websocket gateway.
    Gateway {
        /// Listen port; overrides TETRIS_GATEWAY_PORT.
        #[arg(long)]
        port: Option<u16>,
        /// Engine address; overrides TETRIS_ENGINE_ADDR.
        #[arg(long)]
        engine: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Engine { port, tick_ms } => {
            let mut config = EngineConfig::from_env();
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(ms) = tick_ms {
                config.tick = std::time::Duration::from_millis(ms);
            }
            run_engine(config, None).await
        }
        Command::Gateway { port, engine } => {
            let mut config = GatewayConfig::from_env();
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(engine) = engine {
                config.engine_addr = engine;
            }
            run_gateway(config, None).await
        }
    }
}
