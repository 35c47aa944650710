//! Pollcast Server
//!
//! Run with: cargo run -- serve
//!
//! # Configuration
//!
//! Settings come from a TOML file (`--config`, or the default locations) and
//! are overridden by environment variables:
//! - `POLLCAST_HOST`: Host to bind to (default: 0.0.0.0)
//! - `POLLCAST_PORT`: Port to listen on (default: 3000)
//! - `POLLCAST_MAX_CONNECTIONS`: WebSocket connection limit (default: 1000)
//! - `POLLCAST_LOG_LEVEL`: Log level (default: info)
//! - `POLLCAST_LOG_FORMAT`: `pretty` or `json` (default: pretty)
//! - `RUST_LOG`: Overrides the log filter entirely

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pollcast::api::{serve, AppState};
use pollcast::config::{generate_default_config, Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "pollcast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time poll update server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP and WebSocket server (default)
    Serve {
        /// Config file (default: search standard locations)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the bind port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve {
        config: None,
        host: None,
        port: None,
    }) {
        Commands::Serve { config, host, port } => {
            let mut config = match config {
                Some(path) => Config::load_with_env(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => Config::load_default(),
            };
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            init_tracing(&config.logging);
            run(config).await
        }
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    }
}

/// Initialize tracing from the logging config; `RUST_LOG` wins if set
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("pollcast={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting Pollcast server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        max_connections = config.hub.max_connections,
        "WebSocket hub configured"
    );

    let state = AppState::new(config.server.clone(), config.hub.clone());
    serve(state, &config.server).await?;

    tracing::info!("Pollcast server stopped");
    Ok(())
}
