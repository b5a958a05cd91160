use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskboard::{config::ServerConfig, http, storage::Storage, AppContext};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "taskboard",
    about = "Taskboard — self-hosted personal task tracker",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "TASKBOARD_PORT")]
    port: Option<u16>,

    /// Data directory for the SQLite database and config.toml
    #[arg(long, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKBOARD_LOG")]
    log: Option<String>,

    /// Bind address for the HTTP server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKBOARD_BIND")]
    bind_address: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the web server (default when no subcommand given).
    ///
    /// Examples:
    ///   taskboard serve
    ///   taskboard
    Serve,
}

fn init_logging(log_level: &str, log_format: &str) {
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServerConfig::new(args.port, args.data_dir, args.log, args.bind_address);
    init_logging(&config.log, &config.log_format);

    match args.command {
        Some(Command::Serve) | None => serve(config).await,
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        "starting taskboard"
    );

    let storage = Arc::new(Storage::new(&config.data_dir).await?);
    let ctx = Arc::new(AppContext::new(config, storage));

    http::start_http_server(ctx).await
}
