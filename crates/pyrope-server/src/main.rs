//! Pyrope cache server.
//!
//! Main entry point for the standalone server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use pyrope_server::{CacheServer, ServerConfig};

/// Pyrope - single-node cache server with idle-timeout expiration
#[derive(Parser)]
#[command(name = "pyrope-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:40404", env = "PYROPE_BIND")]
    bind: SocketAddr,

    /// Name announced to clients
    #[arg(long, default_value = "pyrope-server")]
    name: String,

    /// Idle timeout in seconds for regions created without one
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Interval between expiration sweeps, in milliseconds
    #[arg(long, default_value_t = 1000)]
    sweep_interval_ms: u64,

    /// Directory for daily-rotated JSON logs (console only when unset)
    #[arg(long, env = "PYROPE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console logging always, rotating JSON file when --log-dir is set.
    let filter = if cli.verbose {
        "pyrope_server=debug,pyrope_proto=debug,info"
    } else {
        "pyrope_server=info,warn"
    };

    use tracing_subscriber::prelude::*;
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(tracing_subscriber::EnvFilter::new(filter));

    let (file_layer, _guard) = match &cli.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "pyrope-server.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "pyrope_server=trace,pyrope_proto=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    let mut config = ServerConfig::new()
        .with_bind_address(cli.bind)
        .with_server_name(cli.name)
        .with_sweep_interval(Duration::from_millis(cli.sweep_interval_ms));
    if let Some(secs) = cli.idle_timeout_secs {
        config = config.with_default_idle_timeout(Duration::from_secs(secs));
    }

    let server = CacheServer::bind(config).await?;
    server.run().await?;
    Ok(())
}
