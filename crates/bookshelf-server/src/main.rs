//! Bookshelf server
//!
//! Serves the book-tracking API over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookshelf_core::Config;
use bookshelf_server::{router, AppState};

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(about = "Bookshelf - personal book tracking API")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/bookshelf/config.toml)
    #[arg(short, long, env = "BOOKSHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory for the local copy of books.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config_path = cli.config.clone().unwrap_or_else(Config::config_file_path);
    let mut config = Config::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let state = AppState::from_config(&config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Bookshelf listening on http://{}", listener.local_addr()?);
    info!("Allowed origin: {}", config.allowed_origin);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Bookshelf stopped");
    Ok(())
}

fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("bookshelf_core={},bookshelf_server={}", level, level))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
