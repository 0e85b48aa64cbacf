//! Stockroom - a command-line client for the inventory backend.
//!
//! Logs in against the backend's session API, keeps the session cookie
//! between runs and navigates the same guarded routes as the web front end.

mod app;
mod cli;
mod keychain;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;

/// Directory for rolling log files; unset disables file logging
const LOG_DIR_ENV: &str = "STOCKROOM_LOG_DIR";

const LOG_FILE_PREFIX: &str = "stockroom.log";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let cli = Cli::parse();
    info!(command = ?cli.command, "Stockroom starting");

    let mut app = App::new()?;
    app.run(cli.command).await
}
