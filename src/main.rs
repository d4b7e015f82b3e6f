// ABOUTME: Main entry point for pinmatrix
//
// Binary: pinmatrix
// Usage: pinmatrix [--root DIR] [--format text|json] [--no-pull] [COMMAND]
// - No command: show the version matrix
// - status: per-repository sync status
// - pull: pull every repository
// - diff / commit / reset: single-repository operations
// - set / edit / values: change version pins and descriptor files
// - clone: bootstrap the root from the project list

#![allow(missing_docs)]

use anyhow::Result;
use clap::Parser;

use pinmatrix::cli;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    setup_panic_handler();

    let args = cli::Cli::parse();
    let result = cli::run(args).await;

    if let Err(ref e) = result {
        tracing::error!("Command failed: {:#}", e);
    }
    result
}

fn setup_logging() {
    use std::fs::OpenOptions;
    use std::path::PathBuf;
    use tracing_subscriber::prelude::*;

    let log_dir = dirs::home_dir()
        .map(|home| home.join(".pinmatrix").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".pinmatrix/logs"));

    let _ = std::fs::create_dir_all(&log_dir);

    // JSONL log file per run
    let log_file = log_dir.join(format!(
        "pinmatrix-{}.jsonl",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pinmatrix=info".into());

    match OpenOptions::new().create(true).append(true).open(&log_file) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(file)
                        .with_ansi(false),
                )
                .with(filter)
                .init();
        }
        Err(e) => {
            // No writable log directory: warnings and errors go to stderr
            eprintln!("Warning: cannot open log file {}: {}", log_file.display(), e);
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .with(tracing_subscriber::EnvFilter::new("pinmatrix=warn"))
                .init();
        }
    }
}

fn setup_panic_handler() {
    use tracing::error;

    std::panic::set_hook(Box::new(|panic_info| {
        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs in ~/.pinmatrix/logs for more details.");
    }));
}
