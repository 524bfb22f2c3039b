mod browse;
mod config;
mod diff;
mod edit_cmd;
mod editor;
mod error;
mod review;
mod scratch;
mod show_cmd;
mod signals;
mod store;
mod theme;
mod ui;
mod wrap;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Command};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.global)?;

    match cli.command {
        Command::Show(cmd) => show_cmd::run(&config, cmd),
        Command::Edit(cmd) => edit_cmd::run(&config, cmd),
    }
}

/// Logs go to stderr; `KV_LOG` takes an `EnvFilter` directive (default: errors only).
fn init_logging() {
    let filter = EnvFilter::try_from_env("KV_LOG").unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
