mod cli;
mod commands;
mod config;
mod logger;
mod state;
mod terminal_host;
mod ui;

use clap::Parser;

use crate::cli::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let loaded = config::load(cli.config.as_deref())?;
            commands::run_cmd::run(loaded).await
        }
        Command::Bench {
            frames,
            frame_ms,
            drag,
        } => {
            logger::init_stderr();
            let loaded = config::load(cli.config.as_deref())?;
            log::info!("config: {}", loaded.source);
            commands::bench_cmd::run(loaded.config, frames, frame_ms, drag)
        }
        Command::Init { force } => {
            logger::init_stderr();
            commands::init_cmd::run(force)
        }
    }
}
