use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "canvasloop",
    about = "Input-driven render loop on a terminal canvas",
    version,
    arg_required_else_help = false
)]
pub struct Cli {
    /// Config file to use instead of the discovered one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the interactive canvas (default)
    Run,
    /// Drive the loop with a simulated clock and report the rolling FPS
    Bench {
        /// Number of frames to run
        #[arg(long, default_value_t = 300)]
        frames: u32,
        /// Simulated time between repaints, in milliseconds
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f64,
        /// Script a primary-button drag across the run
        #[arg(long)]
        drag: bool,
    },
    /// Write a default .canvasloop/config.toml in the current directory
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}
