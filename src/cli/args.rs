//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ephemera")]
#[command(author, version, about = "Track ephemeral containers and remove them once unused", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Preferences file (JSON)
    #[arg(long, global = true, env = "EPHEMERA_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file the engine persists to
    #[arg(long, global = true, env = "EPHEMERA_STATE")]
    pub state: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Replay a scenario file against an in-memory host
    Simulate {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },

    /// Show containers and statistics from the state file
    Status,

    /// Print the effective preferences
    Preferences,
}
