//! Command-line interface for chess_console.

use chess_console::{Color, PlayerKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chess Console - play chess in the terminal
#[derive(Parser, Debug)]
#[command(name = "chess_console")]
#[command(about = "Two-player chess sessions in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game; moves are read from stdin in SAN or long algebraic
    Play {
        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Color of the primary seat (white or black)
        #[arg(long)]
        color: Option<Color>,

        /// PGN file to resume from
        #[arg(long)]
        history: Option<PathBuf>,

        /// Kind of opponent (human or random)
        #[arg(long)]
        opponent: Option<PlayerKind>,

        /// Seed for computer players
        #[arg(long)]
        seed: Option<u64>,

        /// Print every console event as a JSON line
        #[arg(long)]
        events_json: bool,
    },

    /// Validate a PGN file and print the final position
    Check {
        /// PGN file to load
        file: PathBuf,
    },
}
