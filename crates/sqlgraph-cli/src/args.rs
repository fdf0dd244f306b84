//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqlgraph")]
#[command(author, version, about = "SQL dependency graph extraction tool")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract the table/CTE dependency graph from SQL files
    Extract {
        /// SQL files to analyze (supports glob patterns, `-` for stdin)
        files: Vec<PathBuf>,

        /// Path to a configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print SQL with comments masked out (for debugging offsets)
    Mask {
        /// SQL file to mask
        file: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable node and link listing
    #[default]
    Human,
    /// JSON output
    Json,
    /// Graphviz DOT output
    Dot,
}
