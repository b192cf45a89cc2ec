//! CLI argument definitions using clap
//!
//! Commands:
//! - colsel select [--config <path>]
//! - colsel rename [--config <path>]
//! - colsel explain [--config <path>] [--text]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// colsel - resolve column selections to ordered rename/projection mappings
#[derive(Parser, Debug)]
#[command(name = "colsel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a selection read from stdin and print the mapping
    Select {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Rename columns, keeping every column
    Rename {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show how a selection is resolved, term by term
    Explain {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print a human-readable report instead of JSON
        #[arg(long)]
        text: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
