//! CLI module for colsel
//!
//! Provides command-line interface for:
//! - select: Resolve a selection to an output mapping
//! - rename: Rename columns, keeping all of them
//! - explain: Report how a selection resolves

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    explain, handle_explain, handle_rename, handle_select, rename, run, run_command, select,
    SelectionRequest,
};
pub use errors::{CliError, CliResult};
pub use io::{read_request, read_request_from, write_error, write_response};
