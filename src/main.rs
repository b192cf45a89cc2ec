//! colsel CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Errors that end
//! the process are printed to stderr with a non-zero exit code.

use colsel::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
