//! quill CLI binary entry point
//!
//! This is a thin wrapper around the library's `run_cli()`, mapping
//! failures to process exit codes.

use std::process::ExitCode;

use quill_cli::{exit_code, run_cli};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
