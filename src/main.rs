//! Clipchain - Clipboard transform pipelines, scripted in Rhai

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = clipchain::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
