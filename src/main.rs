//! Canvas CLI - graph canvas with an automatically ordered dependency list

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = graph_canvas::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
