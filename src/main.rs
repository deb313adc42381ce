//! todo - a todo.txt task manager

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = todotxt_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
