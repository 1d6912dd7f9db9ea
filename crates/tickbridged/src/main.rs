//! Reference host for the tickbridge bridge.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match tickbridged::run_bridge() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "tickbridged: {error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}
