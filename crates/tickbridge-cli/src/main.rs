//! CLI entrypoint for the tickbridge controller client.
//!
//! The binary delegates to [`tickbridge_cli::run`], which loads configuration,
//! parses the subcommand, finds the running bridge and prints its envelope.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    tickbridge_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
