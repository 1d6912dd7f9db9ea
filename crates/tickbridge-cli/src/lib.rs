//! Command-line client for the tickbridge bridge.
//!
//! The runtime splits leading configuration flags from the client's own
//! arguments, loads the shared [`tickbridge_config::Config`], builds one HTTP
//! request from the subcommand, sends it to the first bridge candidate that
//! accepts a connection and prints the result envelope. Configuration loading
//! and the IO streams can be substituted in tests.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod config;
mod errors;
mod output;
mod request;
mod transport;

pub use cli::OutputFormat;
use cli::Cli;
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use config::{command_arguments, split_config_arguments};
pub(crate) use errors::AppError;
use request::{BridgeReply, BridgeRequest};
use transport::discover;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, R: Read, W: Write, E: Write> {
    pub(crate) stdin: &'a mut R,
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, R: Read, W: Write, E: Write> IoStreams<'a, R, W, E> {
    pub(crate) fn new(stdin: &'a mut R, stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }
}

struct CliRunner<'a, 'io, R: Read, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'io, R, W, E>,
    loader: &'a L,
}

impl<R, W, E, L> CliRunner<'_, '_, R, W, E, L>
where
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let cli = match Cli::try_parse_from(command_arguments(&args, &split)) {
            Ok(cli) => cli,
            Err(error) => return self.report_usage(&error),
        };

        let result = self.loader.load(&split.config_arguments).and_then(|config| {
            let request = BridgeRequest::from_command(cli.command, &mut *self.io.stdin)?;
            let mut connection = discover(&config.socket_candidates())?;
            request.write_http(&mut connection)?;
            let reply = BridgeReply::read_from(&mut connection)
                .map_err(|error| connection.explain_read_error(error))?;
            output::emit(&reply, cli.output, &mut *self.io.stdout)?;
            Ok(output::exit_code(&reply))
        });

        match result {
            Ok(exit_code) => exit_code,
            Err(error) => {
                self.write_stderr(&error.to_string());
                ExitCode::FAILURE
            }
        }
    }

    /// Help and version requests go to stdout and succeed; genuine usage
    /// errors go to stderr.
    fn report_usage(&mut self, error: &clap::Error) -> ExitCode {
        if error.use_stderr() {
            self.write_stderr(&error.to_string());
            return ExitCode::FAILURE;
        }
        if write!(self.io.stdout, "{error}").is_err() {
            return ExitCode::FAILURE;
        }
        ExitCode::SUCCESS
    }

    fn write_stderr(&mut self, message: &str) {
        // Nothing is left to report to when stderr itself fails.
        drop(writeln!(self.io.stderr, "{}", message.trim_end()));
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdin, stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, R, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner { io, loader }.run(args)
}

#[cfg(test)]
mod tests;
