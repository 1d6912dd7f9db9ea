//! CLI argument definitions for the tickbridge client.

use clap::{Parser, Subcommand, ValueEnum};

/// Rendering of the bridge's result envelope.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON.
    #[default]
    Pretty,
    /// The envelope on a single line.
    Compact,
}

/// Command-line client for a running tickbridge bridge.
#[derive(Parser, Debug)]
#[command(name = "tickbridge", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Controls how the envelope is printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub(crate) output: OutputFormat,
    /// The request to send.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Requests the client can send.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Runs a free-text command (for example `create Box --position 0,1,0`).
    Command {
        /// The command line. A single argument is sent verbatim; several are
        /// joined, quoting any that contain whitespace.
        #[arg(
            value_name = "LINE",
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        line: Vec<String>,
    },
    /// Checks that the bridge answers.
    Health,
    /// Prints request counters and editor state.
    Status,
    /// Prints the recent command log.
    Log {
        /// Clears the counters and the log instead.
        #[arg(long)]
        reset: bool,
    },
    /// Sends a raw GET (for example `get scene/hierarchy?depth=1`).
    Get {
        /// Route below `/unity`, or an absolute path.
        path: String,
    },
    /// Sends a raw POST with a JSON body.
    Post {
        /// Route below `/unity`, or an absolute path.
        path: String,
        /// Request body; `-` reads it from standard input.
        #[arg(long)]
        body: Option<String>,
    },
}
