//! Free-text command grammar.
//!
//! A line is tokenized, parsed into a [`ParsedCommand`], built into a typed
//! [`Command`] and executed against the host:
//!
//! ```text
//! find [<parent>|.] [--component X] [--tag T] [--name "pat*"] ...
//! create <name> [--position x,y,z] [--parent P] [--components A,B,C]
//! modify <target...> [--add X] [--remove X] [--set key=value]
//! delete <target...> [--force] [--recursive]
//! get <target> [--select a,b] [--format full|exists_only]
//! help
//! ```
//!
//! Flags a verb does not recognise are ignored and echoed back under
//! `data.ignored_flags`.

mod builder;
mod execute;
mod parsed;
mod tokenizer;

use serde_json::Value;

use crate::dispatch::{BridgeError, HandlerContext};
use crate::wire::ResultEnvelope;

pub use self::builder::{Assignment, Command, DeleteCommand, FindCommand, GetCommand, ModifyCommand};
pub use self::execute::{USAGE, execute};
pub use self::parsed::{FlagSpec, ParsedCommand, VERBS};
pub use self::tokenizer::tokenize;

/// Parses, builds and executes one command line.
///
/// # Errors
///
/// Returns the parse, build or request-level execution failure.
pub fn run(context: &mut HandlerContext<'_>, line: &str) -> Result<ResultEnvelope, BridgeError> {
    let parsed = ParsedCommand::parse(line)?;
    let command = Command::build(&parsed)?;
    let envelope = execute(context, &command)?;
    if parsed.ignored().is_empty() {
        return Ok(envelope);
    }
    Ok(envelope.with_data("ignored_flags", Value::from(parsed.ignored().to_vec())))
}
