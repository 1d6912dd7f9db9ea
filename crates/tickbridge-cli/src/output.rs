//! Printing of bridge envelopes and the exit status they map to.

use std::io::Write;
use std::process::ExitCode;

use crate::AppError;
use crate::cli::OutputFormat;
use crate::request::BridgeReply;

/// Exit status when the bridge reported a partial result.
pub(crate) const PARTIAL_EXIT: u8 = 2;

/// Writes the reply's envelope to `stdout`. Empty bodies print nothing.
pub(crate) fn emit<W: Write>(
    reply: &BridgeReply,
    format: OutputFormat,
    stdout: &mut W,
) -> Result<(), AppError> {
    if reply.envelope.is_null() {
        return Ok(());
    }
    let written = match format {
        OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *stdout, &reply.envelope),
        OutputFormat::Compact => serde_json::to_writer(&mut *stdout, &reply.envelope),
    };
    written.map_err(|error| AppError::Emit(error.into()))?;
    stdout
        .write_all(b"\n")
        .and_then(|()| stdout.flush())
        .map_err(AppError::Emit)
}

/// `success` exits 0, `partial` exits [`PARTIAL_EXIT`] and anything else,
/// including a non-2xx HTTP status, exits 1.
pub(crate) fn exit_code(reply: &BridgeReply) -> ExitCode {
    if !(200..300).contains(&reply.status_code) {
        return ExitCode::FAILURE;
    }
    match reply.status() {
        Some("success") => ExitCode::SUCCESS,
        Some("partial") => ExitCode::from(PARTIAL_EXIT),
        _ => ExitCode::FAILURE,
    }
}
