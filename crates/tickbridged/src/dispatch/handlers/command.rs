//! Free-text command route.

use serde_json::Value;

use crate::command;
use crate::dispatch::context::HandlerContext;
use crate::dispatch::errors::BridgeError;
use crate::dispatch::router::RouteRequest;
use crate::wire::ResultEnvelope;

/// `POST /unity/command` with `{"command": "..."}` or the line as a raw text
/// body.
pub(super) fn run_posted(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let text = String::from_utf8_lossy(request.body());
    let line = if text.trim_start().starts_with('{') {
        let body = request.json()?;
        match body.get("command") {
            Some(Value::String(line)) => line.clone(),
            _ => return Err(BridgeError::malformed("missing 'command'")),
        }
    } else {
        text.into_owned()
    };
    command::run(context, &line)
}

/// `GET /unity/command?q=...`.
pub(super) fn run_query(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let line = request
        .query()
        .get("q")
        .ok_or_else(|| BridgeError::malformed("missing 'q'"))?;
    command::run(context, line)
}
