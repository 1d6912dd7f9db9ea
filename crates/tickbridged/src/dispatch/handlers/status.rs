//! Liveness, counters and the command log.

use serde_json::{Map, Value};

use crate::dispatch::context::HandlerContext;
use crate::dispatch::errors::BridgeError;
use crate::dispatch::router::RouteRequest;
use crate::wire::ResultEnvelope;

pub(super) fn health(
    _context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    Ok(ResultEnvelope::ok("bridge is healthy").with_data("healthy", true))
}

pub(super) fn status(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let snapshot = context.stats.snapshot();
    let editor = context.host.editor();
    let mut data = Map::new();
    data.insert("processed".into(), Value::from(snapshot.processed));
    data.insert("succeeded".into(), Value::from(snapshot.succeeded));
    data.insert("partial".into(), Value::from(snapshot.partial));
    data.insert("failed".into(), Value::from(snapshot.failed));
    data.insert("faults".into(), Value::from(snapshot.faults));
    data.insert("uptime_seconds".into(), Value::from(snapshot.uptime_seconds));
    data.insert("play_mode".into(), Value::from(editor.play_mode().to_string()));
    data.insert("frame".into(), Value::from(editor.frame()));
    data.insert("busy".into(), Value::from(context.host.busy_signal().is_busy()));
    data.insert("scene".into(), Value::from(context.host.scene().name()));
    data.insert("object_count".into(), Value::from(context.host.scene().len()));
    Ok(ResultEnvelope::success("bridge status", data))
}

pub(super) fn log(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let log = context.stats.log();
    let limit = request.read_options().limit.unwrap_or(log.len());
    let entries = serde_json::to_value(log.recent(limit))?;
    let mut data = Map::new();
    data.insert("count".into(), Value::from(entries.as_array().map_or(0, Vec::len)));
    data.insert("capacity".into(), Value::from(log.capacity()));
    data.insert("entries".into(), entries);
    Ok(ResultEnvelope::success("command log", data))
}

pub(super) fn reset_log(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    context.stats.reset();
    Ok(ResultEnvelope::ok("counters and command log reset"))
}
