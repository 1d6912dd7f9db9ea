//! Editor play-mode transitions and the busy wait.

use std::thread;
use std::time::{Duration, Instant};

use crate::dispatch::body;
use crate::dispatch::context::HandlerContext;
use crate::dispatch::errors::BridgeError;
use crate::dispatch::router::RouteRequest;
use crate::scene::{EditorError, EditorState};
use crate::wire::ResultEnvelope;

fn transition<T>(
    context: &mut HandlerContext<'_>,
    action: &str,
    change: impl FnOnce(&mut EditorState) -> Result<T, EditorError>,
) -> Result<ResultEnvelope, BridgeError> {
    let editor = context.host.editor_mut();
    change(editor).map_err(|error| BridgeError::invalid_state(error.to_string()))?;
    Ok(ResultEnvelope::ok(format!("editor {action}"))
        .with_data("play_mode", editor.play_mode().to_string())
        .with_data("frame", editor.frame()))
}

pub(super) fn play(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    transition(context, "playing", EditorState::play)
}

pub(super) fn stop(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    transition(context, "stopped", EditorState::stop)
}

pub(super) fn pause(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    transition(context, "pause toggled", EditorState::pause)
}

pub(super) fn step(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    transition(context, "stepped", EditorState::step)
}

/// Busy-polls the host busy signal. This stalls the coordinator, and every
/// queued request behind it, until the signal clears or the budget runs out.
pub(super) fn wait(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let timeout = body::unsigned(&body, "timeoutMs")
        .map_or(context.settings.default_wait_timeout, Duration::from_millis);
    let busy = context.host.busy_signal();
    let started = Instant::now();
    while busy.is_busy() {
        if started.elapsed() >= timeout {
            return Err(BridgeError::WaitTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
        thread::sleep(context.settings.wait_poll_interval);
    }
    let waited = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(ResultEnvelope::ok("host is idle").with_data("waited_ms", waited))
}
