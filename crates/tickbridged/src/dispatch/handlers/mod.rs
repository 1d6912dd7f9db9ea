//! Standard `/unity` handlers.

mod command;
mod component;
mod editor;
mod presets;
mod scene;
mod status;
mod tags;

use crate::aggregate::{BatchReport, enforce_batch_limit};
use crate::host::Operation;
use crate::mutation::PropertyValue;
use crate::wire::{Method, ResultEnvelope};

use super::context::HandlerContext;
use super::errors::BridgeError;
use super::router::{BASE_PATH, RoutePattern, RouteRequest, Router};

type HandlerFn =
    fn(&mut HandlerContext<'_>, &RouteRequest<'_>) -> Result<ResultEnvelope, BridgeError>;

const EXACT_ROUTES: &[(Method, &str, HandlerFn)] = &[
    (Method::Get, "health", status::health),
    (Method::Get, "status", status::status),
    (Method::Get, "log", status::log),
    (Method::Post, "log/reset", status::reset_log),
    (Method::Get, "scene/info", scene::info),
    (Method::Get, "scene/hierarchy", scene::hierarchy),
    (Method::Post, "scene/create", scene::create),
    (Method::Post, "scene/find", scene::find),
    (Method::Post, "scene/find_and_modify", scene::find_and_modify),
    (Method::Post, "scene/delete", scene::delete),
    (Method::Post, "scene/modify", scene::modify),
    (Method::Post, "component/add", component::add),
    (Method::Post, "component/remove", component::remove),
    (Method::Post, "component/modify", component::modify),
    (Method::Post, "tag/create", tags::create),
    (Method::Post, "tag/assign", tags::assign),
    (Method::Get, "tag/list", tags::list),
    (Method::Post, "layer/assign", tags::assign_layer),
    (Method::Post, "editor/play", editor::play),
    (Method::Post, "editor/stop", editor::stop),
    (Method::Post, "editor/pause", editor::pause),
    (Method::Post, "editor/step", editor::step),
    (Method::Post, "editor/wait", editor::wait),
    (Method::Post, "command", command::run_posted),
    (Method::Get, "command", command::run_query),
];

fn route(path: &str) -> String {
    format!("{BASE_PATH}/{path}")
}

/// Boolean query flag: `true`, `1` or `yes`.
fn query_flag(request: &RouteRequest<'_>, key: &str) -> bool {
    request
        .query()
        .get(key)
        .is_some_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Applies `properties` to the node (`component: None`) or one component of
/// every target, one report item per `(target, key)`.
fn modify_targets(
    context: &mut HandlerContext<'_>,
    targets: &[String],
    component: Option<&str>,
    properties: &[PropertyValue],
    action: &str,
) -> Result<ResultEnvelope, BridgeError> {
    enforce_batch_limit(targets.len(), context.settings.batch_limit)?;
    let mut report = BatchReport::new();
    for target in targets {
        let id = match context.host.resolve(target, true) {
            Ok(id) => id,
            Err(error) => {
                report.failed(target.as_str(), error);
                continue;
            }
        };
        let label = context.host.label(id);
        if properties.is_empty() {
            report.skipped(label, "no usable change");
            continue;
        }
        match context.host.modify_properties(id, component, properties) {
            Ok(outcomes) => {
                for outcome in outcomes {
                    match outcome.result {
                        Ok(_) => report.applied(label.as_str()),
                        Err(error) => report.failed(label.as_str(), BridgeError::from(error)),
                    }
                }
            }
            Err(error) => report.failed(label.as_str(), error),
        }
    }
    Ok(report.into_envelope(action))
}

/// Applies one operation to every target.
fn apply_to_targets(
    context: &mut HandlerContext<'_>,
    targets: &[String],
    operation: &Operation,
    action: &str,
) -> Result<ResultEnvelope, BridgeError> {
    enforce_batch_limit(targets.len(), context.settings.batch_limit)?;
    let mut report = BatchReport::new();
    for target in targets {
        match context.host.resolve(target, true) {
            Ok(id) => {
                let label = context.host.label(id);
                report.record_result(label, context.host.apply(id, operation));
            }
            Err(error) => report.failed(target.as_str(), error),
        }
    }
    Ok(report.into_envelope(action))
}

/// Fills `router` with every standard route.
pub(super) fn register_standard(router: &mut Router) {
    for (method, path, handler) in EXACT_ROUTES {
        router.register(*method, RoutePattern::exact(route(path)), *handler);
    }
    router.register(
        Method::Get,
        RoutePattern::prefix(route("scene/object")),
        scene::object as HandlerFn,
    );
    for preset in presets::PRESETS {
        router.register(
            Method::Post,
            RoutePattern::exact(route(preset.route)),
            presets::PresetHandler::new(preset),
        );
    }
}
