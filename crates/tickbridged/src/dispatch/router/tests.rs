//! Route matching tests.

use rstest::{fixture, rstest};
use serde_json::Value;

use super::*;
use crate::diagnostics::BridgeStats;
use crate::dispatch::BridgeSettings;
use crate::host::Host;
use crate::wire::Status;

struct World {
    host: Host,
    stats: BridgeStats,
    settings: BridgeSettings,
}

impl World {
    fn dispatch(&mut self, router: &Router, request: &HttpRequest) -> Result<ResultEnvelope, BridgeError> {
        let mut context = HandlerContext::new(&mut self.host, &mut self.stats, &self.settings);
        router.dispatch(&mut context, request)
    }

    fn send(&mut self, method: Method, target: &str, body: &str) -> ResultEnvelope {
        let router = Router::standard();
        let request = HttpRequest::new(method, target, body.as_bytes().to_vec());
        self.dispatch(&router, &request)
            .unwrap_or_else(|error| error.to_envelope())
    }
}

#[fixture]
fn world() -> World {
    World {
        host: Host::new(true),
        stats: BridgeStats::new(16),
        settings: BridgeSettings::default(),
    }
}

fn echo_argument(
    _context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    Ok(ResultEnvelope::ok("echo").with_data("argument", request.argument().unwrap_or_default()))
}

fn constant(
    _context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    Ok(ResultEnvelope::ok("constant"))
}

fn argument_of(envelope: &ResultEnvelope) -> Option<&str> {
    envelope.data().get("argument").and_then(Value::as_str)
}

#[rstest]
fn prefix_routes_decode_their_argument(mut world: World) {
    let mut router = Router::new();
    router.register(Method::Get, RoutePattern::prefix("/items"), echo_argument);
    let request = HttpRequest::new(Method::Get, "/items/Main%20Camera", Vec::new());
    let envelope = world.dispatch(&router, &request).expect("routed");
    assert_eq!(argument_of(&envelope), Some("Main Camera"));
}

#[rstest]
fn plus_signs_survive_in_path_arguments(mut world: World) {
    let mut router = Router::new();
    router.register(Method::Get, RoutePattern::prefix("/items"), echo_argument);
    let request = HttpRequest::new(Method::Get, "/items/a+b", Vec::new());
    let envelope = world.dispatch(&router, &request).expect("routed");
    assert_eq!(argument_of(&envelope), Some("a+b"));
}

#[rstest]
fn empty_remainder_does_not_match_prefix(mut world: World) {
    let mut router = Router::new();
    router.register(Method::Get, RoutePattern::prefix("/items"), echo_argument);
    let request = HttpRequest::new(Method::Get, "/items/", Vec::new());
    let error = world.dispatch(&router, &request).expect_err("no route");
    assert!(matches!(error, BridgeError::RouteNotFound { .. }));
}

#[rstest]
fn longest_prefix_wins(mut world: World) {
    let mut router = Router::new();
    router.register(Method::Get, RoutePattern::prefix("/a"), constant);
    router.register(Method::Get, RoutePattern::prefix("/a/b"), echo_argument);
    let request = HttpRequest::new(Method::Get, "/a/b/c", Vec::new());
    let envelope = world.dispatch(&router, &request).expect("routed");
    assert_eq!(argument_of(&envelope), Some("c"));
}

#[rstest]
fn exact_routes_shadow_prefixes(mut world: World) {
    let mut router = Router::new();
    router.register(Method::Get, RoutePattern::prefix("/a"), echo_argument);
    router.register(Method::Get, RoutePattern::exact("/a/fixed"), constant);
    let request = HttpRequest::new(Method::Get, "/a/fixed", Vec::new());
    let envelope = world.dispatch(&router, &request).expect("routed");
    assert_eq!(envelope.message(), "constant");
}

#[rstest]
#[case::wrong_method(Method::Post, "/unity/health")]
#[case::unknown_path(Method::Get, "/unity/teleport")]
fn unknown_routes_name_method_and_path(mut world: World, #[case] method: Method, #[case] path: &str) {
    let envelope = world.send(method, path, "");
    assert_eq!(envelope.status(), Status::Error);
    assert_eq!(envelope.message(), format!("no route for {method} {path}"));
}

#[rstest]
fn standard_table_serves_health(mut world: World) {
    let envelope = world.send(Method::Get, "/unity/health", "");
    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(envelope.data().get("healthy"), Some(&Value::Bool(true)));
}

#[rstest]
fn object_route_resolves_names_with_spaces(mut world: World) {
    let envelope = world.send(Method::Get, "/unity/scene/object/Main%20Camera", "");
    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(envelope.data()["object"]["tag"], "MainCamera");
}

#[rstest]
fn object_route_reports_existence_only(mut world: World) {
    let envelope = world.send(Method::Get, "/unity/scene/object/Nope?format=exists_only", "");
    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(envelope.data().get("exists"), Some(&Value::Bool(false)));
}

#[rstest]
fn delete_skips_missing_targets(mut world: World) {
    let envelope = world.send(
        Method::Post,
        "/unity/scene/delete",
        r#"{"objects": ["Main Camera", "Ghost"]}"#,
    );
    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(envelope.data()["skipped"][0], "Ghost");
    assert_eq!(envelope.data()["count"], 1);
}

#[rstest]
fn modify_of_missing_target_is_partial(mut world: World) {
    let envelope = world.send(
        Method::Post,
        "/unity/scene/modify",
        r#"{"objects": ["Main Camera", "Ghost"], "active": false}"#,
    );
    assert_eq!(envelope.status(), Status::Partial);
    assert_eq!(envelope.errors(), vec!["Ghost: object 'Ghost' not found"]);
}

#[rstest]
fn component_modify_reports_each_bad_key(mut world: World) {
    let body = r#"{
        "object": "Directional Light",
        "component": "Light",
        "properties": {"intensity": 3, "warp": 1, "range": "far"}
    }"#;
    let envelope = world.send(Method::Post, "/unity/component/modify", body);
    assert_eq!(envelope.status(), Status::Partial);
    assert_eq!(envelope.errors().len(), 2);
    assert_eq!(envelope.data()["affected_objects"][0], "Directional Light");
}

#[rstest]
fn light_preset_renames_fields(mut world: World) {
    let body = r#"{"object": "Directional Light", "lightType": "Spot", "intensity": 2.5}"#;
    let envelope = world.send(Method::Post, "/unity/light/modify", body);
    assert_eq!(envelope.status(), Status::Success);
    let light = world.host.resolve("Directional Light", false).expect("light");
    let field = world
        .host
        .scene()
        .node(light)
        .and_then(|node| node.component("Light"))
        .and_then(|light| light.field("type"))
        .map(ToString::to_string);
    assert_eq!(field.as_deref(), Some("Spot"));
}

#[rstest]
fn batch_limit_rejects_before_mutation(mut world: World) {
    world.settings.batch_limit = 2;
    let body = r#"{"objects": ["Main Camera", "Directional Light", "Main Camera"], "active": false}"#;
    let envelope = world.send(Method::Post, "/unity/scene/modify", body);
    assert_eq!(envelope.status(), Status::Error);
    assert_eq!(
        envelope.data().get("error_kind").and_then(Value::as_str),
        Some("batch_limit_exceeded")
    );
    let camera = world.host.resolve("Main Camera", false);
    assert!(camera.is_ok(), "camera must still be active");
}

fn delete_body(real: &str, ghosts: usize) -> String {
    let mut objects = vec![Value::from(real)];
    objects.extend((0..ghosts).map(|index| Value::from(format!("Ghost{index}"))));
    serde_json::json!({ "objects": objects }).to_string()
}

#[rstest]
fn default_batch_limit_admits_exactly_one_thousand_targets(mut world: World) {
    assert_eq!(world.settings.batch_limit, tickbridge_config::DEFAULT_BATCH_LIMIT);
    let before = world.host.scene().len();
    let envelope = world.send(Method::Post, "/unity/scene/delete", &delete_body("Main Camera", 999));
    assert_eq!(envelope.status(), Status::Success, "{envelope:?}");
    assert_eq!(envelope.data()["count"], 1);
    assert_eq!(world.host.scene().len(), before - 1);
}

#[rstest]
fn default_batch_limit_rejects_the_thousand_and_first_target(mut world: World) {
    let before = world.host.scene().len();
    let envelope = world.send(Method::Post, "/unity/scene/delete", &delete_body("Main Camera", 1000));
    assert_eq!(
        envelope.data().get("error_kind").and_then(Value::as_str),
        Some("batch_limit_exceeded")
    );
    assert_eq!(world.host.scene().len(), before);
    assert!(world.host.resolve("Main Camera", false).is_ok());
}

#[rstest]
fn component_modify_without_properties_changes_nothing(mut world: World) {
    let body = r#"{"object": "Directional Light", "component": "Light", "properties": {}}"#;
    let envelope = world.send(Method::Post, "/unity/component/modify", body);
    assert_eq!(envelope.status(), Status::Success, "{envelope:?}");
    assert_eq!(envelope.message(), "modify_component: no changes applied");
    assert_eq!(envelope.data()["skipped"][0], "Directional Light");
}

#[rstest]
fn find_and_modify_rejects_unknown_operations(mut world: World) {
    let body = r#"{"filter": {"type": "name", "value": "*"}, "operations": [{"type": "explode"}]}"#;
    let envelope = world.send(Method::Post, "/unity/scene/find_and_modify", body);
    assert_eq!(
        envelope.data().get("error_kind").and_then(Value::as_str),
        Some("unknown_operation")
    );
}

#[rstest]
fn editor_step_requires_pause(mut world: World) {
    let envelope = world.send(Method::Post, "/unity/editor/step", "");
    assert_eq!(envelope.status(), Status::Error);
    world.send(Method::Post, "/unity/editor/play", "");
    world.send(Method::Post, "/unity/editor/pause", "");
    let envelope = world.send(Method::Post, "/unity/editor/step", "");
    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(envelope.data()["frame"], 1);
}

#[rstest]
fn wait_times_out_while_busy(mut world: World) {
    world.settings.wait_poll_interval = std::time::Duration::from_millis(1);
    world.host.busy_signal().raise();
    let envelope = world.send(Method::Post, "/unity/editor/wait", r#"{"timeoutMs": 20}"#);
    assert_eq!(
        envelope.data().get("error_kind").and_then(Value::as_str),
        Some("wait_timeout")
    );
    world.host.busy_signal().clear();
    let envelope = world.send(Method::Post, "/unity/editor/wait", "");
    assert_eq!(envelope.status(), Status::Success);
}
