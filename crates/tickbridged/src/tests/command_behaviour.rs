//! Behavioural tests for the free-text command grammar over the wire.

use std::cell::RefCell;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rstest::fixture;
use rstest_bdd_macros::{scenario, then, when};

use super::support::{self, BridgeClient, TestWorld};

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[when("the controller runs the command \"{line}\"")]
fn when_controller_runs(world: &RefCell<TestWorld>, line: String) {
    let raw = BridgeClient::post("/unity/command", line.trim_matches('"'));
    world.borrow_mut().send(raw);
}

#[when("the controller queries the command \"{line}\"")]
fn when_controller_queries(world: &RefCell<TestWorld>, line: String) {
    let query = utf8_percent_encode(line.trim_matches('"'), NON_ALPHANUMERIC);
    world
        .borrow_mut()
        .send(BridgeClient::get(&format!("/unity/command?q={query}")));
}

#[then("the reply lists the object \"{name}\"")]
fn then_reply_lists(world: &RefCell<TestWorld>, name: String) {
    let world = world.borrow();
    let objects = world.reply().body["data"]["objects"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert!(
        objects.iter().any(|object| object == name.trim_matches('"')),
        "{objects:?}"
    );
}

#[then("the reply object is named \"{name}\"")]
fn then_reply_object_named(world: &RefCell<TestWorld>, name: String) {
    let world = world.borrow();
    assert_eq!(
        world.reply().body["data"]["object"]["name"],
        name.trim_matches('"')
    );
}

#[then("the object \"{name}\" sits at the scene root")]
fn then_object_at_root(world: &RefCell<TestWorld>, name: String) {
    let world = world.borrow();
    let host = world.bridge().coordinator().host();
    let id = host
        .resolve(name.trim_matches('"'), true)
        .expect("object should survive");
    let parent = host.scene().node(id).and_then(|node| node.parent());
    assert_eq!(parent, None);
}

#[scenario(
    path = "tests/features/command_grammar.feature",
    name = "Created objects can be found by name"
)]
fn created_objects_are_found(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_grammar.feature",
    name = "Unknown components make creation partial"
)]
fn unknown_components_are_partial(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_grammar.feature",
    name = "Deleting a parent keeps its children"
)]
fn deleting_parent_keeps_children(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_grammar.feature",
    name = "Unknown verbs point to the help command"
)]
fn unknown_verbs_point_to_help(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/command_grammar.feature",
    name = "Commands can be passed in the query string"
)]
fn commands_in_query_string(world: RefCell<TestWorld>) {
    drop(world);
}
