//! Runs typed commands against the host.

use serde_json::{Map, Value};

use crate::aggregate::{BatchReport, enforce_batch_limit};
use crate::dispatch::view;
use crate::dispatch::{BridgeError, HandlerContext, OutputFormat, ReadOptions};
use crate::host::{Host, Operation};
use crate::mutation::{PropertyValue, Vector3, WireValue};
use crate::scene::{FilterCriteria, MatchType, NodeId, TRANSFORM};
use crate::wire::ResultEnvelope;

use super::builder::{
    Assignment, Command, DeleteCommand, FindCommand, GetCommand, ModifyCommand,
};

/// Grammar summary returned by `help`.
pub const USAGE: &[&str] = &[
    "find [<parent>|.] [--component X] [--tag T] [--name \"pat*\"] [--layer N] [--parent P] \
     [--limit N] [--format names_only|full] [--select a,b] [--precision N] [--inactive] \
     [--no-recursive] [--names-only]",
    "create <name> [--position x,y,z] [--rotation x,y,z] [--scale x,y,z] [--parent P] \
     [--components A,B,C] [--tag T] [--layer L]",
    "modify <target...> [--add X] [--remove X] [--set key=value] [--set Component.member=value] \
     [--position x,y,z] [--rotation x,y,z] [--scale x,y,z]",
    "delete <target...> [--force] [--recursive]",
    "get <target> [--select a,b] [--format full|exists_only] [--precision N]",
    "help",
];

/// Executes `command`.
///
/// # Errors
///
/// Request-level failures: a missing search root, a missing `get` target,
/// an oversized batch or an invalid `create`.
pub fn execute(
    context: &mut HandlerContext<'_>,
    command: &Command,
) -> Result<ResultEnvelope, BridgeError> {
    match command {
        Command::Find(find) => run_find(context.host, find),
        Command::Create(spec) => {
            let created = context.host.create_object(spec)?;
            Ok(view::created_envelope(
                context.host,
                &created,
                &ReadOptions::default(),
            ))
        }
        Command::Modify(modify) => {
            enforce_batch_limit(modify.targets.len(), context.settings.batch_limit)?;
            Ok(run_modify(context.host, modify))
        }
        Command::Delete(delete) => {
            enforce_batch_limit(delete.targets.len(), context.settings.batch_limit)?;
            Ok(run_delete(context.host, delete))
        }
        Command::Get(get) => run_get(context.host, get),
        Command::Help => Ok(ResultEnvelope::ok("available commands").with_data("commands", USAGE)),
    }
}

fn run_find(host: &Host, find: &FindCommand) -> Result<ResultEnvelope, BridgeError> {
    let target_parent = find
        .root
        .as_deref()
        .map(|root| host.resolve(root, true))
        .transpose()?;
    let additional = [
        (MatchType::Name, &find.name),
        (MatchType::Tag, &find.tag),
        (MatchType::Layer, &find.layer),
    ]
    .into_iter()
    .filter_map(|(kind, value)| value.clone().map(|value| (kind, value)))
    .collect();
    let criteria = FilterCriteria {
        target_parent,
        component_name: find.component.clone(),
        include_inactive: find.include_inactive,
        recursive: find.recursive,
        additional,
        ..FilterCriteria::default()
    };
    let scene = host.scene();
    let matches = scene.find(&criteria, host.tags());
    let objects: Vec<Value> = matches
        .iter()
        .take(find.options.limit.unwrap_or(usize::MAX))
        .map(|id| view::summary(scene, *id, &find.options))
        .collect();
    let mut data = Map::new();
    data.insert("total".into(), Value::from(matches.len()));
    data.insert("count".into(), Value::from(objects.len()));
    data.insert("objects".into(), Value::from(objects));
    Ok(ResultEnvelope::success(
        format!("found {} object(s)", matches.len()),
        data,
    ))
}

fn vector_property(member: &str, value: Vector3) -> Operation {
    Operation::ModifyProperty {
        component: Some(TRANSFORM.to_owned()),
        property: PropertyValue::new(member, WireValue::String(value.to_string())),
    }
}

/// Every change of a `modify`, paired with the text used in failure reasons.
fn modify_operations(modify: &ModifyCommand) -> Vec<(String, Result<Operation, String>)> {
    let mut operations = Vec::new();
    for type_name in &modify.add {
        let operation = Operation::AddMember {
            type_name: type_name.clone(),
        };
        operations.push((format!("add {type_name}"), Ok(operation)));
    }
    for type_name in &modify.remove {
        let operation = Operation::RemoveMember {
            type_name: type_name.clone(),
        };
        operations.push((format!("remove {type_name}"), Ok(operation)));
    }
    for assignment in &modify.set {
        match assignment {
            Assignment::Property {
                component,
                property,
            } => {
                let label = match component {
                    Some(component) => format!("set {component}.{}", property.key()),
                    None => format!("set {}", property.key()),
                };
                let operation = Operation::ModifyProperty {
                    component: component.clone(),
                    property: property.clone(),
                };
                operations.push((label, Ok(operation)));
            }
            Assignment::Invalid(text) => operations.push((
                format!("set {text}"),
                Err("expected key=value".to_owned()),
            )),
        }
    }
    for (member, value) in [
        ("position", modify.position),
        ("rotation", modify.rotation),
        ("scale", modify.scale),
    ] {
        if let Some(value) = value {
            operations.push((format!("set {member}"), Ok(vector_property(member, value))));
        }
    }
    operations
}

fn run_modify(host: &mut Host, modify: &ModifyCommand) -> ResultEnvelope {
    let operations = modify_operations(modify);
    let mut report = BatchReport::new();
    for target in &modify.targets {
        let id = match host.resolve(target, true) {
            Ok(id) => id,
            Err(error) => {
                report.failed(target.as_str(), error);
                continue;
            }
        };
        let label = host.label(id);
        if operations.is_empty() {
            report.skipped(label, "no usable change");
            continue;
        }
        for (what, operation) in &operations {
            match operation {
                Ok(operation) => match host.apply(id, operation) {
                    Ok(()) => report.applied(label.as_str()),
                    Err(error) => report.failed(label.as_str(), format!("{what}: {error}")),
                },
                Err(reason) => report.failed(label.as_str(), format!("{what}: {reason}")),
            }
        }
    }
    report.into_envelope("modify")
}

fn run_delete(host: &mut Host, delete: &DeleteCommand) -> ResultEnvelope {
    let operation = Operation::Delete {
        recursive: delete.recursive,
    };
    let mut report = BatchReport::new();
    for target in &delete.targets {
        match host.scene().resolve(target, delete.force) {
            Some(id) => {
                let label = host.label(id);
                report.record_result(label, host.apply(id, &operation));
            }
            None => report.skipped(target.as_str(), "not found"),
        }
    }
    report.into_envelope("delete")
}

fn run_get(host: &Host, get: &GetCommand) -> Result<ResultEnvelope, BridgeError> {
    let found: Option<NodeId> = host.scene().resolve(&get.target, true);
    if get.options.format == OutputFormat::ExistsOnly {
        return Ok(ResultEnvelope::ok(format!("lookup of '{}'", get.target))
            .with_data("exists", found.is_some()));
    }
    let id = found.ok_or_else(|| BridgeError::not_found(get.target.as_str()))?;
    Ok(ResultEnvelope::ok(format!("object '{}'", host.label(id)))
        .with_data("object", view::detail(host.scene(), id, &get.options)))
}
