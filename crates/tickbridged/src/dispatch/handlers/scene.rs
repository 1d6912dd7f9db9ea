//! Scene queries and object lifecycle.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::aggregate::{BatchReport, enforce_batch_limit};
use crate::dispatch::body;
use crate::dispatch::context::HandlerContext;
use crate::dispatch::errors::BridgeError;
use crate::dispatch::read_options::{OutputFormat, ReadOptions, parse_select};
use crate::dispatch::router::RouteRequest;
use crate::dispatch::view;
use crate::host::{CreateSpec, Host, Operation};
use crate::mutation::{PropertyValue, WireValue};
use crate::scene::{FilterCriteria, MatchType};
use crate::wire::ResultEnvelope;

use super::{modify_targets, query_flag};

pub(super) fn info(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let scene = context.host.scene();
    let roots: Vec<Value> = scene
        .roots()
        .into_iter()
        .filter_map(|id| scene.node(id))
        .map(|node| Value::from(node.name()))
        .collect();
    let active = scene
        .ids()
        .filter(|id| scene.active_in_hierarchy(*id))
        .count();
    let mut data = Map::new();
    data.insert("scene".into(), Value::from(scene.name()));
    data.insert("object_count".into(), Value::from(scene.len()));
    data.insert("active_count".into(), Value::from(active));
    data.insert("root_count".into(), Value::from(roots.len()));
    data.insert("root_objects".into(), Value::from(roots));
    Ok(ResultEnvelope::success(
        format!("scene '{}'", scene.name()),
        data,
    ))
}

pub(super) fn hierarchy(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let options = request.read_options();
    let include_inactive = query_flag(request, "includeInactive");
    let roots = match request.query().get("root") {
        Some(root) => vec![context.host.resolve(root, true)?],
        None => context.host.scene().roots(),
    };
    let tree = view::hierarchy(context.host.scene(), &roots, include_inactive, &options);
    let mut data = Map::new();
    data.insert("count".into(), Value::from(tree.len()));
    data.insert("objects".into(), Value::from(tree));
    Ok(ResultEnvelope::success("scene hierarchy", data))
}

pub(super) fn object(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let reference = request
        .argument()
        .ok_or_else(|| BridgeError::malformed("missing object reference"))?;
    let options = request.read_options();
    let found = context.host.scene().resolve(reference, true);
    if options.format == OutputFormat::ExistsOnly {
        return Ok(ResultEnvelope::ok(format!("lookup of '{reference}'"))
            .with_data("exists", found.is_some()));
    }
    let id = found.ok_or_else(|| BridgeError::not_found(reference))?;
    let detail = view::detail(context.host.scene(), id, &options);
    Ok(ResultEnvelope::ok(format!("object '{}'", context.host.label(id))).with_data("object", detail))
}

pub(super) fn create(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let spec = create_spec(&body)?;
    let created = context.host.create_object(&spec)?;
    Ok(view::created_envelope(
        context.host,
        &created,
        &ReadOptions::default(),
    ))
}

fn create_spec(body: &Map<String, Value>) -> Result<CreateSpec, BridgeError> {
    let vector = |key: &str| body.get(key).and_then(body::vector);
    Ok(CreateSpec {
        name: body::required_string(body, "name")?,
        parent: body::string(body, "parent"),
        position: vector("position"),
        rotation: vector("rotation"),
        scale: vector("scale"),
        components: body::string_list(body, "components"),
        active: body::boolean(body, "active"),
        tag: body::string(body, "tag"),
        layer: body::text(body, "layer"),
    })
}

pub(super) fn find(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let criteria = filter_criteria(context.host, &body)?;
    let options = ReadOptions {
        select: body::string(&body, "select").and_then(|text| parse_select(&text)),
        depth: None,
        format: body::string(&body, "format")
            .and_then(|text| OutputFormat::parse(&text))
            .unwrap_or_default(),
        limit: body::unsigned(&body, "limit").and_then(|limit| usize::try_from(limit).ok()),
        precision: body::unsigned(&body, "precision").and_then(|places| u32::try_from(places).ok()),
    };
    let scene = context.host.scene();
    let matches = scene.find(&criteria, context.host.tags());
    let objects: Vec<Value> = matches
        .iter()
        .take(options.limit.unwrap_or(usize::MAX))
        .map(|id| view::summary(scene, *id, &options))
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

/// Criteria from `parent`, `filter{type,value,component}`,
/// `includeInactive` and `recursive`.
fn filter_criteria(host: &Host, body: &Map<String, Value>) -> Result<FilterCriteria, BridgeError> {
    let target_parent = body::string(body, "parent")
        .map(|parent| host.resolve(&parent, true))
        .transpose()?;
    let filter = body.get("filter").and_then(Value::as_object);
    let match_type = filter
        .and_then(|filter| body::string(filter, "type"))
        .map(|kind| {
            MatchType::from_str(&kind)
                .map_err(|_| BridgeError::malformed(format!("unknown filter type '{kind}'")))
        })
        .transpose()?;
    let match_value = filter.and_then(|filter| body::text(filter, "value"));
    if match_type.is_some() && match_value.is_none() {
        return Err(BridgeError::malformed("filter type given without a value"));
    }
    Ok(FilterCriteria {
        target_parent,
        match_type,
        match_value,
        component_name: filter.and_then(|filter| body::string(filter, "component")),
        include_inactive: body::boolean(body, "includeInactive").unwrap_or(false),
        recursive: body::boolean(body, "recursive").unwrap_or(true),
        additional: Vec::new(),
    })
}

pub(super) fn find_and_modify(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let criteria = filter_criteria(context.host, &body)?;
    let operations = match body.get("operations") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(parse_operation)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(BridgeError::malformed("no operations")),
    };
    let matches = context.host.scene().find(&criteria, context.host.tags());
    enforce_batch_limit(matches.len(), context.settings.batch_limit)?;
    if matches.is_empty() {
        return Ok(
            ResultEnvelope::error("find_and_modify: no objects matched the filter", Vec::new())
                .with_data("count", 0),
        );
    }
    let mut report = BatchReport::new();
    for id in matches {
        let label = context.host.label(id);
        for (name, operation) in &operations {
            match context.host.apply(id, operation) {
                Ok(()) => report.applied(label.as_str()),
                Err(error) => report.failed(label.as_str(), format!("{name}: {error}")),
            }
        }
    }
    Ok(report.into_envelope("find_and_modify"))
}

/// Decodes one `operations[]` entry, keeping its type name for reporting.
fn parse_operation(value: &Value) -> Result<(String, Operation), BridgeError> {
    let Value::Object(entry) = value else {
        return Err(BridgeError::malformed("operations must be objects"));
    };
    let kind = body::required_string(entry, "type")?;
    let component = || body::required_string(entry, "component");
    let operation = match kind.to_ascii_lowercase().as_str() {
        "add_component" => Operation::AddMember {
            type_name: component()?,
        },
        "remove_component" => Operation::RemoveMember {
            type_name: component()?,
        },
        "set_active" => Operation::SetActive(
            body::boolean(entry, "value")
                .ok_or_else(|| BridgeError::malformed("set_active needs a boolean 'value'"))?,
        ),
        "activate" => Operation::SetActive(true),
        "deactivate" => Operation::SetActive(false),
        "delete" => Operation::Delete {
            recursive: body::boolean(entry, "recursive").unwrap_or(false),
        },
        "modify_property" | "set_property" => Operation::ModifyProperty {
            component: body::string(entry, "component"),
            property: serde_json::from_value::<PropertyValue>(value.clone())?,
        },
        _ => return Err(BridgeError::unknown_operation(kind)),
    };
    Ok((kind, operation))
}

pub(super) fn delete(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let targets = body::targets(&body)?;
    enforce_batch_limit(targets.len(), context.settings.batch_limit)?;
    let operation = Operation::Delete {
        recursive: body::boolean(&body, "recursive").unwrap_or(false),
    };
    let include_inactive = body::boolean(&body, "includeInactive").unwrap_or(false);
    let mut report = BatchReport::new();
    for target in targets {
        match context.host.scene().resolve(&target, include_inactive) {
            Some(id) => {
                let label = context.host.label(id);
                report.record_result(label, context.host.apply(id, &operation));
            }
            None => report.skipped(target, "not found"),
        }
    }
    Ok(report.into_envelope("delete"))
}

pub(super) fn modify(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let targets = body::targets(&body)?;
    let mut properties = Vec::new();
    for key in ["active", "name", "tag", "layer"] {
        let Some(value) = body.get(key) else {
            continue;
        };
        let value = WireValue::from_json(value)
            .ok_or_else(|| BridgeError::malformed(format!("'{key}' has no usable value")))?;
        let value = match value {
            WireValue::String(name) if key == "layer" => context
                .host
                .tags()
                .layer_index(&name)
                .map_or(WireValue::String(name), |index| WireValue::Int(i64::from(index))),
            other => other,
        };
        properties.push(PropertyValue::new(key, value));
    }
    if properties.is_empty() {
        return Err(BridgeError::malformed(
            "expected at least one of 'active', 'name', 'tag' or 'layer'",
        ));
    }
    modify_targets(context, &targets, None, &properties, "modify")
}
