//! JSON views of host nodes for read endpoints.

use serde_json::{Map, Value};

use crate::aggregate::BatchReport;
use crate::host::{Created, Host};
use crate::scene::{Node, NodeId, Scene};
use crate::wire::ResultEnvelope;

use super::read_options::{OutputFormat, ReadOptions};

/// Summary of one node: identity, activity, tag, layer, transform and
/// component names, filtered by the selection.
#[must_use]
pub fn summary(scene: &Scene, id: NodeId, options: &ReadOptions) -> Value {
    let Some(node) = scene.node(id) else {
        return Value::Null;
    };
    if options.format == OutputFormat::NamesOnly {
        return Value::from(node.name());
    }
    Value::Object(summary_fields(scene, node, options))
}

fn summary_fields(scene: &Scene, node: &Node, options: &ReadOptions) -> Map<String, Value> {
    let precision = options.precision;
    let mut fields = Map::new();
    let mut put = |key: &str, value: Value| {
        if options.selects(key) {
            fields.insert(key.to_owned(), value);
        }
    };
    put("id", Value::from(node.id().to_string()));
    put("name", Value::from(node.name()));
    put("path", Value::from(scene.path(node.id())));
    put("active", Value::from(node.active()));
    put(
        "activeInHierarchy",
        Value::from(scene.active_in_hierarchy(node.id())),
    );
    put("tag", Value::from(node.tag()));
    put("layer", Value::from(node.layer()));
    for member in ["position", "rotation", "scale"] {
        put(member, node.transform(member).to_json(precision));
    }
    put(
        "components",
        Value::from(
            node.components()
                .iter()
                .map(|component| component.type_name())
                .collect::<Vec<_>>(),
        ),
    );
    put("childCount", Value::from(node.children().len()));
    fields
}

/// Summary plus every component's fields.
#[must_use]
pub fn detail(scene: &Scene, id: NodeId, options: &ReadOptions) -> Value {
    let Some(node) = scene.node(id) else {
        return Value::Null;
    };
    if options.format == OutputFormat::NamesOnly {
        return Value::from(node.name());
    }
    let mut fields = summary_fields(scene, node, options);
    if options.selects("components") {
        let components = node
            .components()
            .iter()
            .map(|component| {
                let values: Map<String, Value> = component
                    .fields()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json(options.precision)))
                    .collect();
                let mut entry = Map::new();
                entry.insert("type".to_owned(), Value::from(component.type_name()));
                entry.insert("fields".to_owned(), Value::Object(values));
                Value::Object(entry)
            })
            .collect::<Vec<_>>();
        fields.insert("components".to_owned(), Value::from(components));
    }
    if options.selects("children") {
        let children = node
            .children()
            .iter()
            .filter_map(|child| scene.node(*child))
            .map(|child| Value::from(child.name()))
            .collect::<Vec<_>>();
        fields.insert("children".to_owned(), Value::from(children));
    }
    Value::Object(fields)
}

/// Envelope for a create: `success` with the new object, or `partial` when
/// some requested parts could not be applied.
#[must_use]
pub fn created_envelope(host: &Host, created: &Created, options: &ReadOptions) -> ResultEnvelope {
    let label = host.label(created.id);
    let mut report = BatchReport::new();
    report.applied(label.as_str());
    for (part, error) in &created.failures {
        report.failed(label.as_str(), format!("{part}: {error}"));
    }
    let mut data = Map::new();
    data.insert("id".to_owned(), Value::from(created.id.to_string()));
    data.insert(
        "object".to_owned(),
        summary(host.scene(), created.id, options),
    );
    report.into_envelope_with("create", data)
}

/// Nested tree below `roots`, cut at `options.depth` levels beneath them.
#[must_use]
pub fn hierarchy(
    scene: &Scene,
    roots: &[NodeId],
    include_inactive: bool,
    options: &ReadOptions,
) -> Vec<Value> {
    roots
        .iter()
        .copied()
        .filter(|id| include_inactive || scene.active_in_hierarchy(*id))
        .take(options.limit.unwrap_or(usize::MAX))
        .map(|id| tree(scene, id, 0, include_inactive, options))
        .collect()
}

fn tree(
    scene: &Scene,
    id: NodeId,
    level: usize,
    include_inactive: bool,
    options: &ReadOptions,
) -> Value {
    let Some(node) = scene.node(id) else {
        return Value::Null;
    };
    let children: Vec<NodeId> = node
        .children()
        .iter()
        .copied()
        .filter(|child| include_inactive || scene.active_in_hierarchy(*child))
        .collect();
    let descend = options.depth.is_none_or(|depth| level < depth);
    let nested: Vec<Value> = if descend {
        children
            .iter()
            .map(|child| tree(scene, *child, level + 1, include_inactive, options))
            .collect()
    } else {
        Vec::new()
    };

    if options.format == OutputFormat::NamesOnly {
        let mut entry = Map::new();
        entry.insert("name".to_owned(), Value::from(node.name()));
        if !nested.is_empty() {
            entry.insert("children".to_owned(), Value::from(nested));
        }
        return Value::Object(entry);
    }
    let mut fields = summary_fields(scene, node, options);
    fields.insert("children".to_owned(), Value::from(nested));
    Value::Object(fields)
}
