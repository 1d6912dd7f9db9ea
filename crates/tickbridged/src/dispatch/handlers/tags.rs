//! Tag manager and layer assignment.

use serde_json::{Map, Value};

use crate::dispatch::body;
use crate::dispatch::context::HandlerContext;
use crate::dispatch::errors::BridgeError;
use crate::dispatch::router::RouteRequest;
use crate::mutation::{PropertyValue, WireValue};
use crate::scene::LAYER_COUNT;
use crate::wire::ResultEnvelope;

use super::modify_targets;

fn tag_name(body: &Map<String, Value>) -> Result<String, BridgeError> {
    body::required_string(body, "tag").or_else(|_| body::required_string(body, "tagName"))
}

pub(super) fn create(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let tag = tag_name(&body)?;
    let created = context.host.tags_mut().create(&tag);
    let message = if created {
        format!("tag '{tag}' created")
    } else {
        format!("tag '{tag}' already exists")
    };
    Ok(ResultEnvelope::ok(message)
        .with_data("tag", tag)
        .with_data("created", created))
}

pub(super) fn assign(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let targets = body::targets(&body)?;
    let tag = tag_name(&body)?;
    if !context.host.tags().contains(&tag) {
        return Err(BridgeError::invalid_state(format!(
            "tag '{tag}' is not defined; create it first"
        )));
    }
    let property = PropertyValue::new("tag", WireValue::String(tag));
    modify_targets(context, &targets, None, &[property], "assign_tag")
}

pub(super) fn list(
    context: &mut HandlerContext<'_>,
    _request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let tags = context.host.tags();
    let layers: Vec<Value> = (0..LAYER_COUNT)
        .filter_map(|index| u8::try_from(index).ok())
        .filter_map(|index| {
            tags.layer_name(index).map(|name| {
                let mut layer = Map::new();
                layer.insert("index".into(), Value::from(index));
                layer.insert("name".into(), Value::from(name));
                Value::Object(layer)
            })
        })
        .collect();
    let mut data = Map::new();
    data.insert("tags".into(), Value::from(tags.tags().to_vec()));
    data.insert("layers".into(), Value::from(layers));
    Ok(ResultEnvelope::success(
        format!("{} tag(s) defined", tags.tags().len()),
        data,
    ))
}

pub(super) fn assign_layer(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let targets = body::targets(&body)?;
    let reference = body::text(&body, "layer")
        .or_else(|| body::text(&body, "layerName"))
        .ok_or_else(|| BridgeError::malformed("missing 'layer'"))?;
    let index = context
        .host
        .tags()
        .layer_index(&reference)
        .ok_or_else(|| BridgeError::invalid_state(format!("layer '{reference}' is not defined")))?;
    let property = PropertyValue::new("layer", WireValue::Int(i64::from(index)));
    modify_targets(context, &targets, None, &[property], "assign_layer")
}
