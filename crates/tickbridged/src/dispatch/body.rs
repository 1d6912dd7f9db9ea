//! JSON request body helpers shared by the handlers.

use serde_json::{Map, Value};

use crate::mutation::{PropertyValue, Vector3, WireValue};

use super::errors::BridgeError;

/// Parses the body as a JSON object; an empty body is an empty object.
pub(crate) fn parse_object(body: &[u8]) -> Result<Map<String, Value>, BridgeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(BridgeError::malformed(format!(
            "expected a JSON object body, got {}",
            json_type(&other)
        ))),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Target list from `objects`, `object` or `objectName`.
pub(crate) fn targets(body: &Map<String, Value>) -> Result<Vec<String>, BridgeError> {
    let targets = if let Some(objects) = body.get("objects") {
        let Value::Array(items) = objects else {
            return Err(BridgeError::malformed("'objects' must be an array"));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(name) => Ok(name.clone()),
                Value::Number(number) => Ok(format!("#{number}")),
                _ => Err(BridgeError::malformed("'objects' entries must be names")),
            })
            .collect::<Result<Vec<_>, _>>()?
    } else if let Some(name) = string(body, "object").or_else(|| string(body, "objectName")) {
        vec![name]
    } else {
        return Err(BridgeError::malformed("no object list"));
    };
    if targets.is_empty() {
        return Err(BridgeError::malformed("object list is empty"));
    }
    Ok(targets)
}

/// String field.
pub(crate) fn string(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Scalar field rendered as text (strings, numbers and booleans).
pub(crate) fn text(body: &Map<String, Value>, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Required string field.
pub(crate) fn required_string(body: &Map<String, Value>, key: &str) -> Result<String, BridgeError> {
    string(body, key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| BridgeError::malformed(format!("missing '{key}'")))
}

/// Boolean field.
pub(crate) fn boolean(body: &Map<String, Value>, key: &str) -> Option<bool> {
    body.get(key).and_then(Value::as_bool)
}

/// Non-negative integer field.
pub(crate) fn unsigned(body: &Map<String, Value>, key: &str) -> Option<u64> {
    body.get(key).and_then(Value::as_u64)
}

/// String list from an array of strings or a comma-separated string.
pub(crate) fn string_list(body: &Map<String, Value>, key: &str) -> Vec<String> {
    match body.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

/// Vector from `{x,y,z}`, `[x,y,z]` or `"x,y,z"`. Anything else is `None`.
pub(crate) fn vector(value: &Value) -> Option<Vector3> {
    match value {
        Value::Object(map) => Some(Vector3::new(
            map.get("x")?.as_f64()?,
            map.get("y")?.as_f64()?,
            map.get("z")?.as_f64()?,
        )),
        Value::Array(items) => match items.as_slice() {
            [x, y, z] => Some(Vector3::new(x.as_f64()?, y.as_f64()?, z.as_f64()?)),
            _ => None,
        },
        Value::String(text) => Vector3::parse(text),
        _ => None,
    }
}

/// Property pairs from `propertyValues` (typed wire form) or `properties`
/// (`{"key": value}`).
pub(crate) fn properties(body: &Map<String, Value>) -> Result<Vec<PropertyValue>, BridgeError> {
    if let Some(values) = body.get("propertyValues") {
        return Ok(serde_json::from_value(values.clone())?);
    }
    if let Some(Value::Object(map)) = body.get("properties") {
        return map
            .iter()
            .map(|(key, value)| {
                WireValue::from_json(value)
                    .map(|value| PropertyValue::new(key.clone(), value))
                    .ok_or_else(|| {
                        BridgeError::malformed(format!("property '{key}' has no usable value"))
                    })
            })
            .collect();
    }
    Err(BridgeError::malformed(
        "expected 'propertyValues' or 'properties'",
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert!(parse_object(b"  ").expect("empty").is_empty());
    }

    #[test]
    fn array_body_is_malformed() {
        assert!(matches!(
            parse_object(b"[1]"),
            Err(BridgeError::MalformedRequest { .. })
        ));
    }

    #[test]
    fn targets_accept_single_object() {
        let body = object(json!({"object": "Cube"}));
        assert_eq!(targets(&body).expect("targets"), vec!["Cube"]);
    }

    #[test]
    fn missing_object_list_is_malformed() {
        let body = object(json!({"component": "Light"}));
        assert_eq!(
            targets(&body),
            Err(BridgeError::malformed("no object list"))
        );
    }

    #[test]
    fn vectors_accept_three_shapes() {
        let expected = Some(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(vector(&json!({"x": 1, "y": 2, "z": 3})), expected);
        assert_eq!(vector(&json!([1, 2, 3])), expected);
        assert_eq!(vector(&json!("1,2,3")), expected);
        assert_eq!(vector(&json!("1,2")), None);
    }

    #[test]
    fn properties_object_form_infers_types() {
        let body = object(json!({"properties": {"intensity": 2.5, "enabled": false}}));
        let pairs = properties(&body).expect("pairs");
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().any(|pair| pair.value() == &WireValue::Float(2.5)));
    }
}
