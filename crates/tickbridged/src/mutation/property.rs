//! Wire-level `(key, typed value)` pairs.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Declared wire type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    /// `"string"`.
    String,
    /// `"float"`.
    Float,
    /// `"int"`.
    Int,
    /// `"bool"`.
    Bool,
}

impl DeclaredType {
    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "string" | "str" => Some(Self::String),
            "float" | "double" | "number" => Some(Self::Float),
            "int" | "integer" => Some(Self::Int),
            "bool" | "boolean" => Some(Self::Bool),
            _ => None,
        }
    }
}

/// Raw value tagged with its declared wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// Text.
    String(String),
    /// Floating point number.
    Float(f64),
    /// Integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
}

impl WireValue {
    /// The declared type of this value.
    #[must_use]
    pub const fn declared_type(&self) -> DeclaredType {
        match self {
            Self::String(_) => DeclaredType::String,
            Self::Float(_) => DeclaredType::Float,
            Self::Int(_) => DeclaredType::Int,
            Self::Bool(_) => DeclaredType::Bool,
        }
    }

    /// Infers a typed value from free text: `true`/`false`, integers and
    /// decimals are recognised, anything else stays a string.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::Int(value);
        }
        if let Ok(value) = trimmed.parse::<f64>()
            && value.is_finite()
        {
            return Self::Float(value);
        }
        Self::String(text.to_owned())
    }

    /// Converts a JSON value by its JSON type. Objects shaped like vectors
    /// or colours become comma-joined strings.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::String(text.clone())),
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float)),
            Value::Object(map) => {
                let keys: &[&[&str]] = &[&["r", "g", "b", "a"], &["r", "g", "b"], &["x", "y", "z"]];
                keys.iter().find_map(|names| {
                    if map.len() != names.len() {
                        return None;
                    }
                    let parts: Option<Vec<String>> = names
                        .iter()
                        .map(|name| map.get(*name).and_then(Value::as_f64).map(|v| v.to_string()))
                        .collect();
                    parts.map(|parts| Self::String(parts.join(",")))
                })
            }
            Value::Array(items) => {
                let parts: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_f64().map(|v| v.to_string()))
                    .collect();
                parts.map(|parts| Self::String(parts.join(",")))
            }
            Value::Null => None,
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => formatter.write_str(text),
            Self::Float(value) => write!(formatter, "{value}"),
            Self::Int(value) => write!(formatter, "{value}"),
            Self::Bool(value) => write!(formatter, "{value}"),
        }
    }
}

/// One `(key, value)` pair of a mutation request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WirePropertyValue")]
pub struct PropertyValue {
    key: String,
    value: WireValue,
}

impl PropertyValue {
    /// Builds a pair.
    pub fn new(key: impl Into<String>, value: WireValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Member name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw value.
    #[must_use]
    pub const fn value(&self) -> &WireValue {
        &self.value
    }

    /// Declared wire type.
    #[must_use]
    pub const fn declared_type(&self) -> DeclaredType {
        self.value.declared_type()
    }
}

/// Wire form: `{key, valueType, stringValue|floatValue|intValue|boolValue|value}`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePropertyValue {
    key: String,
    value_type: Option<String>,
    string_value: Option<String>,
    float_value: Option<f64>,
    int_value: Option<i64>,
    bool_value: Option<bool>,
    value: Option<Value>,
}

impl TryFrom<WirePropertyValue> for PropertyValue {
    type Error = String;

    fn try_from(wire: WirePropertyValue) -> Result<Self, Self::Error> {
        let declared = match wire.value_type.as_deref() {
            Some(name) => Some(
                DeclaredType::parse(name)
                    .ok_or_else(|| format!("unknown valueType '{name}' for '{}'", wire.key))?,
            ),
            None => None,
        };
        let typed = match declared {
            Some(DeclaredType::String) => wire.string_value.map(WireValue::String),
            Some(DeclaredType::Float) => wire.float_value.map(WireValue::Float),
            Some(DeclaredType::Int) => wire.int_value.map(WireValue::Int),
            Some(DeclaredType::Bool) => wire.bool_value.map(WireValue::Bool),
            None => wire
                .string_value
                .map(WireValue::String)
                .or_else(|| wire.float_value.map(WireValue::Float))
                .or_else(|| wire.int_value.map(WireValue::Int))
                .or_else(|| wire.bool_value.map(WireValue::Bool)),
        };
        let value = typed
            .or_else(|| wire.value.as_ref().and_then(WireValue::from_json))
            .ok_or_else(|| format!("property '{}' carries no value", wire.key))?;
        Ok(Self::new(wire.key, value))
    }
}
