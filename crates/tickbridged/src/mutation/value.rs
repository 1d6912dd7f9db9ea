//! Native value model used by host members.

use std::fmt;

use serde_json::{Value, json};

/// Three-component vector (position, rotation, scale).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3 {
    /// Builds a vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The unit scale vector.
    #[must_use]
    pub const fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Parses `x,y,z`, optionally wrapped in parentheses.
    ///
    /// Returns `None` unless exactly three finite floats are present.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let components = parse_floats(text)?;
        match components.as_slice() {
            [x, y, z] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }

    /// JSON object form `{x, y, z}`, rounded when `precision` is set.
    #[must_use]
    pub fn to_json(self, precision: Option<u32>) -> Value {
        json!({
            "x": round(self.x, precision),
            "y": round(self.y, precision),
            "z": round(self.z, precision),
        })
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{},{}", self.x, self.y, self.z)
    }
}

/// RGBA colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Color {
    /// Builds an opaque colour.
    #[must_use]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parses `r,g,b[,a]`, `#RGB`, `#RRGGBB`, `#RRGGBBAA` or a preset name.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(preset) = preset(trimmed) {
            return Some(preset);
        }
        let components = parse_floats(trimmed)?;
        match components.as_slice() {
            [r, g, b] => Some(Self::rgb(*r, *g, *b)),
            [r, g, b, a] => Some(Self {
                r: *r,
                g: *g,
                b: *b,
                a: *a,
            }),
            _ => None,
        }
    }

    /// JSON object form `{r, g, b, a}`.
    #[must_use]
    pub fn to_json(self, precision: Option<u32>) -> Value {
        json!({
            "r": round(self.r, precision),
            "g": round(self.g, precision),
            "b": round(self.b, precision),
            "a": round(self.a, precision),
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

fn preset(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "red" => Color::rgb(1.0, 0.0, 0.0),
        "green" => Color::rgb(0.0, 1.0, 0.0),
        "blue" => Color::rgb(0.0, 0.0, 1.0),
        "white" => Color::rgb(1.0, 1.0, 1.0),
        "black" => Color::rgb(0.0, 0.0, 0.0),
        "yellow" => Color::rgb(1.0, 0.92, 0.016),
        "cyan" => Color::rgb(0.0, 1.0, 1.0),
        "magenta" => Color::rgb(1.0, 0.0, 1.0),
        "gray" | "grey" => Color::rgb(0.5, 0.5, 0.5),
        "orange" => Color::rgb(1.0, 0.5, 0.0),
        "purple" => Color::rgb(0.5, 0.0, 0.5),
        "clear" => Color {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        },
        _ => return None,
    };
    Some(color)
}

fn parse_hex(hex: &str) -> Option<Color> {
    let channel = |text: &str| u8::from_str_radix(text, 16).ok().map(|v| f64::from(v) / 255.0);
    let doubled = |c: char| {
        let pair: String = [c, c].iter().collect();
        channel(&pair)
    };
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            let r = doubled(chars.next()?)?;
            let g = doubled(chars.next()?)?;
            let b = doubled(chars.next()?)?;
            Some(Color::rgb(r, g, b))
        }
        6 | 8 => {
            let r = channel(hex.get(0..2)?)?;
            let g = channel(hex.get(2..4)?)?;
            let b = channel(hex.get(4..6)?)?;
            let a = match hex.get(6..8) {
                Some(alpha) => channel(alpha)?,
                None => 1.0,
            };
            Some(Color { r, g, b, a })
        }
        _ => None,
    }
}

fn parse_floats(text: &str) -> Option<Vec<f64>> {
    let inner = text
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    inner
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

/// Rounds `value` to `precision` decimal places when requested. Values too
/// large to scale without overflowing are returned unchanged.
#[must_use]
pub fn round(value: f64, precision: Option<u32>) -> f64 {
    let Some(places) = precision else {
        return value;
    };
    let factor = 10_f64.powi(i32::try_from(places.min(15)).unwrap_or(15));
    let scaled = value * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    }
}

/// Type of a settable member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    /// Free text.
    String,
    /// Floating point number.
    Float,
    /// Integer.
    Int,
    /// Boolean.
    Bool,
    /// [`Vector3`].
    Vector3,
    /// [`Color`].
    Color,
    /// One of a fixed set of option names.
    Enum(&'static [&'static str]),
}

impl fmt::Display for NativeType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => formatter.write_str("string"),
            Self::Float => formatter.write_str("float"),
            Self::Int => formatter.write_str("int"),
            Self::Bool => formatter.write_str("bool"),
            Self::Vector3 => formatter.write_str("vector3"),
            Self::Color => formatter.write_str("color"),
            Self::Enum(options) => write!(formatter, "one of [{}]", options.join(", ")),
        }
    }
}

/// Value stored in a host member.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Free text.
    String(String),
    /// Floating point number.
    Float(f64),
    /// Integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// Three-component vector.
    Vector3(Vector3),
    /// RGBA colour.
    Color(Color),
    /// Selected option of an enumeration.
    Enum {
        /// Canonical option name.
        value: &'static str,
        /// Every valid option.
        options: &'static [&'static str],
    },
}

impl NativeValue {
    /// Type of the stored value.
    #[must_use]
    pub const fn native_type(&self) -> NativeType {
        match self {
            Self::String(_) => NativeType::String,
            Self::Float(_) => NativeType::Float,
            Self::Int(_) => NativeType::Int,
            Self::Bool(_) => NativeType::Bool,
            Self::Vector3(_) => NativeType::Vector3,
            Self::Color(_) => NativeType::Color,
            Self::Enum { options, .. } => NativeType::Enum(*options),
        }
    }

    /// Float payload, if this is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Vector payload, if this is a vector.
    #[must_use]
    pub const fn as_vector(&self) -> Option<Vector3> {
        match self {
            Self::Vector3(value) => Some(*value),
            _ => None,
        }
    }

    /// JSON rendering, rounding floats when `precision` is set.
    #[must_use]
    pub fn to_json(&self, precision: Option<u32>) -> Value {
        match self {
            Self::String(text) => Value::from(text.as_str()),
            Self::Float(value) => Value::from(round(*value, precision)),
            Self::Int(value) => Value::from(*value),
            Self::Bool(value) => Value::from(*value),
            Self::Vector3(vector) => vector.to_json(precision),
            Self::Color(color) => color.to_json(precision),
            Self::Enum { value, .. } => Value::from(*value),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => formatter.write_str(text),
            Self::Float(value) => write!(formatter, "{value}"),
            Self::Int(value) => write!(formatter, "{value}"),
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Vector3(vector) => write!(formatter, "{vector}"),
            Self::Color(color) => write!(formatter, "{color}"),
            Self::Enum { value, .. } => formatter.write_str(value),
        }
    }
}
