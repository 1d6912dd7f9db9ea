//! Wire value to native value coercion.

use thiserror::Error;

use super::property::WireValue;
use super::value::{Color, NativeType, NativeValue, Vector3};

/// A wire value could not be converted to a member's native type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The value has no conversion to the target type.
    #[error("cannot convert {found} '{value}' to {expected}")]
    Incompatible {
        /// Rendered source value.
        value: String,
        /// Declared wire type of the source.
        found: &'static str,
        /// Target native type.
        expected: String,
    },
    /// A float was offered for an integer member but has a fractional part.
    #[error("{value} is not an integral value")]
    NotIntegral {
        /// Rendered source value.
        value: String,
    },
    /// The value converted but lies outside the member's accepted range.
    #[error("{value} is outside the accepted range {range}")]
    OutOfRange {
        /// Rendered value.
        value: String,
        /// Human-readable accepted range.
        range: &'static str,
    },
    /// The value converted but the host refused it.
    #[error("'{value}' rejected: {reason}")]
    Rejected {
        /// Rendered value.
        value: String,
        /// Why the host refused it.
        reason: &'static str,
    },
}

impl CoercionError {
    fn incompatible(raw: &WireValue, target: &NativeType) -> Self {
        Self::Incompatible {
            value: raw.to_string(),
            found: raw.declared_type().as_str(),
            expected: target.to_string(),
        }
    }
}

/// Converts `raw` to `target`.
///
/// Strings parse into any type; integers widen to floats; floats narrow to
/// integers only when integral; booleans and integers interconvert as 0/1;
/// every value renders to a string.
pub fn coerce(raw: &WireValue, target: &NativeType) -> Result<NativeValue, CoercionError> {
    match target {
        NativeType::String => Ok(NativeValue::String(raw.to_string())),
        NativeType::Float => to_float(raw).map(NativeValue::Float),
        NativeType::Int => to_int(raw).map(NativeValue::Int),
        NativeType::Bool => to_bool(raw).map(NativeValue::Bool),
        NativeType::Vector3 => parse_text(raw, Vector3::parse)
            .map(NativeValue::Vector3)
            .ok_or_else(|| CoercionError::incompatible(raw, target)),
        NativeType::Color => parse_text(raw, Color::parse)
            .map(NativeValue::Color)
            .ok_or_else(|| CoercionError::incompatible(raw, target)),
        NativeType::Enum(options) => to_enum(raw, options)
            .map(|value| NativeValue::Enum { value, options })
            .ok_or_else(|| CoercionError::incompatible(raw, target)),
    }
}

/// Composite values only arrive as text (`"x,y,z"`, `"r,g,b,a"`).
fn parse_text<V>(raw: &WireValue, parse: impl FnOnce(&str) -> Option<V>) -> Option<V> {
    match raw {
        WireValue::String(text) => parse(text),
        _ => None,
    }
}

fn to_float(raw: &WireValue) -> Result<f64, CoercionError> {
    let parsed = match raw {
        WireValue::Float(value) => Some(*value),
        WireValue::Int(value) => Some(*value as f64),
        WireValue::String(text) => text.trim().parse::<f64>().ok(),
        WireValue::Bool(_) => None,
    };
    parsed
        .filter(|value| value.is_finite())
        .ok_or_else(|| CoercionError::incompatible(raw, &NativeType::Float))
}

fn to_int(raw: &WireValue) -> Result<i64, CoercionError> {
    match raw {
        WireValue::Int(value) => Ok(*value),
        WireValue::Bool(value) => Ok(i64::from(*value)),
        WireValue::Float(value) => float_to_int(*value),
        WireValue::String(text) => {
            let trimmed = text.trim();
            if let Ok(value) = trimmed.parse::<i64>() {
                return Ok(value);
            }
            match trimmed.parse::<f64>() {
                Ok(value) => float_to_int(value),
                Err(_) => Err(CoercionError::incompatible(raw, &NativeType::Int)),
            }
        }
    }
}

fn float_to_int(value: f64) -> Result<i64, CoercionError> {
    let in_range = value >= i64::MIN as f64 && value <= i64::MAX as f64;
    if !value.is_finite() || value.fract() != 0.0 || !in_range {
        return Err(CoercionError::NotIntegral {
            value: value.to_string(),
        });
    }
    Ok(value as i64)
}

fn to_bool(raw: &WireValue) -> Result<bool, CoercionError> {
    let parsed = match raw {
        WireValue::Bool(value) => Some(*value),
        WireValue::Int(0) => Some(false),
        WireValue::Int(1) => Some(true),
        WireValue::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        WireValue::Int(_) | WireValue::Float(_) => None,
    };
    parsed.ok_or_else(|| CoercionError::incompatible(raw, &NativeType::Bool))
}

fn to_enum(raw: &WireValue, options: &'static [&'static str]) -> Option<&'static str> {
    match raw {
        WireValue::String(text) => {
            let wanted = text.trim();
            options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(wanted))
                .copied()
                .or_else(|| {
                    wanted
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| options.get(index).copied())
                })
        }
        WireValue::Int(index) => usize::try_from(*index)
            .ok()
            .and_then(|index| options.get(index).copied()),
        WireValue::Float(_) | WireValue::Bool(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const SHADOWS: &[&str] = &["None", "Hard", "Soft"];

    #[rstest]
    #[case::string_to_float(WireValue::String("2.5".into()), NativeType::Float, NativeValue::Float(2.5))]
    #[case::int_to_float(WireValue::Int(3), NativeType::Float, NativeValue::Float(3.0))]
    #[case::integral_float(WireValue::Float(4.0), NativeType::Int, NativeValue::Int(4))]
    #[case::bool_to_int(WireValue::Bool(true), NativeType::Int, NativeValue::Int(1))]
    #[case::yes(WireValue::String("YES".into()), NativeType::Bool, NativeValue::Bool(true))]
    #[case::zero(WireValue::Int(0), NativeType::Bool, NativeValue::Bool(false))]
    #[case::display(WireValue::Float(1.5), NativeType::String, NativeValue::String("1.5".into()))]
    #[case::vector(
        WireValue::String("1,2,3".into()),
        NativeType::Vector3,
        NativeValue::Vector3(Vector3::new(1.0, 2.0, 3.0))
    )]
    #[case::enum_name(
        WireValue::String("soft".into()),
        NativeType::Enum(SHADOWS),
        NativeValue::Enum { value: "Soft", options: SHADOWS }
    )]
    #[case::enum_index(
        WireValue::Int(1),
        NativeType::Enum(SHADOWS),
        NativeValue::Enum { value: "Hard", options: SHADOWS }
    )]
    fn converts_supported_pairs(
        #[case] raw: WireValue,
        #[case] target: NativeType,
        #[case] expected: NativeValue,
    ) {
        assert_eq!(coerce(&raw, &target), Ok(expected));
    }

    #[test]
    fn fractional_float_is_not_an_int() {
        let error = coerce(&WireValue::Float(2.5), &NativeType::Int).expect_err("fractional");
        assert!(matches!(error, CoercionError::NotIntegral { .. }));
    }

    #[rstest]
    #[case::word_to_float(WireValue::String("bright".into()), NativeType::Float)]
    #[case::bool_to_float(WireValue::Bool(true), NativeType::Float)]
    #[case::two_to_bool(WireValue::Int(2), NativeType::Bool)]
    #[case::number_to_vector(WireValue::Float(1.0), NativeType::Vector3)]
    #[case::unknown_option(WireValue::String("Fuzzy".into()), NativeType::Enum(SHADOWS))]
    fn rejects_incompatible_values(#[case] raw: WireValue, #[case] target: NativeType) {
        let error = coerce(&raw, &target).expect_err("incompatible");
        assert!(matches!(error, CoercionError::Incompatible { .. }));
    }
}
