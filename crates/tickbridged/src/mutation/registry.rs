//! Named-member lookup: typed setter closures registered per target type.

use std::collections::HashMap;

use super::coerce::{CoercionError, coerce};
use super::property::PropertyValue;
use super::value::{NativeType, NativeValue};

/// An object whose raw fields can be read and written by name.
pub trait MemberTarget {
    /// Type tag used to select accessors (e.g. `"Light"`).
    fn type_tag(&self) -> &str;

    /// Native type of raw field `name`, if the field exists.
    fn field_type(&self, name: &str) -> Option<NativeType>;

    /// Stores a raw field value. Only called after [`Self::field_type`]
    /// reported the field.
    fn write_field(&mut self, name: &str, value: NativeValue);
}

type Apply<T> = Box<dyn Fn(&mut T, NativeValue) -> Result<(), CoercionError> + Send + Sync>;

/// Property-style accessor: a declared native type plus the setter.
pub struct MemberSetter<T> {
    native: NativeType,
    apply: Apply<T>,
}

impl<T> MemberSetter<T> {
    /// Native type the wire value is coerced to before `apply` runs.
    #[must_use]
    pub const fn native(&self) -> &NativeType {
        &self.native
    }
}

/// How a pair was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedVia {
    /// Through a registered accessor.
    Accessor,
    /// Directly into a raw field.
    Field,
}

/// Per-pair failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Neither an accessor nor a field matches the key.
    #[error("{type_tag} has no member '{key}'")]
    MemberNotFound {
        /// Target type tag.
        type_tag: String,
        /// Requested key.
        key: String,
    },
    /// The value could not be converted to the member's type.
    #[error("{key}: {source}")]
    Coercion {
        /// Requested key.
        key: String,
        /// Conversion failure.
        #[source]
        source: CoercionError,
    },
}

/// Outcome of one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyOutcome {
    /// Key as requested.
    pub key: String,
    /// Result of the assignment.
    pub result: Result<AppliedVia, MutationError>,
}

/// Accessor table keyed by `(type tag, member name)`.
pub struct MemberRegistry<T> {
    accessors: HashMap<(String, String), MemberSetter<T>>,
}

impl<T> Default for MemberRegistry<T> {
    fn default() -> Self {
        Self {
            accessors: HashMap::new(),
        }
    }
}

impl<T> std::fmt::Debug for MemberRegistry<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MemberRegistry")
            .field("accessors", &self.accessors.len())
            .finish()
    }
}

impl<T: MemberTarget> MemberRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an accessor. Later registrations replace earlier ones.
    pub fn accessor<F>(&mut self, type_tag: &str, member: &str, native: NativeType, apply: F)
    where
        F: Fn(&mut T, NativeValue) -> Result<(), CoercionError> + Send + Sync + 'static,
    {
        self.accessors.insert(
            (type_tag.to_owned(), member.to_owned()),
            MemberSetter {
                native,
                apply: Box::new(apply),
            },
        );
    }

    /// Accessor registered for `(type_tag, member)`.
    #[must_use]
    pub fn lookup(&self, type_tag: &str, member: &str) -> Option<&MemberSetter<T>> {
        self.accessors
            .get(&(type_tag.to_owned(), member.to_owned()))
    }

    /// Applies one pair: accessor first, then raw field, else
    /// [`MutationError::MemberNotFound`]. The target is only touched when
    /// coercion succeeds.
    pub fn apply(&self, target: &mut T, property: &PropertyValue) -> Result<AppliedVia, MutationError> {
        let key = property.key();
        let coercion = |source| MutationError::Coercion {
            key: key.to_owned(),
            source,
        };
        if let Some(setter) = self.lookup(target.type_tag(), key) {
            let value = coerce(property.value(), &setter.native).map_err(coercion)?;
            (setter.apply)(target, value).map_err(coercion)?;
            return Ok(AppliedVia::Accessor);
        }
        if let Some(native) = target.field_type(key) {
            let value = coerce(property.value(), &native).map_err(coercion)?;
            target.write_field(key, value);
            return Ok(AppliedVia::Field);
        }
        Err(MutationError::MemberNotFound {
            type_tag: target.type_tag().to_owned(),
            key: key.to_owned(),
        })
    }

    /// Applies every pair in order, recording one outcome per pair. A failed
    /// pair never stops the remaining pairs.
    pub fn apply_properties(&self, target: &mut T, properties: &[PropertyValue]) -> Vec<PropertyOutcome> {
        properties
            .iter()
            .map(|property| PropertyOutcome {
                key: property.key().to_owned(),
                result: self.apply(target, property),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::mutation::WireValue;

    #[derive(Default)]
    struct Lamp {
        fields: BTreeMap<String, NativeValue>,
    }

    impl MemberTarget for Lamp {
        fn type_tag(&self) -> &str {
            "Lamp"
        }

        fn field_type(&self, name: &str) -> Option<NativeType> {
            self.fields.get(name).map(NativeValue::native_type)
        }

        fn write_field(&mut self, name: &str, value: NativeValue) {
            self.fields.insert(name.to_owned(), value);
        }
    }

    fn lamp() -> Lamp {
        let mut lamp = Lamp::default();
        lamp.write_field("intensity", NativeValue::Float(1.0));
        lamp.write_field("enabled", NativeValue::Bool(true));
        lamp
    }

    fn registry() -> MemberRegistry<Lamp> {
        let mut registry = MemberRegistry::new();
        registry.accessor("Lamp", "intensity", NativeType::Float, |lamp: &mut Lamp, value| {
            let clamped = value.as_float().unwrap_or_default().max(0.0);
            lamp.write_field("intensity", NativeValue::Float(clamped));
            Ok(())
        });
        registry
    }

    #[test]
    fn accessor_wins_over_same_named_field() {
        let mut target = lamp();
        let property = PropertyValue::new("intensity", WireValue::Float(-4.0));
        let via = registry().apply(&mut target, &property).expect("apply");
        assert_eq!(via, AppliedVia::Accessor);
        assert_eq!(target.fields.get("intensity"), Some(&NativeValue::Float(0.0)));
    }

    #[test]
    fn falls_back_to_raw_field() {
        let mut target = lamp();
        let property = PropertyValue::new("enabled", WireValue::String("no".into()));
        let via = registry().apply(&mut target, &property).expect("apply");
        assert_eq!(via, AppliedVia::Field);
        assert_eq!(target.fields.get("enabled"), Some(&NativeValue::Bool(false)));
    }

    #[test]
    fn reports_every_pair_without_short_circuit() {
        let mut target = lamp();
        let properties = vec![
            PropertyValue::new("wattage", WireValue::Int(60)),
            PropertyValue::new("intensity", WireValue::String("bright".into())),
            PropertyValue::new("enabled", WireValue::Bool(false)),
        ];
        let outcomes = registry().apply_properties(&mut target, &properties);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            outcomes[0].result,
            Err(MutationError::MemberNotFound { .. })
        ));
        assert!(matches!(outcomes[1].result, Err(MutationError::Coercion { .. })));
        assert_eq!(outcomes[2].result, Ok(AppliedVia::Field));
        assert_eq!(target.fields.get("enabled"), Some(&NativeValue::Bool(false)));
        assert_eq!(target.fields.get("intensity"), Some(&NativeValue::Float(1.0)));
    }
}
