//! Generic mutation engine.
//!
//! A request names members by string; the engine resolves each name against
//! an accessor registry and then the target's raw fields, coerces the wire
//! value to the member's native type and records one outcome per pair.

mod coerce;
mod property;
mod registry;
mod value;

pub use self::coerce::{CoercionError, coerce};
pub use self::property::{DeclaredType, PropertyValue, WireValue};
pub use self::registry::{
    AppliedVia, MemberRegistry, MemberSetter, MemberTarget, MutationError, PropertyOutcome,
};
pub use self::value::{Color, NativeType, NativeValue, Vector3, round};
