//! Table-driven domain mutators.
//!
//! Each preset renames request body fields to members of one component
//! type and pushes them through the mutation engine.

use crate::dispatch::body;
use crate::dispatch::context::HandlerContext;
use crate::dispatch::errors::BridgeError;
use crate::dispatch::router::{Handler, RouteRequest};
use crate::mutation::{PropertyValue, WireValue};
use crate::wire::ResultEnvelope;

use super::modify_targets;

/// One domain mutator.
#[derive(Debug)]
pub(super) struct Preset {
    /// Path below the base path.
    pub(super) route: &'static str,
    /// Component type the members belong to.
    pub(super) component: &'static str,
    /// `(body field, component member)` pairs.
    pub(super) members: &'static [(&'static str, &'static str)],
}

pub(super) const PRESETS: &[Preset] = &[
    Preset {
        route: "light/modify",
        component: "Light",
        members: &[
            ("type", "type"),
            ("lightType", "type"),
            ("color", "color"),
            ("intensity", "intensity"),
            ("range", "range"),
            ("spotAngle", "spotAngle"),
            ("shadows", "shadows"),
            ("enabled", "enabled"),
        ],
    },
    Preset {
        route: "material/modify",
        component: "MeshRenderer",
        members: &[
            ("material", "material"),
            ("color", "color"),
            ("metallic", "metallic"),
            ("smoothness", "smoothness"),
            ("shadowCastingMode", "shadowCastingMode"),
            ("receiveShadows", "receiveShadows"),
        ],
    },
    Preset {
        route: "audio/modify",
        component: "AudioSource",
        members: &[
            ("clip", "clip"),
            ("volume", "volume"),
            ("pitch", "pitch"),
            ("loop", "loop"),
            ("mute", "mute"),
            ("playOnAwake", "playOnAwake"),
            ("spatialBlend", "spatialBlend"),
        ],
    },
];

/// Router adapter for a [`Preset`].
#[derive(Debug)]
pub(super) struct PresetHandler {
    preset: &'static Preset,
}

impl PresetHandler {
    pub(super) const fn new(preset: &'static Preset) -> Self {
        Self { preset }
    }
}

impl Handler for PresetHandler {
    fn handle(
        &self,
        context: &mut HandlerContext<'_>,
        request: &RouteRequest<'_>,
    ) -> Result<ResultEnvelope, BridgeError> {
        let body = request.json()?;
        let targets = body::targets(&body)?;
        let mut properties = Vec::new();
        for (field, member) in self.preset.members {
            let Some(value) = body.get(*field) else {
                continue;
            };
            let value = WireValue::from_json(value)
                .ok_or_else(|| BridgeError::malformed(format!("'{field}' has no usable value")))?;
            properties.push(PropertyValue::new(*member, value));
        }
        if properties.is_empty() {
            let fields: Vec<&str> = self.preset.members.iter().map(|(field, _)| *field).collect();
            return Err(BridgeError::malformed(format!(
                "expected at least one of: {}",
                fields.join(", ")
            )));
        }
        let action = format!("modify_{}", self.preset.component.to_ascii_lowercase());
        modify_targets(
            context,
            &targets,
            Some(self.preset.component),
            &properties,
            &action,
        )
    }
}
