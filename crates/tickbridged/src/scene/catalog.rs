//! Known component types and their default raw fields.

use std::collections::BTreeMap;

use crate::mutation::{Color, MemberTarget, NativeType, NativeValue, Vector3};

/// Raw fields of a component, keyed by member name.
pub type FieldMap = BTreeMap<String, NativeValue>;

/// Type name of the component every node owns.
pub const TRANSFORM: &str = "Transform";

const SHADOW_CASTING: &[&str] = &["Off", "On", "TwoSided", "ShadowsOnly"];
const LIGHT_TYPES: &[&str] = &["Spot", "Directional", "Point", "Area"];
const LIGHT_SHADOWS: &[&str] = &["None", "Hard", "Soft"];
const RENDER_MODES: &[&str] = &["ScreenSpaceOverlay", "ScreenSpaceCamera", "WorldSpace"];

/// A component instance attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    type_name: &'static str,
    fields: FieldMap,
}

impl Component {
    /// Canonical type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Raw field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&NativeValue> {
        self.fields.get(name)
    }

    /// Every raw field.
    #[must_use]
    pub const fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Vector stored in `name`, if any.
    #[must_use]
    pub fn vector(&self, name: &str) -> Option<Vector3> {
        self.fields.get(name).and_then(NativeValue::as_vector)
    }

    pub(crate) fn set(&mut self, name: &str, value: NativeValue) {
        self.fields.insert(name.to_owned(), value);
    }
}

impl MemberTarget for Component {
    fn type_tag(&self) -> &str {
        self.type_name
    }

    fn field_type(&self, name: &str) -> Option<NativeType> {
        self.fields.get(name).map(NativeValue::native_type)
    }

    fn write_field(&mut self, name: &str, value: NativeValue) {
        self.set(name, value);
    }
}

type Defaults = fn() -> FieldMap;

/// Registry of component types the host can instantiate.
#[derive(Debug, Clone)]
pub struct ComponentCatalog {
    entries: Vec<(&'static str, Defaults)>,
}

impl Default for ComponentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ComponentCatalog {
    /// The built-in catalog.
    #[must_use]
    pub fn standard() -> Self {
        let entries: Vec<(&'static str, Defaults)> = vec![
            (TRANSFORM, transform),
            ("MeshFilter", mesh_filter),
            ("MeshRenderer", mesh_renderer),
            ("BoxCollider", box_collider),
            ("SphereCollider", sphere_collider),
            ("CapsuleCollider", capsule_collider),
            ("MeshCollider", mesh_collider),
            ("Rigidbody", rigidbody),
            ("CharacterController", character_controller),
            ("Light", light),
            ("Camera", camera),
            ("AudioListener", enabled_only),
            ("AudioSource", audio_source),
            ("Canvas", canvas),
            ("CanvasScaler", canvas_scaler),
            ("GraphicRaycaster", graphic_raycaster),
            ("ParticleSystem", particle_system),
            ("Animator", animator),
        ];
        Self { entries }
    }

    /// Canonical spelling of `name`, matched case-insensitively.
    #[must_use]
    pub fn canonical(&self, name: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
            .map(|(known, _)| *known)
    }

    /// A fresh instance of `name` with default fields.
    #[must_use]
    pub fn instantiate(&self, name: &str) -> Option<Component> {
        self.entries
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
            .map(|(type_name, defaults)| Component {
                type_name: *type_name,
                fields: defaults(),
            })
    }

    /// Every known type name.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

fn fields<const N: usize>(pairs: [(&str, NativeValue); N]) -> FieldMap {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

fn choice(options: &'static [&'static str], index: usize) -> NativeValue {
    NativeValue::Enum {
        value: options.get(index).copied().unwrap_or_default(),
        options,
    }
}

fn transform() -> FieldMap {
    fields([
        ("position", NativeValue::Vector3(Vector3::default())),
        ("rotation", NativeValue::Vector3(Vector3::default())),
        ("scale", NativeValue::Vector3(Vector3::one())),
    ])
}

fn mesh_filter() -> FieldMap {
    fields([("mesh", NativeValue::String("Cube".into()))])
}

fn mesh_renderer() -> FieldMap {
    fields([
        ("enabled", NativeValue::Bool(true)),
        ("material", NativeValue::String("Default-Material".into())),
        ("color", NativeValue::Color(Color::rgb(1.0, 1.0, 1.0))),
        ("metallic", NativeValue::Float(0.0)),
        ("smoothness", NativeValue::Float(0.5)),
        ("shadowCastingMode", choice(SHADOW_CASTING, 1)),
        ("receiveShadows", NativeValue::Bool(true)),
    ])
}

fn collider_base() -> FieldMap {
    fields([
        ("enabled", NativeValue::Bool(true)),
        ("isTrigger", NativeValue::Bool(false)),
        ("center", NativeValue::Vector3(Vector3::default())),
    ])
}

fn box_collider() -> FieldMap {
    let mut map = collider_base();
    map.insert("size".into(), NativeValue::Vector3(Vector3::one()));
    map
}

fn sphere_collider() -> FieldMap {
    let mut map = collider_base();
    map.insert("radius".into(), NativeValue::Float(0.5));
    map
}

fn capsule_collider() -> FieldMap {
    let mut map = collider_base();
    map.insert("radius".into(), NativeValue::Float(0.5));
    map.insert("height".into(), NativeValue::Float(2.0));
    map.insert("direction".into(), NativeValue::Int(1));
    map
}

fn mesh_collider() -> FieldMap {
    fields([
        ("enabled", NativeValue::Bool(true)),
        ("isTrigger", NativeValue::Bool(false)),
        ("convex", NativeValue::Bool(false)),
    ])
}

fn rigidbody() -> FieldMap {
    fields([
        ("mass", NativeValue::Float(1.0)),
        ("drag", NativeValue::Float(0.0)),
        ("angularDrag", NativeValue::Float(0.05)),
        ("useGravity", NativeValue::Bool(true)),
        ("isKinematic", NativeValue::Bool(false)),
    ])
}

fn character_controller() -> FieldMap {
    fields([
        ("height", NativeValue::Float(2.0)),
        ("radius", NativeValue::Float(0.5)),
        ("slopeLimit", NativeValue::Float(45.0)),
        ("stepOffset", NativeValue::Float(0.3)),
    ])
}

fn light() -> FieldMap {
    fields([
        ("enabled", NativeValue::Bool(true)),
        ("type", choice(LIGHT_TYPES, 2)),
        ("color", NativeValue::Color(Color::rgb(1.0, 1.0, 1.0))),
        ("intensity", NativeValue::Float(1.0)),
        ("range", NativeValue::Float(10.0)),
        ("spotAngle", NativeValue::Float(30.0)),
        ("shadows", choice(LIGHT_SHADOWS, 0)),
    ])
}

fn camera() -> FieldMap {
    fields([
        ("enabled", NativeValue::Bool(true)),
        ("fieldOfView", NativeValue::Float(60.0)),
        ("nearClipPlane", NativeValue::Float(0.3)),
        ("farClipPlane", NativeValue::Float(1000.0)),
        ("orthographic", NativeValue::Bool(false)),
        ("depth", NativeValue::Float(-1.0)),
        (
            "backgroundColor",
            NativeValue::Color(Color::rgb(0.192, 0.302, 0.475)),
        ),
    ])
}

fn enabled_only() -> FieldMap {
    fields([("enabled", NativeValue::Bool(true))])
}

fn audio_source() -> FieldMap {
    fields([
        ("enabled", NativeValue::Bool(true)),
        ("clip", NativeValue::String(String::new())),
        ("volume", NativeValue::Float(1.0)),
        ("pitch", NativeValue::Float(1.0)),
        ("loop", NativeValue::Bool(false)),
        ("playOnAwake", NativeValue::Bool(true)),
        ("mute", NativeValue::Bool(false)),
        ("spatialBlend", NativeValue::Float(0.0)),
    ])
}

fn canvas() -> FieldMap {
    fields([
        ("renderMode", choice(RENDER_MODES, 0)),
        ("sortingOrder", NativeValue::Int(0)),
    ])
}

fn canvas_scaler() -> FieldMap {
    fields([
        ("scaleFactor", NativeValue::Float(1.0)),
        ("referencePixelsPerUnit", NativeValue::Float(100.0)),
    ])
}

fn graphic_raycaster() -> FieldMap {
    fields([("ignoreReversedGraphics", NativeValue::Bool(true))])
}

fn particle_system() -> FieldMap {
    fields([
        ("duration", NativeValue::Float(5.0)),
        ("looping", NativeValue::Bool(true)),
        ("startLifetime", NativeValue::Float(5.0)),
        ("startSpeed", NativeValue::Float(5.0)),
        ("startSize", NativeValue::Float(1.0)),
        ("maxParticles", NativeValue::Int(1000)),
    ])
}

fn animator() -> FieldMap {
    fields([
        ("enabled", NativeValue::Bool(true)),
        ("controller", NativeValue::String(String::new())),
        ("speed", NativeValue::Float(1.0)),
        ("applyRootMotion", NativeValue::Bool(false)),
    ])
}
