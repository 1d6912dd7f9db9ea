//! The host: scene graph, catalogs, editor state and member registries.
//!
//! Only the coordinator holds a `&mut Host`; handlers receive it through the
//! handler context for the duration of one unit of work.

use tracing::warn;

use crate::dispatch::BridgeError;
use crate::mutation::{
    AppliedVia, CoercionError, MemberRegistry, MemberTarget, MutationError, NativeType,
    NativeValue, PropertyOutcome, PropertyValue, Vector3, WireValue, coerce,
};
use crate::scene::{
    BusySignal, Component, ComponentCatalog, EditorState, GAME_OBJECT, LAYER_COUNT, Node, NodeId,
    Scene, TRANSFORM, TagManager,
};

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// One atomic change applied to a single target.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Attach a component of the given type.
    AddMember {
        /// Component type name.
        type_name: String,
    },
    /// Detach the component of the given type.
    RemoveMember {
        /// Component type name.
        type_name: String,
    },
    /// Set the node's own activity flag.
    SetActive(bool),
    /// Remove the node.
    Delete {
        /// Remove descendants too instead of re-parenting them.
        recursive: bool,
    },
    /// Set one member of the node (`component: None`) or of a component.
    ModifyProperty {
        /// Component holding the member, if any.
        component: Option<String>,
        /// Member and raw value.
        property: PropertyValue,
    },
}

/// Parameters of a create request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateSpec {
    /// Name of the new node.
    pub name: String,
    /// Parent reference (name, path or `#id`).
    pub parent: Option<String>,
    /// Initial position.
    pub position: Option<Vector3>,
    /// Initial rotation (Euler degrees).
    pub rotation: Option<Vector3>,
    /// Initial scale.
    pub scale: Option<Vector3>,
    /// Components to attach.
    pub components: Vec<String>,
    /// Initial activity.
    pub active: Option<bool>,
    /// Initial tag.
    pub tag: Option<String>,
    /// Initial layer, by index or name.
    pub layer: Option<String>,
}

/// Outcome of [`Host::create_object`]: the node exists; `failures` lists the
/// optional parts that could not be applied, keyed by what was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    /// The new node.
    pub id: NodeId,
    /// `(requested part, error)` pairs.
    pub failures: Vec<(String, BridgeError)>,
}

/// The mutable host state the bridge edits.
#[derive(Debug)]
pub struct Host {
    scene: Scene,
    catalog: ComponentCatalog,
    tags: TagManager,
    editor: EditorState,
    busy: BusySignal,
    node_members: MemberRegistry<Node>,
    component_members: MemberRegistry<Component>,
}

impl Default for Host {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Host {
    /// Builds a host with an empty scene, seeding the default camera and
    /// light when `seed` is set.
    #[must_use]
    pub fn new(seed: bool) -> Self {
        let mut host = Self {
            scene: Scene::new("SampleScene"),
            catalog: ComponentCatalog::standard(),
            tags: TagManager::default(),
            editor: EditorState::default(),
            busy: BusySignal::default(),
            node_members: node_members(),
            component_members: component_members(),
        };
        if seed {
            host.seed();
        }
        host
    }

    fn seed(&mut self) {
        let camera = CreateSpec {
            name: "Main Camera".into(),
            position: Some(Vector3::new(0.0, 1.0, -10.0)),
            components: vec!["Camera".into(), "AudioListener".into()],
            tag: Some("MainCamera".into()),
            ..CreateSpec::default()
        };
        let light = CreateSpec {
            name: "Directional Light".into(),
            position: Some(Vector3::new(0.0, 3.0, 0.0)),
            rotation: Some(Vector3::new(50.0, -30.0, 0.0)),
            components: vec!["Light".into()],
            ..CreateSpec::default()
        };
        if let Err(error) = self.create_object(&camera) {
            warn!(target: HOST_TARGET, %error, "failed to seed camera");
        }
        let directional = PropertyValue::new("type", WireValue::String("Directional".into()));
        let seeded = self
            .create_object(&light)
            .and_then(|created| self.modify_properties(created.id, Some("Light"), &[directional]));
        if let Err(error) = seeded {
            warn!(target: HOST_TARGET, %error, "failed to seed light");
        }
    }

    /// The scene graph.
    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene graph.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Known component types.
    #[must_use]
    pub const fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    /// Tags and layers.
    #[must_use]
    pub const fn tags(&self) -> &TagManager {
        &self.tags
    }

    /// Mutable tags and layers.
    pub fn tags_mut(&mut self) -> &mut TagManager {
        &mut self.tags
    }

    /// Editor state.
    #[must_use]
    pub const fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// Mutable editor state.
    pub fn editor_mut(&mut self) -> &mut EditorState {
        &mut self.editor
    }

    /// Handle to the host busy flag, shareable across threads.
    #[must_use]
    pub fn busy_signal(&self) -> BusySignal {
        self.busy.clone()
    }

    /// Host tick hook.
    pub fn advance(&mut self) {
        self.editor.advance();
    }

    /// Resolves a reference or fails with [`BridgeError::NotFound`].
    pub fn resolve(&self, reference: &str, include_inactive: bool) -> Result<NodeId, BridgeError> {
        self.scene
            .resolve(reference, include_inactive)
            .ok_or_else(|| BridgeError::not_found(reference))
    }

    /// Name used to identify `id` in batch results.
    #[must_use]
    pub fn label(&self, id: NodeId) -> String {
        self.scene
            .node(id)
            .map_or_else(|| id.to_string(), |node| node.name().to_owned())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, BridgeError> {
        self.scene
            .node_mut(id)
            .ok_or_else(|| BridgeError::not_found(id.to_string()))
    }

    /// Applies one operation to one target. Either the whole operation takes
    /// effect or nothing changes.
    pub fn apply(&mut self, id: NodeId, operation: &Operation) -> Result<(), BridgeError> {
        match operation {
            Operation::AddMember { type_name } => {
                let component = self
                    .catalog
                    .instantiate(type_name)
                    .ok_or_else(|| BridgeError::unknown_component(type_name))?;
                let node = self.node_mut(id)?;
                let name = node.name().to_owned();
                node.add_component(component).map_err(|existing| {
                    BridgeError::invalid_state(format!(
                        "{name} already has a {}",
                        existing.type_name()
                    ))
                })
            }
            Operation::RemoveMember { type_name } => {
                if type_name.eq_ignore_ascii_case(TRANSFORM) {
                    return Err(BridgeError::invalid_state("Transform cannot be removed"));
                }
                let node = self.node_mut(id)?;
                let name = node.name().to_owned();
                node.remove_component(type_name)
                    .map(|_| ())
                    .ok_or_else(|| BridgeError::member_not_found(name, type_name.as_str()))
            }
            Operation::SetActive(active) => {
                self.node_mut(id)?.set_active(*active);
                Ok(())
            }
            Operation::Delete { recursive } => {
                if self.scene.remove(id, *recursive).is_empty() {
                    return Err(BridgeError::not_found(id.to_string()));
                }
                Ok(())
            }
            Operation::ModifyProperty {
                component,
                property,
            } => {
                let outcome = self
                    .modify_properties(id, component.as_deref(), std::slice::from_ref(property))?
                    .pop();
                match outcome {
                    Some(PropertyOutcome { result: Err(error), .. }) => Err(error.into()),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Applies every pair to the node (`component: None`) or to one of its
    /// components, recording one outcome per pair.
    pub fn modify_properties(
        &mut self,
        id: NodeId,
        component: Option<&str>,
        properties: &[PropertyValue],
    ) -> Result<Vec<PropertyOutcome>, BridgeError> {
        let node = self
            .scene
            .node_mut(id)
            .ok_or_else(|| BridgeError::not_found(id.to_string()))?;
        let Some(component) = component else {
            let outcomes = properties
                .iter()
                .map(|property| PropertyOutcome {
                    key: property.key().to_owned(),
                    result: apply_node_property(&self.node_members, &self.tags, node, property),
                })
                .collect();
            return Ok(outcomes);
        };
        let name = node.name().to_owned();
        let target = node
            .component_mut(component)
            .ok_or_else(|| BridgeError::member_not_found(name, component))?;
        Ok(self.component_members.apply_properties(target, properties))
    }

    /// Creates a node. Fails without creating anything when the name is
    /// empty or the parent is missing; every other problem is reported in
    /// [`Created::failures`].
    pub fn create_object(&mut self, spec: &CreateSpec) -> Result<Created, BridgeError> {
        if spec.name.trim().is_empty() {
            return Err(BridgeError::malformed("create requires a name"));
        }
        let parent = spec
            .parent
            .as_deref()
            .map(|parent| self.resolve(parent, true))
            .transpose()?;
        let transform = self
            .catalog
            .instantiate(TRANSFORM)
            .ok_or_else(|| BridgeError::internal("catalog has no Transform"))?;
        let id = self
            .scene
            .create(&spec.name, parent, transform)
            .ok_or_else(|| BridgeError::not_found(spec.parent.clone().unwrap_or_default()))?;

        let node = self.node_mut(id)?;
        for (member, value) in [
            ("position", spec.position),
            ("rotation", spec.rotation),
            ("scale", spec.scale),
        ] {
            if let Some(value) = value {
                node.set_transform(member, value);
            }
        }
        if let Some(active) = spec.active {
            node.set_active(active);
        }

        let mut failures = Vec::new();
        for type_name in &spec.components {
            let operation = Operation::AddMember {
                type_name: type_name.clone(),
            };
            if let Err(error) = self.apply(id, &operation) {
                failures.push((type_name.clone(), error));
            }
        }
        let mut node_properties = Vec::new();
        if let Some(tag) = &spec.tag {
            node_properties.push(PropertyValue::new("tag", WireValue::String(tag.clone())));
        }
        if let Some(layer) = &spec.layer {
            match self.tags.layer_index(layer) {
                Some(index) => node_properties
                    .push(PropertyValue::new("layer", WireValue::Int(i64::from(index)))),
                None => failures.push((
                    "layer".to_owned(),
                    BridgeError::invalid_state(format!("layer '{layer}' is not defined")),
                )),
            }
        }
        for outcome in self.modify_properties(id, None, &node_properties)? {
            if let Err(error) = outcome.result {
                failures.push((outcome.key, error.into()));
            }
        }
        Ok(Created { id, failures })
    }
}

fn apply_node_property(
    registry: &MemberRegistry<Node>,
    tags: &TagManager,
    node: &mut Node,
    property: &PropertyValue,
) -> Result<AppliedVia, MutationError> {
    if property.key() == "tag" {
        let value = coerce(property.value(), &NativeType::String).map_err(|source| {
            MutationError::Coercion {
                key: "tag".into(),
                source,
            }
        })?;
        if !tags.contains(&value.to_string()) {
            return Err(MutationError::Coercion {
                key: "tag".into(),
                source: CoercionError::Rejected {
                    value: value.to_string(),
                    reason: "tag is not defined",
                },
            });
        }
    }
    registry.apply(node, property)
}

fn node_members() -> MemberRegistry<Node> {
    let mut registry = MemberRegistry::new();
    let tag = GAME_OBJECT;
    registry.accessor(tag, "active", NativeType::Bool, |node: &mut Node, value| {
        node.set_active(matches!(value, NativeValue::Bool(true)));
        Ok(())
    });
    registry.accessor(tag, "name", NativeType::String, |node: &mut Node, value| {
        node.set_name(value.to_string());
        Ok(())
    });
    registry.accessor(tag, "tag", NativeType::String, |node: &mut Node, value| {
        node.set_tag(value.to_string());
        Ok(())
    });
    registry.accessor(tag, "layer", NativeType::Int, |node: &mut Node, value| {
        let NativeValue::Int(layer) = value else {
            return Ok(());
        };
        let layer = u8::try_from(layer)
            .ok()
            .filter(|layer| usize::from(*layer) < LAYER_COUNT)
            .ok_or(CoercionError::OutOfRange {
                value: layer.to_string(),
                range: "0..=31",
            })?;
        node.set_layer(layer);
        Ok(())
    });
    registry
}

fn component_members() -> MemberRegistry<Component> {
    let mut registry = MemberRegistry::new();
    for member in ["position", "rotation", "scale"] {
        registry.accessor(TRANSFORM, member, NativeType::Vector3, move |transform: &mut Component, value| {
            transform.write_field(member, value);
            Ok(())
        });
    }
    let clamps: [(&str, &str, f64, f64); 11] = [
        ("Light", "intensity", 0.0, f64::MAX),
        ("Light", "range", 0.0, f64::MAX),
        ("Light", "spotAngle", 1.0, 179.0),
        ("Rigidbody", "mass", 1e-7, f64::MAX),
        ("AudioSource", "volume", 0.0, 1.0),
        ("AudioSource", "pitch", -3.0, 3.0),
        ("AudioSource", "spatialBlend", 0.0, 1.0),
        ("MeshRenderer", "metallic", 0.0, 1.0),
        ("MeshRenderer", "smoothness", 0.0, 1.0),
        ("Camera", "fieldOfView", 1.0, 179.0),
        ("Camera", "nearClipPlane", 0.01, f64::MAX),
    ];
    for (type_name, member, min, max) in clamps {
        registry.accessor(type_name, member, NativeType::Float, move |component: &mut Component, value| {
            let clamped = value.as_float().unwrap_or(min).clamp(min, max);
            component.write_field(member, NativeValue::Float(clamped));
            Ok(())
        });
    }
    registry
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn host() -> Host {
        Host::new(true)
    }

    fn float(host: &Host, id: NodeId, component: &str, member: &str) -> Option<f64> {
        host.scene()
            .node(id)?
            .component(component)?
            .field(member)?
            .as_float()
    }

    #[rstest]
    fn seeds_camera_and_directional_light(host: Host) {
        let light = host.resolve("Directional Light", false).expect("light");
        let node = host.scene().node(light).expect("node");
        let kind = node.component("Light").and_then(|light| light.field("type"));
        assert_eq!(kind.map(ToString::to_string).as_deref(), Some("Directional"));
        let camera = host.resolve("Main Camera", false).expect("camera");
        assert_eq!(host.scene().node(camera).map(Node::tag), Some("MainCamera"));
    }

    #[rstest]
    fn accessor_clamps_light_intensity(mut host: Host) {
        let light = host.resolve("Directional Light", false).expect("light");
        let property = PropertyValue::new("intensity", WireValue::Float(-2.0));
        let outcomes = host
            .modify_properties(light, Some("Light"), &[property])
            .expect("light component");
        assert_eq!(outcomes[0].result, Ok(AppliedVia::Accessor));
        assert_eq!(float(&host, light, "Light", "intensity"), Some(0.0));
    }

    #[rstest]
    fn raw_fields_take_writes_without_accessor(mut host: Host) {
        let light = host.resolve("Directional Light", false).expect("light");
        let property = PropertyValue::new("shadows", WireValue::String("soft".into()));
        let outcomes = host
            .modify_properties(light, Some("Light"), &[property])
            .expect("light component");
        assert_eq!(outcomes[0].result, Ok(AppliedVia::Field));
    }

    #[rstest]
    fn undefined_tags_are_rejected(mut host: Host) {
        let camera = host.resolve("Main Camera", false).expect("camera");
        let property = PropertyValue::new("tag", WireValue::String("Enemy".into()));
        let outcomes = host
            .modify_properties(camera, None, &[property])
            .expect("node");
        assert!(outcomes[0].result.is_err());
        host.tags_mut().create("Enemy");
        let property = PropertyValue::new("tag", WireValue::String("Enemy".into()));
        let outcomes = host
            .modify_properties(camera, None, &[property])
            .expect("node");
        assert!(outcomes[0].result.is_ok());
    }

    #[rstest]
    fn create_reports_unknown_components_but_keeps_object(mut host: Host) {
        let spec = CreateSpec {
            name: "Crate".into(),
            components: vec!["Rigidbody".into(), "Teleporter".into()],
            ..CreateSpec::default()
        };
        let created = host.create_object(&spec).expect("created");
        assert_eq!(created.failures.len(), 1);
        assert_eq!(created.failures[0].0, "Teleporter");
        assert!(
            host.scene()
                .node(created.id)
                .and_then(|node| node.component("Rigidbody"))
                .is_some()
        );
    }

    #[rstest]
    fn create_with_missing_parent_creates_nothing(mut host: Host) {
        let before = host.scene().len();
        let spec = CreateSpec {
            name: "Orphan".into(),
            parent: Some("Nowhere".into()),
            ..CreateSpec::default()
        };
        let error = host.create_object(&spec).expect_err("missing parent");
        assert_eq!(error, BridgeError::not_found("Nowhere"));
        assert_eq!(host.scene().len(), before);
    }

    #[rstest]
    fn transform_cannot_be_removed(mut host: Host) {
        let camera = host.resolve("Main Camera", false).expect("camera");
        let operation = Operation::RemoveMember {
            type_name: "transform".into(),
        };
        assert!(matches!(
            host.apply(camera, &operation),
            Err(BridgeError::InvalidState { .. })
        ));
    }

    #[rstest]
    fn layer_out_of_range_is_a_coercion_failure(mut host: Host) {
        let camera = host.resolve("Main Camera", false).expect("camera");
        let operation = Operation::ModifyProperty {
            component: None,
            property: PropertyValue::new("layer", WireValue::Int(40)),
        };
        assert!(matches!(
            host.apply(camera, &operation),
            Err(BridgeError::TypeCoercion { .. })
        ));
    }
}
