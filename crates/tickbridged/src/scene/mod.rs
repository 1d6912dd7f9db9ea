//! In-memory reference host graph.
//!
//! The bridge never touches this state outside the coordinator. Nodes are
//! stored in creation order; every node owns a `Transform`.

mod catalog;
mod editor;
mod filter;
mod tags;

use std::collections::BTreeMap;
use std::fmt;

pub use self::catalog::{Component, ComponentCatalog, FieldMap, TRANSFORM};
pub use self::editor::{BusySignal, EditorError, EditorState, PlayMode};
pub use self::filter::{FilterCriteria, MatchType, glob_match};
pub use self::tags::{BUILTIN_TAGS, LAYER_COUNT, TagManager};

use crate::mutation::{MemberTarget, NativeType, NativeValue, Vector3};

/// Type tag under which node-level accessors are registered.
pub const GAME_OBJECT: &str = "GameObject";

/// Stable node identifier, rendered as `#<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parses `#<n>`.
    #[must_use]
    pub fn parse(reference: &str) -> Option<Self> {
        reference
            .strip_prefix('#')
            .and_then(|digits| digits.parse().ok())
            .map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// One object of the host graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    active: bool,
    tag: String,
    layer: u8,
    components: Vec<Component>,
}

impl Node {
    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Display name; not unique.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Own activity flag.
    #[must_use]
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Layer index.
    #[must_use]
    pub const fn layer(&self) -> u8 {
        self.layer
    }

    /// Attached components; the first is always the `Transform`.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Component of type `name`, matched case-insensitively.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|component| component.type_name().eq_ignore_ascii_case(name))
    }

    /// Mutable component of type `name`.
    pub fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find(|component| component.type_name().eq_ignore_ascii_case(name))
    }

    /// Transform vector `member` (`position`, `rotation` or `scale`).
    #[must_use]
    pub fn transform(&self, member: &str) -> Vector3 {
        self.component(TRANSFORM)
            .and_then(|transform| transform.vector(member))
            .unwrap_or_default()
    }

    /// Attaches `component`. Fails if one of the same type is present.
    pub fn add_component(&mut self, component: Component) -> Result<(), Component> {
        if self.component(component.type_name()).is_some() {
            return Err(component);
        }
        self.components.push(component);
        Ok(())
    }

    /// Detaches the component of type `name`.
    pub fn remove_component(&mut self, name: &str) -> Option<Component> {
        let index = self
            .components
            .iter()
            .position(|component| component.type_name().eq_ignore_ascii_case(name))?;
        Some(self.components.remove(index))
    }

    /// Sets the own activity flag.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_tag(&mut self, tag: String) {
        self.tag = tag;
    }

    pub(crate) fn set_layer(&mut self, layer: u8) {
        self.layer = layer;
    }

    /// Writes a transform vector.
    pub fn set_transform(&mut self, member: &str, value: Vector3) {
        if let Some(transform) = self.component_mut(TRANSFORM) {
            transform.set(member, NativeValue::Vector3(value));
        }
    }
}

impl MemberTarget for Node {
    fn type_tag(&self) -> &str {
        GAME_OBJECT
    }

    fn field_type(&self, _name: &str) -> Option<NativeType> {
        None
    }

    fn write_field(&mut self, _name: &str, _value: NativeValue) {}
}

/// The host graph.
#[derive(Debug, Clone)]
pub struct Scene {
    name: String,
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Scene name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Root ids in creation order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.parent.is_none())
            .map(Node::id)
            .collect()
    }

    /// Node lookup.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable node lookup.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Creates an active, untagged node owning `transform`. Returns `None`
    /// when `parent` does not exist.
    pub fn create(&mut self, name: &str, parent: Option<NodeId>, transform: Component) -> Option<NodeId> {
        if let Some(parent) = parent {
            self.nodes.get(&parent)?;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.to_owned(),
                parent,
                children: Vec::new(),
                active: true,
                tag: "Untagged".to_owned(),
                layer: 0,
                components: vec![transform],
            },
        );
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.push(id);
        }
        Some(id)
    }

    /// Whether the node and all of its ancestors are active.
    #[must_use]
    pub fn active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.nodes.get(&id) {
                Some(node) if node.active => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Resolves `#<id>`, a name, or a `Parent/Child` path. Name matches
    /// return the first node in creation order. Inactive nodes are skipped
    /// unless `include_inactive` is set, whichever form the reference takes.
    #[must_use]
    pub fn resolve(&self, reference: &str, include_inactive: bool) -> Option<NodeId> {
        let reference = reference.trim();
        if let Some(id) = NodeId::parse(reference) {
            let visible = include_inactive || self.active_in_hierarchy(id);
            return (self.nodes.contains_key(&id) && visible).then_some(id);
        }
        let visible = |node: &&Node| include_inactive || self.active_in_hierarchy(node.id);
        if let Some(node) = self
            .nodes
            .values()
            .filter(visible)
            .find(|node| node.name == reference)
        {
            return Some(node.id);
        }
        if reference.contains('/') {
            return self.resolve_path(reference, include_inactive);
        }
        None
    }

    fn resolve_path(&self, path: &str, include_inactive: bool) -> Option<NodeId> {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        let first = segments.next()?;
        let mut current = self
            .roots()
            .into_iter()
            .find(|id| self.nodes.get(id).is_some_and(|node| node.name == first))?;
        for segment in segments {
            current = self.nodes.get(&current)?.children.iter().copied().find(|id| {
                self.nodes.get(id).is_some_and(|node| node.name == segment)
            })?;
        }
        (include_inactive || self.active_in_hierarchy(current)).then_some(current)
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(&id)
            .map(|node| node.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            found.push(next);
            if let Some(node) = self.nodes.get(&next) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        found
    }

    /// Slash-separated path from the root.
    #[must_use]
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(&id) else {
                break;
            };
            segments.push(node.name.as_str());
            current = node.parent;
        }
        segments.reverse();
        segments.join("/")
    }

    /// Removes `id`. With `recursive` the whole subtree goes; otherwise the
    /// children are re-parented to the removed node's parent. Returns the
    /// removed ids.
    pub fn remove(&mut self, id: NodeId, recursive: bool) -> Vec<NodeId> {
        let Some(node) = self.nodes.remove(&id) else {
            return Vec::new();
        };
        if let Some(parent) = node.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.retain(|child| *child != id);
        }
        let mut removed = vec![id];
        if recursive {
            let mut stack = node.children;
            while let Some(next) = stack.pop() {
                if let Some(child) = self.nodes.remove(&next) {
                    stack.extend(child.children);
                    removed.push(next);
                }
            }
        } else {
            for child in &node.children {
                if let Some(child) = self.nodes.get_mut(child) {
                    child.parent = node.parent;
                }
            }
            if let Some(parent) = node.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
                parent.children.extend(node.children.iter().copied());
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    fn transform() -> Component {
        ComponentCatalog::standard()
            .instantiate(TRANSFORM)
            .expect("transform")
    }

    struct Fixture {
        scene: Scene,
        root: NodeId,
        child: NodeId,
        grandchild: NodeId,
    }

    #[fixture]
    fn tree() -> Fixture {
        let mut scene = Scene::new("Test");
        let root = scene.create("Root", None, transform()).expect("root");
        let child = scene.create("Child", Some(root), transform()).expect("child");
        let grandchild = scene
            .create("Leaf", Some(child), transform())
            .expect("grandchild");
        Fixture {
            scene,
            root,
            child,
            grandchild,
        }
    }

    #[rstest]
    fn resolves_names_ids_and_paths(tree: Fixture) {
        assert_eq!(tree.scene.resolve("Child", false), Some(tree.child));
        assert_eq!(tree.scene.resolve(&tree.root.to_string(), false), Some(tree.root));
        assert_eq!(tree.scene.resolve("Root/Child/Leaf", false), Some(tree.grandchild));
        assert_eq!(tree.scene.resolve("Nope", false), None);
    }

    #[rstest]
    fn inactive_ancestors_hide_descendants(mut tree: Fixture) {
        tree.scene
            .node_mut(tree.root)
            .expect("root")
            .set_active(false);
        assert_eq!(tree.scene.resolve("Leaf", false), None);
        assert_eq!(tree.scene.resolve("Leaf", true), Some(tree.grandchild));
    }

    #[rstest]
    fn id_references_respect_activity(mut tree: Fixture) {
        let reference = tree.grandchild.to_string();
        tree.scene
            .node_mut(tree.child)
            .expect("child")
            .set_active(false);
        assert_eq!(tree.scene.resolve(&reference, false), None);
        assert_eq!(tree.scene.resolve(&reference, true), Some(tree.grandchild));
        assert_eq!(tree.scene.resolve(&tree.root.to_string(), false), Some(tree.root));
    }

    #[rstest]
    fn non_recursive_remove_reparents_children(mut tree: Fixture) {
        let removed = tree.scene.remove(tree.child, false);
        assert_eq!(removed, vec![tree.child]);
        let leaf = tree.scene.node(tree.grandchild).expect("leaf survives");
        assert_eq!(leaf.parent(), Some(tree.root));
        assert_eq!(
            tree.scene.node(tree.root).expect("root").children(),
            &[tree.grandchild]
        );
    }

    #[rstest]
    fn recursive_remove_drops_subtree(mut tree: Fixture) {
        let removed = tree.scene.remove(tree.child, true);
        assert_eq!(removed.len(), 2);
        assert_eq!(tree.scene.len(), 1);
    }

    #[rstest]
    fn create_under_missing_parent_fails(mut tree: Fixture) {
        let ghost = NodeId(99);
        assert!(tree.scene.create("Orphan", Some(ghost), transform()).is_none());
        assert_eq!(tree.scene.len(), 3);
    }

    #[rstest]
    fn find_filters_by_name_and_scope(tree: Fixture) {
        let tags = TagManager::default();
        let criteria = FilterCriteria {
            target_parent: Some(tree.root),
            match_type: Some(MatchType::Name),
            match_value: Some("*a*".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(tree.scene.find(&criteria, &tags), vec![tree.grandchild]);
        let shallow = FilterCriteria {
            recursive: false,
            ..criteria
        };
        assert!(tree.scene.find(&shallow, &tags).is_empty());
    }

    #[rstest]
    fn paths_join_ancestor_names(tree: Fixture) {
        assert_eq!(tree.scene.path(tree.grandchild), "Root/Child/Leaf");
    }
}
