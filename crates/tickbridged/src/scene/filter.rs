//! Selection predicates over the scene graph.

use strum::{Display, EnumString};

use super::{Node, NodeId, Scene, TagManager};

/// Attribute a [`FilterCriteria`] matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MatchType {
    /// Name, with `*` and `?` wildcards, case-insensitive.
    Name,
    /// Exact tag.
    Tag,
    /// Has a component of the given type.
    Component,
    /// Layer index or layer name.
    Layer,
}

/// Stateless selection predicate, built per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Restrict the search to descendants of this node.
    pub target_parent: Option<NodeId>,
    /// Primary attribute to match.
    pub match_type: Option<MatchType>,
    /// Value for [`Self::match_type`].
    pub match_value: Option<String>,
    /// Additionally require a component of this type.
    pub component_name: Option<String>,
    /// Consider inactive objects.
    pub include_inactive: bool,
    /// Descend below the direct children of the search root.
    pub recursive: bool,
    /// Further `(attribute, value)` pairs that must all match.
    pub additional: Vec<(MatchType, String)>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            target_parent: None,
            match_type: None,
            match_value: None,
            component_name: None,
            include_inactive: false,
            recursive: true,
            additional: Vec::new(),
        }
    }
}

impl FilterCriteria {
    fn predicates(&self) -> impl Iterator<Item = (MatchType, &str)> {
        let primary = self
            .match_type
            .zip(self.match_value.as_deref());
        let component = self
            .component_name
            .as_deref()
            .map(|name| (MatchType::Component, name));
        primary
            .into_iter()
            .chain(component)
            .chain(self.additional.iter().map(|(kind, value)| (*kind, value.as_str())))
    }

    /// Whether `node` satisfies every predicate. Activity is checked by
    /// [`Scene::find`].
    #[must_use]
    pub fn matches(&self, node: &Node, tags: &TagManager) -> bool {
        self.predicates().all(|(kind, value)| match kind {
            MatchType::Name => glob_match(value, node.name()),
            MatchType::Tag => node.tag() == value,
            MatchType::Component => node.component(value).is_some(),
            MatchType::Layer => tags.layer_index(value) == Some(node.layer()),
        })
    }
}

impl Scene {
    /// Nodes matching `criteria`, in creation order.
    #[must_use]
    pub fn find(&self, criteria: &FilterCriteria, tags: &TagManager) -> Vec<NodeId> {
        let candidates: Vec<NodeId> = match (criteria.target_parent, criteria.recursive) {
            (Some(parent), true) => self.descendants(parent),
            (Some(parent), false) => self
                .node(parent)
                .map(|node| node.children().to_vec())
                .unwrap_or_default(),
            (None, true) => self.ids().collect(),
            (None, false) => self.roots(),
        };
        candidates
            .into_iter()
            .filter(|id| criteria.include_inactive || self.active_in_hierarchy(*id))
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|node| criteria.matches(node, tags))
            })
            .collect()
    }
}

/// Case-insensitive glob match supporting `*` and `?`.
#[must_use]
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(c) if *c == '?' || *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}
