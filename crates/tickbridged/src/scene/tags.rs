//! Tag and layer names.

/// Tags every scene starts with.
pub const BUILTIN_TAGS: &[&str] = &[
    "Untagged",
    "Respawn",
    "Finish",
    "EditorOnly",
    "MainCamera",
    "Player",
    "GameController",
];

/// Number of layer slots.
pub const LAYER_COUNT: usize = 32;

/// Defined tags plus the 32 layer slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagManager {
    tags: Vec<String>,
    layers: [Option<String>; LAYER_COUNT],
}

impl Default for TagManager {
    fn default() -> Self {
        let mut layers: [Option<String>; LAYER_COUNT] = Default::default();
        for (index, name) in [
            (0, "Default"),
            (1, "TransparentFX"),
            (2, "Ignore Raycast"),
            (4, "Water"),
            (5, "UI"),
        ] {
            layers[index] = Some(name.to_owned());
        }
        Self {
            tags: BUILTIN_TAGS.iter().map(|tag| (*tag).to_owned()).collect(),
            layers,
        }
    }
}

impl TagManager {
    /// Whether `tag` is defined (exact match).
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|known| known == tag)
    }

    /// Defines `tag`. Returns `false` if it already existed.
    pub fn create(&mut self, tag: &str) -> bool {
        if self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_owned());
        true
    }

    /// Defined tags in definition order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Resolves a layer given as an index (`"8"`) or a name (`"Water"`).
    #[must_use]
    pub fn layer_index(&self, reference: &str) -> Option<u8> {
        let reference = reference.trim();
        if let Ok(index) = reference.parse::<u8>() {
            return (usize::from(index) < LAYER_COUNT).then_some(index);
        }
        self.layers
            .iter()
            .position(|name| {
                name.as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(reference))
            })
            .and_then(|index| u8::try_from(index).ok())
    }

    /// Name of layer `index`, if one is assigned.
    #[must_use]
    pub fn layer_name(&self, index: u8) -> Option<&str> {
        self.layers.get(usize::from(index)).and_then(Option::as_deref)
    }
}
