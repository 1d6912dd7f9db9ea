//! Turns a [`ParsedCommand`] into a typed [`Command`].
//!
//! Numeric triples and numbers are parsed leniently: a malformed value
//! leaves the field unset instead of failing the command.

use crate::dispatch::{BridgeError, OutputFormat, ReadOptions, parse_select};
use crate::host::CreateSpec;
use crate::mutation::{PropertyValue, Vector3, WireValue};

use super::parsed::ParsedCommand;

/// `find` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindCommand {
    /// Search root; `None` searches the whole graph.
    pub root: Option<String>,
    /// Required component type.
    pub component: Option<String>,
    /// Required tag.
    pub tag: Option<String>,
    /// Name pattern with `*` and `?`.
    pub name: Option<String>,
    /// Layer index or name.
    pub layer: Option<String>,
    /// Consider inactive objects.
    pub include_inactive: bool,
    /// Descend below the root's children.
    pub recursive: bool,
    /// Output shaping.
    pub options: ReadOptions,
}

/// One `--set` argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// `member=value` (node) or `Component.member=value`.
    Property {
        /// Component type, or `None` for the node itself.
        component: Option<String>,
        /// Member and inferred value.
        property: PropertyValue,
    },
    /// Text without `=`, kept for reporting.
    Invalid(String),
}

impl Assignment {
    /// Parses `key=value`; the value's type is inferred from its text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let Some((key, value)) = text.split_once('=') else {
            return Self::Invalid(text.to_owned());
        };
        let key = key.trim();
        if key.is_empty() {
            return Self::Invalid(text.to_owned());
        }
        let (component, member) = match key.split_once('.') {
            Some((component, member)) => (Some(component.to_owned()), member),
            None => (None, key),
        };
        Self::Property {
            component,
            property: PropertyValue::new(member, WireValue::infer(value)),
        }
    }
}

/// `modify` arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyCommand {
    /// Target references.
    pub targets: Vec<String>,
    /// Components to attach.
    pub add: Vec<String>,
    /// Components to detach.
    pub remove: Vec<String>,
    /// Member assignments in order.
    pub set: Vec<Assignment>,
    /// New position.
    pub position: Option<Vector3>,
    /// New rotation.
    pub rotation: Option<Vector3>,
    /// New scale.
    pub scale: Option<Vector3>,
}

/// `delete` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteCommand {
    /// Target references.
    pub targets: Vec<String>,
    /// Include inactive objects when resolving.
    pub force: bool,
    /// Remove whole subtrees.
    pub recursive: bool,
}

/// `get` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetCommand {
    /// Target reference.
    pub target: String,
    /// Output shaping.
    pub options: ReadOptions,
}

/// A typed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Query the graph.
    Find(FindCommand),
    /// Create one object.
    Create(CreateSpec),
    /// Mutate objects.
    Modify(ModifyCommand),
    /// Remove objects.
    Delete(DeleteCommand),
    /// Read one object.
    Get(GetCommand),
    /// List the grammar.
    Help,
}

impl Command {
    /// Builds the command for `parsed`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedRequest`] when a required target or
    /// name is missing, or `modify` names no change.
    pub fn build(parsed: &ParsedCommand) -> Result<Self, BridgeError> {
        match parsed.verb() {
            "find" => Ok(Self::Find(find(parsed))),
            "create" => create(parsed).map(Self::Create),
            "modify" => modify(parsed).map(Self::Modify),
            "delete" => delete(parsed).map(Self::Delete),
            "get" => get(parsed).map(Self::Get),
            "help" => Ok(Self::Help),
            verb => Err(BridgeError::unknown_verb(verb)),
        }
    }
}

fn vector(parsed: &ParsedCommand, flag: &str) -> Option<Vector3> {
    parsed.flag(flag).and_then(Vector3::parse)
}

fn list(parsed: &ParsedCommand, flag: &str) -> Vec<String> {
    parsed
        .flag_values(flag)
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn read_options(parsed: &ParsedCommand) -> ReadOptions {
    ReadOptions {
        select: parsed.flag("select").and_then(parse_select),
        depth: None,
        format: parsed
            .flag("format")
            .and_then(OutputFormat::parse)
            .unwrap_or_default(),
        limit: parsed.flag("limit").and_then(|limit| limit.parse().ok()),
        precision: parsed.flag("precision").and_then(|places| places.parse().ok()),
    }
}

fn find(parsed: &ParsedCommand) -> FindCommand {
    let root = parsed
        .flag("parent")
        .map(str::to_owned)
        .or_else(|| parsed.positional().first().cloned())
        .filter(|root| root != ".");
    let mut options = read_options(parsed);
    if parsed.has_flag("names-only") {
        options.format = OutputFormat::NamesOnly;
    }
    FindCommand {
        root,
        component: parsed.flag("component").map(str::to_owned),
        tag: parsed.flag("tag").map(str::to_owned),
        name: parsed.flag("name").map(str::to_owned),
        layer: parsed.flag("layer").map(str::to_owned),
        include_inactive: parsed.has_flag("inactive"),
        recursive: !parsed.has_flag("no-recursive"),
        options,
    }
}

fn create(parsed: &ParsedCommand) -> Result<CreateSpec, BridgeError> {
    let name = parsed
        .positional()
        .first()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| BridgeError::malformed("create requires a name"))?;
    Ok(CreateSpec {
        name: name.clone(),
        parent: parsed.flag("parent").map(str::to_owned),
        position: vector(parsed, "position"),
        rotation: vector(parsed, "rotation"),
        scale: vector(parsed, "scale"),
        components: list(parsed, "components"),
        active: None,
        tag: parsed.flag("tag").map(str::to_owned),
        layer: parsed.flag("layer").map(str::to_owned),
    })
}

fn targets(parsed: &ParsedCommand, verb: &str) -> Result<Vec<String>, BridgeError> {
    if parsed.positional().is_empty() {
        return Err(BridgeError::malformed(format!(
            "{verb} requires at least one target"
        )));
    }
    Ok(parsed.positional().to_vec())
}

fn modify(parsed: &ParsedCommand) -> Result<ModifyCommand, BridgeError> {
    let command = ModifyCommand {
        targets: targets(parsed, "modify")?,
        add: list(parsed, "add"),
        remove: list(parsed, "remove"),
        set: parsed
            .flag_values("set")
            .into_iter()
            .map(Assignment::parse)
            .collect(),
        position: vector(parsed, "position"),
        rotation: vector(parsed, "rotation"),
        scale: vector(parsed, "scale"),
    };
    let changes = ["add", "remove", "set", "position", "rotation", "scale"];
    if !changes.iter().any(|flag| parsed.has_flag(flag)) {
        return Err(BridgeError::malformed(
            "modify requires at least one of --add, --remove, --set or --position",
        ));
    }
    Ok(command)
}

fn delete(parsed: &ParsedCommand) -> Result<DeleteCommand, BridgeError> {
    Ok(DeleteCommand {
        targets: targets(parsed, "delete")?,
        force: parsed.has_flag("force"),
        recursive: parsed.has_flag("recursive"),
    })
}

fn get(parsed: &ParsedCommand) -> Result<GetCommand, BridgeError> {
    let target = parsed
        .positional()
        .first()
        .cloned()
        .ok_or_else(|| BridgeError::malformed("get requires a target"))?;
    Ok(GetCommand {
        target,
        options: read_options(parsed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(line: &str) -> Result<Command, BridgeError> {
        Command::build(&ParsedCommand::parse(line)?)
    }

    #[test]
    fn malformed_triples_leave_position_unset() {
        let Ok(Command::Create(spec)) = build("create Foo --position notanumber,2,3") else {
            panic!("expected create");
        };
        assert_eq!(spec.name, "Foo");
        assert_eq!(spec.position, None);
    }

    #[test]
    fn create_splits_component_lists() {
        let Ok(Command::Create(spec)) = build("create Box -c Rigidbody,BoxCollider --scale 2,2,2")
        else {
            panic!("expected create");
        };
        assert_eq!(spec.components, vec!["Rigidbody", "BoxCollider"]);
        assert_eq!(spec.scale, Some(Vector3::new(2.0, 2.0, 2.0)));
    }

    #[test]
    fn find_dot_means_whole_graph() {
        let Ok(Command::Find(find)) = build("find . --names-only --no-recursive") else {
            panic!("expected find");
        };
        assert_eq!(find.root, None);
        assert!(!find.recursive);
        assert_eq!(find.options.format, OutputFormat::NamesOnly);
    }

    #[test]
    fn set_targets_components_and_nodes() {
        assert_eq!(
            Assignment::parse("Light.intensity=2.5"),
            Assignment::Property {
                component: Some("Light".into()),
                property: PropertyValue::new("intensity", WireValue::Float(2.5)),
            }
        );
        assert_eq!(
            Assignment::parse("active=false"),
            Assignment::Property {
                component: None,
                property: PropertyValue::new("active", WireValue::Bool(false)),
            }
        );
        assert_eq!(
            Assignment::parse("broken"),
            Assignment::Invalid("broken".into())
        );
    }

    #[test]
    fn modify_without_changes_is_malformed() {
        assert!(matches!(
            build("modify Cube"),
            Err(BridgeError::MalformedRequest { .. })
        ));
    }

    #[test]
    fn create_without_name_is_malformed() {
        assert!(matches!(
            build("create --position 1,2,3"),
            Err(BridgeError::MalformedRequest { .. })
        ));
    }
}
