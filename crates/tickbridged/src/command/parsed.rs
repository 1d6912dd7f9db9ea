//! Verb, positional arguments and flags of one command line.

use crate::dispatch::BridgeError;

use super::tokenizer::tokenize;

/// A flag a verb recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    /// Long name without the leading `--`.
    pub name: &'static str,
    /// Single-letter short form.
    pub short: Option<char>,
    /// Boolean flags never consume the next token.
    pub boolean: bool,
}

const fn value(name: &'static str, short: Option<char>) -> FlagSpec {
    FlagSpec {
        name,
        short,
        boolean: false,
    }
}

const fn switch(name: &'static str, short: Option<char>) -> FlagSpec {
    FlagSpec {
        name,
        short,
        boolean: true,
    }
}

const FIND_FLAGS: &[FlagSpec] = &[
    value("component", Some('c')),
    value("tag", Some('t')),
    value("name", Some('n')),
    value("layer", Some('l')),
    value("parent", Some('p')),
    value("limit", None),
    value("format", Some('f')),
    value("select", Some('s')),
    value("precision", None),
    switch("inactive", None),
    switch("no-recursive", None),
    switch("names-only", None),
];

const CREATE_FLAGS: &[FlagSpec] = &[
    value("position", Some('p')),
    value("rotation", Some('r')),
    value("scale", Some('s')),
    value("parent", None),
    value("components", Some('c')),
    value("tag", None),
    value("layer", None),
];

const MODIFY_FLAGS: &[FlagSpec] = &[
    value("add", Some('a')),
    value("remove", Some('r')),
    value("set", Some('s')),
    value("position", Some('p')),
    value("rotation", None),
    value("scale", None),
];

const DELETE_FLAGS: &[FlagSpec] = &[switch("force", Some('f')), switch("recursive", Some('r'))];

const GET_FLAGS: &[FlagSpec] = &[
    value("select", Some('s')),
    value("format", Some('f')),
    value("precision", None),
];

/// Verbs and the flags each recognises.
pub const VERBS: &[(&str, &[FlagSpec])] = &[
    ("find", FIND_FLAGS),
    ("create", CREATE_FLAGS),
    ("modify", MODIFY_FLAGS),
    ("delete", DELETE_FLAGS),
    ("get", GET_FLAGS),
    ("help", &[]),
];

/// One parsed command line; immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    verb: String,
    positional: Vec<String>,
    flags: Vec<(String, Option<String>)>,
    ignored: Vec<String>,
}

impl ParsedCommand {
    /// Parses `line`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedRequest`] for an empty line and
    /// [`BridgeError::UnknownVerb`] for a verb outside [`VERBS`].
    pub fn parse(line: &str) -> Result<Self, BridgeError> {
        let mut tokens = tokenize(line).into_iter();
        let verb = tokens
            .next()
            .filter(|verb| !verb.is_empty())
            .ok_or_else(|| BridgeError::malformed("empty command"))?
            .to_ascii_lowercase();
        let specs = VERBS
            .iter()
            .find(|(name, _)| *name == verb)
            .map(|(_, specs)| *specs)
            .ok_or_else(|| BridgeError::unknown_verb(verb.as_str()))?;

        let mut parsed = Self {
            verb,
            ..Self::default()
        };
        let mut tokens = tokens.peekable();
        while let Some(token) = tokens.next() {
            let Some((name, inline)) = flag_name(&token) else {
                parsed.positional.push(token);
                continue;
            };
            let spec = specs.iter().find(|spec| match &name {
                FlagName::Long(long) => spec.name == long.as_str(),
                FlagName::Short(short) => spec.short == Some(*short),
            });
            let takes_value = spec.is_none_or(|spec| !spec.boolean);
            let value = match inline {
                Some(value) => Some(value),
                None if takes_value => tokens.next_if(|next| !next.starts_with("--")),
                None => None,
            };
            match spec {
                Some(spec) => parsed.flags.push((spec.name.to_owned(), value)),
                None => parsed.ignored.push(token),
            }
        }
        Ok(parsed)
    }

    /// Lower-cased verb.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Non-flag arguments in order.
    #[must_use]
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Whether the flag appeared at all.
    #[must_use]
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|(flag, _)| flag == name)
    }

    /// Last value given for the flag.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .rev()
            .filter(|(flag, _)| flag == name)
            .find_map(|(_, value)| value.as_deref())
    }

    /// Every value given for the flag, in order.
    #[must_use]
    pub fn flag_values(&self, name: &str) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|(flag, _)| flag == name)
            .filter_map(|(_, value)| value.as_deref())
            .collect()
    }

    /// Flags the verb does not recognise, as written.
    #[must_use]
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }
}

enum FlagName {
    Long(String),
    Short(char),
}

/// Classifies `token`: `--name`, `--name=value` or `-x`. Anything else,
/// including `-1,2,3`, is a value.
fn flag_name(token: &str) -> Option<(FlagName, Option<String>)> {
    if let Some(long) = token.strip_prefix("--") {
        if long.is_empty() {
            return None;
        }
        return Some(match long.split_once('=') {
            Some((name, value)) => (FlagName::Long(name.to_ascii_lowercase()), Some(value.to_owned())),
            None => (FlagName::Long(long.to_ascii_lowercase()), None),
        });
    }
    let mut characters = token.strip_prefix('-')?.chars();
    match (characters.next(), characters.next()) {
        (Some(short), None) if short.is_ascii_alphabetic() => Some((FlagName::Short(short), None)),
        _ => None,
    }
}
