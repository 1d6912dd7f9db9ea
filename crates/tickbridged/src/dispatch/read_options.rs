//! Read options for query endpoints.
//!
//! Every option is optional and parsed leniently: an unparseable value is
//! treated as absent rather than failing the request.

use crate::wire::QueryMap;

/// Shape of read results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Every selected field.
    #[default]
    Full,
    /// Names only.
    NamesOnly,
    /// Only whether the target exists.
    ExistsOnly,
}

impl OutputFormat {
    /// Parses `full`, `names_only` or `exists_only` (dashes accepted).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full" => Some(Self::Full),
            "names_only" | "names" => Some(Self::NamesOnly),
            "exists_only" | "exists" => Some(Self::ExistsOnly),
            _ => None,
        }
    }
}

/// Field selection, depth limit, result limit, numeric precision and output
/// format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Fields to keep; `None` keeps every field.
    pub select: Option<Vec<String>>,
    /// Maximum hierarchy depth below the roots.
    pub depth: Option<usize>,
    /// Output shape.
    pub format: OutputFormat,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Decimal places for floats.
    pub precision: Option<u32>,
}

impl ReadOptions {
    /// Builds options from `select`, `depth`, `format`, `limit` and
    /// `precision` query parameters.
    #[must_use]
    pub fn from_query(query: &QueryMap) -> Self {
        let get = |key: &str| query.get(key).map(String::as_str);
        Self {
            select: get("select").and_then(parse_select),
            depth: get("depth").and_then(|value| value.trim().parse().ok()),
            format: get("format")
                .and_then(OutputFormat::parse)
                .unwrap_or_default(),
            limit: get("limit").and_then(|value| value.trim().parse().ok()),
            precision: get("precision").and_then(|value| value.trim().parse().ok()),
        }
    }

    /// Whether `field` survives the selection. `name` always does.
    #[must_use]
    pub fn selects(&self, field: &str) -> bool {
        field == "name"
            || self
                .select
                .as_ref()
                .is_none_or(|fields| fields.iter().any(|selected| selected == field))
    }
}

/// Splits `a,b , c` into field names; an empty list means no selection.
#[must_use]
pub fn parse_select(text: &str) -> Option<Vec<String>> {
    let fields: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_owned)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::parse_query;

    #[test]
    fn parses_every_option() {
        let query = parse_query("select=name,position&depth=2&format=names_only&limit=5&precision=1");
        let options = ReadOptions::from_query(&query);
        assert_eq!(
            options.select,
            Some(vec!["name".to_owned(), "position".to_owned()])
        );
        assert_eq!(options.depth, Some(2));
        assert_eq!(options.format, OutputFormat::NamesOnly);
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.precision, Some(1));
    }

    #[test]
    fn ignores_unparseable_values() {
        let query = parse_query("depth=deep&format=fancy&limit=-3&precision=x");
        assert_eq!(ReadOptions::from_query(&query), ReadOptions::default());
    }

    #[test]
    fn selection_always_keeps_name() {
        let options = ReadOptions {
            select: Some(vec!["tag".into()]),
            ..ReadOptions::default()
        };
        assert!(options.selects("name"));
        assert!(options.selects("tag"));
        assert!(!options.selects("position"));
    }
}
