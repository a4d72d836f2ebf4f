//! Selection requests: literal fields mixed with fragment references.
//!
//! Keys that start with the sentinel prefix (`$` unless configured otherwise)
//! are fragment references. The prefix is inspected exactly once, when a key
//! crosses into the crate, and from then on an entry is either a
//! [`SelectionEntry::Literal`] or a [`SelectionEntry::FragmentRef`].

use std::fmt;

use serde_json::Value as JsonValue;
use smol_str::SmolStr;

use crate::error::{SelectionError, SelectionResult};
use crate::value::{Selection, SelectionValue, json_kind};

/// Sentinel used when no configuration says otherwise.
pub const DEFAULT_PREFIX: char = '$';

/// Name of a fragment, stored without its sentinel prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentName(SmolStr);

impl FragmentName {
    /// Create a fragment name. A leading `$` is stripped if present.
    ///
    /// Any other configured prefix is kept as part of the name; a
    /// [`Selector`](crate::Selector) using that prefix still resolves it.
    /// Use [`parse`](Self::parse) to strip a specific prefix.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self(SmolStr::new(
            name.strip_prefix(DEFAULT_PREFIX).unwrap_or(name),
        ))
    }

    /// Parse a key, returning a name only if it starts with `prefix`.
    pub fn parse(key: &str, prefix: char) -> Option<Self> {
        key.strip_prefix(prefix).map(|name| Self(SmolStr::new(name)))
    }

    /// The bare name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key as it would be written with the given prefix.
    pub fn to_key(&self, prefix: char) -> String {
        format!("{}{}", prefix, self.0)
    }
}

/// Formats with the default `$` prefix; see [`FragmentName::to_key`] for others.
impl fmt::Display for FragmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DEFAULT_PREFIX, self.0)
    }
}

impl From<&str> for FragmentName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FragmentName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One entry of a selection request or fragment body.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEntry {
    /// A plain field (or relation) with its value.
    Literal {
        /// Field name.
        field: SmolStr,
        /// Field value, passed through unchanged.
        value: SelectionValue,
    },
    /// A reference to another fragment by name.
    FragmentRef {
        /// Referenced fragment.
        name: FragmentName,
    },
}

impl SelectionEntry {
    /// Create a literal entry.
    pub fn literal(field: impl Into<SmolStr>, value: impl Into<SelectionValue>) -> Self {
        Self::Literal {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a fragment reference entry.
    pub fn fragment(name: impl Into<FragmentName>) -> Self {
        Self::FragmentRef { name: name.into() }
    }

    /// Classify a raw key/value pair.
    ///
    /// The value of a fragment key is ignored: `$a: false` still refers to `$a`.
    pub fn from_key(key: &str, value: &JsonValue, prefix: char) -> Self {
        match FragmentName::parse(key, prefix) {
            Some(name) => Self::FragmentRef { name },
            None => Self::Literal {
                field: SmolStr::new(key),
                value: SelectionValue::from_json(value),
            },
        }
    }

    /// Whether this entry is a fragment reference.
    pub fn is_fragment_ref(&self) -> bool {
        matches!(self, Self::FragmentRef { .. })
    }
}

/// An ordered list of selection entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionRequest {
    entries: Vec<SelectionEntry>,
}

impl SelectionRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object using the default `$` prefix.
    pub fn from_json(value: &JsonValue) -> SelectionResult<Self> {
        Self::from_json_with_prefix(value, DEFAULT_PREFIX)
    }

    /// Parse a JSON object, treating keys that start with `prefix` as fragment references.
    pub fn from_json_with_prefix(value: &JsonValue, prefix: char) -> SelectionResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            SelectionError::invalid_request(
                "<root>",
                format!("expected an object, found {}", json_kind(value)),
            )
        })?;

        Ok(Self {
            entries: map
                .iter()
                .map(|(key, value)| SelectionEntry::from_key(key, value, prefix))
                .collect(),
        })
    }

    /// Add a boolean field.
    pub fn field(self, name: impl Into<SmolStr>, include: bool) -> Self {
        self.entry(SelectionEntry::literal(name, include))
    }

    /// Add a nested relation selection.
    pub fn relation(self, name: impl Into<SmolStr>, selection: Selection) -> Self {
        self.entry(SelectionEntry::literal(name, selection))
    }

    /// Add a literal with an arbitrary value.
    pub fn value(self, name: impl Into<SmolStr>, value: impl Into<SelectionValue>) -> Self {
        self.entry(SelectionEntry::literal(name, value))
    }

    /// Reference a fragment.
    pub fn fragment(self, name: impl Into<FragmentName>) -> Self {
        self.entry(SelectionEntry::fragment(name))
    }

    /// Append an entry.
    pub fn entry(mut self, entry: SelectionEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Append an entry in place.
    pub fn push(&mut self, entry: SelectionEntry) {
        self.entries.push(entry);
    }

    /// Entries in request order.
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    /// Iterate over the referenced fragment names.
    pub fn fragment_refs(&self) -> impl Iterator<Item = &FragmentName> {
        self.entries.iter().filter_map(|entry| match entry {
            SelectionEntry::FragmentRef { name } => Some(name),
            SelectionEntry::Literal { .. } => None,
        })
    }

    /// Iterate over the literal fields.
    pub fn literals(&self) -> impl Iterator<Item = (&SmolStr, &SelectionValue)> {
        self.entries.iter().filter_map(|entry| match entry {
            SelectionEntry::Literal { field, value } => Some((field, value)),
            SelectionEntry::FragmentRef { .. } => None,
        })
    }

    /// Whether any entry references a fragment.
    pub fn has_fragment_refs(&self) -> bool {
        self.entries.iter().any(SelectionEntry::is_fragment_ref)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Selection> for SelectionRequest {
    fn from(selection: Selection) -> Self {
        selection
            .into_iter()
            .map(|(field, value)| SelectionEntry::Literal { field, value })
            .collect()
    }
}

impl FromIterator<SelectionEntry> for SelectionRequest {
    fn from_iter<T: IntoIterator<Item = SelectionEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<&JsonValue> for SelectionRequest {
    type Error = SelectionError;

    fn try_from(value: &JsonValue) -> SelectionResult<Self> {
        Self::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fragment_name_strips_prefix() {
        assert_eq!(FragmentName::new("$user").as_str(), "user");
        assert_eq!(FragmentName::new("user").as_str(), "user");
        assert_eq!(FragmentName::new("user").to_string(), "$user");
        assert_eq!(FragmentName::new("user").to_key('@'), "@user");
    }

    #[test]
    fn test_fragment_name_parse() {
        assert_eq!(FragmentName::parse("$a", '$'), Some(FragmentName::new("a")));
        assert_eq!(FragmentName::parse("a", '$'), None);
        assert_eq!(FragmentName::parse("@a", '@'), Some(FragmentName::new("a")));
        assert_eq!(FragmentName::parse("$a", '@'), None);
    }

    #[test]
    fn test_from_json_tags_entries_in_order() {
        let request = SelectionRequest::from_json(&json!({
            "someField": true,
            "$a": true,
            "posts": { "select": { "id": true } }
        }))
        .unwrap();

        assert_eq!(
            request.entries(),
            &[
                SelectionEntry::literal("someField", true),
                SelectionEntry::fragment("a"),
                SelectionEntry::literal(
                    "posts",
                    Selection::new().relation("select", Selection::new().field("id", true))
                ),
            ]
        );
        assert!(request.has_fragment_refs());
    }

    #[test]
    fn test_fragment_value_is_ignored() {
        let request = SelectionRequest::from_json(&json!({ "$a": false })).unwrap();
        assert_eq!(request.entries(), &[SelectionEntry::fragment("a")]);
    }

    #[test]
    fn test_custom_prefix() {
        let request =
            SelectionRequest::from_json_with_prefix(&json!({ "@a": true, "$b": true }), '@')
                .unwrap();
        assert_eq!(request.fragment_refs().count(), 1);
        assert_eq!(request.literals().count(), 1);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = SelectionRequest::from_json(&json!("nope")).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidRequest { .. }));
    }

    #[test]
    fn test_builder() {
        let request = SelectionRequest::new()
            .field("id", true)
            .fragment("$basics")
            .value("take", JsonValue::from(3));

        assert_eq!(request.len(), 3);
        assert_eq!(
            request.fragment_refs().collect::<Vec<_>>(),
            vec![&FragmentName::new("basics")]
        );
    }
}
