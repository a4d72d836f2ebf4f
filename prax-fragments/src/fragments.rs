//! Named fragment collections, before and after expansion.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{SelectionError, SelectionResult};
use crate::request::{DEFAULT_PREFIX, FragmentName, SelectionRequest};
use crate::value::{Selection, json_kind};

/// Fragment bodies as written, possibly referencing each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentDefinitions {
    fragments: IndexMap<FragmentName, SelectionRequest>,
}

impl FragmentDefinitions {
    /// Create an empty set of definitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "$name": { ... }, ... }` using the default `$` prefix.
    pub fn from_json(value: &JsonValue) -> SelectionResult<Self> {
        Self::from_json_with_prefix(value, DEFAULT_PREFIX)
    }

    /// Parse a JSON mapping of fragment keys to fragment bodies.
    ///
    /// Every top-level key must start with `prefix`.
    pub fn from_json_with_prefix(value: &JsonValue, prefix: char) -> SelectionResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            SelectionError::invalid_request(
                "<root>",
                format!("expected an object, found {}", json_kind(value)),
            )
        })?;

        let mut definitions = Self::new();
        for (key, body) in map {
            let name = FragmentName::parse(key, prefix).ok_or_else(|| {
                SelectionError::InvalidFragmentKey {
                    key: key.clone(),
                    prefix,
                }
            })?;
            let body = SelectionRequest::from_json_with_prefix(body, prefix).map_err(|_| {
                SelectionError::invalid_request(
                    key.as_str(),
                    format!("expected an object, found {}", json_kind(body)),
                )
            })?;
            definitions.fragments.insert(name, body);
        }
        Ok(definitions)
    }

    /// Parse definitions from a JSON string.
    pub fn from_json_str(text: &str) -> SelectionResult<Self> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Add a fragment, replacing any previous body with the same name.
    pub fn define(mut self, name: impl Into<FragmentName>, body: SelectionRequest) -> Self {
        self.insert(name, body);
        self
    }

    /// Insert a fragment, returning the body it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<FragmentName>,
        body: SelectionRequest,
    ) -> Option<SelectionRequest> {
        self.fragments.insert(name.into(), body)
    }

    /// Look up a fragment body.
    pub fn get(&self, name: &FragmentName) -> Option<&SelectionRequest> {
        self.fragments.get(name)
    }

    /// Check if a fragment is defined.
    pub fn contains(&self, name: &FragmentName) -> bool {
        self.fragments.contains_key(name)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FragmentName, &SelectionRequest)> {
        self.fragments.iter()
    }

    /// Fragment names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &FragmentName> {
        self.fragments.keys()
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if there are no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Whether no fragment body references another fragment.
    pub fn is_expanded(&self) -> bool {
        self.fragments
            .values()
            .all(|body| !body.has_fragment_refs())
    }
}

impl FromIterator<(FragmentName, SelectionRequest)> for FragmentDefinitions {
    fn from_iter<T: IntoIterator<Item = (FragmentName, SelectionRequest)>>(iter: T) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

/// Fragments with every reference resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedFragments {
    fragments: IndexMap<FragmentName, Selection>,
}

impl ExpandedFragments {
    pub(crate) fn from_map(fragments: IndexMap<FragmentName, Selection>) -> Self {
        Self { fragments }
    }

    /// Look up an expanded fragment.
    pub fn get(&self, name: &FragmentName) -> Option<&Selection> {
        self.fragments.get(name)
    }

    /// Check if a fragment is present.
    pub fn contains(&self, name: &FragmentName) -> bool {
        self.fragments.contains_key(name)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FragmentName, &Selection)> {
        self.fragments.iter()
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if there are no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Turn the expanded fragments back into reference-free definitions.
    pub fn to_definitions(&self) -> FragmentDefinitions {
        self.fragments
            .iter()
            .map(|(name, selection)| (name.clone(), SelectionRequest::from(selection.clone())))
            .collect()
    }

    /// Render as `{ "$name": { ... } }` with the given prefix.
    pub fn to_json(&self, prefix: char) -> JsonValue {
        JsonValue::Object(
            self.fragments
                .iter()
                .map(|(name, selection)| (name.to_key(prefix), selection.to_json()))
                .collect(),
        )
    }
}
