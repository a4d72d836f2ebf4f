//! The selection tree handed to the query layer, and its deep merge.
//!
//! A [`Selection`] is what Prax's `select`/`include` arguments look like once
//! every fragment has been resolved: field names mapped to `true`/`false`, or
//! to a nested selection for relations. Keys keep insertion order.
//!
//! ```rust
//! use prax_fragments::Selection;
//!
//! let mut base = Selection::new()
//!     .field("id", true)
//!     .relation("posts", Selection::new().relation("select", Selection::new().field("title", true)));
//! let extra = Selection::new()
//!     .relation("posts", Selection::new().relation("select", Selection::new().field("body", true)));
//!
//! base.merge(&extra);
//! assert_eq!(
//!     base.to_json(),
//!     serde_json::json!({ "id": true, "posts": { "select": { "title": true, "body": true } } })
//! );
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use smol_str::SmolStr;

use crate::error::{SelectionError, SelectionResult};

/// A single value in a selection object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectionValue {
    /// Include (`true`) or exclude (`false`) a field.
    Bool(bool),
    /// Nested selection for a relation (`{ select: { .. } }`).
    Nested(Selection),
    /// Any other relation argument, e.g. `take: 5` or `orderBy: [..]`.
    Arg(JsonValue),
}

impl SelectionValue {
    /// Parse a JSON value into a selection value.
    ///
    /// Booleans become leaves, objects become nested selections and anything
    /// else is carried through as an argument.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Object(map) => Self::Nested(Selection(
                map.iter()
                    .map(|(k, v)| (SmolStr::new(k), Self::from_json(v)))
                    .collect(),
            )),
            other => Self::Arg(other.clone()),
        }
    }

    /// Convert back into plain JSON.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Nested(selection) => selection.to_json(),
            Self::Arg(value) => value.clone(),
        }
    }

    /// The boolean flag, if this is a leaf.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The nested selection, if this is a relation.
    pub fn as_nested(&self) -> Option<&Selection> {
        match self {
            Self::Nested(selection) => Some(selection),
            _ => None,
        }
    }

    /// Merge `other` into `self`: nested objects are unioned recursively,
    /// arrays are concatenated, every other pair is replaced by `other`.
    pub fn merge_from(&mut self, other: &SelectionValue) {
        match (&mut *self, other) {
            (Self::Nested(ours), Self::Nested(theirs)) => ours.merge(theirs),
            (Self::Arg(JsonValue::Array(ours)), Self::Arg(JsonValue::Array(theirs))) => {
                ours.extend(theirs.iter().cloned());
            }
            (slot, value) => *slot = value.clone(),
        }
    }
}

impl From<bool> for SelectionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Selection> for SelectionValue {
    fn from(selection: Selection) -> Self {
        Self::Nested(selection)
    }
}

impl From<JsonValue> for SelectionValue {
    fn from(value: JsonValue) -> Self {
        Self::from_json(&value)
    }
}

/// An ordered mapping from field name to [`SelectionValue`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(IndexMap<SmolStr, SelectionValue>);

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object into a selection.
    pub fn from_json(value: &JsonValue) -> SelectionResult<Self> {
        match SelectionValue::from_json(value) {
            SelectionValue::Nested(selection) => Ok(selection),
            _ => Err(SelectionError::invalid_request(
                "<root>",
                format!("expected an object, found {}", json_kind(value)),
            )),
        }
    }

    /// Convert into the plain JSON object the query layer consumes.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect(),
        )
    }

    /// Add a boolean field.
    pub fn field(mut self, name: impl Into<SmolStr>, include: bool) -> Self {
        self.0.insert(name.into(), SelectionValue::Bool(include));
        self
    }

    /// Add a nested relation selection.
    pub fn relation(mut self, name: impl Into<SmolStr>, selection: Selection) -> Self {
        self.0.insert(name.into(), SelectionValue::Nested(selection));
        self
    }

    /// Add an arbitrary value.
    pub fn value(mut self, name: impl Into<SmolStr>, value: impl Into<SelectionValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<SmolStr>,
        value: impl Into<SelectionValue>,
    ) -> Option<SelectionValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<SelectionValue> {
        self.0.shift_remove(name)
    }

    /// Get a field's value.
    pub fn get(&self, name: &str) -> Option<&SelectionValue> {
        self.0.get(name)
    }

    /// Get a mutable reference to a field's value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SelectionValue> {
        self.0.get_mut(name)
    }

    /// Follow a path of relation names down the tree.
    pub fn get_path(&self, path: &[&str]) -> Option<&SelectionValue> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.get(segment)?.as_nested()?;
        }
        current.get(last)
    }

    /// Check if a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &SelectionValue)> {
        self.0.iter()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(SmolStr::as_str)
    }

    /// Copy every field of `other` into `self`, replacing whole values.
    pub fn extend_shallow(&mut self, other: &Selection) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Deep-merge `other` into `self`; `other` wins on conflicting leaves.
    pub fn merge(&mut self, other: &Selection) {
        for (name, value) in &other.0 {
            self.merge_value(name, value);
        }
    }

    /// Deep-merge a single field into `self`.
    pub fn merge_value(&mut self, name: &SmolStr, value: &SelectionValue) {
        match self.0.get_mut(name) {
            Some(existing) => existing.merge_from(value),
            None => {
                self.0.insert(name.clone(), value.clone());
            }
        }
    }

    /// Deep-merge a sequence of pieces, later pieces winning on leaves.
    pub fn merge_all<'a>(pieces: impl IntoIterator<Item = &'a Selection>) -> Selection {
        pieces.into_iter().fold(Selection::new(), |mut acc, piece| {
            acc.merge(piece);
            acc
        })
    }
}

impl<K: Into<SmolStr>, V: Into<SelectionValue>> FromIterator<(K, V)> for Selection {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Selection {
    type Item = (SmolStr, SelectionValue);
    type IntoIter = indexmap::map::IntoIter<SmolStr, SelectionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl TryFrom<&JsonValue> for Selection {
    type Error = SelectionError;

    fn try_from(value: &JsonValue) -> SelectionResult<Self> {
        Self::from_json(value)
    }
}

impl From<Selection> for JsonValue {
    fn from(selection: Selection) -> Self {
        selection.to_json()
    }
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sel(value: JsonValue) -> Selection {
        Selection::from_json(&value).unwrap()
    }

    #[test]
    fn test_from_json_classifies_values() {
        let selection = sel(json!({
            "id": true,
            "secret": false,
            "posts": { "take": 5, "select": { "title": true } }
        }));

        assert_eq!(selection.get("id"), Some(&SelectionValue::Bool(true)));
        assert_eq!(selection.get("secret").and_then(SelectionValue::as_bool), Some(false));
        assert_eq!(
            selection.get_path(&["posts", "take"]),
            Some(&SelectionValue::Arg(json!(5)))
        );
        assert_eq!(
            selection.get_path(&["posts", "select", "title"]),
            Some(&SelectionValue::Bool(true))
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Selection::from_json(&json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_to_json_preserves_order() {
        let selection = Selection::new().field("b", true).field("a", false);
        let keys: Vec<_> = selection.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(selection.to_json().to_string(), r#"{"b":true,"a":false}"#);
    }

    #[test]
    fn test_merge_leaf_last_wins() {
        let mut a = sel(json!({ "x": true }));
        a.merge(&sel(json!({ "x": false, "y": true })));
        assert_eq!(a.to_json(), json!({ "x": false, "y": true }));
    }

    #[test]
    fn test_merge_nested_union() {
        let mut a = sel(json!({ "rel": { "select": { "f1": true } } }));
        a.merge(&sel(json!({ "rel": { "select": { "f2": true } } })));
        assert_eq!(a.to_json(), json!({ "rel": { "select": { "f1": true, "f2": true } } }));
    }

    #[test]
    fn test_merge_leaf_replaced_by_object_and_back() {
        let mut a = sel(json!({ "rel": true }));
        a.merge(&sel(json!({ "rel": { "select": { "id": true } } })));
        assert_eq!(a.to_json(), json!({ "rel": { "select": { "id": true } } }));

        a.merge(&sel(json!({ "rel": true })));
        assert_eq!(a.to_json(), json!({ "rel": true }));
    }

    #[test]
    fn test_merge_concatenates_arrays() {
        let mut a = sel(json!({ "rel": { "orderBy": [{ "id": "asc" }] } }));
        a.merge(&sel(json!({ "rel": { "orderBy": [{ "name": "desc" }] } })));
        assert_eq!(
            a.to_json(),
            json!({ "rel": { "orderBy": [{ "id": "asc" }, { "name": "desc" }] } })
        );
    }

    #[test]
    fn test_extend_shallow_replaces_nested() {
        let mut a = sel(json!({ "rel": { "select": { "f1": true } } }));
        a.extend_shallow(&sel(json!({ "rel": { "select": { "f2": true } } })));
        assert_eq!(a.to_json(), json!({ "rel": { "select": { "f2": true } } }));
    }

    #[test]
    fn test_merge_all_is_fresh() {
        let a = sel(json!({ "rel": { "select": { "f1": true } } }));
        let mut merged = Selection::merge_all([&a]);
        merged.insert("extra", true);
        if let Some(SelectionValue::Nested(rel)) = merged.get_mut("rel") {
            rel.insert("take", JsonValue::from(1));
        }

        assert_eq!(a.to_json(), json!({ "rel": { "select": { "f1": true } } }));
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let selection = sel(json!({ "id": true, "posts": { "select": { "id": true } } }));
        let text = serde_json::to_string(&selection).unwrap();
        assert_eq!(text, r#"{"id":true,"posts":{"select":{"id":true}}}"#);
        let back: Selection = serde_json::from_str(&text).unwrap();
        assert_eq!(back, selection);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut selection = Selection::new().field("a", true).field("b", true).field("c", true);
        selection.remove("b");
        assert_eq!(selection.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
