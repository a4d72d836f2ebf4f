//! The selector: merges fragment references and literal fields into one
//! selection object.
//!
//! A [`Selector`] expands its fragment definitions once, at construction, and
//! keeps the expanded set behind an [`Arc`]. Cloning a selector is cheap and
//! every clone shares the same expanded fragments, so one selector per model
//! is typically built at startup and reused for the life of the process.
//!
//! ```rust
//! use prax_fragments::{FragmentDefinitions, Selector};
//! use serde_json::json;
//!
//! let selector = Selector::new(&FragmentDefinitions::from_json(&json!({
//!     "$basics": { "id": true, "name": true },
//!     "$withPosts": { "posts": { "select": { "title": true } } }
//! }))?)?;
//!
//! let select = selector.select_json(&json!({ "email": true, "$basics": true, "$withPosts": true }))?;
//! assert_eq!(
//!     select.to_json(),
//!     json!({ "email": true, "id": true, "name": true, "posts": { "select": { "title": true } } })
//! );
//! # Ok::<(), prax_fragments::SelectionError>(())
//! ```

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::config::SelectionConfig;
use crate::error::SelectionResult;
use crate::expand::expand_with;
use crate::fragments::{ExpandedFragments, FragmentDefinitions};
use crate::request::{DEFAULT_PREFIX, FragmentName, SelectionEntry, SelectionRequest};
use crate::value::Selection;

/// Builds merged selection objects from requests.
#[derive(Debug, Clone)]
pub struct Selector {
    fragments: Arc<ExpandedFragments>,
    prefix: char,
}

impl Selector {
    /// Expand `definitions` with the default configuration.
    pub fn new(definitions: &FragmentDefinitions) -> SelectionResult<Self> {
        Self::with_config(definitions, &SelectionConfig::default())
    }

    /// Expand `definitions` using the cycle policy and prefix from `config`.
    pub fn with_config(
        definitions: &FragmentDefinitions,
        config: &SelectionConfig,
    ) -> SelectionResult<Self> {
        let expanded = expand_with(definitions, &config.fragments)?;
        Ok(Self::from_expanded(expanded, config.fragments.prefix))
    }

    /// Parse and expand a JSON fragment mapping.
    pub fn from_json(definitions: &JsonValue, config: &SelectionConfig) -> SelectionResult<Self> {
        let definitions =
            FragmentDefinitions::from_json_with_prefix(definitions, config.fragments.prefix)?;
        Self::with_config(&definitions, config)
    }

    /// Wrap fragments that are already expanded.
    pub fn from_expanded(fragments: ExpandedFragments, prefix: char) -> Self {
        Self {
            fragments: Arc::new(fragments),
            prefix,
        }
    }

    /// A selector with no fragments; only literal fields pass through.
    pub fn empty() -> Self {
        Self::from_expanded(ExpandedFragments::default(), DEFAULT_PREFIX)
    }

    /// Merge every requested fragment and literal, in request order.
    ///
    /// Later entries win on conflicting leaves; nested objects are merged
    /// recursively. References to unknown fragments contribute nothing. The
    /// result shares no data with the request or the cached fragments.
    pub fn select(&self, request: &SelectionRequest) -> Selection {
        trace!(entries = request.len(), "Building selection");

        let mut merged = Selection::new();
        for entry in request.entries() {
            match entry {
                SelectionEntry::FragmentRef { name } => match self.resolve(name) {
                    Some(fragment) => merged.merge(fragment),
                    None => {
                        debug!(
                            fragment = %name.to_key(self.prefix),
                            "Selection references unknown fragment"
                        );
                    }
                },
                SelectionEntry::Literal { field, value } => merged.merge_value(field, value),
            }
        }
        merged
    }

    /// Parse a JSON request with this selector's prefix, then [`select`](Self::select).
    pub fn select_json(&self, request: &JsonValue) -> SelectionResult<Selection> {
        let request = SelectionRequest::from_json_with_prefix(request, self.prefix)?;
        Ok(self.select(&request))
    }

    /// Select a single fragment by name.
    pub fn fragment(&self, name: impl Into<FragmentName>) -> Option<&Selection> {
        self.resolve(&name.into())
    }

    // Builder names may still carry this selector's prefix, e.g. `"@card"`.
    fn resolve(&self, name: &FragmentName) -> Option<&Selection> {
        self.fragments.get(name).or_else(|| {
            FragmentName::parse(name.as_str(), self.prefix)
                .and_then(|bare| self.fragments.get(&bare))
        })
    }

    /// The cached expanded fragments.
    pub fn fragments(&self) -> &ExpandedFragments {
        &self.fragments
    }

    /// The sentinel prefix used by [`select_json`](Self::select_json).
    pub fn prefix(&self) -> char {
        self.prefix
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::empty()
    }
}

/// Expand `definitions` once and return a reusable [`Selector`].
pub fn create_selector(definitions: &FragmentDefinitions) -> SelectionResult<Selector> {
    Selector::new(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CyclePolicy;
    use crate::value::SelectionValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn selector(value: JsonValue) -> Selector {
        Selector::new(&FragmentDefinitions::from_json(&value).unwrap()).unwrap()
    }

    #[test]
    fn test_later_fragment_wins() {
        let s = selector(json!({ "$a": { "x": true }, "$b": { "x": false, "y": true } }));
        let out = s.select_json(&json!({ "$a": true, "$b": true })).unwrap();
        assert_eq!(out.to_json(), json!({ "x": false, "y": true }));

        let out = s.select_json(&json!({ "$b": true, "$a": true })).unwrap();
        assert_eq!(out.to_json(), json!({ "x": true, "y": true }));
    }

    #[test]
    fn test_nested_relations_deep_merge() {
        let s = selector(json!({
            "$a": { "rel": { "select": { "f1": true } } },
            "$b": { "rel": { "select": { "f2": true } } }
        }));
        let out = s.select_json(&json!({ "$a": true, "$b": true })).unwrap();
        assert_eq!(out.to_json(), json!({ "rel": { "select": { "f1": true, "f2": true } } }));
    }

    #[test]
    fn test_literal_passthrough() {
        let s = selector(json!({ "$a": { "x": true } }));
        let out = s.select_json(&json!({ "someField": true, "$a": true })).unwrap();
        assert_eq!(out.to_json(), json!({ "someField": true, "x": true }));
    }

    #[test]
    fn test_literal_relation_merges_with_fragment() {
        let s = selector(json!({ "$a": { "posts": { "select": { "id": true } } } }));
        let out = s
            .select_json(&json!({
                "$a": true,
                "posts": { "select": { "title": true }, "take": 5 }
            }))
            .unwrap();
        assert_eq!(
            out.to_json(),
            json!({ "posts": { "select": { "id": true, "title": true }, "take": 5 } })
        );
    }

    #[test]
    fn test_unknown_fragment_is_noop() {
        let s = selector(json!({ "$a": { "x": true } }));
        let out = s.select_json(&json!({ "$nope": true, "y": true })).unwrap();
        assert_eq!(out.to_json(), json!({ "y": true }));
    }

    #[test]
    fn test_request_uses_transitive_fragments() {
        let s = selector(json!({
            "$a": { "x": true, "$b": true },
            "$b": { "y": true }
        }));
        let out = s.select(&SelectionRequest::new().fragment("a"));
        assert_eq!(out.to_json(), json!({ "x": true, "y": true }));
    }

    #[test]
    fn test_output_is_fresh() {
        let s = selector(json!({ "$a": { "rel": { "select": { "f1": true } } } }));
        let request = SelectionRequest::new()
            .fragment("a")
            .relation("other", Selection::new().field("id", true));

        let mut out = s.select(&request);
        out.insert("x", true);
        if let Some(SelectionValue::Nested(rel)) = out.get_mut("rel") {
            rel.insert("select", false);
        }
        if let Some(SelectionValue::Nested(other)) = out.get_mut("other") {
            other.insert("id", false);
        }

        assert_eq!(
            s.fragment("a").map(Selection::to_json),
            Some(json!({ "rel": { "select": { "f1": true } } }))
        );
        assert_eq!(
            request.entries()[1],
            SelectionEntry::literal("other", Selection::new().field("id", true))
        );
        assert_eq!(s.select(&request).get("x"), None);
    }

    #[test]
    fn test_clones_share_fragments() {
        let s = selector(json!({ "$a": { "x": true } }));
        let clone = s.clone();
        assert!(std::ptr::eq(s.fragments(), clone.fragments()));
    }

    #[test]
    fn test_custom_prefix() {
        let config = SelectionConfig::default().with_prefix('@');
        let s = Selector::from_json(&json!({ "@a": { "x": true } }), &config).unwrap();
        let out = s.select_json(&json!({ "@a": true, "$a": true })).unwrap();
        assert_eq!(out.to_json(), json!({ "x": true, "$a": true }));
    }

    #[test]
    fn test_custom_prefix_builder_names() {
        let config = SelectionConfig::default().with_prefix('@');
        let s = Selector::from_json(&json!({ "@a": { "x": true } }), &config).unwrap();

        let request = SelectionRequest::new().fragment("@a").field("id", true);
        assert_eq!(s.select(&request).to_json(), json!({ "x": true, "id": true }));
        assert_eq!(
            s.select(&SelectionRequest::new().fragment("a")).to_json(),
            json!({ "x": true })
        );
        assert!(s.fragment("@a").is_some());
    }

    #[test]
    fn test_custom_prefix_cycle_message() {
        let config = SelectionConfig::default().with_prefix('@');
        let definitions = json!({ "@a": { "@b": true }, "@b": { "@a": true } });
        let err = Selector::from_json(&definitions, &config).unwrap_err();
        assert_eq!(err.to_string(), "cyclic fragment reference: @a -> @b -> @a");
    }

    #[test]
    fn test_cycle_policy_from_config() {
        let defs = FragmentDefinitions::from_json(&json!({
            "$a": { "$b": true },
            "$b": { "$a": true, "y": true }
        }))
        .unwrap();

        assert!(Selector::new(&defs).unwrap_err().is_cycle());

        let config = SelectionConfig::default().with_cycle_policy(CyclePolicy::Break);
        let s = Selector::with_config(&defs, &config).unwrap();
        assert_eq!(
            s.select(&SelectionRequest::new().fragment("a")).to_json(),
            json!({ "y": true })
        );
    }

    #[test]
    fn test_empty_selector() {
        let out = Selector::empty()
            .select_json(&json!({ "$a": true, "id": true }))
            .unwrap();
        assert_eq!(out.to_json(), json!({ "id": true }));
    }

    #[test]
    fn test_create_selector() {
        let defs = FragmentDefinitions::new().define("a", SelectionRequest::new().field("x", true));
        let s = create_selector(&defs).unwrap();
        assert_eq!(s.fragments().len(), 1);
    }
}
