//! Fragment expansion.
//!
//! Every fragment body is resolved into a reference-free [`Selection`]:
//!
//! 1. the body's literal fields are copied in declaration order;
//! 2. each referenced fragment is expanded first (depth-first, memoized by
//!    name) and its fields are spliced in with a *shallow* overwrite, in the
//!    order the references were declared.
//!
//! A reference therefore overrides a literal of the same name wherever it
//! appears in the body, and later references override earlier ones.
//! References to fragments that do not exist contribute nothing.
//!
//! The caller's [`FragmentDefinitions`] are never touched; the result is a
//! fresh [`ExpandedFragments`].
//!
//! ```rust
//! use prax_fragments::{FragmentDefinitions, expand};
//! use serde_json::json;
//!
//! let defs = FragmentDefinitions::from_json(&json!({
//!     "$a": { "x": true, "$b": true },
//!     "$b": { "y": true, "$c": true },
//!     "$c": { "z": true }
//! }))?;
//!
//! let expanded = expand(&defs)?;
//! assert_eq!(
//!     expanded.get(&"a".into()).map(|s| s.to_json()),
//!     Some(json!({ "x": true, "y": true, "z": true }))
//! );
//! # Ok::<(), prax_fragments::SelectionError>(())
//! ```

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::config::{CyclePolicy, FragmentConfig};
use crate::error::{SelectionError, SelectionResult};
use crate::fragments::{ExpandedFragments, FragmentDefinitions};
use crate::request::FragmentName;
use crate::value::Selection;

/// Expand all fragments with the default configuration, rejecting reference cycles.
pub fn expand(definitions: &FragmentDefinitions) -> SelectionResult<ExpandedFragments> {
    expand_with(definitions, &FragmentConfig::default())
}

/// Expand all fragments with an explicit cycle policy and prefix.
///
/// The prefix only affects how fragment names are reported in
/// [`SelectionError::CyclicFragment`].
///
/// Under [`CyclePolicy::Break`] every fragment is expanded as the root of its
/// own walk: a reference back into the chain currently being expanded is
/// dropped, so a fragment's result never depends on the order fragments were
/// declared in.
pub fn expand_with(
    definitions: &FragmentDefinitions,
    config: &FragmentConfig,
) -> SelectionResult<ExpandedFragments> {
    debug!(
        fragments = definitions.len(),
        policy = ?config.cycles,
        "Expanding selection fragments"
    );

    let mut expander = Expander::new(definitions, config);
    let mut expanded = IndexMap::with_capacity(definitions.len());
    for name in definitions.names() {
        if let Some(selection) = expander.expand_fragment(name)?.selection {
            expanded.insert(name.clone(), selection);
        }
    }
    Ok(ExpandedFragments::from_map(expanded))
}

/// Outcome of expanding one reference.
struct Resolved {
    /// `None` when the reference contributes nothing.
    selection: Option<Selection>,
    /// A cyclic reference was dropped somewhere below this fragment, so the
    /// result is only valid for the current chain.
    cut: bool,
}

impl Resolved {
    fn nothing(cut: bool) -> Self {
        Self {
            selection: None,
            cut,
        }
    }
}

/// Memoizing depth-first expander.
struct Expander<'a> {
    definitions: &'a FragmentDefinitions,
    policy: CyclePolicy,
    prefix: char,
    // Only results that did not cross a dropped reference are cached.
    done: HashMap<FragmentName, Selection>,
    // Fragments currently being expanded, outermost first.
    in_progress: IndexSet<FragmentName>,
}

impl<'a> Expander<'a> {
    fn new(definitions: &'a FragmentDefinitions, config: &FragmentConfig) -> Self {
        Self {
            definitions,
            policy: config.cycles,
            prefix: config.prefix,
            done: HashMap::with_capacity(definitions.len()),
            in_progress: IndexSet::new(),
        }
    }

    fn expand_fragment(&mut self, name: &FragmentName) -> SelectionResult<Resolved> {
        if let Some(selection) = self.done.get(name) {
            return Ok(Resolved {
                selection: Some(selection.clone()),
                cut: false,
            });
        }

        let definitions = self.definitions;
        let Some(body) = definitions.get(name) else {
            debug!(
                fragment = %name.to_key(self.prefix),
                "Unresolved fragment reference, skipping"
            );
            return Ok(Resolved::nothing(false));
        };

        if !self.in_progress.insert(name.clone()) {
            return match self.policy {
                CyclePolicy::Reject => Err(self.cycle_error(name)),
                CyclePolicy::Break => {
                    debug!(
                        fragment = %name.to_key(self.prefix),
                        "Dropping cyclic fragment reference"
                    );
                    Ok(Resolved::nothing(true))
                }
            };
        }

        let mut expanded = Selection::new();
        for (field, value) in body.literals() {
            expanded.insert(field.clone(), value.clone());
        }
        let mut cut = false;
        for reference in body.fragment_refs() {
            let inner = self.expand_fragment(reference)?;
            cut |= inner.cut;
            if let Some(inner) = inner.selection {
                expanded.extend_shallow(&inner);
            }
        }

        self.in_progress.shift_remove(name);
        if !cut {
            self.done.insert(name.clone(), expanded.clone());
        }
        Ok(Resolved {
            selection: Some(expanded),
            cut,
        })
    }

    fn cycle_error(&self, name: &FragmentName) -> SelectionError {
        let start = self.in_progress.get_index_of(name).unwrap_or(0);
        SelectionError::cyclic(
            self.in_progress
                .iter()
                .skip(start)
                .chain(std::iter::once(name))
                .map(|name| name.to_key(self.prefix)),
        )
    }
}
