//! # Prax Selections
//!
//! Composable, reusable selection fragments for Prax queries.
//!
//! Prax selections provide:
//! - Named `$fragment` groups of fields and relation selections
//! - Fragment-to-fragment references, expanded once and cached
//! - Deep merging of fragments and literal fields into a single `select`
//! - Context-dependent fragment factories that degrade to "no fragments"
//!
//! ## Quick Start
//!
//! ```rust
//! use prax_selections::prelude::*;
//! use serde_json::json;
//!
//! let post = Selector::new(&FragmentDefinitions::from_json(&json!({
//!     "$summary": { "id": true, "title": true },
//!     "$withAuthor": { "author": { "select": { "name": true } } },
//!     "$full": { "$summary": true, "$withAuthor": true, "body": true }
//! }))?)?;
//!
//! let select = post.select_json(&json!({ "$full": true, "author": { "select": { "email": true } } }))?;
//! assert_eq!(
//!     select.to_json(),
//!     json!({
//!         "body": true,
//!         "id": true,
//!         "title": true,
//!         "author": { "select": { "name": true, "email": true } }
//!     })
//! );
//! # Ok::<(), prax_selections::SelectionError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Fragment expansion, selection and guarded factories.
pub mod fragments {
    pub use prax_fragments::*;
}

/// Logging initialization.
pub use prax_fragments::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fragments::{
        FragmentDefinitions, FragmentLoad, GuardedFactory, Selection, SelectionConfig,
        SelectionRequest, SelectionValue, Selector, create_selector, define_fragments, expand,
    };
}

// Re-export key types at the crate root
pub use fragments::{
    CyclePolicy, FragmentDefinitions, SelectionConfig, SelectionError, SelectionResult, Selector,
};
