//! # prax-fragments
//!
//! Reusable selection fragments for Prax queries.
//!
//! A fragment is a named group of fields (and relation selections) that can
//! be referenced from other fragments or from a query's `select` argument
//! with a `$`-prefixed key. This crate provides:
//!
//! - [`expand`]: resolves fragment-to-fragment references into flat,
//!   reference-free selections
//! - [`Selector`]: expands a set of fragments once, then merges requested
//!   fragments and literal fields into one selection per call
//! - [`define_fragments`]: wraps an async, context-dependent fragment factory
//!   so that failures degrade to "no fragments" instead of failing the caller
//!
//! ## Selecting
//!
//! ```rust
//! use prax_fragments::{FragmentDefinitions, Selector};
//! use serde_json::json;
//!
//! let user = Selector::new(&FragmentDefinitions::from_json(&json!({
//!     "$profile": { "name": true, "avatar": true },
//!     "$card": { "id": true, "$profile": true }
//! }))?)?;
//!
//! let select = user.select_json(&json!({ "email": true, "$card": true }))?;
//! assert_eq!(
//!     select.to_json(),
//!     json!({ "email": true, "id": true, "name": true, "avatar": true })
//! );
//! # Ok::<(), prax_fragments::SelectionError>(())
//! ```
//!
//! ## Building requests without JSON
//!
//! ```rust
//! use prax_fragments::{FragmentDefinitions, Selection, SelectionRequest, Selector};
//!
//! let defs = FragmentDefinitions::new()
//!     .define("author", SelectionRequest::new().relation(
//!         "author",
//!         Selection::new().relation("select", Selection::new().field("name", true)),
//!     ));
//! let selector = Selector::new(&defs)?;
//!
//! let select = selector.select(&SelectionRequest::new().field("title", true).fragment("author"));
//! assert!(select.get_path(&["author", "select", "name"]).is_some());
//! # Ok::<(), prax_fragments::SelectionError>(())
//! ```

pub mod config;
pub mod define;
pub mod error;
pub mod expand;
pub mod fragments;
pub mod logging;
pub mod request;
pub mod selector;
pub mod value;

pub use config::{CyclePolicy, FallbackConfig, FragmentConfig, SelectionConfig};
pub use define::{
    BoxError, FnSource, FragmentLoad, FragmentRegistry, FragmentSource, GuardedFactory,
    define_fragments,
};
pub use error::{SelectionError, SelectionResult};
pub use expand::{expand, expand_with};
pub use fragments::{ExpandedFragments, FragmentDefinitions};
pub use request::{DEFAULT_PREFIX, FragmentName, SelectionEntry, SelectionRequest};
pub use selector::{Selector, create_selector};
pub use value::{Selection, SelectionValue};
