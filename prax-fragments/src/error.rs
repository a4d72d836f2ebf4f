//! Error types for fragment parsing, expansion and configuration.
//!
//! Expansion and selection are fail-soft: unresolved fragment references
//! never produce an error. The variants here cover the boundaries where a
//! caller hands us malformed input (JSON that is not a selection, a fragment
//! key without the sentinel, an unreadable config file) and the one case the
//! expander refuses to guess about, a reference cycle.
//!
//! ```rust
//! use prax_fragments::SelectionError;
//!
//! let err = SelectionError::invalid_fragment_key("user");
//! assert!(err.to_string().contains("user"));
//! ```

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for selection operations.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Errors raised at the edges of the selection engine.
#[derive(Error, Debug, Diagnostic)]
pub enum SelectionError {
    /// A fragment (transitively) references itself.
    #[error("cyclic fragment reference: {}", .cycle.join(" -> "))]
    #[diagnostic(
        code(prax::selections::cyclic_fragment),
        help("break the cycle or set `fragments.cycles = \"break\"` to drop the back reference")
    )]
    CyclicFragment { cycle: Vec<String> },

    /// A top-level fragment key does not start with the sentinel prefix.
    #[error("fragment key `{key}` must start with `{prefix}`")]
    #[diagnostic(code(prax::selections::invalid_fragment_key))]
    InvalidFragmentKey { key: String, prefix: char },

    /// A request or fragment body is not shaped like a selection.
    #[error("invalid selection at `{path}`: {message}")]
    #[diagnostic(code(prax::selections::invalid_request))]
    InvalidRequest { path: String, message: String },

    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(prax::selections::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse TOML")]
    #[diagnostic(code(prax::selections::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Failed to parse JSON input.
    #[error("failed to parse JSON")]
    #[diagnostic(code(prax::selections::json_error))]
    JsonError {
        #[source]
        source: serde_json::Error,
    },
}

impl SelectionError {
    /// Create a cycle error from the chain of fragment keys that closes the loop.
    pub fn cyclic(cycle: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::CyclicFragment {
            cycle: cycle.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an invalid fragment key error using the default `$` sentinel.
    pub fn invalid_fragment_key(key: impl Into<String>) -> Self {
        Self::InvalidFragmentKey {
            key: key.into(),
            prefix: crate::request::DEFAULT_PREFIX,
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from a reference cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicFragment { .. })
    }
}

impl From<serde_json::Error> for SelectionError {
    fn from(source: serde_json::Error) -> Self {
        Self::JsonError { source }
    }
}

impl From<toml::de::Error> for SelectionError {
    fn from(source: toml::de::Error) -> Self {
        Self::TomlError { source }
    }
}
