//! Configuration for `prax-selections.toml`.
//!
//! ```toml
//! [fragments]
//! prefix = "$"
//! cycles = "reject"
//!
//! [fallback]
//! log = true
//! ```
//!
//! Every key is optional; an empty file yields [`SelectionConfig::default`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SelectionError, SelectionResult};
use crate::request::DEFAULT_PREFIX;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "prax-selections.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    /// Fragment parsing and expansion.
    #[serde(default)]
    pub fragments: FragmentConfig,

    /// Behavior of guarded fragment factories.
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl SelectionConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SelectionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SelectionError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SelectionResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `prax-selections.toml` from `dir` if it exists, otherwise defaults.
    pub fn discover(dir: impl AsRef<Path>) -> SelectionResult<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Set the sentinel prefix.
    pub fn with_prefix(mut self, prefix: char) -> Self {
        self.fragments.prefix = prefix;
        self
    }

    /// Set the cycle policy.
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.fragments.cycles = policy;
        self
    }

    /// Log failures swallowed by guarded factories.
    pub fn with_fallback_logging(mut self, log: bool) -> Self {
        self.fallback.log = log;
        self
    }
}

/// Fragment parsing and expansion settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentConfig {
    /// Leading character that marks a key as a fragment reference.
    #[serde(default = "default_prefix")]
    pub prefix: char,

    /// What to do when fragments reference each other in a loop.
    #[serde(default)]
    pub cycles: CyclePolicy,
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX,
            cycles: CyclePolicy::default(),
        }
    }
}

fn default_prefix() -> char {
    DEFAULT_PREFIX
}

/// Handling of reference cycles between fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Fail expansion with [`SelectionError::CyclicFragment`].
    #[default]
    Reject,
    /// Drop the reference that closes the cycle, as if it were undefined.
    Break,
}

/// Guarded factory settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackConfig {
    /// Emit a `warn` event when a factory failure is swallowed.
    #[serde(default)]
    pub log: bool,
}
