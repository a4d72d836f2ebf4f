//! Logging setup for selection fragments.
//!
//! The engine only emits `tracing` events:
//!
//! - `debug` when fragments are expanded, and for every unresolved reference
//! - `trace` for each `select` call
//! - `warn` when a guarded factory swallows a failure (if enabled)
//!
//! Applications normally install their own subscriber. With the
//! `tracing-subscriber` feature, [`init`] installs one driven by the same
//! environment variables as the rest of Prax:
//!
//! - `PRAX_DEBUG=true|1|yes` - enable debug output
//! - `PRAX_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `PRAX_LOG_FORMAT=json|pretty|compact` - output format (default: json)

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Output format for the built-in subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether logging was requested at all.
    pub enabled: bool,
    /// Level applied to the Prax selection crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read `PRAX_DEBUG`, `PRAX_LOG_LEVEL` and `PRAX_LOG_FORMAT`.
    pub fn from_env() -> Self {
        Self::resolve(
            env::var("PRAX_DEBUG").ok().as_deref(),
            env::var("PRAX_LOG_LEVEL").ok().as_deref(),
            env::var("PRAX_LOG_FORMAT").ok().as_deref(),
        )
    }

    fn resolve(debug: Option<&str>, level: Option<&str>, format: Option<&str>) -> Self {
        let debug = debug.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"));
        let explicit = level.and_then(|l| match l.to_lowercase().as_str() {
            "trace" => Some("trace"),
            "debug" => Some("debug"),
            "info" => Some("info"),
            "warn" => Some("warn"),
            "error" => Some("error"),
            _ => None,
        });

        Self {
            enabled: debug || level.is_some(),
            level: explicit.unwrap_or(if debug { "debug" } else { "warn" }),
            format: format.map(LogFormat::parse).unwrap_or(LogFormat::Json),
        }
    }

    /// The `EnvFilter` directive for the selection crates.
    pub fn directive(&self) -> String {
        format!(
            "prax_fragments={},prax_selections={}",
            self.level, self.level
        )
    }
}

/// Install the built-in subscriber once. Later calls are no-ops.
///
/// Does nothing unless logging was requested through the environment, or
/// when the `tracing-subscriber` feature is disabled.
pub fn init() {
    INIT.call_once(|| {
        let settings = LogSettings::from_env();
        if !settings.enabled {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(settings.directive())
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            // A subscriber may already be installed by the application.
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = ?settings.format,
                    "Selection fragment logging initialized"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let settings = LogSettings::resolve(None, None, None);
        assert!(!settings.enabled);
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_flag() {
        let settings = LogSettings::resolve(Some("YES"), None, Some("compact"));
        assert!(settings.enabled);
        assert_eq!(settings.level, "debug");
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn test_explicit_level_wins() {
        let settings = LogSettings::resolve(Some("true"), Some("trace"), None);
        assert_eq!(settings.level, "trace");
        assert_eq!(
            settings.directive(),
            "prax_fragments=trace,prax_selections=trace"
        );
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let settings = LogSettings::resolve(None, Some("loud"), Some("pretty"));
        assert!(settings.enabled);
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.format, LogFormat::Pretty);
    }
}
