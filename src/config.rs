//! Registry configuration.
//!
//! A [`RegistryConfig`] is fixed when the registry is built. It can be
//! written in code, overlaid from environment variables, or (with the
//! `config` feature) loaded from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_LOG_TARGET: &str = "ferrous_lifecycle";
const DEFAULT_MAX_INIT_DEPTH: usize = 1024;

/// Registry settings
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{RegistryConfig, SingletonRegistry};
///
/// let config = RegistryConfig {
///     log_target: "viewer::singletons".to_string(),
///     max_init_depth: 64,
///     ..RegistryConfig::default()
/// };
///
/// let registry = SingletonRegistry::builder().config(config).build();
/// assert_eq!(registry.config().max_init_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RegistryConfig {
    /// Log target used by the built-in `LoggingObserver`
    pub log_target: String,
    /// Install the built-in `LoggingObserver`
    pub log_events: bool,
    /// Report revival of deleted implicit singletons as a warning
    pub warn_on_revival: bool,
    /// Maximum nesting of singleton constructions on one call chain
    pub max_init_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            log_target: DEFAULT_LOG_TARGET.to_string(),
            log_events: true,
            warn_on_revival: true,
            max_init_depth: DEFAULT_MAX_INIT_DEPTH,
        }
    }
}

impl RegistryConfig {
    /// Overlay settings from `<PREFIX>_LOG_TARGET`, `<PREFIX>_LOG_EVENTS`,
    /// `<PREFIX>_WARN_ON_REVIVAL` and `<PREFIX>_MAX_INIT_DEPTH`.
    ///
    /// Unset or unparsable variables leave the current value alone.
    pub fn with_env(mut self, prefix: &str) -> Self {
        if let Ok(target) = env::var(format!("{}_LOG_TARGET", prefix)) {
            if !target.is_empty() {
                self.log_target = target;
            }
        }
        if let Some(flag) = env_flag(&format!("{}_LOG_EVENTS", prefix)) {
            self.log_events = flag;
        }
        if let Some(flag) = env_flag(&format!("{}_WARN_ON_REVIVAL", prefix)) {
            self.warn_on_revival = flag;
        }
        if let Some(depth) = env::var(format!("{}_MAX_INIT_DEPTH", prefix))
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            if depth > 0 {
                self.max_init_depth = depth;
            }
        }
        self
    }

    /// Parse a config from JSON; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
