//! # Runtime Configuration Module
//!
//! Environment variables that affect code generation.
//!
//! ## Environment Variables
//!
//! ### `OPFORGE_CONTROLLER_GEN_BIN`
//!
//! Path or program name of the controller-gen binary run after scaffolding.
//! Overridden by `controller_gen` in `opforge.toml` and by CLI flags.
//!
//! Default: `controller-gen` (looked up on `PATH`)
//!
//! Logging variables (`OPFORGE_LOG_*`) are read by [`crate::logging`].

use std::env;
use std::path::PathBuf;

use crate::generator::DEFAULT_CONTROLLER_GEN;

pub const CONTROLLER_GEN_ENV: &str = "OPFORGE_CONTROLLER_GEN_BIN";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub controller_gen: PathBuf,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let controller_gen = lookup(CONTROLLER_GEN_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTROLLER_GEN.to_string());
        RuntimeConfig {
            controller_gen: PathBuf::from(controller_gen),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binary() {
        let config = RuntimeConfig::from_lookup(|_| None);
        assert_eq!(config.controller_gen, PathBuf::from("controller-gen"));
    }

    #[test]
    fn test_env_override() {
        let config = RuntimeConfig::from_lookup(|key| {
            (key == CONTROLLER_GEN_ENV).then(|| "/opt/bin/controller-gen".to_string())
        });
        assert_eq!(config.controller_gen, PathBuf::from("/opt/bin/controller-gen"));
    }

    #[test]
    fn test_blank_value_falls_back() {
        let config = RuntimeConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config.controller_gen, PathBuf::from("controller-gen"));
    }
}
