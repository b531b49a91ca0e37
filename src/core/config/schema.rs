//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$SCHEMATICS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/schematics/config.toml`
//! 3. `~/.schematics/config.toml`
//!
//! # Project Config
//!
//! Located at `<project>/schematics.toml` (canonical).
//!
//! # Validation
//!
//! Keys of the `[defaults]` table must be `collection:schematic` pairs where
//! both halves are valid identifiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{CollectionName, SchematicName};

/// Option defaults for one schematic, as a JSON object.
pub type OptionDefaults = serde_json::Map<String, serde_json::Value>;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// debug = false
/// interactive = true
///
/// [defaults."@acme/schematics:component"]
/// style = "scss"
/// skip_tests = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Emit debug information from invocations
    pub debug: Option<bool>,

    /// Allow interactive option prompts
    pub interactive: Option<bool>,

    /// Option defaults keyed by `collection:schematic`
    pub defaults: BTreeMap<String, OptionDefaults>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any defaults key is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_defaults(&self.defaults)
    }
}

/// Project configuration.
///
/// # Example
///
/// ```toml
/// debug = true
///
/// [defaults."@acme/schematics:component"]
/// style = "css"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Emit debug information from invocations
    pub debug: Option<bool>,

    /// Option defaults keyed by `collection:schematic`
    pub defaults: BTreeMap<String, OptionDefaults>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any defaults key is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_defaults(&self.defaults)
    }
}

fn validate_defaults(defaults: &BTreeMap<String, OptionDefaults>) -> Result<(), ConfigError> {
    for key in defaults.keys() {
        let (collection, schematic) = key.rsplit_once(':').ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "defaults key '{}' must have the form 'collection:schematic'",
                key
            ))
        })?;
        CollectionName::new(collection)
            .map_err(|e| ConfigError::InvalidValue(format!("defaults key '{}': {}", key, e)))?;
        SchematicName::new(schematic)
            .map_err(|e| ConfigError::InvalidValue(format!("defaults key '{}': {}", key, e)))?;
    }
    Ok(())
}
