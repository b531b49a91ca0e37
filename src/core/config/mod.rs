//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! There are two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Settings for the project a schematic runs against
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//!
//! Option defaults merge per key: a project default for `style` replaces the
//! global one, other global keys survive.
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$SCHEMATICS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/schematics/config.toml`
//! 3. `~/.schematics/config.toml`
//!
//! # Project Config Locations
//!
//! Searched in order:
//! 1. `schematics.toml` (canonical)
//! 2. `.schematics/config.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use schematics::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let config = result.config;
//!
//! println!("Debug: {}", config.debug());
//! if let Some(defaults) = config.defaults_for("@acme/schematics:component") {
//!     println!("Defaults: {:?}", defaults);
//! }
//! ```

pub mod schema;

pub use schema::{GlobalConfig, OptionDefaults, ProjectConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules automatically.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration (if a project was given and has one)
    pub project: Option<ProjectConfig>,
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Assemble configuration from already-parsed scopes.
    pub fn new(global: GlobalConfig, project: Option<ProjectConfig>) -> Self {
        Self {
            global,
            project,
            global_path: None,
            project_path: None,
        }
    }

    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads project config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// validated. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global_path = Self::find_global();
        let project_path = match project_dir {
            Some(dir) => Self::find_project(dir, &mut warnings),
            None => None,
        };

        let mut result = Self::load_files(global_path.as_deref(), project_path.as_deref())?;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }

    /// Load configuration from explicit file paths.
    ///
    /// `None` means "use defaults for that scope".
    pub fn load_files(
        global_path: Option<&Path>,
        project_path: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let global: GlobalConfig = match global_path {
            Some(path) => read_toml(path)?,
            None => GlobalConfig::default(),
        };
        let project: Option<ProjectConfig> = match project_path {
            Some(path) => Some(read_toml(path)?),
            None => None,
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        tracing::debug!(
            global = ?global_path,
            project = ?project_path,
            "configuration loaded"
        );

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path: global_path.map(Path::to_path_buf),
                project_path: project_path.map(Path::to_path_buf),
            },
            warnings: Vec::new(),
        })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $SCHEMATICS_CONFIG
        if let Ok(path) = std::env::var("SCHEMATICS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/schematics/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("schematics/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.schematics/config.toml
        Self::global_config_path().ok().filter(|path| path.exists())
    }

    /// Locate the project config file, if any.
    fn find_project(project_dir: &Path, warnings: &mut Vec<ConfigWarning>) -> Option<PathBuf> {
        let canonical = Self::project_config_path(project_dir);
        if canonical.exists() {
            return Some(canonical);
        }

        let compat = project_dir.join(".schematics/config.toml");
        if compat.exists() {
            let message = format!(
                "Using deprecated config location. Please move to '{}'",
                canonical.display()
            );
            tracing::warn!(path = %compat.display(), "{}", message);
            warnings.push(ConfigWarning {
                message,
                path: compat.clone(),
            });
            return Some(compat);
        }

        None
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.schematics/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".schematics/config.toml"))
    }

    /// Get the canonical path for project config.
    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join("schematics.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Check if debug mode is enabled.
    ///
    /// Defaults to `false` if not configured.
    pub fn debug(&self) -> bool {
        self.project
            .as_ref()
            .and_then(|p| p.debug)
            .or(self.global.debug)
            .unwrap_or(false)
    }

    /// Check if interactive prompting is allowed.
    ///
    /// Defaults to `true` if not configured.
    pub fn interactive(&self) -> bool {
        self.global.interactive.unwrap_or(true)
    }

    /// Option defaults for a `collection:schematic` key.
    ///
    /// Project keys override global keys. Returns `None` when neither scope
    /// has a table for the key.
    pub fn defaults_for(&self, qualified_name: &str) -> Option<OptionDefaults> {
        let global = self.global.defaults.get(qualified_name);
        let project = self
            .project
            .as_ref()
            .and_then(|p| p.defaults.get(qualified_name));

        match (global, project) {
            (None, None) => None,
            (global, project) => {
                let mut merged = global.cloned().unwrap_or_default();
                if let Some(project) = project {
                    for (key, value) in project {
                        merged.insert(key.clone(), value.clone());
                    }
                }
                Some(merged)
            }
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

/// Read and parse a TOML config file.
fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_files_with_nothing_uses_defaults() {
        let config = Config::load_files(None, None).unwrap().config;

        assert!(!config.debug());
        assert!(config.interactive());
        assert!(config.defaults_for("kit:component").is_none());
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = write(
            temp.path(),
            "config.toml",
            r#"
            [defaults."env-kit:from-env"]
            loaded = true
            "#,
        );

        std::env::set_var("SCHEMATICS_CONFIG", config_path.to_str().unwrap());
        let result = Config::load(None).unwrap();
        std::env::remove_var("SCHEMATICS_CONFIG");

        assert_eq!(
            result.config.global_config_loaded_from(),
            Some(config_path.as_path())
        );
        assert!(result.config.defaults_for("env-kit:from-env").is_some());
    }

    #[test]
    fn load_project_config() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "schematics.toml",
            r#"
            debug = true

            [defaults."kit:component"]
            style = "css"
            "#,
        );

        let result = Config::load(Some(temp.path())).unwrap();
        let config = result.config;

        assert!(config.debug());
        assert_eq!(
            config.defaults_for("kit:component").unwrap()["style"],
            serde_json::json!("css")
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn load_project_compat_warns() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".schematics/config.toml", "debug = true");

        let result = Config::load(Some(temp.path())).unwrap();

        assert!(result.config.debug());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("deprecated"));
    }

    #[test]
    fn project_defaults_override_global_per_key() {
        let temp = TempDir::new().unwrap();
        let global = write(
            temp.path(),
            "global.toml",
            r#"
            [defaults."kit:component"]
            style = "scss"
            flat = true
            "#,
        );
        let project = write(
            temp.path(),
            "project.toml",
            r#"
            [defaults."kit:component"]
            style = "css"
            "#,
        );

        let config = Config::load_files(Some(&global), Some(&project))
            .unwrap()
            .config;
        let defaults = config.defaults_for("kit:component").unwrap();

        assert_eq!(defaults["style"], serde_json::json!("css"));
        assert_eq!(defaults["flat"], serde_json::json!(true));
    }

    #[test]
    fn project_debug_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = write(temp.path(), "global.toml", "debug = true");
        let project = write(temp.path(), "project.toml", "debug = false");

        let config = Config::load_files(Some(&global), Some(&project))
            .unwrap()
            .config;
        assert!(!config.debug());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "schematics.toml",
            r#"
            debug = true
            unknown_field = true
            "#,
        );

        let result = Config::load_files(None, Some(&path));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_defaults_key_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "global.toml",
            r#"
            [defaults."no separator"]
            x = 1
            "#,
        );

        let result = Config::load_files(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.toml");
        let result = Config::load_files(Some(&missing), None);
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
