//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `--config <file>` or `$XDG_CONFIG_HOME/treefs/treefs.toml`
//! 3. Environment variables: `TREEFS_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Unified configuration for treefs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Shell prompt (default: "> ")
    pub prompt: String,
    /// Ask before `rm` removes an entry (default: true)
    pub confirm_removals: bool,
    /// strftime format of modification times in `ls`
    pub date_format: String,
    /// Snapshot written on `exit` when set
    pub autosave: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt: "> ".into(),
            confirm_removals: true,
            date_format: "%d %b %H:%M".into(),
            autosave: None,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub prompt: Option<String>,
    pub confirm_removals: Option<bool>,
    pub date_format: Option<String>,
    pub autosave: Option<PathBuf>,
}

/// Get the XDG config directory for treefs.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treefs").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treefs.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(autosave) = &self.autosave {
            let expanded = expand_env_vars(autosave.to_string_lossy().as_ref());
            self.autosave = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay config onto self: overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            prompt: overlay.prompt.clone().unwrap_or_else(|| self.prompt.clone()),
            confirm_removals: overlay.confirm_removals.unwrap_or(self.confirm_removals),
            date_format: overlay
                .date_format
                .clone()
                .unwrap_or_else(|| self.date_format.clone()),
            autosave: overlay.autosave.clone().or_else(|| self.autosave.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file; must exist when given.
    ///   Without it the global XDG file is used if present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file
        let file = match config_file {
            Some(path) if !path.exists() => {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                })
            }
            Some(path) => Some(path.to_path_buf()),
            None => global_config_path().filter(|p| p.exists()),
        };
        if let Some(path) = file {
            let raw = load_raw_settings(&path)?;
            current = current.merge_with(&raw);
        }

        // 3. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply TREEFS_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TREEFS").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("prompt") {
            settings.prompt = val;
        }
        if let Ok(val) = config.get_bool("confirm_removals") {
            settings.confirm_removals = val;
        }
        if let Ok(val) = config.get_string("date_format") {
            settings.date_format = val;
        }
        if let Ok(val) = config.get_string("autosave") {
            settings.autosave = Some(PathBuf::from(val));
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treefs configuration
#
# Locations (by precedence, lowest to highest):
#   File: ~/.config/treefs/treefs.toml or --config <file>
#   Env:  TREEFS_* environment variables (explicit overrides)

# Shell prompt
# prompt = "> "

# Ask before rm removes an entry and everything below it
# confirm_removals = true

# Format of modification times in ls (strftime)
# date_format = "%d %b %H:%M"

# Snapshot file written on exit
# autosave = "~/.local/share/treefs/snapshot.txt"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
