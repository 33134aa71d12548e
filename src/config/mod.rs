//! User configuration for the pfe CLI.
//!
//! One optional TOML file at `~/.config/prefedit/config.toml`:
//!
//! ```toml
//! output-format = "human"   # or "json" (default)
//! kill-on-save = true       # terminate the consumer after a save
//! backup-on-save = false    # write <file>.bak before replacing
//! ```
//!
//! Every key is optional; [`Config::resolved`] fills in the defaults.
//! Precedence for the effective settings is CLI flag > config file >
//! built-in default; the flag side of that lives in the command layer.
//! The `PFE_CONFIG` environment variable points at an alternative config
//! file (used by the integration tests for isolation).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw user preferences as written in config.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Whether saves terminate the consuming process by default
    pub kill_on_save: Option<bool>,

    /// Whether saves keep a `.bak` copy of the previous content
    pub backup_on_save: Option<bool>,
}

impl Config {
    /// Load the config from `PFE_CONFIG` or the default location.
    ///
    /// A missing file is an empty config; an unreadable or invalid file is
    /// an error, not a silent fallback.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("PFE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Self::load_from(&path);
            }
            return Ok(Self::default());
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and parse a specific config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// `~/.config/prefedit/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("prefedit").join("config.toml"))
    }

    /// Apply defaults to get the effective settings.
    pub fn resolved(&self) -> Settings {
        Settings {
            output_format: self.output_format.unwrap_or_default(),
            kill_on_save: self.kill_on_save.unwrap_or(true),
            backup_on_save: self.backup_on_save.unwrap_or(false),
        }
    }
}

/// Effective settings after defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub output_format: OutputFormat,
    pub kill_on_save: bool,
    pub backup_on_save: bool,
}
