use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::card::{CardOptions, EscapePolicy};

/// Maximum number of characters a selection may have and still be liked
pub const DEFAULT_MAX_LIKEABLE_LENGTH: usize = 500;

/// What to do when a collaborator is missing: an element id that does not
/// resolve, a selection that cannot be read, an envelope without its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Surface the problem as an error
    #[default]
    Fail,
    /// Log a warning and carry on with what is available
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Selections longer than this (in characters) cannot be liked
    #[serde(default = "default_max_likeable_length")]
    pub max_likeable_length: usize,

    /// Policy for element ids missing from the surface
    #[serde(default)]
    pub missing_targets: FailurePolicy,

    /// Policy for error envelopes lacking `error` or `logs`
    #[serde(default)]
    pub malformed_envelopes: FailurePolicy,

    /// Escaping applied to error fields and log lines in the error card
    #[serde(default)]
    pub escape: EscapePolicy,

    /// Transcript opened by the viewer when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<PathBuf>,
}

fn default_max_likeable_length() -> usize {
    DEFAULT_MAX_LIKEABLE_LENGTH
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_likeable_length: DEFAULT_MAX_LIKEABLE_LENGTH,
            missing_targets: FailurePolicy::default(),
            malformed_envelopes: FailurePolicy::default(),
            escape: EscapePolicy::default(),
            transcript: None,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("dimantic");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match Self::from_toml(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            // Keep the user's broken file around for them to fix
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Rendering options for the error card
    pub fn card_options(&self) -> CardOptions {
        CardOptions {
            escape: self.escape,
            on_malformed: self.malformed_envelopes,
        }
    }
}
