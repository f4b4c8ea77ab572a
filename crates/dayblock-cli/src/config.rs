//! `dayblock.toml` configuration

use anyhow::{Context, Result};
use dayblock_core::DEFAULT_LOCATIONS;
use dayblock_xlsx::{ReadPolicy, DEFAULT_SHEET_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "dayblock.toml";

/// What to do with an existing workbook that cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnUnreadable {
    /// Start over from empty history
    #[default]
    Reset,
    /// Stop the run without touching the file
    Abort,
}

impl From<OnUnreadable> for ReadPolicy {
    fn from(value: OnUnreadable) -> Self {
        match value {
            OnUnreadable::Reset => Self::Reset,
            OnUnreadable::Abort => Self::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workbook the ledger is kept in
    pub output: PathBuf,

    /// Name of the single sheet
    pub sheet_name: String,

    /// Pause between consecutive upstream lookups
    pub request_delay_ms: u64,

    pub on_unreadable: OnUnreadable,

    /// Locations queried each run, in row order
    pub locations: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from("results.xlsx"),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            request_delay_ms: 200,
            on_unreadable: OnUnreadable::default(),
            locations: DEFAULT_LOCATIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.locations.is_empty() {
            anyhow::bail!("Configuration validation failed: locations must not be empty");
        }
        if self.locations.iter().any(|l| l.trim().is_empty()) {
            anyhow::bail!("Configuration validation failed: locations contains a blank name");
        }
        if self.sheet_name.trim().is_empty() {
            anyhow::bail!("Configuration validation failed: sheet_name must not be empty");
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
