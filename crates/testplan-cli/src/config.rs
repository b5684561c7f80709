//! Configuration file handling
//!
//! Settings come from three layers: built-in defaults, an optional TOML
//! file, then command-line flags and environment variables.
//!
//! ```toml
//! mode = "auto"
//! store = "sqlite"
//! data_dir = "plans"
//!
//! [alerts]
//! test_end_days = 5
//!
//! [limits]
//! max_vehicles = 40
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use testplan_core::{AlertThresholds, DerivationConfig, ModeSelection, PlanLimits};
use testplan_store::StoreKind;

/// Data directory used when neither the file nor the command line names one
pub const DEFAULT_DATA_DIR: &str = "plans";

/// Contents of a configuration file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub mode: ModeSelection,
    pub store: StoreKind,
    pub data_dir: Option<PathBuf>,
    pub alerts: AlertThresholds,
    pub limits: PlanLimits,
}

impl AppConfig {
    /// Read a configuration file, or the defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::parse(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        // A relative data_dir is taken relative to the file that names it
        if let (Some(dir), Some(base)) = (config.data_dir.as_mut(), path.parent()) {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply command-line overrides on top of the file
    pub fn resolve(self, overrides: Overrides) -> Settings {
        let mut derivation = DerivationConfig::new()
            .mode(overrides.mode.unwrap_or(self.mode))
            .alerts(self.alerts)
            .limits(self.limits);
        if overrides.milestone_view {
            derivation.alerts.test_end_days = AlertThresholds::milestone_view().test_end_days;
        }

        Settings {
            store: overrides.store.unwrap_or(self.store),
            data_dir: overrides
                .data_dir
                .or(self.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            derivation,
        }
    }
}

/// Values given on the command line; `None` leaves the file's value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store: Option<StoreKind>,
    pub data_dir: Option<PathBuf>,
    pub mode: Option<ModeSelection>,
    pub milestone_view: bool,
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreKind,
    pub data_dir: PathBuf,
    pub derivation: DerivationConfig,
}
