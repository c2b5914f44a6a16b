//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, EngineSettings, RewardActionsConfig, TiersConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/homestay/
/// ├── engine.yaml          # Currency, service fee rate, active statuses
/// ├── tiers.yaml           # Loyalty tier thresholds and multipliers
/// └── reward_actions.yaml  # Actions that earn points
/// ```
///
/// # Example
///
/// ```no_run
/// use stay_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/homestay")?;
/// println!("Currency: {}", loader.config().settings().currency);
/// # Ok::<(), stay_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if a file is missing, contains invalid YAML, or the
    /// tier table is unusable (empty, not starting at zero, duplicate slugs).
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;

        let tiers_path = path.join("tiers.yaml");
        let tiers = Self::load_yaml::<TiersConfig>(&tiers_path)?;

        let actions_path = path.join("reward_actions.yaml");
        let actions = Self::load_yaml::<RewardActionsConfig>(&actions_path)?;

        let config = EngineConfig::new(settings, tiers.tiers, actions.actions);
        Self::validate_tiers(&config, &tiers_path)?;
        Self::validate_actions(&actions_path, &config)?;

        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate_tiers(config: &EngineConfig, path: &Path) -> EngineResult<()> {
        let parse_error = |message: &str| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: message.to_string(),
        };

        let tiers = config.tiers();
        match tiers.first() {
            None => return Err(parse_error("tier table is empty")),
            Some(lowest) if lowest.min_points != 0 => {
                return Err(parse_error("lowest tier must start at 0 points"));
            }
            Some(_) => {}
        }

        let mut seen = HashSet::new();
        for tier in tiers {
            if !seen.insert(tier.slug.as_str()) {
                return Err(parse_error(&format!("duplicate tier slug '{}'", tier.slug)));
            }
            if tier.multiplier.is_sign_negative() {
                return Err(parse_error(&format!(
                    "tier '{}' has a negative multiplier",
                    tier.slug
                )));
            }
        }
        Ok(())
    }

    fn validate_actions(path: &Path, config: &EngineConfig) -> EngineResult<()> {
        let completion = &config.settings().completion_reward_action;
        if config.reward_action(completion).is_none() {
            return Err(EngineError::ConfigParseError {
                path: path.display().to_string(),
                message: format!("completion reward action '{}' is not in the catalog", completion),
            });
        }
        Ok(())
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}
