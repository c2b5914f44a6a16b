//! Configuration loading and management for the stay engine.
//!
//! This module loads marketplace settings, the loyalty tier table and the
//! reward action catalog from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use stay_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/homestay").unwrap();
//! println!("Tiers: {}", loader.config().tiers().len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, EngineSettings, RewardActionsConfig, TiersConfig};
