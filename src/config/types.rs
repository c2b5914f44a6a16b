//! Configuration types for the stay engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{ReservationStatus, RewardAction, TierDefinition};

/// Marketplace-wide settings from `engine.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// ISO currency code used for every priced booking.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Fraction of the nightly total taken as the platform service fee.
    pub service_fee_rate: Decimal,
    /// Reservation statuses that hold dates.
    #[serde(default = "ReservationStatus::default_active")]
    pub active_statuses: Vec<ReservationStatus>,
    /// Reward action credited when a stay completes.
    #[serde(default = "default_completion_action")]
    pub completion_reward_action: String,
}

fn default_currency() -> String {
    "VND".to_string()
}

fn default_completion_action() -> String {
    "booking_completed".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            service_fee_rate: Decimal::new(5, 2),
            active_statuses: ReservationStatus::default_active(),
            completion_reward_action: default_completion_action(),
        }
    }
}

/// Tier table file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct TiersConfig {
    /// Tier rows in any order.
    pub tiers: Vec<TierDefinition>,
}

/// Reward action catalog file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct RewardActionsConfig {
    /// Catalog entries.
    pub actions: Vec<RewardAction>,
}

/// The complete engine configuration.
///
/// Tiers are kept sorted ascending by `min_points`. Reward actions are
/// indexed by slug.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    settings: EngineSettings,
    tiers: Vec<TierDefinition>,
    reward_actions: HashMap<String, RewardAction>,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(
        settings: EngineSettings,
        tiers: Vec<TierDefinition>,
        reward_actions: Vec<RewardAction>,
    ) -> Self {
        let mut sorted_tiers = tiers;
        sorted_tiers.sort_by_key(|t| t.min_points);
        let reward_actions = reward_actions
            .into_iter()
            .map(|action| (action.slug.clone(), action))
            .collect();
        Self {
            settings,
            tiers: sorted_tiers,
            reward_actions,
        }
    }

    /// Returns the marketplace settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the tier table, ascending by `min_points`.
    pub fn tiers(&self) -> &[TierDefinition] {
        &self.tiers
    }

    /// Looks up a tier by slug.
    pub fn tier(&self, slug: &str) -> Option<&TierDefinition> {
        self.tiers.iter().find(|t| t.slug == slug)
    }

    /// Looks up a reward action by slug.
    pub fn reward_action(&self, slug: &str) -> Option<&RewardAction> {
        self.reward_actions.get(slug)
    }

    /// Returns true if reservations in `status` hold their dates.
    pub fn is_active_status(&self, status: ReservationStatus) -> bool {
        self.settings.active_statuses.contains(&status)
    }
}
