//! Loyalty rewards models: action catalog, tiers, ledger entries and cached
//! user state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry describing an action that earns points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAction {
    /// Unique slug (e.g. "booking_completed").
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Points granted before multipliers.
    pub points_base: i64,
    /// Minimum hours between two credits of this action for one user.
    #[serde(default)]
    pub cooldown_hours: Option<u32>,
    /// Maximum credits of this action per user in a rolling 7-day window.
    #[serde(default)]
    pub max_times_per_week: Option<u32>,
    /// Non-recurring actions are credited at most once per user.
    #[serde(default = "default_true")]
    pub is_recurring: bool,
    /// Inactive actions credit nothing.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// One row of the tier threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// Unique slug (e.g. "gold").
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Points balance needed to reach the tier.
    pub min_points: i64,
    /// Bonus multiplier applied to points earned while in the tier.
    pub multiplier: Decimal,
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTransaction {
    /// Unique identifier.
    pub id: Uuid,
    /// The user credited.
    pub user_id: String,
    /// The action that earned the points.
    pub action_slug: String,
    /// Idempotency reference (e.g. a booking id).
    pub reference_id: Option<String>,
    /// Points credited.
    pub points: i64,
    /// Balance immediately after this entry.
    pub balance_after: i64,
    /// Caller-supplied context.
    pub metadata: serde_json::Value,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Cached points balance and tier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRewardState {
    /// The user.
    pub user_id: String,
    /// Current balance, never negative.
    pub points: i64,
    /// Slug of the current tier, if the user has one.
    pub tier: Option<String>,
}
