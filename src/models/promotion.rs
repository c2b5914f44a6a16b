//! Promotion model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Listing;

/// How a promotion's discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the pre-discount total.
    Percentage,
    /// `discount_value` is an amount in whole currency units.
    FixedAmount,
}

/// A promotional code configured by marketplace admins.
///
/// Promotions are never deleted. The only mutations are redemptions, which
/// increment `used_count`, and deactivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// Unique identifier.
    pub id: String,
    /// Redemption code. Compared without regard to case.
    pub code: String,
    /// Discount type.
    pub discount_type: DiscountType,
    /// Percentage points or fixed amount, depending on `discount_type`.
    pub discount_value: Decimal,
    /// Upper bound on a percentage discount.
    #[serde(default)]
    pub max_discount: Option<i64>,
    /// Minimum pre-discount total for the code to apply.
    #[serde(default)]
    pub min_booking_value: Option<i64>,
    /// Total redemptions allowed across all users.
    #[serde(default)]
    pub max_uses: Option<u32>,
    /// Redemptions allowed per user or walk-in contact.
    #[serde(default)]
    pub max_uses_per_user: Option<u32>,
    /// Redemptions so far.
    #[serde(default)]
    pub used_count: u32,
    /// Start of validity (inclusive).
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of validity (exclusive).
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    /// Property types the code applies to. Empty means all.
    #[serde(default)]
    pub property_types: Vec<String>,
    /// Listing ids the code applies to. Empty means all.
    #[serde(default)]
    pub listing_ids: Vec<String>,
    /// Whether the code combines with a membership-tier discount.
    #[serde(default)]
    pub stack_with_membership: bool,
    /// Whether another promotion may be applied on top of this one.
    #[serde(default)]
    pub stack_with_promotions: bool,
    /// Inactive codes cannot be redeemed.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Promotion {
    /// Normalizes a code for case-insensitive lookup.
    ///
    /// # Example
    ///
    /// ```
    /// use stay_engine::models::Promotion;
    ///
    /// assert_eq!(Promotion::normalize_code("  summer15 "), "SUMMER15");
    /// ```
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Returns true if `now` falls inside `[valid_from, valid_until)`.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        let started = self.valid_from.is_none_or(|from| from <= now);
        let not_ended = self.valid_until.is_none_or(|until| now < until);
        started && not_ended
    }

    /// Returns true if the allow-lists admit the listing.
    pub fn applies_to(&self, listing: &Listing) -> bool {
        let type_ok = self.property_types.is_empty()
            || self
                .property_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&listing.property_type));
        let listing_ok = self.listing_ids.is_empty() || self.listing_ids.contains(&listing.id);
        type_ok && listing_ok
    }

    /// Returns true if the global usage cap has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.used_count >= max)
    }
}
