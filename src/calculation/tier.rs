//! Loyalty tier resolution and points computation.

use rust_decimal::Decimal;

use super::round_to_units;
use crate::models::TierDefinition;

/// Finds the highest tier whose threshold the balance reaches.
///
/// `tiers` must be sorted ascending by `min_points`, as `EngineConfig`
/// guarantees. Returns `None` only when the balance is below every threshold.
///
/// # Example
///
/// ```
/// use stay_engine::calculation::resolve_tier;
/// use stay_engine::models::TierDefinition;
/// use rust_decimal::Decimal;
///
/// let tiers = vec![
///     TierDefinition { slug: "member".into(), name: "Member".into(), min_points: 0, multiplier: Decimal::ONE },
///     TierDefinition { slug: "gold".into(), name: "Gold".into(), min_points: 5_000, multiplier: Decimal::new(12, 1) },
/// ];
/// assert_eq!(resolve_tier(&tiers, 4_999).map(|t| t.slug.as_str()), Some("member"));
/// assert_eq!(resolve_tier(&tiers, 5_000).map(|t| t.slug.as_str()), Some("gold"));
/// ```
pub fn resolve_tier(tiers: &[TierDefinition], balance: i64) -> Option<&TierDefinition> {
    tiers.iter().rev().find(|tier| tier.min_points <= balance)
}

/// Computes points for one credit.
///
/// `round(points_base * tier_multiplier * custom_multiplier)`, clamped at
/// zero. A missing tier multiplier counts as 1.
pub fn compute_points(
    points_base: i64,
    tier_multiplier: Option<Decimal>,
    custom_multiplier: Decimal,
) -> i64 {
    let tier_multiplier = tier_multiplier.unwrap_or(Decimal::ONE);
    let points = Decimal::from(points_base)
        .checked_mul(tier_multiplier)
        .and_then(|p| p.checked_mul(custom_multiplier))
        .unwrap_or(Decimal::MAX);
    round_to_units(points).max(0)
}
