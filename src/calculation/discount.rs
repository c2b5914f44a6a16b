//! Promotion eligibility and discount computation.
//!
//! Pure evaluation of a promotion against a priced booking. Recording the
//! redemption (and bumping `used_count`) is the promotion book's job; this
//! module only decides whether the code applies and for how much.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round_to_units;
use crate::models::{
    AuditStep, BookingRejection, DiscountType, Listing, PricedBooking, Promotion, RejectionKind,
    RejectionReason,
};

/// A promotion already applied to the booking being priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromotion {
    /// The promotion id.
    pub promotion_id: String,
    /// The normalized code.
    pub code: String,
    /// Discount actually taken off the total.
    pub amount: i64,
    /// Whether further promotions may stack on this one.
    pub stack_with_promotions: bool,
}

/// Booking-side facts the eligibility rules need.
#[derive(Debug, Clone, Copy)]
pub struct DiscountContext<'a> {
    /// The listing being booked.
    pub listing: &'a Listing,
    /// Times this guest has already redeemed the promotion.
    pub redeemer_uses: u32,
    /// Promotions already applied to this booking.
    pub applied_promotions: &'a [AppliedPromotion],
    /// Whether a membership-tier discount also applies.
    pub membership_discount: bool,
}

/// Why a promotion cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionRejection {
    /// No promotion has this code.
    UnknownCode {
        /// The code as supplied.
        code: String,
    },
    /// A code was supplied without a guest identity to count it against.
    MissingRedeemer,
    /// The promotion has been deactivated.
    Inactive,
    /// The validity window has not started.
    NotYetValid {
        /// Start of validity.
        valid_from: DateTime<Utc>,
    },
    /// The validity window has ended.
    Expired {
        /// End of validity.
        valid_until: DateTime<Utc>,
    },
    /// The pre-discount total is below the promotion's floor.
    BelowMinimum {
        /// Required pre-discount total.
        min_booking_value: i64,
        /// Actual pre-discount total.
        subtotal: i64,
    },
    /// The listing is outside the promotion's allow-lists.
    NotApplicable,
    /// All redemptions have been used.
    UsageExhausted {
        /// Redemptions so far.
        used: u32,
        /// Global cap.
        max: u32,
    },
    /// This guest has used all of their redemptions.
    UserLimitReached {
        /// This guest's redemptions so far.
        used: u32,
        /// Per-guest cap.
        max: u32,
    },
    /// The promotion does not combine with membership discounts.
    NotStackableWithMembership,
    /// A promotion already on the booking forbids stacking.
    NotStackable {
        /// The code already applied.
        applied_code: String,
    },
    /// This guest already redeemed the promotion for this booking.
    AlreadyRedeemed,
}

impl PromotionRejection {
    /// Converts into the caller-facing rejection.
    pub fn to_booking_rejection(&self) -> BookingRejection {
        BookingRejection {
            kind: RejectionKind::PromotionIneligible,
            reason: RejectionReason::PromotionIneligible,
            message: self.to_string(),
            conflicting_range: None,
        }
    }
}

impl std::fmt::Display for PromotionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromotionRejection::UnknownCode { code } => {
                write!(f, "Promotion code '{}' was not found", code)
            }
            PromotionRejection::MissingRedeemer => {
                write!(f, "A guest identity is required to redeem a promotion")
            }
            PromotionRejection::Inactive => write!(f, "Promotion is no longer active"),
            PromotionRejection::NotYetValid { valid_from } => {
                write!(f, "Promotion is not valid until {}", valid_from)
            }
            PromotionRejection::Expired { valid_until } => {
                write!(f, "Promotion expired at {}", valid_until)
            }
            PromotionRejection::BelowMinimum {
                min_booking_value,
                subtotal,
            } => write!(
                f,
                "Booking value {} is below the promotion minimum of {}",
                subtotal, min_booking_value
            ),
            PromotionRejection::NotApplicable => {
                write!(f, "Promotion does not apply to this listing")
            }
            PromotionRejection::UsageExhausted { used, max } => {
                write!(f, "Promotion has been fully redeemed ({}/{} uses)", used, max)
            }
            PromotionRejection::UserLimitReached { used, max } => write!(
                f,
                "Promotion already used the maximum number of times by this guest ({}/{})",
                used, max
            ),
            PromotionRejection::NotStackableWithMembership => {
                write!(f, "Promotion cannot be combined with a membership discount")
            }
            PromotionRejection::NotStackable { applied_code } => write!(
                f,
                "Promotion cannot be combined with already applied code '{}'",
                applied_code
            ),
            PromotionRejection::AlreadyRedeemed => {
                write!(f, "Promotion was already redeemed for this booking")
            }
        }
    }
}

/// The outcome of evaluating a promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountDecision {
    /// The promotion applies.
    Applied {
        /// Discount before the max-discount cap.
        raw_discount: i64,
        /// Discount to take off the total.
        discount: i64,
    },
    /// The promotion does not apply.
    Rejected(PromotionRejection),
}

/// The result of evaluating a promotion, including the audit step.
#[derive(Debug, Clone)]
pub struct DiscountResult {
    /// Applied amount or rejection reason.
    pub decision: DiscountDecision,
    /// The audit step recording this evaluation.
    pub audit_step: AuditStep,
}

/// Computes a promotion's discount on `base`.
///
/// Returns `(raw, capped)`. PERCENTAGE takes `round(base * value / 100)` and
/// caps it at `max_discount`. FIXED_AMOUNT takes `value`. Either way the
/// result never exceeds `base`.
///
/// # Example
///
/// ```
/// use stay_engine::calculation::compute_discount;
/// use stay_engine::models::DiscountType;
/// use rust_decimal::Decimal;
///
/// let (raw, capped) = compute_discount(
///     DiscountType::Percentage,
///     Decimal::new(15, 0),
///     Some(300_000),
///     3_350_000,
/// );
/// assert_eq!(raw, 502_500);
/// assert_eq!(capped, 300_000);
/// ```
pub fn compute_discount(
    discount_type: DiscountType,
    value: Decimal,
    max_discount: Option<i64>,
    base: i64,
) -> (i64, i64) {
    let base = base.max(0);
    match discount_type {
        DiscountType::Percentage => {
            let raw = round_to_units(Decimal::from(base) * value / Decimal::ONE_HUNDRED).max(0);
            let capped = max_discount.map_or(raw, |cap| raw.min(cap.max(0)));
            (raw, capped.min(base))
        }
        DiscountType::FixedAmount => {
            let raw = round_to_units(value).max(0);
            (raw, raw.min(base))
        }
    }
}

fn check_eligibility(
    promotion: &Promotion,
    priced: &PricedBooking,
    context: &DiscountContext<'_>,
    now: DateTime<Utc>,
) -> Option<PromotionRejection> {
    if !promotion.is_active {
        return Some(PromotionRejection::Inactive);
    }
    if let Some(valid_from) = promotion.valid_from.filter(|from| now < *from) {
        return Some(PromotionRejection::NotYetValid { valid_from });
    }
    if let Some(valid_until) = promotion.valid_until.filter(|until| now >= *until) {
        return Some(PromotionRejection::Expired { valid_until });
    }
    if let Some(min) = promotion.min_booking_value.filter(|min| priced.subtotal() < *min) {
        return Some(PromotionRejection::BelowMinimum {
            min_booking_value: min,
            subtotal: priced.subtotal(),
        });
    }
    if !promotion.applies_to(context.listing) {
        return Some(PromotionRejection::NotApplicable);
    }
    if let Some(max) = promotion.max_uses.filter(|max| promotion.used_count >= *max) {
        return Some(PromotionRejection::UsageExhausted {
            used: promotion.used_count,
            max,
        });
    }
    if let Some(max) = promotion
        .max_uses_per_user
        .filter(|max| context.redeemer_uses >= *max)
    {
        return Some(PromotionRejection::UserLimitReached {
            used: context.redeemer_uses,
            max,
        });
    }
    if context.membership_discount && !promotion.stack_with_membership {
        return Some(PromotionRejection::NotStackableWithMembership);
    }
    if let Some(applied) = context
        .applied_promotions
        .iter()
        .find(|applied| !applied.stack_with_promotions)
    {
        return Some(PromotionRejection::NotStackable {
            applied_code: applied.code.clone(),
        });
    }
    None
}

/// Evaluates a promotion against a priced booking.
///
/// Eligibility checks run in order and the first failure wins: active,
/// validity window, minimum booking value, allow-lists, global usage cap,
/// per-guest cap, membership stacking, promotion stacking.
///
/// The discount base is the pre-discount total. When promotions are stacked
/// the discount is further capped at what is still payable.
pub fn evaluate_promotion(
    promotion: &Promotion,
    priced: &PricedBooking,
    context: &DiscountContext<'_>,
    now: DateTime<Utc>,
    step_number: u32,
) -> DiscountResult {
    let input = serde_json::json!({
        "code": promotion.code,
        "discount_type": promotion.discount_type,
        "discount_value": promotion.discount_value.normalize().to_string(),
        "max_discount": promotion.max_discount,
        "subtotal": priced.subtotal(),
        "payable": priced.total,
        "used_count": promotion.used_count,
        "redeemer_uses": context.redeemer_uses,
        "already_applied": context.applied_promotions.len()
    });

    if let Some(rejection) = check_eligibility(promotion, priced, context, now) {
        let reasoning = rejection.to_string();
        return DiscountResult {
            audit_step: AuditStep {
                step_number,
                rule_id: "promotion_discount".to_string(),
                rule_name: "Promotion Discount".to_string(),
                input,
                output: serde_json::json!({ "applied": false, "rejection": rejection }),
                reasoning,
            },
            decision: DiscountDecision::Rejected(rejection),
        };
    }

    let (raw_discount, capped) = compute_discount(
        promotion.discount_type,
        promotion.discount_value,
        promotion.max_discount,
        priced.subtotal(),
    );
    let discount = capped.min(priced.total);

    let reasoning = match promotion.discount_type {
        DiscountType::Percentage => format!(
            "{}% of {} = {}, capped to {}",
            promotion.discount_value.normalize(),
            priced.subtotal(),
            raw_discount,
            discount
        ),
        DiscountType::FixedAmount => format!(
            "Fixed discount {} on payable {} = {}",
            raw_discount, priced.total, discount
        ),
    };

    DiscountResult {
        decision: DiscountDecision::Applied {
            raw_discount,
            discount,
        },
        audit_step: AuditStep {
            step_number,
            rule_id: "promotion_discount".to_string(),
            rule_name: "Promotion Discount".to_string(),
            input,
            output: serde_json::json!({
                "applied": true,
                "raw_discount": raw_discount,
                "discount": discount,
                "total_after": priced.total - discount
            }),
            reasoning,
        },
    }
}
