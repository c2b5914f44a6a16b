//! Stay pricing.
//!
//! Produces the pre-discount breakdown for a stay. The service fee is fixed
//! here and carried through unchanged; promotions reduce the guest's total
//! but never the fee base.

use rust_decimal::Decimal;

use super::round_to_units;
use crate::config::EngineSettings;
use crate::models::{AuditStep, DateRange, Listing, PricedBooking};

/// The result of pricing a stay, including the audit step.
#[derive(Debug, Clone)]
pub struct PricingResult {
    /// The undiscounted breakdown.
    pub priced: PricedBooking,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes the platform service fee for a nightly total.
///
/// # Example
///
/// ```
/// use stay_engine::calculation::service_fee;
/// use rust_decimal::Decimal;
///
/// assert_eq!(service_fee(3_000_000, Decimal::new(5, 2)), 150_000);
/// ```
pub fn service_fee(base_price_total: i64, rate: Decimal) -> i64 {
    round_to_units(Decimal::from(base_price_total) * rate).max(0)
}

/// Prices a stay before any discount.
///
/// * `nights = range.nights()`
/// * `base_price_total = listing.base_price * nights`
/// * `cleaning_fee = listing.cleaning_fee` (flat, once per stay)
/// * `service_fee = round(base_price_total * settings.service_fee_rate)`
///
/// # Example
///
/// ```
/// use stay_engine::calculation::price_stay;
/// use stay_engine::config::EngineSettings;
/// use stay_engine::models::{BookingMode, DateRange, Listing};
/// use chrono::NaiveDate;
///
/// let listing = Listing {
///     id: "lst_001".to_string(),
///     property_type: "villa".to_string(),
///     max_guests: 4,
///     allows_pets: false,
///     base_price: 1_000_000,
///     cleaning_fee: 200_000,
///     booking_mode: BookingMode::Instant,
///     is_active: true,
/// };
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
/// ).unwrap();
///
/// let result = price_stay(&listing, &range, &EngineSettings::default(), 2);
/// assert_eq!(result.priced.total, 3_350_000);
/// ```
pub fn price_stay(
    listing: &Listing,
    range: &DateRange,
    settings: &EngineSettings,
    step_number: u32,
) -> PricingResult {
    let nights = range.nights();
    let base_price_total = listing.base_price.saturating_mul(nights);
    let fee = service_fee(base_price_total, settings.service_fee_rate);

    let priced = PricedBooking::new(
        nights,
        base_price_total,
        listing.cleaning_fee,
        fee,
        settings.currency.clone(),
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "stay_pricing".to_string(),
        rule_name: "Stay Pricing".to_string(),
        input: serde_json::json!({
            "base_price": listing.base_price,
            "nights": nights,
            "cleaning_fee": listing.cleaning_fee,
            "service_fee_rate": settings.service_fee_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "base_price_total": priced.base_price_total,
            "cleaning_fee": priced.cleaning_fee,
            "service_fee": priced.service_fee,
            "total": priced.total,
            "currency": priced.currency
        }),
        reasoning: format!(
            "{} x {} nights = {}; + cleaning {} + service fee {} = {} {}",
            listing.base_price,
            nights,
            priced.base_price_total,
            priced.cleaning_fee,
            priced.service_fee,
            priced.total,
            priced.currency
        ),
    };

    PricingResult { priced, audit_step }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingMode;
    use chrono::NaiveDate;

    fn create_test_listing(base_price: i64, cleaning_fee: i64) -> Listing {
        Listing {
            id: "lst_001".to_string(),
            property_type: "villa".to_string(),
            max_guests: 4,
            allows_pets: false,
            base_price,
            cleaning_fee,
            booking_mode: BookingMode::Instant,
            is_active: true,
        }
    }

    fn nights_from_march_10(nights: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 10 + nights).unwrap(),
        )
        .unwrap()
    }

    /// PR-001: three nights with cleaning and service fee
    #[test]
    fn test_three_nights_pre_discount_total() {
        let listing = create_test_listing(1_000_000, 200_000);
        let result = price_stay(&listing, &nights_from_march_10(3), &EngineSettings::default(), 2);

        assert_eq!(result.priced.nights, 3);
        assert_eq!(result.priced.base_price_total, 3_000_000);
        assert_eq!(result.priced.cleaning_fee, 200_000);
        assert_eq!(result.priced.service_fee, 150_000);
        assert_eq!(result.priced.discount, 0);
        assert_eq!(result.priced.total, 3_350_000);
        assert_eq!(result.priced.currency, "VND");
    }

    /// PR-002: cleaning fee is not multiplied by nights
    #[test]
    fn test_cleaning_fee_is_flat() {
        let listing = create_test_listing(500_000, 150_000);
        let result = price_stay(&listing, &nights_from_march_10(7), &EngineSettings::default(), 2);
        assert_eq!(result.priced.cleaning_fee, 150_000);
        assert_eq!(result.priced.base_price_total, 3_500_000);
    }

    /// PR-003: service fee rounds half away from zero
    #[test]
    fn test_service_fee_rounding() {
        // 5% of 10 = 0.5 -> 1
        assert_eq!(service_fee(10, Decimal::new(5, 2)), 1);
        // 5% of 29 = 1.45 -> 1
        assert_eq!(service_fee(29, Decimal::new(5, 2)), 1);
    }

    #[test]
    fn test_zero_service_fee_rate() {
        let listing = create_test_listing(1_000_000, 0);
        let settings = EngineSettings {
            service_fee_rate: Decimal::ZERO,
            ..EngineSettings::default()
        };
        let result = price_stay(&listing, &nights_from_march_10(2), &settings, 2);
        assert_eq!(result.priced.service_fee, 0);
        assert_eq!(result.priced.total, 2_000_000);
    }

    #[test]
    fn test_audit_step_records_breakdown() {
        let listing = create_test_listing(1_000_000, 200_000);
        let result = price_stay(&listing, &nights_from_march_10(3), &EngineSettings::default(), 4);

        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.rule_id, "stay_pricing");
        assert_eq!(result.audit_step.output["total"], 3_350_000);
        assert_eq!(result.audit_step.input["service_fee_rate"], "0.05");
        assert!(result.audit_step.reasoning.contains("3 nights"));
    }

    #[test]
    fn test_oversized_rate_saturates_without_panicking() {
        let listing = create_test_listing(i64::MAX / 2, 200_000);
        let result = price_stay(&listing, &nights_from_march_10(3), &EngineSettings::default(), 2);

        assert_eq!(result.priced.base_price_total, i64::MAX);
        assert_eq!(result.priced.total, i64::MAX);
        assert!(result.priced.total >= 0);
    }
}
