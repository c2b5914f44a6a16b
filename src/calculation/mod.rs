//! Calculation logic for the stay engine.
//!
//! Pure functions only: availability checks, stay pricing, promotion
//! discounts and loyalty points. Each step returns its result together
//! with the audit step describing how it was reached.

mod availability;
mod discount;
mod pricing;
mod rounding;
mod tier;

pub use availability::{
    Availability, AvailabilityRejection, AvailabilityResult, check_availability, find_conflict,
};
pub use discount::{
    AppliedPromotion, DiscountContext, DiscountDecision, DiscountResult, PromotionRejection,
    compute_discount, evaluate_promotion,
};
pub use pricing::{PricingResult, price_stay, service_fee};
pub use rounding::round_to_units;
pub use tier::{compute_points, resolve_tier};
