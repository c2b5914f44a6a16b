//! Conversion of decimal intermediate results to whole currency units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to the nearest whole unit, halves away from zero.
///
/// Values outside the `i64` range saturate.
///
/// # Example
///
/// ```
/// use stay_engine::calculation::round_to_units;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_to_units(Decimal::new(2505, 1)), 251);
/// assert_eq!(round_to_units(Decimal::new(3000, 1)), 300);
/// ```
pub fn round_to_units(value: Decimal) -> i64 {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}
