//! Priced booking model and booking status.

use serde::{Deserialize, Serialize};

use super::ReservationStatus;

/// Status of an accepted booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Waiting for the host to confirm.
    Pending,
    /// Confirmed immediately (instant-bookable listing) or by the host.
    Confirmed,
    /// The stay has finished.
    Completed,
}

impl BookingStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BookingStatus> for ReservationStatus {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => ReservationStatus::Pending,
            BookingStatus::Confirmed => ReservationStatus::Confirmed,
            BookingStatus::Completed => ReservationStatus::Completed,
        }
    }
}

/// The monetary breakdown of a stay.
///
/// All amounts are whole currency units. The breakdown keeps the identity
/// `total == base_price_total + cleaning_fee + service_fee - discount` and
/// never lets `total` drop below zero.
///
/// # Example
///
/// ```
/// use stay_engine::models::PricedBooking;
///
/// let mut priced = PricedBooking::new(3, 3_000_000, 200_000, 150_000, "VND");
/// assert_eq!(priced.total, 3_350_000);
///
/// priced.add_discount(300_000);
/// assert_eq!(priced.total, 3_050_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedBooking {
    /// Number of nights, at least 1.
    pub nights: i64,
    /// Nightly rate times nights.
    pub base_price_total: i64,
    /// Flat cleaning fee.
    pub cleaning_fee: i64,
    /// Platform service fee, fixed before any discount is applied.
    pub service_fee: i64,
    /// Sum of all discounts applied.
    pub discount: i64,
    /// Amount payable by the guest.
    pub total: i64,
    /// ISO currency code.
    pub currency: String,
}

impl PricedBooking {
    /// Creates an undiscounted breakdown.
    pub fn new(
        nights: i64,
        base_price_total: i64,
        cleaning_fee: i64,
        service_fee: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            nights,
            base_price_total,
            cleaning_fee,
            service_fee,
            discount: 0,
            total: base_price_total
                .saturating_add(cleaning_fee)
                .saturating_add(service_fee),
            currency: currency.into(),
        }
    }

    /// The total before any discount. Saturates at `i64::MAX`.
    pub fn subtotal(&self) -> i64 {
        self.base_price_total
            .saturating_add(self.cleaning_fee)
            .saturating_add(self.service_fee)
    }

    /// Adds a discount, capped at the amount still payable.
    ///
    /// Returns the amount that was actually applied. The service fee is left
    /// untouched.
    pub fn add_discount(&mut self, amount: i64) -> i64 {
        let applied = amount.clamp(0, self.total);
        self.discount += applied;
        self.total = self.subtotal() - self.discount;
        applied
    }
}
