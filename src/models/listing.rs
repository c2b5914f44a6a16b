//! Listing snapshot model.
//!
//! Listings are owned by the surrounding marketplace. The engine only reads a
//! snapshot of the fields that affect availability and price.

use serde::{Deserialize, Serialize};

/// How a listing accepts new bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    /// Bookings are confirmed immediately without host approval.
    Instant,
    /// Bookings wait for the host to confirm them.
    Request,
}

/// Read-only snapshot of a bookable listing.
///
/// Money values are whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Unique identifier of the listing.
    pub id: String,
    /// Property type used by promotion allow-lists (e.g. "villa", "apartment").
    pub property_type: String,
    /// Maximum number of guests, counting adults, children and infants.
    pub max_guests: u32,
    /// Whether guests may bring pets.
    #[serde(default)]
    pub allows_pets: bool,
    /// Price per night.
    pub base_price: i64,
    /// Flat cleaning fee charged once per stay.
    #[serde(default)]
    pub cleaning_fee: i64,
    /// Booking mode.
    pub booking_mode: BookingMode,
    /// Inactive listings accept no bookings.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Listing {
    /// Returns true if new bookings are confirmed without host approval.
    pub fn is_instant_bookable(&self) -> bool {
        self.booking_mode == BookingMode::Instant
    }

    /// Returns the first field that makes the snapshot unbookable, with its
    /// value.
    ///
    /// The nightly rate must be positive, the cleaning fee non-negative and
    /// the capacity at least one guest.
    pub fn invalid_field(&self) -> Option<(&'static str, i64)> {
        if self.base_price <= 0 {
            return Some(("base_price", self.base_price));
        }
        if self.cleaning_fee < 0 {
            return Some(("cleaning_fee", self.cleaning_fee));
        }
        if self.max_guests == 0 {
            return Some(("max_guests", 0));
        }
        None
    }

    /// Nightly rate times `nights` plus the cleaning fee, or `None` if the
    /// amount does not fit in whole currency units.
    pub fn stay_cost(&self, nights: i64) -> Option<i64> {
        self.base_price
            .checked_mul(nights)?
            .checked_add(self.cleaning_fee)
    }
}
