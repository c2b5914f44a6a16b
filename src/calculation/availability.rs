//! Availability checking.
//!
//! Decides whether a listing can take a stay for a given range and party.
//! The check is a pure function of its inputs and safe to repeat; the
//! orchestrator runs it once up front and the reservation book re-runs the
//! overlap part under the listing lock at commit time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    AuditStep, BlockedInterval, BookingRejection, DateRange, ExistingReservation, Listing,
    PartyComposition, RejectionKind, RejectionReason, ReservationStatus,
};

/// Why a stay cannot be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AvailabilityRejection {
    /// The listing snapshot carries a value no stay can be priced from.
    InvalidListing {
        /// The listing id.
        listing_id: String,
        /// The offending field.
        field: String,
        /// Its value.
        value: i64,
    },
    /// The stay's price does not fit in whole currency units.
    PriceOutOfRange {
        /// The listing id.
        listing_id: String,
        /// Requested nights.
        nights: i64,
    },
    /// The listing is not accepting bookings.
    ListingInactive {
        /// The listing id.
        listing_id: String,
    },
    /// Check-in is before today.
    PastDate {
        /// Requested check-in.
        check_in: NaiveDate,
        /// The engine's current date.
        today: NaiveDate,
    },
    /// No adult in the party.
    EmptyParty,
    /// More guests than the listing holds.
    CapacityExceeded {
        /// Adults, children and infants requested.
        requested: u32,
        /// Listing capacity.
        max_guests: u32,
    },
    /// Pets requested at a listing that does not allow them.
    PetsNotAllowed {
        /// Pets requested.
        pets: u32,
    },
    /// Dates overlap an active reservation.
    ReservationConflict {
        /// The reservation's range.
        conflicting_range: DateRange,
    },
    /// Dates overlap a host block.
    BlockedDates {
        /// The blocked range.
        conflicting_range: DateRange,
    },
}

impl AvailabilityRejection {
    /// The broad category of this rejection.
    pub fn kind(&self) -> RejectionKind {
        match self {
            AvailabilityRejection::InvalidListing { .. }
            | AvailabilityRejection::PriceOutOfRange { .. }
            | AvailabilityRejection::PastDate { .. }
            | AvailabilityRejection::EmptyParty => RejectionKind::Validation,
            _ => RejectionKind::Conflict,
        }
    }

    /// The state-machine reason for this rejection.
    pub fn reason(&self) -> RejectionReason {
        match self {
            AvailabilityRejection::ListingInactive { .. }
            | AvailabilityRejection::PetsNotAllowed { .. } => RejectionReason::Policy,
            AvailabilityRejection::PastDate { .. } => RejectionReason::PastDate,
            AvailabilityRejection::InvalidListing { .. }
            | AvailabilityRejection::PriceOutOfRange { .. }
            | AvailabilityRejection::EmptyParty => RejectionReason::Invalid,
            AvailabilityRejection::CapacityExceeded { .. } => RejectionReason::Capacity,
            AvailabilityRejection::ReservationConflict { .. }
            | AvailabilityRejection::BlockedDates { .. } => RejectionReason::Unavailable,
        }
    }

    /// The range that caused a date conflict.
    pub fn conflicting_range(&self) -> Option<DateRange> {
        match self {
            AvailabilityRejection::ReservationConflict { conflicting_range }
            | AvailabilityRejection::BlockedDates { conflicting_range } => Some(*conflicting_range),
            _ => None,
        }
    }

    /// Converts into the caller-facing rejection.
    pub fn to_booking_rejection(&self) -> BookingRejection {
        BookingRejection {
            kind: self.kind(),
            reason: self.reason(),
            message: self.to_string(),
            conflicting_range: self.conflicting_range(),
        }
    }
}

impl std::fmt::Display for AvailabilityRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityRejection::InvalidListing {
                listing_id,
                field,
                value,
            } => write!(f, "Listing '{}' has invalid {} ({})", listing_id, field, value),
            AvailabilityRejection::PriceOutOfRange { listing_id, nights } => write!(
                f,
                "Price of {} night(s) at listing '{}' is out of range",
                nights, listing_id
            ),
            AvailabilityRejection::ListingInactive { listing_id } => {
                write!(f, "Listing '{}' is not accepting bookings", listing_id)
            }
            AvailabilityRejection::PastDate { check_in, today } => {
                write!(f, "Check-in {} is in the past (today is {})", check_in, today)
            }
            AvailabilityRejection::EmptyParty => write!(f, "At least one adult is required"),
            AvailabilityRejection::CapacityExceeded {
                requested,
                max_guests,
            } => write!(
                f,
                "Party of {} exceeds listing capacity of {}",
                requested, max_guests
            ),
            AvailabilityRejection::PetsNotAllowed { pets } => {
                write!(f, "Listing does not allow pets ({} requested)", pets)
            }
            AvailabilityRejection::ReservationConflict { conflicting_range } => write!(
                f,
                "Dates overlap an existing reservation {}",
                conflicting_range
            ),
            AvailabilityRejection::BlockedDates { conflicting_range } => {
                write!(f, "Dates overlap host-blocked dates {}", conflicting_range)
            }
        }
    }
}

/// The outcome of an availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The stay can be booked.
    Available,
    /// The stay cannot be booked.
    Rejected(AvailabilityRejection),
}

/// The result of an availability check, including the audit step.
#[derive(Debug, Clone)]
pub struct AvailabilityResult {
    /// Available or the first reason it is not.
    pub availability: Availability,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

/// Finds the first active reservation or host block overlapping `range`.
///
/// Reservations are checked before blocks so the caller gets the more
/// actionable conflict. Entries for other listings are ignored.
pub fn find_conflict(
    listing_id: &str,
    range: &DateRange,
    reservations: &[ExistingReservation],
    blocked: &[BlockedInterval],
    active_statuses: &[ReservationStatus],
) -> Option<AvailabilityRejection> {
    let reservation_conflict = reservations
        .iter()
        .filter(|r| r.listing_id == listing_id && active_statuses.contains(&r.status))
        .find(|r| r.range.overlaps(range))
        .map(|r| AvailabilityRejection::ReservationConflict {
            conflicting_range: r.range,
        });

    reservation_conflict.or_else(|| {
        blocked
            .iter()
            .filter(|b| b.listing_id == listing_id)
            .find(|b| b.range.overlaps(range))
            .map(|b| AvailabilityRejection::BlockedDates {
                conflicting_range: b.range,
            })
    })
}

fn check_preconditions(
    listing: &Listing,
    range: &DateRange,
    party: &PartyComposition,
    today: NaiveDate,
) -> Option<AvailabilityRejection> {
    if let Some((field, value)) = listing.invalid_field() {
        return Some(AvailabilityRejection::InvalidListing {
            listing_id: listing.id.clone(),
            field: field.to_string(),
            value,
        });
    }
    if listing.stay_cost(range.nights()).is_none() {
        return Some(AvailabilityRejection::PriceOutOfRange {
            listing_id: listing.id.clone(),
            nights: range.nights(),
        });
    }
    if !listing.is_active {
        return Some(AvailabilityRejection::ListingInactive {
            listing_id: listing.id.clone(),
        });
    }
    if range.start() < today {
        return Some(AvailabilityRejection::PastDate {
            check_in: range.start(),
            today,
        });
    }
    if party.adults == 0 {
        return Some(AvailabilityRejection::EmptyParty);
    }
    if party.total_guests() > listing.max_guests {
        return Some(AvailabilityRejection::CapacityExceeded {
            requested: party.total_guests(),
            max_guests: listing.max_guests,
        });
    }
    if party.pets > 0 && !listing.allows_pets {
        return Some(AvailabilityRejection::PetsNotAllowed { pets: party.pets });
    }
    None
}

/// Checks whether a listing can be booked for a range and party.
///
/// Cheap checks run first: a priceable listing snapshot, listing active,
/// check-in not in the past (date-only comparison), at least one adult,
/// capacity, pet policy. Only if all pass are existing reservations and host
/// blocks scanned for overlap.
///
/// # Arguments
///
/// * `listing` - The listing snapshot
/// * `range` - The requested nights
/// * `party` - Who is travelling
/// * `reservations` - Existing reservations; only active statuses count
/// * `blocked` - Host-blocked intervals; all count
/// * `active_statuses` - Reservation statuses that hold dates
/// * `today` - The current date
/// * `step_number` - The step number for audit trail sequencing
#[allow(clippy::too_many_arguments)]
pub fn check_availability(
    listing: &Listing,
    range: &DateRange,
    party: &PartyComposition,
    reservations: &[ExistingReservation],
    blocked: &[BlockedInterval],
    active_statuses: &[ReservationStatus],
    today: NaiveDate,
    step_number: u32,
) -> AvailabilityResult {
    let rejection = check_preconditions(listing, range, party, today).or_else(|| {
        find_conflict(&listing.id, range, reservations, blocked, active_statuses)
    });

    let input = serde_json::json!({
        "listing_id": listing.id,
        "range": range.to_string(),
        "guests": party.total_guests(),
        "pets": party.pets,
        "reservations_considered": reservations.len(),
        "blocked_considered": blocked.len(),
        "today": today.to_string()
    });

    let (availability, output, reasoning) = match rejection {
        None => (
            Availability::Available,
            serde_json::json!({ "available": true }),
            format!(
                "{} is free at listing '{}' for {} guest(s)",
                range,
                listing.id,
                party.total_guests()
            ),
        ),
        Some(rejection) => {
            let output = serde_json::json!({
                "available": false,
                "reason": rejection.reason(),
                "conflicting_range": rejection.conflicting_range().map(|r| r.to_string())
            });
            let reasoning = rejection.to_string();
            (Availability::Rejected(rejection), output, reasoning)
        }
    };

    AvailabilityResult {
        availability,
        audit_step: AuditStep {
            step_number,
            rule_id: "availability_check".to_string(),
            rule_name: "Availability Check".to_string(),
            input,
            output,
            reasoning,
        },
    }
}
