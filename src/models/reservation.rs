//! Existing reservations, host-blocked intervals and reservation statuses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DateRange;
use crate::error::{EngineError, EngineResult};

/// Canonical reservation status.
///
/// Upstream systems use a wider vocabulary of status strings. They are folded
/// onto this closed set through [`STATUS_ALIASES`], never by ad hoc string
/// matching at call sites. Deserialization goes through the same table, so
/// any alias is accepted as input and the canonical name is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ReservationStatus {
    /// Awaiting host confirmation or payment.
    Pending,
    /// Confirmed by the host or instantly booked.
    Confirmed,
    /// The stay has finished.
    Completed,
    /// Cancelled by guest or host.
    Cancelled,
    /// Declined by the host.
    Rejected,
    /// Lapsed without confirmation.
    Expired,
}

/// Source status strings and the canonical status each maps to.
///
/// Every canonical status appears under its own name, so the table is the
/// single source of truth for parsing.
pub const STATUS_ALIASES: &[(&str, ReservationStatus)] = &[
    ("pending", ReservationStatus::Pending),
    ("reviewing", ReservationStatus::Pending),
    ("awaiting_payment", ReservationStatus::Pending),
    ("awaiting_host", ReservationStatus::Pending),
    ("confirmed", ReservationStatus::Confirmed),
    ("approved", ReservationStatus::Confirmed),
    ("checked_in", ReservationStatus::Confirmed),
    ("completed", ReservationStatus::Completed),
    ("checked_out", ReservationStatus::Completed),
    ("cancelled", ReservationStatus::Cancelled),
    ("canceled", ReservationStatus::Cancelled),
    ("cancelled_by_guest", ReservationStatus::Cancelled),
    ("cancelled_by_host", ReservationStatus::Cancelled),
    ("rejected", ReservationStatus::Rejected),
    ("declined", ReservationStatus::Rejected),
    ("expired", ReservationStatus::Expired),
];

impl ReservationStatus {
    /// Maps a source status string onto the canonical set.
    ///
    /// Matching ignores case and surrounding whitespace. Unknown strings are
    /// an error rather than being treated as inactive.
    ///
    /// # Example
    ///
    /// ```
    /// use stay_engine::models::ReservationStatus;
    ///
    /// assert_eq!(
    ///     ReservationStatus::from_alias("Reviewing").unwrap(),
    ///     ReservationStatus::Pending
    /// );
    /// assert!(ReservationStatus::from_alias("on_hold").is_err());
    /// ```
    pub fn from_alias(raw: &str) -> EngineResult<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        STATUS_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, status)| *status)
            .ok_or_else(|| EngineError::UnknownStatus {
                status: raw.to_string(),
            })
    }

    /// The canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Expired => "expired",
        }
    }

    /// The statuses that hold dates when no configuration overrides them.
    pub fn default_active() -> Vec<ReservationStatus> {
        vec![
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Completed,
        ]
    }
}

impl TryFrom<String> for ReservationStatus {
    type Error = EngineError;

    fn try_from(raw: String) -> EngineResult<Self> {
        Self::from_alias(&raw)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation already recorded against a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingReservation {
    /// The booking id of the reservation.
    pub id: Uuid,
    /// The listing the reservation holds.
    pub listing_id: String,
    /// Nights held by the reservation.
    pub range: DateRange,
    /// Current status.
    pub status: ReservationStatus,
}

/// Dates a host has closed for booking.
///
/// Blocked intervals always take part in conflict checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedInterval {
    /// The listing the block applies to.
    pub listing_id: String,
    /// Nights that are closed.
    pub range: DateRange,
    /// Optional host note (e.g. "maintenance").
    #[serde(default)]
    pub reason: Option<String>,
}
