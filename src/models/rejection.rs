//! Typed rejection values returned to callers.
//!
//! Rejections are routine business outcomes, not errors. They carry enough
//! detail for the caller to explain the refusal or suggest alternatives.

use serde::{Deserialize, Serialize};

use super::DateRange;

/// Broad category of a rejection, used by callers to decide what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    /// Malformed input. Rejected before any state change.
    Validation,
    /// Dates, capacity or policy conflict with the listing.
    Conflict,
    /// The promotion cannot be used. The booking may be retried without it.
    PromotionIneligible,
}

/// The specific reason a booking reached the `Rejected` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// Input could not be accepted as given.
    Invalid,
    /// Check-in lies before today.
    PastDate,
    /// Party larger than the listing allows.
    Capacity,
    /// Listing policy forbids the stay (pets, inactive listing).
    Policy,
    /// Dates overlap a reservation or a host block.
    Unavailable,
    /// Promotion code could not be applied.
    PromotionIneligible,
}

/// A booking rejection as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRejection {
    /// Rejection category.
    pub kind: RejectionKind,
    /// Specific reason.
    pub reason: RejectionReason,
    /// Human-readable explanation.
    pub message: String,
    /// The range that blocked the request, for date conflicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_range: Option<DateRange>,
}
