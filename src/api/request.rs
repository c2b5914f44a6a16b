//! Request types for the stay engine API.

use serde::{Deserialize, Serialize};

use crate::booking::BookingSubmission;
use crate::models::{BookingRequest, ContactIdentity, DateRange, Listing, PartyComposition};

/// Request body for `POST /bookings`.
///
/// `range` accepts either `start`/`end` or `check_in`/`check_out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBookingRequest {
    /// Listing id the guest asked for. Defaults to the snapshot's id.
    #[serde(default)]
    pub listing_id: Option<String>,
    /// Snapshot of the listing.
    pub listing: Listing,
    /// Requested nights.
    pub range: DateRange,
    /// Who is travelling.
    pub party: PartyComposition,
    /// Who is booking.
    #[serde(default)]
    pub contact: Option<ContactIdentity>,
    /// A single promotion code.
    #[serde(default)]
    pub promotion_code: Option<String>,
    /// Further promotion codes to stack, applied after `promotion_code`.
    #[serde(default)]
    pub promotion_codes: Vec<String>,
    /// Whether a membership-tier discount is already in play.
    #[serde(default)]
    pub membership_discount: bool,
}

impl From<SubmitBookingRequest> for BookingSubmission {
    fn from(request: SubmitBookingRequest) -> Self {
        let promotion_codes = request
            .promotion_code
            .into_iter()
            .chain(request.promotion_codes)
            .collect();
        BookingSubmission {
            request: BookingRequest {
                listing_id: request.listing_id.unwrap_or_else(|| request.listing.id.clone()),
                range: request.range,
                party: request.party,
                contact: request.contact,
            },
            listing: request.listing,
            promotion_codes,
            membership_discount: request.membership_discount,
        }
    }
}

/// Request body for `POST /rewards/credit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRewardRequest {
    /// The user to credit.
    pub user_id: String,
    /// The action earned.
    pub action_slug: String,
    /// Idempotency reference, such as a booking id.
    #[serde(default)]
    pub reference_id: Option<String>,
    /// Free-form context. `multiplier` scales the points.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Request body for `POST /rewards/enroll`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollRequest {
    /// The user to enroll.
    pub user_id: String,
}
