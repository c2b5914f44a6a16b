//! Core data models for the stay engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod booking_request;
mod date_range;
mod listing;
mod priced_booking;
mod promotion;
mod rejection;
mod reservation;
mod rewards;

pub use audit::AuditStep;
pub use booking_request::{BookingRequest, ContactIdentity, PartyComposition};
pub use date_range::DateRange;
pub use listing::{BookingMode, Listing};
pub use priced_booking::{BookingStatus, PricedBooking};
pub use promotion::{DiscountType, Promotion};
pub use rejection::{BookingRejection, RejectionKind, RejectionReason};
pub use reservation::{
    BlockedInterval, ExistingReservation, ReservationStatus, STATUS_ALIASES,
};
pub use rewards::{RewardAction, RewardTransaction, TierDefinition, UserRewardState};
