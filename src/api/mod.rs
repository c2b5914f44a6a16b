//! HTTP API module for the stay engine.
//!
//! Thin axum adapter over [`crate::booking::BookingOrchestrator`]: booking
//! submission and completion, promotion administration, and the rewards
//! ledger.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CreditRewardRequest, EnrollRequest, SubmitBookingRequest};
pub use response::{ApiError, ApiErrorResponse, CreditResponse, RejectedBookingBody};
pub use state::AppState;
