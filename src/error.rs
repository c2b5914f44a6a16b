//! Error types for the stay engine.
//!
//! Expected business outcomes (unavailable dates, ineligible promotions,
//! duplicate reward credits) are modelled as typed result values in their own
//! modules. This module covers the failures that are not routine: broken
//! configuration, malformed input that cannot even be represented, and
//! internal faults in the orchestration layer.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the stay engine.
///
/// # Example
///
/// ```
/// use stay_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A date range did not satisfy `start < end`.
    #[error("Invalid date range [{start}, {end}): check-out must be after check-in")]
    InvalidDateRange {
        /// The requested check-in date.
        start: NaiveDate,
        /// The requested check-out date.
        end: NaiveDate,
    },

    /// A reservation status string had no entry in the alias table.
    #[error("Unknown reservation status: {status}")]
    UnknownStatus {
        /// The raw status string.
        status: String,
    },

    /// The booking state machine was driven through an illegal transition.
    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition {
        /// The state the booking was in.
        from: String,
        /// The state that was requested.
        to: String,
    },

    /// The listing snapshot did not match the booking request.
    #[error("Listing mismatch: request targets '{requested}' but snapshot is '{snapshot}'")]
    ListingMismatch {
        /// The listing id carried by the request.
        requested: String,
        /// The listing id of the supplied snapshot.
        snapshot: String,
    },

    /// A promotion with the same normalized code is already registered.
    #[error("Duplicate promotion code: {code}")]
    DuplicatePromotionCode {
        /// The normalized code.
        code: String,
    },

    /// No accepted booking exists with the given id.
    #[error("Booking not found: {booking_id}")]
    BookingNotFound {
        /// The booking id that was looked up.
        booking_id: Uuid,
    },

    /// The booking is not in a status the requested action applies to.
    #[error("Cannot {action} booking {booking_id} while it is {status}")]
    BookingStatusConflict {
        /// The booking id.
        booking_id: Uuid,
        /// Its current status.
        status: String,
        /// The action that was refused.
        action: String,
    },

    /// An internal failure in a counter or ledger step. Retryable; no
    /// partial state was written.
    #[error("Internal error: {message}")]
    Internal {
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
