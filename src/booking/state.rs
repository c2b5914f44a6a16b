//! The booking state machine.

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::models::RejectionReason;

/// Where a booking is in its evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    /// Built from input, nothing checked yet.
    Draft,
    /// Availability confirmed.
    Validated,
    /// Pre-discount breakdown computed.
    Priced,
    /// Promotion applied, or none supplied.
    Discounted,
    /// Committed.
    Accepted,
    /// Refused.
    Rejected(RejectionReason),
}

impl BookingState {
    /// The state that follows on success, if any.
    pub fn next(self) -> Option<BookingState> {
        match self {
            BookingState::Draft => Some(BookingState::Validated),
            BookingState::Validated => Some(BookingState::Priced),
            BookingState::Priced => Some(BookingState::Discounted),
            BookingState::Discounted => Some(BookingState::Accepted),
            BookingState::Accepted | BookingState::Rejected(_) => None,
        }
    }

    /// True for `Accepted` and `Rejected`.
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingState::Draft => write!(f, "DRAFT"),
            BookingState::Validated => write!(f, "VALIDATED"),
            BookingState::Priced => write!(f, "PRICED"),
            BookingState::Discounted => write!(f, "DISCOUNTED"),
            BookingState::Accepted => write!(f, "ACCEPTED"),
            BookingState::Rejected(reason) => write!(f, "REJECTED({:?})", reason),
        }
    }
}

/// Tracks one booking through its states.
///
/// Only forward moves along `Draft → Validated → Priced → Discounted →
/// Accepted` and rejection from a non-terminal state are legal. Anything
/// else is an internal fault and returns `InvalidTransition`.
#[derive(Debug, Clone)]
pub struct BookingMachine {
    state: BookingState,
}

impl Default for BookingMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingMachine {
    /// Starts in `Draft`.
    pub fn new() -> Self {
        Self {
            state: BookingState::Draft,
        }
    }

    /// The current state.
    pub fn state(&self) -> BookingState {
        self.state
    }

    /// Moves to `to`, which must be the next state.
    pub fn advance(&mut self, to: BookingState) -> EngineResult<BookingState> {
        if self.state.next() != Some(to) {
            return Err(self.invalid(to));
        }
        self.state = to;
        Ok(to)
    }

    /// Moves to `Rejected(reason)`.
    pub fn reject(&mut self, reason: RejectionReason) -> EngineResult<BookingState> {
        let to = BookingState::Rejected(reason);
        if self.state.is_terminal() {
            return Err(self.invalid(to));
        }
        self.state = to;
        Ok(to)
    }

    fn invalid(&self, to: BookingState) -> EngineError {
        EngineError::InvalidTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}
