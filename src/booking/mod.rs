//! Booking pipeline: the state machine and the orchestrator that drives it.

mod orchestrator;
mod state;

pub use orchestrator::{
    AcceptedBooking, BookingOrchestrator, BookingOutcome, BookingSubmission, CompletedStay,
};
pub use state::{BookingMachine, BookingState};
