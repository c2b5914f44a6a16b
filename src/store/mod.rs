//! Shared mutable state: reservations, promotion redemptions and the
//! rewards ledger.
//!
//! Every read-modify-write against these stores happens inside a single
//! `parking_lot::Mutex` critical section.

mod promotions;
mod reservations;
mod rewards;

pub use promotions::{PromotionBook, Redemption};
pub use reservations::{CommitError, ReservationBook};
pub use rewards::{CreditOutcome, CreditReceipt, RewardRejection, RewardsLedger};
