//! In-memory reservation calendar with per-listing commit locks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::calculation::{AvailabilityRejection, find_conflict};
use crate::error::{EngineError, EngineResult};
use crate::models::{BlockedInterval, ExistingReservation, ReservationStatus};

#[derive(Debug, Default)]
struct ListingCalendar {
    reservations: Vec<ExistingReservation>,
    blocked: Vec<BlockedInterval>,
}

/// Why a commit did not write a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError<E> {
    /// The range overlapped something committed since the first check.
    Conflict(AvailabilityRejection),
    /// The caller's pre-insert step refused.
    Aborted(E),
}

/// Reservations and host blocks, partitioned by listing.
///
/// Each listing has its own lock. Commits for one listing serialize; commits
/// for different listings do not contend beyond the brief map lookup.
#[derive(Debug, Default)]
pub struct ReservationBook {
    listings: Mutex<HashMap<String, Arc<Mutex<ListingCalendar>>>>,
}

impl ReservationBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    fn calendar(&self, listing_id: &str) -> Arc<Mutex<ListingCalendar>> {
        let mut listings = self.listings.lock();
        Arc::clone(listings.entry(listing_id.to_string()).or_default())
    }

    fn calendars(&self) -> Vec<Arc<Mutex<ListingCalendar>>> {
        self.listings.lock().values().cloned().collect()
    }

    /// Records a reservation without checking for conflicts.
    ///
    /// Used to load reservations that already exist elsewhere.
    pub fn add_reservation(&self, reservation: ExistingReservation) {
        self.calendar(&reservation.listing_id)
            .lock()
            .reservations
            .push(reservation);
    }

    /// Closes a range on a listing.
    pub fn block_dates(&self, interval: BlockedInterval) {
        self.calendar(&interval.listing_id)
            .lock()
            .blocked
            .push(interval);
    }

    /// Snapshot of a listing's reservations.
    pub fn reservations_for(&self, listing_id: &str) -> Vec<ExistingReservation> {
        self.calendar(listing_id).lock().reservations.clone()
    }

    /// Snapshot of a listing's blocked intervals.
    pub fn blocked_for(&self, listing_id: &str) -> Vec<BlockedInterval> {
        self.calendar(listing_id).lock().blocked.clone()
    }

    /// Finds a reservation by booking id.
    pub fn find(&self, booking_id: Uuid) -> Option<ExistingReservation> {
        self.calendars().into_iter().find_map(|calendar| {
            calendar
                .lock()
                .reservations
                .iter()
                .find(|r| r.id == booking_id)
                .cloned()
        })
    }

    /// Writes a reservation if its range is still free.
    ///
    /// Under the listing lock: re-runs the overlap check, then runs
    /// `before_insert`, then inserts. If either step refuses, nothing is
    /// written. `before_insert` is where dependent writes (such as a
    /// promotion redemption) go so they commit or fail with the reservation.
    pub fn commit_with<T, E, F>(
        &self,
        reservation: ExistingReservation,
        active_statuses: &[ReservationStatus],
        before_insert: F,
    ) -> Result<T, CommitError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let calendar = self.calendar(&reservation.listing_id);
        let mut calendar = calendar.lock();

        if let Some(conflict) = find_conflict(
            &reservation.listing_id,
            &reservation.range,
            &calendar.reservations,
            &calendar.blocked,
            active_statuses,
        ) {
            debug!(
                listing_id = %reservation.listing_id,
                range = %reservation.range,
                "Commit refused: range taken"
            );
            return Err(CommitError::Conflict(conflict));
        }

        let value = before_insert().map_err(CommitError::Aborted)?;
        calendar.reservations.push(reservation);
        Ok(value)
    }

    /// Changes a reservation's status. Returns the updated reservation.
    pub fn update_status(
        &self,
        booking_id: Uuid,
        status: ReservationStatus,
    ) -> EngineResult<ExistingReservation> {
        for calendar in self.calendars() {
            let mut calendar = calendar.lock();
            if let Some(reservation) = calendar
                .reservations
                .iter_mut()
                .find(|r| r.id == booking_id)
            {
                reservation.status = status;
                return Ok(reservation.clone());
            }
        }
        Err(EngineError::BookingNotFound { booking_id })
    }
}
