//! Notification dispatch boundary.
//!
//! Delivery (email, push) belongs to an external collaborator. The engine
//! hands it events fire-and-forget; a failed dispatch is logged and never
//! undoes the booking or the reward credit that triggered it.

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{BookingStatus, DateRange};

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A booking was accepted.
    BookingCreated {
        /// The new booking id.
        booking_id: Uuid,
        /// The listing booked.
        listing_id: String,
        /// The nights booked.
        range: DateRange,
        /// Confirmed or awaiting the host.
        status: BookingStatus,
        /// Amount payable.
        total: i64,
    },
    /// Loyalty points were credited.
    RewardEarned {
        /// The user credited.
        user_id: String,
        /// The action that earned the points.
        action_slug: String,
        /// Points credited.
        points: i64,
        /// Balance after the credit.
        balance_after: i64,
        /// New tier slug, when the credit caused an upgrade.
        upgraded_to: Option<String>,
    },
}

/// A failed dispatch.
#[derive(Debug, Error)]
#[error("Notification dispatch failed: {message}")]
pub struct NotifyError {
    /// What went wrong.
    pub message: String,
}

/// Receives engine events.
pub trait Notifier: Send + Sync {
    /// Dispatches an event. Implementations must not block on delivery.
    fn notify(&self, event: &EngineEvent) -> Result<(), NotifyError>;
}

/// Notifier that records events in the trace log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: &EngineEvent) -> Result<(), NotifyError> {
        match event {
            EngineEvent::BookingCreated {
                booking_id,
                listing_id,
                status,
                ..
            } => info!(%booking_id, %listing_id, ?status, "Booking created"),
            EngineEvent::RewardEarned {
                user_id,
                action_slug,
                points,
                ..
            } => info!(%user_id, %action_slug, points, "Reward earned"),
        }
        Ok(())
    }
}
