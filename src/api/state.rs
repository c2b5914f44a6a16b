//! Application state for the stay engine API.

use std::sync::Arc;

use crate::booking::BookingOrchestrator;
use crate::clock::{Clock, SystemClock};
use crate::config::ConfigLoader;
use crate::notify::{Notifier, TracingNotifier};

/// Shared application state.
///
/// Wraps one orchestrator, which owns the reservation calendar, the
/// promotion registry and the rewards ledger.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<BookingOrchestrator>,
}

impl AppState {
    /// Creates state on the wall clock, logging notifications via tracing.
    pub fn new(config: ConfigLoader) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(TracingNotifier))
    }

    /// Creates state on a caller-supplied clock.
    pub fn with_clock(config: ConfigLoader, clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(config, clock, Arc::new(TracingNotifier))
    }

    /// Creates state from explicit collaborators.
    pub fn with_parts(
        config: ConfigLoader,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let config = Arc::new(config.into_config());
        Self {
            orchestrator: Arc::new(BookingOrchestrator::new(config, clock, notifier)),
        }
    }

    /// Returns the orchestrator.
    pub fn orchestrator(&self) -> &BookingOrchestrator {
        &self.orchestrator
    }
}
