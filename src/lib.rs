//! Booking availability, pricing and promotion engine for a homestay
//! marketplace.
//!
//! This crate decides whether a stay request can be booked (date-range
//! conflicts against reservations and host blocks), prices it (nightly rate,
//! cleaning fee, service fee), applies promotion codes, and credits loyalty
//! points with tier multipliers when a stay completes.

#![warn(missing_docs)]

pub mod api;
pub mod booking;
pub mod calculation;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod store;
