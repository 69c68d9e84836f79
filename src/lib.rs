//! Cost calculation engine for scheduled bookings.
//!
//! The engine consumes a fully resolved [`pricing::BookingRequest`] and
//! [`pricing::BookableProduct`] snapshot and returns a single price. It
//! performs no I/O and keeps no state between calls; configuration snapshots
//! and results travel as serde-friendly values.

pub mod error;
pub mod pricing;

pub use error::{PricingError, Result};
pub use pricing::{calculate_booking_cost, calculate_booking_cost_with, calculated_display_cost};
