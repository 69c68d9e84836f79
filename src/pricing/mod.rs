//! Booking cost engine.
//!
//! Given a resolved booking request and a product's pricing configuration,
//! produces a single deterministic price: a block-by-block walk folding in
//! conditional cost rules, then override substitution and the optional
//! person-count multiplier.

pub mod calculators;
pub mod models;
pub mod requests;
pub mod responses;
pub mod rules;

// Re-export commonly used items
pub use calculators::{
    apply_cost, calculate_booking_cost, calculate_booking_cost_with, calculated_display_cost,
    CalculationPolicy, CostAdjustment,
};
pub use models::{
    BookableProduct, DurationType, DurationUnit, PersonType, PricingConfig, Resource,
};
pub use requests::BookingRequest;
pub use responses::{BookingQuoteResponse, MoneyResponse, PricingErrorResponse};
pub use rules::{CalendarUnitScope, CostEffect, CostOperator, CostRule, RuleScope, TimeAnchor};
