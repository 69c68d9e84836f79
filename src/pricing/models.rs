//! Product and pricing configuration models.
//!
//! These are resolved snapshots supplied by the calling layer - the engine
//! never fetches or persists anything itself.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PricingError, Result};
use crate::pricing::rules::CostRule;

/// Length unit of one booked block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Minute,
    Hour,
    Day,
    Night,
    Week,
    Month,
}

impl DurationUnit {
    /// Minute and hour blocks carry a time of day; the day-and-up units only
    /// carry a calendar date. Time-range rules and buffer checks branch on
    /// this.
    pub fn is_time_granularity(&self) -> bool {
        matches!(self, DurationUnit::Minute | DurationUnit::Hour)
    }
}

/// Whether a request books whole multiples of the block duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationType {
    /// Requested units round up to whole blocks.
    #[default]
    Fixed,
    /// Requested units are the block count directly.
    Customizable,
}

/// Pricing configuration owned by a bookable product, read-only to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat charge applied once per booking.
    pub base_cost: Decimal,
    /// Charge applied per booked block.
    pub block_cost: Decimal,
    /// When set, the display estimator returns this verbatim.
    #[serde(default)]
    pub display_cost: Option<Decimal>,
    /// Length of one block, in `duration_unit`s. Must be at least 1.
    pub duration: u32,
    pub duration_unit: DurationUnit,
    #[serde(default)]
    pub duration_type: DurationType,
    /// Block count used when the request omits a duration, and by the
    /// display estimator.
    #[serde(default = "default_min_duration")]
    pub min_duration: u32,
    #[serde(default)]
    pub min_persons: u32,
    /// Whether the product takes person counts at all.
    #[serde(default)]
    pub has_persons: bool,
    /// When true, person costs are kept out of the block totals and the final
    /// price is multiplied by the total person count instead.
    #[serde(default)]
    pub has_person_cost_multiplier: bool,
    /// Buffer blocks that must not overlap designated buffer days. Zero
    /// disables the check.
    #[serde(default)]
    pub buffer_period: u32,
    /// Ordered; evaluation order is significant.
    #[serde(default)]
    pub cost_rules: Vec<CostRule>,
}

fn default_min_duration() -> u32 {
    1
}

impl PricingConfig {
    /// Reject malformed configuration before any block is evaluated.
    pub fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(PricingError::invalid_config(
                "block duration must be at least 1",
            ));
        }
        for rule in &self.cost_rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// Number of blocks a request books.
    ///
    /// Fixed-duration products round the requested units up to whole blocks;
    /// customizable products book the requested count directly. A missing
    /// duration falls back to the configured minimum.
    pub fn resolved_blocks(&self, requested: Option<u32>) -> u32 {
        let units = requested.unwrap_or(self.min_duration);
        match self.duration_type {
            DurationType::Fixed => units.div_ceil(self.duration),
            DurationType::Customizable => units,
        }
    }
}

/// A bookable resource (room, boat, instructor) with its own cost pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub base_cost: Decimal,
    pub block_cost: Decimal,
}

/// A category of occupant (adult, child) with its own cost pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonType {
    pub id: Uuid,
    pub name: String,
    pub base_cost: Decimal,
    pub block_cost: Decimal,
    /// Minimum selectable count; `None` falls back to the product minimum in
    /// the display estimator.
    #[serde(default)]
    pub min: Option<u32>,
}

/// Fully resolved bookable product snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookableProduct {
    pub id: Uuid,
    pub name: String,
    pub pricing: PricingConfig,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub person_types: Vec<PersonType>,
    /// Calendar days a booking must not touch, precomputed by the caller
    /// from surrounding bookings.
    #[serde(default)]
    pub buffer_days: BTreeSet<NaiveDate>,
}

impl BookableProduct {
    pub fn resource(&self, id: Uuid) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn person_type(&self, id: Uuid) -> Option<&PersonType> {
        self.person_types.iter().find(|p| p.id == id)
    }

    pub fn has_person_types(&self) -> bool {
        !self.person_types.is_empty()
    }
}
