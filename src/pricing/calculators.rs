//! Core cost calculation functions.
//!
//! Pure functions for booking cost math - no I/O, no shared state. Each
//! calculation owns its own bookkeeping, so calls are safe to run
//! concurrently over the same product snapshot.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use rust_decimal::Decimal;

use crate::error::{PricingError, Result};
use crate::pricing::models::{BookableProduct, DurationUnit, PricingConfig};
use crate::pricing::requests::BookingRequest;
use crate::pricing::rules::{evaluate_block, BlockSpan, CalculationState, CostOperator};

/// Controls rule evaluation inside one block.
#[derive(Debug, Clone)]
pub struct CalculationPolicy {
    /// When false, only the first matching rule modifies each block.
    pub apply_multiple_rules_per_block: bool,
}

impl Default for CalculationPolicy {
    fn default() -> Self {
        CalculationPolicy {
            apply_multiple_rules_per_block: true,
        }
    }
}

/// Post-compute hook: the one seam where external code may adjust the final
/// figure. Runs exactly once, after all block-level math.
pub trait CostAdjustment {
    fn adjust(
        &self,
        computed: Decimal,
        product: &BookableProduct,
        request: &BookingRequest,
    ) -> Decimal;
}

/// Apply a cost operator.
///
/// Zero divisors are rejected by rule validation before evaluation starts,
/// so `Divide` never sees a zero operand here.
pub fn apply_cost(base: Decimal, op: CostOperator, amount: Decimal) -> Decimal {
    match op {
        CostOperator::Times => base * amount,
        CostOperator::Divide => base / amount,
        CostOperator::Minus => base - amount,
        CostOperator::Equals => amount,
        CostOperator::Plus => base + amount,
    }
}

/// Calculate the cost of one booking with default policy and no adjustment.
pub fn calculate_booking_cost(
    request: &BookingRequest,
    product: &BookableProduct,
) -> Result<Decimal> {
    calculate_booking_cost_with(request, product, &CalculationPolicy::default(), None)
}

/// Calculate the cost of one booking.
///
/// Walks the booked blocks in order, folding matched cost rules into each
/// block, then applies override substitutions and the optional person-count
/// multiplier. Fails fast on buffer-day overlap and malformed configuration.
pub fn calculate_booking_cost_with(
    request: &BookingRequest,
    product: &BookableProduct,
    policy: &CalculationPolicy,
    adjustment: Option<&dyn CostAdjustment>,
) -> Result<Decimal> {
    let config = &product.pricing;
    config.validate()?;

    let mut base_cost = config.base_cost.max(Decimal::ZERO);
    let mut base_block_cost = config.block_cost.max(Decimal::ZERO);

    if let Some(resource_id) = request.resource_id {
        let resource = product
            .resource(resource_id)
            .ok_or(PricingError::UnknownResource(resource_id))?;
        base_cost += resource.base_cost;
        base_block_cost += resource.block_cost;
    }

    let mut person_base_costs = Decimal::ZERO;
    let mut person_block_costs = Decimal::ZERO;

    if request.has_persons() && product.has_person_types() {
        for (&person_id, &count) in &request.persons {
            let person_type = product
                .person_type(person_id)
                .ok_or(PricingError::UnknownPersonType(person_id))?;

            // Single line per person type; the multiplier, when enabled,
            // applies once to the net total rather than per cost line.
            if count > 0 && person_type.base_cost > Decimal::ZERO {
                let line = person_type.base_cost * Decimal::from(count);
                if config.has_person_cost_multiplier {
                    person_base_costs += line;
                } else {
                    base_cost += line;
                }
            }
            if count > 0 && person_type.block_cost > Decimal::ZERO {
                person_block_costs += person_type.block_cost * Decimal::from(count);
            }
        }
    }

    let blocks_booked = config.resolved_blocks(request.duration);
    tracing::debug!(
        product = %product.id,
        blocks = blocks_booked,
        unit = ?config.duration_unit,
        "calculating booking cost"
    );

    if config.buffer_period > 0 && !config.duration_unit.is_time_granularity() {
        check_buffer_days(request, product, blocks_booked)?;
    }

    let mut state = CalculationState::new(base_cost);
    let reference_year = request.start.year();
    let mut total_block_cost = Decimal::ZERO;
    let mut total_person_block_costs = Decimal::ZERO;

    for block in 0..blocks_booked {
        // In multiplier mode person block costs stay out of the block total
        // so the multiplication does not double-count them.
        let block_cost = if person_block_costs > Decimal::ZERO && config.has_person_cost_multiplier
        {
            base_block_cost
        } else {
            base_block_cost + person_block_costs
        };

        let units = config.duration as i64;
        let span = BlockSpan {
            start: offset_from(request.start, block as i64 * units, config.duration_unit)?,
            end: offset_from(request.start, (block as i64 + 1) * units, config.duration_unit)?,
        };

        let block_cost = evaluate_block(
            &span,
            block_cost,
            request,
            config,
            policy,
            reference_year,
            &mut state,
        );
        tracing::trace!(block, %block_cost, "block evaluated");

        total_block_cost += block_cost;
        total_person_block_costs += person_block_costs;
    }

    // Overrides replace a block's cost outright instead of stacking on it.
    for override_cost in state.override_blocks.values() {
        total_block_cost = total_block_cost - base_block_cost + *override_cost;
    }

    let mut booking_cost = (total_block_cost + state.base_cost).max(Decimal::ZERO);

    if request.has_persons() && config.has_person_cost_multiplier {
        // The multiplier scales the booking cost, not the person costs.
        booking_cost = booking_cost * Decimal::from(request.total_persons())
            + (total_person_block_costs + person_base_costs).max(Decimal::ZERO);
    }

    if let Some(adjustment) = adjustment {
        booking_cost = adjustment.adjust(booking_cost, product, request);
    }

    Ok(booking_cost)
}

/// Fail when any booked block touches a designated buffer day.
///
/// Only meaningful for day-granularity units; the reported minimum is in
/// days (weeks scaled by seven).
fn check_buffer_days(
    request: &BookingRequest,
    product: &BookableProduct,
    blocks_booked: u32,
) -> Result<()> {
    if product.buffer_days.is_empty() {
        return Ok(());
    }
    let config = &product.pricing;
    let units = config.duration as i64;

    for block in 0..blocks_booked {
        let start_offset = block as i64 * units;
        let end_offset = (block as i64 + 1) * units - 1;
        let block_start = offset_from(request.start, start_offset, config.duration_unit)?;
        let block_end = offset_from(request.start, end_offset, config.duration_unit)?;

        if product.buffer_days.contains(&block_start.date_naive())
            || product.buffer_days.contains(&block_end.date_naive())
        {
            let minimum_days = match config.duration_unit {
                DurationUnit::Week => config.duration * 7,
                _ => config.duration,
            };
            return Err(PricingError::DurationTooShort { minimum_days });
        }
    }
    Ok(())
}

/// Offset an instant by a number of duration units.
///
/// Night blocks advance by calendar days so a two-night stay spans two
/// checkout days, matching common booking semantics.
fn offset_from(start: DateTime<Utc>, units: i64, unit: DurationUnit) -> Result<DateTime<Utc>> {
    let shifted = match unit {
        DurationUnit::Minute => start.checked_add_signed(Duration::minutes(units)),
        DurationUnit::Hour => start.checked_add_signed(Duration::hours(units)),
        DurationUnit::Day | DurationUnit::Night => start.checked_add_signed(Duration::days(units)),
        DurationUnit::Week => start.checked_add_signed(Duration::weeks(units)),
        DurationUnit::Month => u32::try_from(units)
            .ok()
            .and_then(|months| start.checked_add_months(Months::new(months))),
    };
    shifted.ok_or_else(|| {
        PricingError::invalid_config("booking range exceeds the supported calendar")
    })
}

/// Representative "starting from" price shown before a request exists.
///
/// Combines base cost, minimum-duration block cost, the cheapest resource
/// and the cheapest qualifying person-type cost, mirroring the full
/// calculator's multiplier semantics without walking blocks or rules.
pub fn calculated_display_cost(product: &BookableProduct) -> Decimal {
    let config = &product.pricing;

    // An explicit display cost always wins.
    if let Some(display) = config.display_cost {
        return display;
    }

    let min_duration = Decimal::from(config.min_duration);
    let mut display_cost = config.block_cost * min_duration + config.base_cost;

    let resource_cost = product
        .resources
        .iter()
        .map(|r| r.block_cost * min_duration + r.base_cost)
        .min()
        .unwrap_or(Decimal::ZERO);

    let mut cheapest: Option<Decimal> = None;
    let mut persons_total = Decimal::ZERO;
    let mut persons_count: u32 = 0;

    if config.has_persons && product.has_person_types() {
        for person in &product.person_types {
            // Person types without an explicit minimum fall back to the
            // product minimum but stay out of the multiplier totals.
            let (multiplier, counted) = match person.min {
                Some(min) => (min, true),
                None => (config.min_persons, false),
            };
            let cost = (person.block_cost * min_duration + person.base_cost)
                * Decimal::from(multiplier);
            if cheapest.map_or(true, |c| cost < c) {
                cheapest = Some(cost);
            }
            if counted {
                persons_total += cost;
                persons_count += multiplier;
            }
        }

        if !config.has_person_cost_multiplier {
            display_cost += cheapest.unwrap_or(Decimal::ZERO);
        }
    }

    if config.has_persons && product.has_person_types() && config.has_person_cost_multiplier {
        let persons_count = if persons_count != 0 {
            persons_count
        } else {
            config.min_persons
        };
        let persons_total = if persons_total != Decimal::ZERO {
            persons_total
        } else {
            cheapest.unwrap_or(Decimal::ZERO)
        };
        let count = Decimal::from(persons_count);
        display_cost = (display_cost + persons_total) * count + resource_cost * count;
    } else if config.has_persons && config.min_persons > 1 && config.has_person_cost_multiplier {
        display_cost = (display_cost + resource_cost) * Decimal::from(config.min_persons);
    } else {
        display_cost += resource_cost;
    }

    display_cost
}
