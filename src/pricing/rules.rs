//! Cost-modifier rules and per-block rule evaluation.
//!
//! A rule is a matching scope plus an effect pair: one effect folds into the
//! running block cost, the other into the running base cost. Rules are
//! evaluated in configured order for every booked block; base effects apply
//! at most once per calculation, keyed by the rule key.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};
use crate::pricing::calculators::{apply_cost, CalculationPolicy};
use crate::pricing::models::PricingConfig;
use crate::pricing::requests::BookingRequest;

/// Arithmetic applied by a cost effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostOperator {
    #[default]
    Plus,
    Minus,
    Times,
    Divide,
    /// Absolute value, replacing the running cost.
    Equals,
}

/// One half of a rule's effect pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEffect {
    #[serde(default)]
    pub op: CostOperator,
    #[serde(default)]
    pub amount: Decimal,
}

impl CostEffect {
    /// Plus zero - leaves the running cost untouched.
    pub fn none() -> Self {
        CostEffect {
            op: CostOperator::Plus,
            amount: Decimal::ZERO,
        }
    }
}

/// Calendar anchoring of a time-of-day rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum TimeAnchor {
    /// Every day.
    AnyDay,
    /// One weekday each week.
    Weekday { day: Weekday },
    /// Only days inside an explicit date range (inclusive).
    DateRange { from: NaiveDate, to: NaiveDate },
}

/// Recurring calendar-unit scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum CalendarUnitScope {
    /// Calendar month number, 1-12, recurring yearly.
    Month { month: u32 },
    /// ISO week number, 1-53, recurring yearly.
    Week { week: u32 },
    /// Weekday, recurring weekly.
    Day { day: Weekday },
}

/// What a cost rule matches against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleScope {
    /// Time-of-day window, minute/hour products only.
    TimeRange {
        anchor: TimeAnchor,
        from: NaiveTime,
        to: NaiveTime,
    },
    /// Recurring month/week/weekday. Scanned per calendar unit inside the
    /// block; every hit applies.
    CalendarUnit(CalendarUnitScope),
    /// Explicit date range (inclusive). Applies once per block at most.
    CustomDate { from: NaiveDate, to: NaiveDate },
    /// Total person count within `[from, to]`.
    PersonCount { from: u32, to: u32 },
    /// Explicitly requested duration within `[from, to]`.
    DurationCount { from: u32, to: u32 },
}

/// A single conditional cost-modifier rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRule {
    /// Stable key; a rule's base effect applies at most once per calculation
    /// no matter how many blocks match.
    pub key: String,
    pub scope: RuleScope,
    #[serde(default = "CostEffect::none")]
    pub block_effect: CostEffect,
    #[serde(default = "CostEffect::none")]
    pub base_effect: CostEffect,
    /// When set and matched, the block's cost is replaced by this amount
    /// instead of accumulated.
    #[serde(default)]
    pub override_cost: Option<Decimal>,
}

impl CostRule {
    /// Reject malformed rule data up front; silent coercion mid-loop is a
    /// configuration error, not a tolerance.
    pub fn validate(&self) -> Result<()> {
        for effect in [&self.block_effect, &self.base_effect] {
            if effect.op == CostOperator::Divide && effect.amount == Decimal::ZERO {
                return Err(PricingError::invalid_config(format!(
                    "cost rule {}: division by zero",
                    self.key
                )));
            }
        }
        // Only calendar-unit and custom-date scopes record overrides; an
        // override anywhere else would be silently dropped.
        if self.override_cost.is_some()
            && !matches!(
                self.scope,
                RuleScope::CalendarUnit(_) | RuleScope::CustomDate { .. }
            )
        {
            return Err(PricingError::invalid_config(format!(
                "cost rule {}: override cost is only valid for calendar and custom date rules",
                self.key
            )));
        }
        match &self.scope {
            RuleScope::TimeRange {
                anchor: TimeAnchor::DateRange { from, to },
                ..
            } => {
                if from > to {
                    return Err(self.inverted_range());
                }
            }
            RuleScope::TimeRange { .. } => {}
            RuleScope::CalendarUnit(CalendarUnitScope::Month { month }) => {
                if !(1..=12).contains(month) {
                    return Err(PricingError::invalid_config(format!(
                        "cost rule {}: month {} out of range",
                        self.key, month
                    )));
                }
            }
            RuleScope::CalendarUnit(CalendarUnitScope::Week { week }) => {
                if !(1..=53).contains(week) {
                    return Err(PricingError::invalid_config(format!(
                        "cost rule {}: week {} out of range",
                        self.key, week
                    )));
                }
            }
            RuleScope::CalendarUnit(CalendarUnitScope::Day { .. }) => {}
            RuleScope::CustomDate { from, to } => {
                if from > to {
                    return Err(self.inverted_range());
                }
            }
            RuleScope::PersonCount { from, to } | RuleScope::DurationCount { from, to } => {
                if from > to {
                    return Err(self.inverted_range());
                }
            }
        }
        Ok(())
    }

    fn inverted_range(&self) -> PricingError {
        PricingError::invalid_config(format!("cost rule {}: inverted range", self.key))
    }
}

/// One booked block's half-open span
#[derive(Debug, Clone, Copy)]
pub struct BlockSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bookkeeping scoped to one calculation call.
///
/// Never shared across invocations; concurrent calculations each own one.
#[derive(Debug)]
pub(crate) struct CalculationState {
    /// Running base cost, mutated by matched base effects.
    pub base_cost: Decimal,
    applied_base_rules: HashSet<String>,
    /// Override amounts keyed by block start, first rule wins per block.
    pub override_blocks: BTreeMap<DateTime<Utc>, Decimal>,
}

impl CalculationState {
    pub fn new(base_cost: Decimal) -> Self {
        CalculationState {
            base_cost,
            applied_base_rules: HashSet::new(),
            override_blocks: BTreeMap::new(),
        }
    }

    /// Fold a rule's base effect into the running base cost, at most once per
    /// rule key across the whole calculation.
    pub fn apply_base_effect(&mut self, effect: &CostEffect, rule_key: &str) {
        if self.applied_base_rules.contains(rule_key) {
            return;
        }
        self.applied_base_rules.insert(rule_key.to_string());
        self.base_cost = apply_cost(self.base_cost, effect.op, effect.amount);
    }

    fn record_override(&mut self, block_start: DateTime<Utc>, amount: Decimal) {
        self.override_blocks.entry(block_start).or_insert(amount);
    }
}

/// Match and fold every applicable rule into one block's cost.
///
/// Returns the rule-modified block cost; base effects and overrides land in
/// `state`. With `apply_multiple_rules_per_block` disabled, evaluation stops
/// at the first rule that matched.
pub(crate) fn evaluate_block(
    span: &BlockSpan,
    mut block_cost: Decimal,
    request: &BookingRequest,
    config: &PricingConfig,
    policy: &CalculationPolicy,
    reference_year: i32,
    state: &mut CalculationState,
) -> Decimal {
    for rule in &config.cost_rules {
        let mut rule_applied = false;

        match &rule.scope {
            RuleScope::TimeRange { anchor, from, to } => {
                if config.duration_unit.is_time_granularity()
                    && time_range_matches(span, anchor, *from, *to)
                {
                    block_cost = apply_cost(block_cost, rule.block_effect.op, rule.block_effect.amount);
                    state.apply_base_effect(&rule.base_effect, &rule.key);
                    rule_applied = true;
                }
            }
            RuleScope::CalendarUnit(unit) => {
                // Each calendar hit inside the block applies, unlike custom
                // date ranges which apply once (see below).
                for _ in 0..calendar_unit_hits(unit, span, reference_year) {
                    block_cost = apply_cost(block_cost, rule.block_effect.op, rule.block_effect.amount);
                    state.apply_base_effect(&rule.base_effect, &rule.key);
                    if let Some(amount) = rule.override_cost {
                        state.record_override(span.start, amount);
                    }
                    rule_applied = true;
                }
            }
            RuleScope::CustomDate { from, to } => {
                // First matching day only; a block overlapping several days of
                // the range must not compound the effect.
                if custom_date_matches(span, *from, *to) {
                    block_cost = apply_cost(block_cost, rule.block_effect.op, rule.block_effect.amount);
                    state.apply_base_effect(&rule.base_effect, &rule.key);
                    if let Some(amount) = rule.override_cost {
                        state.record_override(span.start, amount);
                    }
                    rule_applied = true;
                }
            }
            RuleScope::PersonCount { from, to } => {
                if request.has_persons() {
                    let total = request.total_persons();
                    if *from <= total && total <= *to {
                        block_cost =
                            apply_cost(block_cost, rule.block_effect.op, rule.block_effect.amount);
                        state.apply_base_effect(&rule.base_effect, &rule.key);
                        rule_applied = true;
                    }
                }
            }
            RuleScope::DurationCount { from, to } => {
                if let Some(duration) = request.duration.filter(|d| *d > 0) {
                    if *from <= duration && duration <= *to {
                        block_cost =
                            apply_cost(block_cost, rule.block_effect.op, rule.block_effect.amount);
                        state.apply_base_effect(&rule.base_effect, &rule.key);
                        rule_applied = true;
                    }
                }
            }
        }

        if rule_applied && !policy.apply_multiple_rules_per_block {
            break;
        }
    }

    block_cost
}

/// Time-of-day window match, anchored to the block's start date.
///
/// A window whose end does not lie after its start wraps past midnight
/// (e.g. 22:00 through 06:00 the next morning) and matches when the block
/// extends past the wrap point, sits in the evening arm, or sits in the
/// early-morning arm. A normal window requires full containment.
fn time_range_matches(span: &BlockSpan, anchor: &TimeAnchor, from: NaiveTime, to: NaiveTime) -> bool {
    let start_date = span.start.date_naive();

    match anchor {
        TimeAnchor::AnyDay => {}
        TimeAnchor::Weekday { day } => {
            if *day != span.start.weekday() {
                return false;
            }
        }
        TimeAnchor::DateRange { from, to } => {
            if start_date < *from || start_date > *to {
                return false;
            }
        }
    }

    let rule_start = start_date.and_time(from);
    let rule_end = start_date.and_time(to);
    let block_start = span.start.naive_utc();
    let block_end = span.end.naive_utc();

    if rule_end <= rule_start {
        block_end > rule_start
            || (block_start >= rule_start && block_end >= rule_end)
            || (block_start <= rule_start && block_end <= rule_end)
    } else {
        block_start >= rule_start && block_end <= rule_end
    }
}

/// Count how often a recurring calendar scope occurs while stepping through
/// the block one unit at a time (inclusive start, exclusive end).
fn calendar_unit_hits(scope: &CalendarUnitScope, span: &BlockSpan, reference_year: i32) -> u32 {
    let mut hits = 0;
    let mut check = span.start;

    while check < span.end {
        let matched = match scope {
            CalendarUnitScope::Month { month } => {
                let mut value = check.month();
                // Recurring monthly rules stay keyed 1-12 however far out the
                // block lands; 12 folds to 12, not 0.
                if check.year() > reference_year {
                    value = (value + 12) % 12;
                    if value == 0 {
                        value = 12;
                    }
                }
                value == *month
            }
            CalendarUnitScope::Week { week } => check.iso_week().week() == *week,
            CalendarUnitScope::Day { day } => check.weekday() == *day,
        };
        if matched {
            hits += 1;
        }

        let next = match scope {
            CalendarUnitScope::Month { .. } => check.checked_add_months(Months::new(1)),
            CalendarUnitScope::Week { .. } => check.checked_add_signed(Duration::weeks(1)),
            CalendarUnitScope::Day { .. } => check.checked_add_signed(Duration::days(1)),
        };
        match next {
            Some(next) => check = next,
            None => break,
        }
    }

    hits
}

/// Day-by-day scan for a custom date range; true at the first day inside it.
fn custom_date_matches(span: &BlockSpan, from: NaiveDate, to: NaiveDate) -> bool {
    let mut check = span.start;
    while check < span.end {
        let day = check.date_naive();
        if day >= from && day <= to {
            return true;
        }
        match check.checked_add_signed(Duration::days(1)) {
            Some(next) => check = next,
            None => break,
        }
    }
    false
}
