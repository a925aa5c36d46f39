//! Evaluation orchestration: single point, batch rows, and price x time grids.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::error::ValidationError;
use crate::domain::observation::{EvaluationRow, ObservationRow};
use crate::domain::price_share::compute_price_share;
use crate::domain::strategy::StrategySpec;
use crate::domain::time_coefficient::compute_time_coefficient;
use crate::domain::validation::{validate_observation, validate_range_arguments, validate_strategy};
use crate::domain::virtual_price::compute_virtual_price;

/// Absolute tolerance used to merge grid prices with segment breakpoints.
pub const PRICE_DEDUP_TOLERANCE: f64 = 1e-9;

/// Price x time grid parameters for [`build_rows_from_ranges`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRequest {
    pub price_start: f64,
    pub price_end: f64,
    pub price_steps: usize,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub time_steps: usize,
    pub include_price_breakpoints: bool,
}

impl RangeRequest {
    pub fn new(
        price_start: f64,
        price_end: f64,
        price_steps: usize,
        time_start: DateTime<Utc>,
        time_end: DateTime<Utc>,
        time_steps: usize,
    ) -> Self {
        RangeRequest {
            price_start,
            price_end,
            price_steps,
            time_start,
            time_end,
            time_steps,
            include_price_breakpoints: true,
        }
    }

    pub fn without_breakpoints(mut self) -> Self {
        self.include_price_breakpoints = false;
        self
    }
}

/// Evaluate an already-validated strategy at one observation.
pub(crate) fn evaluate_validated(
    strategy: &StrategySpec,
    timestamp: DateTime<Utc>,
    price: f64,
) -> EvaluationRow {
    let mode = strategy.market_mode;
    let time_k = compute_time_coefficient(timestamp, &strategy.time_segments);
    let base_share = compute_price_share(price, &strategy.price_segments, mode);
    let virtual_price = compute_virtual_price(price, time_k, mode);
    let target_share = compute_price_share(virtual_price, &strategy.price_segments, mode);

    EvaluationRow {
        timestamp,
        price,
        time_k,
        virtual_price,
        base_share,
        target_share,
    }
}

pub fn evaluate_point(
    strategy: &StrategySpec,
    timestamp: DateTime<Utc>,
    price: f64,
) -> Result<EvaluationRow, ValidationError> {
    validate_strategy(strategy)?;
    validate_observation(timestamp, price)?;
    Ok(evaluate_validated(strategy, timestamp, price))
}

/// Evaluate every row in input order. Any invalid row fails the whole batch.
pub fn evaluate_rows(
    strategy: &StrategySpec,
    rows: &[ObservationRow],
) -> Result<Vec<EvaluationRow>, ValidationError> {
    validate_strategy(strategy)?;
    debug!(rows = rows.len(), mode = %strategy.market_mode, "evaluating rows");

    rows.iter()
        .map(|row| {
            validate_observation(row.timestamp, row.price)?;
            Ok(evaluate_validated(strategy, row.timestamp, row.price))
        })
        .collect()
}

fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    if steps <= 1 {
        return vec![start];
    }
    let step_size = (end - start) / (steps - 1) as f64;
    (0..steps)
        .map(|i| if i == steps - 1 { end } else { start + step_size * i as f64 })
        .collect()
}

fn unique_sorted(mut values: Vec<f64>, descending: bool) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    let mut deduped: Vec<f64> = Vec::with_capacity(values.len());
    for value in values {
        match deduped.last() {
            Some(&prev) if (value - prev).abs() <= PRICE_DEDUP_TOLERANCE => {}
            _ => deduped.push(value),
        }
    }
    if descending {
        deduped.reverse();
    }
    deduped
}

fn from_epoch_seconds(seconds: f64) -> Result<DateTime<Utc>, ValidationError> {
    let micros = (seconds * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_micros(micros).ok_or_else(|| ValidationError::InvalidTimestamp {
        value: seconds.to_string(),
        reason: "epoch seconds outside the representable range".to_string(),
    })
}

/// Price points of the grid, in the direction `price_start -> price_end`.
pub fn price_axis(strategy: &StrategySpec, request: &RangeRequest) -> Vec<f64> {
    let mut points = linspace(request.price_start, request.price_end, request.price_steps);
    if request.include_price_breakpoints {
        let low = request.price_start.min(request.price_end);
        let high = request.price_start.max(request.price_end);
        points.extend(strategy.breakpoints_in_range(low, high));
    }
    unique_sorted(points, request.price_end < request.price_start)
}

/// Time points of the grid, linearly spaced by epoch seconds.
pub fn time_axis(request: &RangeRequest) -> Result<Vec<DateTime<Utc>>, ValidationError> {
    let start = request.time_start.timestamp_micros() as f64 / 1_000_000.0;
    let end = request.time_end.timestamp_micros() as f64 / 1_000_000.0;
    linspace(start, end, request.time_steps)
        .into_iter()
        .map(from_epoch_seconds)
        .collect()
}

/// Full cartesian grid, time-major then price-minor.
pub fn build_rows_from_ranges(
    strategy: &StrategySpec,
    request: &RangeRequest,
) -> Result<Vec<ObservationRow>, ValidationError> {
    validate_strategy(strategy)?;
    validate_range_arguments(
        request.price_start,
        request.price_end,
        request.price_steps,
        request.time_steps,
    )?;

    let prices = price_axis(strategy, request);
    let times = time_axis(request)?;
    debug!(
        prices = prices.len(),
        times = times.len(),
        breakpoints = request.include_price_breakpoints,
        "built evaluation grid"
    );

    let mut rows = Vec::with_capacity(prices.len() * times.len());
    for timestamp in times {
        rows.extend(prices.iter().map(|&price| ObservationRow::new(timestamp, price)));
    }
    Ok(rows)
}

pub fn evaluate_rows_from_ranges(
    strategy: &StrategySpec,
    request: &RangeRequest,
) -> Result<Vec<EvaluationRow>, ValidationError> {
    let rows = build_rows_from_ranges(strategy, request)?;
    evaluate_rows(strategy, &rows)
}
