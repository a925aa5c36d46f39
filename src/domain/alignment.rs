//! Alignment price root-finder.
//!
//! For a portfolio `(usd, asset)` at a fixed `time_k`, the alignment price is
//! a root of `f(p) = current_share(p) - target_share(p)`. A log-spaced grid
//! brackets every crossing, the bracket nearest the observed price is chosen,
//! and bisection refines it.

use tracing::debug;

use crate::domain::error::ValidationError;
use crate::domain::price_share::compute_price_share;
use crate::domain::strategy::StrategySpec;
use crate::domain::virtual_price::compute_virtual_price;

/// Root-finder tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentConfig {
    pub grid_points: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Default lower bound as a multiple of the lowest `price_low`.
    pub default_min_factor: f64,
    /// Default upper bound as a multiple of the highest `price_high`.
    pub default_max_factor: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        AlignmentConfig {
            grid_points: 512,
            max_iterations: 60,
            tolerance: 1e-12,
            default_min_factor: 0.2,
            default_max_factor: 5.0,
        }
    }
}

impl AlignmentConfig {
    /// Search bounds, filling missing ones from the strategy's price extent.
    ///
    /// A strategy whose lowest `price_low` is 0 has no usable default lower
    /// bound; the caller must pass one.
    pub fn search_bounds(
        &self,
        strategy: &StrategySpec,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> Result<(f64, f64), ValidationError> {
        let min = match min_price {
            Some(min) => min,
            None => defaulted(
                "alignment_search_min_price",
                strategy.min_price_low().unwrap_or(0.0) * self.default_min_factor,
            )?,
        };
        let max = match max_price {
            Some(max) => max,
            None => defaulted(
                "alignment_search_max_price",
                strategy.max_price_high().unwrap_or(0.0) * self.default_max_factor,
            )?,
        };
        Ok((min, max))
    }
}

fn defaulted(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::UnusableDefaultBound {
            field: field.to_string(),
            value,
        })
    }
}

/// A live portfolio's holdings, fixed while the price varies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holdings {
    pub usd_amount: f64,
    pub asset_amount: f64,
}

impl Holdings {
    /// Asset share of the portfolio valued at `price`; 0 for an empty portfolio.
    pub fn current_share(&self, price: f64) -> f64 {
        let asset_value = self.asset_amount * price;
        let denom = self.usd_amount + asset_value;
        if denom <= 0.0 { 0.0 } else { asset_value / denom }
    }
}

fn mismatch(strategy: &StrategySpec, holdings: &Holdings, time_k: f64, price: f64) -> f64 {
    let mode = strategy.market_mode;
    let virtual_price = compute_virtual_price(price, time_k, mode);
    holdings.current_share(price) - compute_price_share(virtual_price, &strategy.price_segments, mode)
}

/// `points` log-spaced values from `min` to `max`, both ends exact.
pub fn log_grid(min: f64, max: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![min];
    }
    let (ln_min, ln_max) = (min.ln(), max.ln());
    let step = (ln_max - ln_min) / (points - 1) as f64;
    (0..points)
        .map(|i| match i {
            0 => min,
            i if i == points - 1 => max,
            i => (ln_min + step * i as f64).exp(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bracket {
    low: f64,
    high: f64,
    f_low: f64,
}

impl Bracket {
    fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    fn is_exact(&self) -> bool {
        self.low == self.high
    }
}

fn candidate_brackets(grid: &[f64], values: &[f64], tolerance: f64) -> Vec<Bracket> {
    let mut brackets: Vec<Bracket> = grid
        .iter()
        .zip(values)
        .filter(|(_, f)| f.abs() <= tolerance)
        .map(|(&p, &f)| Bracket {
            low: p,
            high: p,
            f_low: f,
        })
        .collect();

    for i in 1..grid.len() {
        let (f_left, f_right) = (values[i - 1], values[i]);
        if f_left.abs() <= tolerance || f_right.abs() <= tolerance {
            continue;
        }
        if (f_left < 0.0) != (f_right < 0.0) {
            brackets.push(Bracket {
                low: grid[i - 1],
                high: grid[i],
                f_low: f_left,
            });
        }
    }
    brackets
}

fn bisect<F: Fn(f64) -> f64>(f: F, bracket: Bracket, config: &AlignmentConfig) -> f64 {
    let Bracket {
        mut low,
        mut high,
        mut f_low,
    } = bracket;

    for _ in 0..config.max_iterations {
        let mid = (low + high) / 2.0;
        let f_mid = f(mid);
        if f_mid.abs() <= config.tolerance {
            return mid;
        }
        if (f_mid < 0.0) == (f_low < 0.0) {
            low = mid;
            f_low = f_mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

fn closest_bracket(brackets: Vec<Bracket>, current_price: f64) -> Option<Bracket> {
    brackets.into_iter().reduce(|best, candidate| {
        let best_dist = (best.midpoint() - current_price).abs();
        let candidate_dist = (candidate.midpoint() - current_price).abs();
        if candidate_dist < best_dist { candidate } else { best }
    })
}

fn locate_root<F: Fn(f64) -> f64>(
    f: F,
    grid: &[f64],
    current_price: f64,
    config: &AlignmentConfig,
) -> Option<f64> {
    let values: Vec<f64> = grid.iter().map(|&p| f(p)).collect();
    let brackets = candidate_brackets(grid, &values, config.tolerance);
    let chosen = closest_bracket(brackets, current_price)?;

    debug!(
        low = chosen.low,
        high = chosen.high,
        current_price,
        "alignment bracket selected"
    );

    if chosen.is_exact() {
        return Some(chosen.low);
    }
    Some(bisect(f, chosen, config))
}

/// Price in `[min_price, max_price]` at which the portfolio's current share
/// equals the strategy's target share, or `None` when `f` never crosses zero
/// on the search grid. Among several crossings, the one whose bracket
/// midpoint lies closest to `current_price` wins; a zero at `current_price`
/// itself is returned as is.
///
/// Preconditions: strategy validated, `0 < min_price < max_price`.
pub fn find_alignment_price(
    strategy: &StrategySpec,
    holdings: &Holdings,
    time_k: f64,
    current_price: f64,
    min_price: f64,
    max_price: f64,
    config: &AlignmentConfig,
) -> Option<f64> {
    let f = |price: f64| mismatch(strategy, holdings, time_k, price);

    if (min_price..=max_price).contains(&current_price) && f(current_price).abs() <= config.tolerance
    {
        debug!(current_price, "portfolio already aligned");
        return Some(current_price);
    }

    let grid = log_grid(min_price, max_price, config.grid_points);
    let found = locate_root(f, &grid, current_price, config);
    if found.is_none() {
        debug!(min_price, max_price, "no alignment price on search grid");
    }
    found
}
