//! Strategy value types: market mode, price segments, time segments.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ValidationError;

/// Direction the allocation curve favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketMode {
    /// Accumulate more as price falls.
    Bear,
    /// Distribute more as price rises.
    Bull,
}

impl MarketMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketMode::Bear => "bear",
            MarketMode::Bull => "bull",
        }
    }
}

impl fmt::Display for MarketMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bear" => Ok(MarketMode::Bear),
            "bull" => Ok(MarketMode::Bull),
            other => Err(ValidationError::InvalidMarketMode(other.to_string())),
        }
    }
}

/// A half-open price band `[price_low, price_high)` with a relative weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSegment {
    pub price_low: f64,
    pub price_high: f64,
    pub weight: f64,
}

impl PriceSegment {
    pub fn new(price_low: f64, price_high: f64, weight: f64) -> Self {
        PriceSegment {
            price_low,
            price_high,
            weight,
        }
    }
}

/// Linear ramp of the time coefficient from `k_start` at `start_ts` to
/// `k_end` at `end_ts`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSegment {
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub k_start: f64,
    pub k_end: f64,
}

impl TimeSegment {
    pub fn new(start_ts: DateTime<Utc>, end_ts: DateTime<Utc>, k_start: f64, k_end: f64) -> Self {
        TimeSegment {
            start_ts,
            end_ts,
            k_start,
            k_end,
        }
    }
}

/// A complete strategy. Built once per evaluation request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySpec {
    pub market_mode: MarketMode,
    pub price_segments: Vec<PriceSegment>,
    pub time_segments: Vec<TimeSegment>,
}

impl StrategySpec {
    pub fn new(market_mode: MarketMode, price_segments: Vec<PriceSegment>) -> Self {
        StrategySpec {
            market_mode,
            price_segments,
            time_segments: Vec::new(),
        }
    }

    pub fn with_time_segments(mut self, time_segments: Vec<TimeSegment>) -> Self {
        self.time_segments = time_segments;
        self
    }

    /// Lowest `price_low` across all price segments.
    pub fn min_price_low(&self) -> Option<f64> {
        self.price_segments
            .iter()
            .map(|s| s.price_low)
            .reduce(f64::min)
    }

    /// Highest `price_high` across all price segments.
    pub fn max_price_high(&self) -> Option<f64> {
        self.price_segments
            .iter()
            .map(|s| s.price_high)
            .reduce(f64::max)
    }

    /// Every segment boundary inside `[low, high]`, in segment order.
    pub fn breakpoints_in_range(&self, low: f64, high: f64) -> Vec<f64> {
        let mut points = Vec::new();
        for segment in &self.price_segments {
            if (low..=high).contains(&segment.price_low) {
                points.push(segment.price_low);
            }
            if (low..=high).contains(&segment.price_high) {
                points.push(segment.price_high);
            }
        }
        points
    }
}
