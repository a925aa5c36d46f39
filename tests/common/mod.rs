#![allow(dead_code)]

use psa::domain::error::PsaError;
use psa::domain::observation::ObservationRow;
use psa::domain::strategy::{MarketMode, PriceSegment, StrategySpec, TimeSegment};
use psa::domain::validation::parse_timestamp;
use psa::ports::observation_port::ObservationSource;
use chrono::{DateTime, Utc};
use std::cell::Cell;

pub fn ts(value: &str) -> DateTime<Utc> {
    parse_timestamp(value).unwrap()
}

/// Four-band accumulation profile with a 1.0 -> 1.8 ramp over 2026H1.
pub fn bear_strategy() -> StrategySpec {
    StrategySpec::new(
        MarketMode::Bear,
        vec![
            PriceSegment::new(50_000.0, 60_000.0, 10.0),
            PriceSegment::new(40_000.0, 50_000.0, 30.0),
            PriceSegment::new(30_000.0, 40_000.0, 40.0),
            PriceSegment::new(25_000.0, 30_000.0, 20.0),
        ],
    )
    .with_time_segments(vec![TimeSegment::new(
        ts("2026-01-01T00:00:00Z"),
        ts("2026-06-01T00:00:00Z"),
        1.0,
        1.8,
    )])
}

/// Distribution profile mirroring the bear bands.
pub fn bull_strategy() -> StrategySpec {
    StrategySpec::new(
        MarketMode::Bull,
        vec![
            PriceSegment::new(60_000.0, 70_000.0, 20.0),
            PriceSegment::new(70_000.0, 85_000.0, 40.0),
            PriceSegment::new(85_000.0, 100_000.0, 40.0),
        ],
    )
    .with_time_segments(vec![TimeSegment::new(
        ts("2026-01-01T00:00:00Z"),
        ts("2026-06-01T00:00:00Z"),
        1.0,
        1.5,
    )])
}

pub fn single_band(mode: MarketMode, low: f64, high: f64) -> StrategySpec {
    StrategySpec::new(mode, vec![PriceSegment::new(low, high, 1.0)])
}

pub const BEAR_STRATEGY_JSON: &str = r#"{
  "market_mode": "bear",
  "price_segments": [
    {"price_low": 50000, "price_high": 60000, "weight": 10},
    {"price_low": 40000, "price_high": 50000, "weight": 30},
    {"price_low": 30000, "price_high": 40000, "weight": 40},
    {"price_low": 25000, "price_high": 30000, "weight": 20}
  ],
  "time_segments": [
    {"start_ts": "2026-01-01T00:00:00Z", "end_ts": "2026-06-01T00:00:00Z", "k_start": 1.0, "k_end": 1.8}
  ]
}"#;

/// In-memory observation source that counts how often it is read.
pub struct MockObservationSource {
    pub rows: Vec<ObservationRow>,
    pub error: Option<String>,
    pub loads: Cell<usize>,
}

impl MockObservationSource {
    pub fn new(rows: Vec<ObservationRow>) -> Self {
        Self {
            rows,
            error: None,
            loads: Cell::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(reason.to_string()),
            loads: Cell::new(0),
        }
    }
}

impl ObservationSource for MockObservationSource {
    fn load_rows(&self) -> Result<Vec<ObservationRow>, PsaError> {
        self.loads.set(self.loads.get() + 1);
        if let Some(reason) = &self.error {
            return Err(PsaError::Csv {
                reason: reason.clone(),
            });
        }
        Ok(self.rows.clone())
    }
}
