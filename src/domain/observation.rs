//! Observation inputs and evaluation outputs.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One `(timestamp, price)` input to point/batch evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl ObservationRow {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        ObservationRow { timestamp, price }
    }
}

/// Engine output for a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub time_k: f64,
    pub virtual_price: f64,
    pub base_share: f64,
    pub target_share: f64,
}

/// A live portfolio observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioObservation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub usd_amount: f64,
    pub asset_amount: f64,
    pub avg_entry_price: Option<f64>,
    pub alignment_search_min_price: Option<f64>,
    pub alignment_search_max_price: Option<f64>,
}

impl PortfolioObservation {
    pub fn new(timestamp: DateTime<Utc>, price: f64, usd_amount: f64, asset_amount: f64) -> Self {
        PortfolioObservation {
            timestamp,
            price,
            usd_amount,
            asset_amount,
            avg_entry_price: None,
            alignment_search_min_price: None,
            alignment_search_max_price: None,
        }
    }

    pub fn with_avg_entry_price(mut self, avg_entry_price: f64) -> Self {
        self.avg_entry_price = Some(avg_entry_price);
        self
    }

    pub fn with_search_bounds(mut self, min_price: Option<f64>, max_price: Option<f64>) -> Self {
        self.alignment_search_min_price = min_price;
        self.alignment_search_max_price = max_price;
        self
    }
}

/// Portfolio valuation against the strategy's target allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioEvaluation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub time_k: f64,
    pub virtual_price: f64,
    pub base_share: f64,
    pub target_share: f64,
    pub current_share: f64,
    pub share_deviation: f64,
    pub portfolio_value_usd: f64,
    pub asset_value_usd: f64,
    pub usd_value_usd: f64,
    pub target_asset_value_usd: f64,
    pub target_asset_amount: f64,
    pub asset_amount_delta: f64,
    pub usd_delta: f64,
    pub alignment_price: Option<f64>,
    pub avg_entry_price: Option<f64>,
    pub avg_entry_pnl_usd: Option<f64>,
    pub avg_entry_pnl_pct: Option<f64>,
}

impl PortfolioEvaluation {
    /// The point-evaluation fields of this result.
    pub fn row(&self) -> EvaluationRow {
        EvaluationRow {
            timestamp: self.timestamp,
            price: self.price,
            time_k: self.time_k,
            virtual_price: self.virtual_price,
            base_share: self.base_share,
            target_share: self.target_share,
        }
    }
}
