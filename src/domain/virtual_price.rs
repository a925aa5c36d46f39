//! Virtual price: the observed price adjusted by the time coefficient.
//!
//! Bear mode divides by `k`, so a rising `k` makes the price look cheaper and
//! pulls accumulation forward. Bull mode multiplies, pulling distribution
//! forward.

use crate::domain::price_share::EPS;
use crate::domain::strategy::MarketMode;

pub fn compute_virtual_price(price: f64, time_k: f64, market_mode: MarketMode) -> f64 {
    let safe_k = time_k.max(EPS);
    match market_mode {
        MarketMode::Bear => price / safe_k,
        MarketMode::Bull => price * safe_k,
    }
}
