//! Portfolio valuation against the strategy target, with rebalance deltas,
//! alignment price and average-entry P&L.

use crate::domain::alignment::{AlignmentConfig, Holdings, find_alignment_price};
use crate::domain::error::ValidationError;
use crate::domain::evaluation::evaluate_validated;
use crate::domain::observation::{PortfolioEvaluation, PortfolioObservation};
use crate::domain::strategy::StrategySpec;
use crate::domain::validation::{
    validate_alignment_search_bounds, validate_portfolio_observation, validate_strategy,
};

pub fn evaluate_portfolio(
    strategy: &StrategySpec,
    observation: &PortfolioObservation,
) -> Result<PortfolioEvaluation, ValidationError> {
    evaluate_portfolio_with(strategy, observation, &AlignmentConfig::default())
}

pub fn evaluate_portfolio_with(
    strategy: &StrategySpec,
    observation: &PortfolioObservation,
    config: &AlignmentConfig,
) -> Result<PortfolioEvaluation, ValidationError> {
    validate_strategy(strategy)?;
    validate_portfolio_observation(
        observation.timestamp,
        observation.price,
        observation.usd_amount,
        observation.asset_amount,
        observation.avg_entry_price,
    )?;
    let (search_min, search_max) = config.search_bounds(
        strategy,
        observation.alignment_search_min_price,
        observation.alignment_search_max_price,
    )?;
    validate_alignment_search_bounds(search_min, search_max)?;

    let row = evaluate_validated(strategy, observation.timestamp, observation.price);
    let price = observation.price;
    let holdings = Holdings {
        usd_amount: observation.usd_amount,
        asset_amount: observation.asset_amount,
    };

    let asset_value_usd = holdings.asset_amount * price;
    let usd_value_usd = holdings.usd_amount;
    let portfolio_value_usd = asset_value_usd + usd_value_usd;
    let current_share = holdings.current_share(price);

    let target_asset_value_usd = row.target_share * portfolio_value_usd;
    let target_asset_amount = target_asset_value_usd / price;

    let alignment_price = find_alignment_price(
        strategy,
        &holdings,
        row.time_k,
        price,
        search_min,
        search_max,
        config,
    );

    let avg_entry_pnl_usd = observation
        .avg_entry_price
        .map(|avg| (price - avg) * holdings.asset_amount);
    let avg_entry_pnl_pct = observation
        .avg_entry_price
        .map(|avg| (price / avg - 1.0) * 100.0);

    Ok(PortfolioEvaluation {
        timestamp: row.timestamp,
        price,
        time_k: row.time_k,
        virtual_price: row.virtual_price,
        base_share: row.base_share,
        target_share: row.target_share,
        current_share,
        share_deviation: current_share - row.target_share,
        portfolio_value_usd,
        asset_value_usd,
        usd_value_usd,
        target_asset_value_usd,
        target_asset_amount,
        asset_amount_delta: target_asset_amount - holdings.asset_amount,
        usd_delta: (portfolio_value_usd - target_asset_value_usd) - usd_value_usd,
        alignment_price,
        avg_entry_price: observation.avg_entry_price,
        avg_entry_pnl_usd,
        avg_entry_pnl_pct,
    })
}
