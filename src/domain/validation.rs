//! Semantic validation of strategies, observations and range arguments.
//!
//! Everything here is a pure predicate over already-typed values. Raw payload
//! shape and type checks belong to the JSON contract adapter; the math modules
//! assume these preconditions hold.

use chrono::{DateTime, Utc};

use crate::domain::error::ValidationError;
use crate::domain::strategy::{MarketMode, PriceSegment, StrategySpec, TimeSegment};

/// Parse an RFC 3339 / ISO-8601 timestamp that carries an explicit offset.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidTimestamp {
            value: value.to_string(),
            reason: "timestamp must be a non-empty ISO-8601 string".to_string(),
        });
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ValidationError::InvalidTimestamp {
            value: value.to_string(),
            reason: format!("expected RFC 3339 date-time with timezone ({e})"),
        })
}

pub fn validate_market_mode(mode: &str) -> Result<MarketMode, ValidationError> {
    mode.parse()
}

pub fn require_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn require_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::NonPositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_steps(field: &str, value: usize) -> Result<(), ValidationError> {
    if value < 1 {
        return Err(ValidationError::InvalidSteps {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_price_segments(segments: &[PriceSegment]) -> Result<(), ValidationError> {
    if segments.is_empty() {
        return Err(ValidationError::EmptyPriceSegments);
    }

    for (idx, segment) in segments.iter().enumerate() {
        require_finite(&format!("price_segments[{idx}].price_low"), segment.price_low)?;
        require_finite(&format!("price_segments[{idx}].price_high"), segment.price_high)?;
        require_finite(&format!("price_segments[{idx}].weight"), segment.weight)?;

        if segment.price_low >= segment.price_high {
            return Err(ValidationError::InvertedPriceSegment { index: idx });
        }
        if segment.weight < 0.0 {
            return Err(ValidationError::NegativeWeight { index: idx });
        }
    }

    let total_weight: f64 = segments.iter().map(|s| s.weight).sum();
    if total_weight <= 0.0 {
        return Err(ValidationError::ZeroTotalWeight);
    }

    let mut sorted: Vec<&PriceSegment> = segments.iter().collect();
    sorted.sort_by(|a, b| a.price_low.total_cmp(&b.price_low));
    if sorted
        .windows(2)
        .any(|pair| pair[1].price_low < pair[0].price_high)
    {
        return Err(ValidationError::OverlappingPriceSegments);
    }

    Ok(())
}

pub fn validate_time_segments(segments: &[TimeSegment]) -> Result<(), ValidationError> {
    for (idx, segment) in segments.iter().enumerate() {
        if segment.start_ts >= segment.end_ts {
            return Err(ValidationError::InvertedTimeSegment { index: idx });
        }
        require_finite(&format!("time_segments[{idx}].k_start"), segment.k_start)?;
        require_finite(&format!("time_segments[{idx}].k_end"), segment.k_end)?;
        if segment.k_start <= 0.0 || segment.k_end <= 0.0 {
            return Err(ValidationError::NonPositiveCoefficient { index: idx });
        }
    }

    let mut sorted: Vec<&TimeSegment> = segments.iter().collect();
    sorted.sort_by_key(|s| s.start_ts);
    if sorted
        .windows(2)
        .any(|pair| pair[1].start_ts < pair[0].end_ts)
    {
        return Err(ValidationError::OverlappingTimeSegments);
    }

    Ok(())
}

/// Validate a whole strategy. Idempotent and side-effect free.
pub fn validate_strategy(strategy: &StrategySpec) -> Result<(), ValidationError> {
    validate_price_segments(&strategy.price_segments)?;
    validate_time_segments(&strategy.time_segments)?;
    Ok(())
}

/// A typed timestamp is always timezone-aware, so only the price needs checking.
pub fn validate_observation(_timestamp: DateTime<Utc>, price: f64) -> Result<(), ValidationError> {
    require_positive("price", price)
}

/// Timestamps arrive typed; the time axis may run in either direction.
pub fn validate_range_arguments(
    price_start: f64,
    price_end: f64,
    price_steps: usize,
    time_steps: usize,
) -> Result<(), ValidationError> {
    require_positive("price_start", price_start)?;
    require_positive("price_end", price_end)?;
    validate_steps("price_steps", price_steps)?;
    validate_steps("time_steps", time_steps)?;
    Ok(())
}

pub fn validate_portfolio_observation(
    timestamp: DateTime<Utc>,
    price: f64,
    usd_amount: f64,
    asset_amount: f64,
    avg_entry_price: Option<f64>,
) -> Result<(), ValidationError> {
    validate_observation(timestamp, price)?;
    require_non_negative("usd_amount", usd_amount)?;
    require_non_negative("asset_amount", asset_amount)?;
    if usd_amount == 0.0 && asset_amount == 0.0 {
        return Err(ValidationError::EmptyPortfolio);
    }
    if let Some(avg) = avg_entry_price {
        require_positive("avg_entry_price", avg)?;
    }
    Ok(())
}

pub fn validate_alignment_search_bounds(
    min_price: f64,
    max_price: f64,
) -> Result<(), ValidationError> {
    require_positive("alignment_search_min_price", min_price)?;
    require_positive("alignment_search_max_price", max_price)?;
    if min_price >= max_price {
        return Err(ValidationError::InvertedSearchBounds {
            min: min_price,
            max: max_price,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    fn single_segment(mode: MarketMode) -> StrategySpec {
        StrategySpec::new(mode, vec![PriceSegment::new(20_000.0, 30_000.0, 100.0)])
    }

    #[test]
    fn parse_timestamp_accepts_z_and_offsets() {
        let a = ts("2026-01-01T00:00:00Z");
        let b = ts("2026-01-01T02:00:00+02:00");
        assert_eq!(a, b);
    }

    #[test]
    fn parse_timestamp_rejects_naive() {
        let err = parse_timestamp("2026-01-01T00:00:00").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimestamp { .. }));
    }

    #[test]
    fn parse_timestamp_rejects_empty() {
        let err = parse_timestamp("  ").unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn valid_strategy_passes() {
        assert!(validate_strategy(&single_segment(MarketMode::Bear)).is_ok());
    }

    #[test]
    fn validation_is_idempotent() {
        let s = single_segment(MarketMode::Bull);
        assert_eq!(validate_strategy(&s), validate_strategy(&s));
    }

    #[test]
    fn rejects_invalid_market_mode() {
        let err = validate_market_mode("sideways").unwrap_err();
        assert!(err.to_string().contains("market_mode"));
        assert_eq!(validate_market_mode("bear").unwrap(), MarketMode::Bear);
    }

    #[test]
    fn rejects_empty_price_segments() {
        let s = StrategySpec::new(MarketMode::Bear, Vec::new());
        assert_eq!(
            validate_strategy(&s).unwrap_err(),
            ValidationError::EmptyPriceSegments
        );
    }

    #[test]
    fn rejects_inverted_price_segment() {
        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![
                PriceSegment::new(10.0, 20.0, 1.0),
                PriceSegment::new(30.0, 30.0, 1.0),
            ],
        );
        assert_eq!(
            validate_strategy(&s).unwrap_err(),
            ValidationError::InvertedPriceSegment { index: 1 }
        );
    }

    #[test]
    fn rejects_negative_weight() {
        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![PriceSegment::new(10.0, 20.0, -1.0)],
        );
        assert_eq!(
            validate_strategy(&s).unwrap_err(),
            ValidationError::NegativeWeight { index: 0 }
        );
    }

    #[test]
    fn rejects_all_zero_weights() {
        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![
                PriceSegment::new(20_000.0, 30_000.0, 0.0),
                PriceSegment::new(30_000.0, 40_000.0, 0.0),
            ],
        );
        let err = validate_strategy(&s).unwrap_err();
        assert!(err.to_string().contains("total weight must be > 0"));
    }

    #[test]
    fn zero_weight_allowed_when_total_positive() {
        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![
                PriceSegment::new(20_000.0, 30_000.0, 0.0),
                PriceSegment::new(30_000.0, 40_000.0, 5.0),
            ],
        );
        assert!(validate_strategy(&s).is_ok());
    }

    #[test]
    fn rejects_overlapping_price_segments() {
        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![
                PriceSegment::new(40_000.0, 50_000.0, 50.0),
                PriceSegment::new(49_000.0, 60_000.0, 50.0),
            ],
        );
        let err = validate_strategy(&s).unwrap_err();
        assert!(err.to_string().contains("must not overlap"));
    }

    #[test]
    fn overlap_check_is_order_independent() {
        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![
                PriceSegment::new(49_000.0, 60_000.0, 50.0),
                PriceSegment::new(10_000.0, 20_000.0, 50.0),
                PriceSegment::new(40_000.0, 50_000.0, 50.0),
            ],
        );
        assert_eq!(
            validate_strategy(&s).unwrap_err(),
            ValidationError::OverlappingPriceSegments
        );
    }

    #[test]
    fn touching_price_segments_do_not_overlap() {
        let s = StrategySpec::new(
            MarketMode::Bull,
            vec![
                PriceSegment::new(40_000.0, 50_000.0, 50.0),
                PriceSegment::new(50_000.0, 60_000.0, 50.0),
            ],
        );
        assert!(validate_strategy(&s).is_ok());
    }

    #[test]
    fn rejects_non_finite_price_fields() {
        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![PriceSegment::new(f64::NAN, 20.0, 1.0)],
        );
        let err = validate_strategy(&s).unwrap_err();
        assert_eq!(err.to_string(), "price_segments[0].price_low must be finite");

        let s = StrategySpec::new(
            MarketMode::Bear,
            vec![PriceSegment::new(10.0, 20.0, f64::INFINITY)],
        );
        assert!(matches!(
            validate_strategy(&s).unwrap_err(),
            ValidationError::NonFinite { .. }
        ));
    }

    #[test]
    fn rejects_overlapping_time_segments() {
        let s = single_segment(MarketMode::Bull).with_time_segments(vec![
            TimeSegment::new(ts("2026-01-01T00:00:00Z"), ts("2026-03-01T00:00:00Z"), 1.0, 1.1),
            TimeSegment::new(ts("2026-02-15T00:00:00Z"), ts("2026-04-01T00:00:00Z"), 1.1, 1.2),
        ]);
        let err = validate_strategy(&s).unwrap_err();
        assert!(err.to_string().contains("must not overlap"));
    }

    #[test]
    fn rejects_inverted_time_segment() {
        let s = single_segment(MarketMode::Bull).with_time_segments(vec![TimeSegment::new(
            ts("2026-03-01T00:00:00Z"),
            ts("2026-03-01T00:00:00Z"),
            1.0,
            1.1,
        )]);
        assert_eq!(
            validate_strategy(&s).unwrap_err(),
            ValidationError::InvertedTimeSegment { index: 0 }
        );
    }

    #[test]
    fn rejects_non_positive_coefficients() {
        let s = single_segment(MarketMode::Bear).with_time_segments(vec![TimeSegment::new(
            ts("2026-01-01T00:00:00Z"),
            ts("2026-02-01T00:00:00Z"),
            0.0,
            1.1,
        )]);
        assert_eq!(
            validate_strategy(&s).unwrap_err(),
            ValidationError::NonPositiveCoefficient { index: 0 }
        );
    }

    #[test]
    fn validate_observation_rejects_non_positive_and_nan_price() {
        let t = ts("2026-01-01T00:00:00Z");
        assert!(validate_observation(t, 1.0).is_ok());
        assert_eq!(
            validate_observation(t, 0.0).unwrap_err().to_string(),
            "price must be > 0"
        );
        assert_eq!(
            validate_observation(t, f64::NAN).unwrap_err().to_string(),
            "price must be finite"
        );
    }

    #[test]
    fn validate_range_arguments_rejects_zero_steps() {
        let err = validate_range_arguments(60_000.0, 25_000.0, 0, 3).unwrap_err();
        assert_eq!(err.to_string(), "price_steps must be an integer >= 1");
        let err = validate_range_arguments(60_000.0, 25_000.0, 3, 0).unwrap_err();
        assert_eq!(err.to_string(), "time_steps must be an integer >= 1");
    }

    #[test]
    fn validate_range_arguments_rejects_non_positive_bounds() {
        let err = validate_range_arguments(-1.0, 25_000.0, 3, 3).unwrap_err();
        assert_eq!(err.to_string(), "price_start must be > 0");
    }

    #[test]
    fn validate_portfolio_observation_rejects_empty_portfolio() {
        let err = validate_portfolio_observation(
            ts("2026-01-01T00:00:00Z"),
            40_000.0,
            0.0,
            0.0,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot both be zero"));
    }

    #[test]
    fn validate_portfolio_observation_rejects_negative_amounts() {
        let err = validate_portfolio_observation(
            ts("2026-01-01T00:00:00Z"),
            40_000.0,
            -1.0,
            1.0,
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "usd_amount must be >= 0");
    }

    #[test]
    fn validate_portfolio_observation_checks_avg_entry_price() {
        let err = validate_portfolio_observation(
            ts("2026-01-01T00:00:00Z"),
            40_000.0,
            100.0,
            1.0,
            Some(0.0),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "avg_entry_price must be > 0");
    }

    #[test]
    fn validate_alignment_search_bounds_rejects_inverted_bounds() {
        let err = validate_alignment_search_bounds(100.0, 50.0).unwrap_err();
        assert!(err.to_string().contains("must be <"));
        assert!(validate_alignment_search_bounds(50.0, 50.0).is_err());
        assert!(validate_alignment_search_bounds(0.0, 50.0).is_err());
        assert!(validate_alignment_search_bounds(10.0, 50.0).is_ok());
    }
}
