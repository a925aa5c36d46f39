//! Piecewise price-to-share function.
//!
//! Each segment contributes its normalized weight times a local fraction in
//! `[0, 1]`. Bear mode: local = 1 at or below `price_low`, 0 at or above
//! `price_high`, linear in between. Bull mode mirrors it.

use crate::domain::strategy::{MarketMode, PriceSegment};

/// Floor for segment widths, spans and coefficients.
pub const EPS: f64 = 1e-12;

pub fn clamp(value: f64, lower: f64, upper: f64) -> f64 {
    upper.min(lower.max(value))
}

/// Weights scaled to sum to 1. Precondition: total weight > 0.
pub fn normalize_weights(segments: &[PriceSegment]) -> Vec<f64> {
    let total: f64 = segments.iter().map(|s| s.weight).sum();
    segments.iter().map(|s| s.weight / total).collect()
}

fn local_fraction(price: f64, segment: &PriceSegment, market_mode: MarketMode) -> f64 {
    let low = segment.price_low;
    let high = segment.price_high;
    let width = (high - low).max(EPS);

    let local = match market_mode {
        MarketMode::Bear => {
            if price >= high {
                0.0
            } else if price <= low {
                1.0
            } else {
                (high - price) / width
            }
        }
        MarketMode::Bull => {
            if price <= low {
                0.0
            } else if price >= high {
                1.0
            } else {
                (price - low) / width
            }
        }
    };
    clamp(local, 0.0, 1.0)
}

/// Allocation fraction at `price`, always within `[0, 1]`.
pub fn compute_price_share(price: f64, segments: &[PriceSegment], market_mode: MarketMode) -> f64 {
    let share: f64 = segments
        .iter()
        .zip(normalize_weights(segments))
        .map(|(segment, weight)| weight * local_fraction(price, segment, market_mode))
        .sum();
    clamp(share, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bear_ladder() -> Vec<PriceSegment> {
        vec![
            PriceSegment::new(50_000.0, 60_000.0, 10.0),
            PriceSegment::new(40_000.0, 50_000.0, 30.0),
            PriceSegment::new(30_000.0, 40_000.0, 40.0),
            PriceSegment::new(25_000.0, 30_000.0, 20.0),
        ]
    }

    #[test]
    fn normalize_weights_sums_to_one() {
        let w = normalize_weights(&bear_ladder());
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn bear_share_extremes() {
        let segs = bear_ladder();
        assert_relative_eq!(compute_price_share(70_000.0, &segs, MarketMode::Bear), 0.0);
        assert_relative_eq!(
            compute_price_share(20_000.0, &segs, MarketMode::Bear),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn bear_share_inside_segment() {
        let segs = bear_ladder();
        // 55k: half of the top segment (0.1 * 0.5) and nothing else.
        assert_relative_eq!(
            compute_price_share(55_000.0, &segs, MarketMode::Bear),
            0.05,
            epsilon = 1e-12
        );
        // 45k: top segment full (0.1) plus half of the 40-50k band (0.15).
        assert_relative_eq!(
            compute_price_share(45_000.0, &segs, MarketMode::Bear),
            0.25,
            epsilon = 1e-12
        );
    }

    #[test]
    fn bull_share_mirrors_bear() {
        let segs = vec![
            PriceSegment::new(25_000.0, 35_000.0, 20.0),
            PriceSegment::new(35_000.0, 50_000.0, 30.0),
            PriceSegment::new(50_000.0, 70_000.0, 50.0),
        ];
        assert_relative_eq!(compute_price_share(20_000.0, &segs, MarketMode::Bull), 0.0);
        assert_relative_eq!(
            compute_price_share(80_000.0, &segs, MarketMode::Bull),
            1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            compute_price_share(30_000.0, &segs, MarketMode::Bull),
            0.1,
            epsilon = 1e-12
        );
    }

    #[test]
    fn boundary_prices_hit_plateaus() {
        let segs = vec![PriceSegment::new(100.0, 200.0, 1.0)];
        assert_eq!(compute_price_share(100.0, &segs, MarketMode::Bear), 1.0);
        assert_eq!(compute_price_share(200.0, &segs, MarketMode::Bear), 0.0);
        assert_eq!(compute_price_share(100.0, &segs, MarketMode::Bull), 0.0);
        assert_eq!(compute_price_share(200.0, &segs, MarketMode::Bull), 1.0);
    }

    #[test]
    fn zero_weight_segment_contributes_nothing() {
        let segs = vec![
            PriceSegment::new(100.0, 200.0, 0.0),
            PriceSegment::new(200.0, 300.0, 1.0),
        ];
        assert_relative_eq!(compute_price_share(150.0, &segs, MarketMode::Bear), 1.0);
    }

    #[test]
    fn degenerate_width_is_floored() {
        let segs = vec![PriceSegment::new(100.0, 100.0 + 1e-13, 1.0)];
        let share = compute_price_share(100.0 + 5e-14, &segs, MarketMode::Bear);
        assert!(share.is_finite());
        assert!((0.0..=1.0).contains(&share));
    }
}
