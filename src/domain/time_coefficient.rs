//! Time coefficient `k` from ordered, non-overlapping time segments.
//!
//! Policy:
//! - no segments: `k = 1`
//! - inside a segment: linear `k_start -> k_end` by elapsed fraction
//! - before the first segment: first `k_start`
//! - after the last segment: last `k_end`
//! - in a gap between two segments: the earlier segment's `k_end`
//!
//! Every returned value is floored at [`EPS`].

use chrono::{DateTime, Utc};

use crate::domain::price_share::{EPS, clamp};
use crate::domain::strategy::TimeSegment;

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to.timestamp_micros() - from.timestamp_micros()) as f64 / 1_000_000.0
}

fn segment_k(segment: &TimeSegment, ts: DateTime<Utc>) -> Option<f64> {
    if ts < segment.start_ts || ts > segment.end_ts {
        return None;
    }

    let span = seconds_between(segment.start_ts, segment.end_ts);
    if span <= EPS {
        return Some(segment.k_end);
    }

    let ratio = clamp(seconds_between(segment.start_ts, ts) / span, 0.0, 1.0);
    Some(segment.k_start + (segment.k_end - segment.k_start) * ratio)
}

pub fn compute_time_coefficient(timestamp: DateTime<Utc>, segments: &[TimeSegment]) -> f64 {
    let mut ordered: Vec<&TimeSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.start_ts);

    let (Some(first), Some(last)) = (ordered.first(), ordered.last()) else {
        return 1.0;
    };

    if let Some(k) = ordered.iter().find_map(|s| segment_k(s, timestamp)) {
        return k.max(EPS);
    }
    if timestamp < first.start_ts {
        return first.k_start.max(EPS);
    }
    if timestamp > last.end_ts {
        return last.k_end.max(EPS);
    }

    // Gap: hold the earlier segment's final value.
    ordered
        .windows(2)
        .find(|pair| pair[0].end_ts < timestamp && timestamp < pair[1].start_ts)
        .map(|pair| pair[0].k_end.max(EPS))
        .unwrap_or(1.0)
}
