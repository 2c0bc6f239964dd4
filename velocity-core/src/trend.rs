//! Two-window trend classification over a chronological score series.
//!
//! The series is split at `n / 2` (the first half is the smaller one for odd
//! n) and the mean of each half is compared. Change beyond ±threshold percent
//! is accelerating / decelerating; anything else is stable.

use serde::{Deserialize, Serialize};

use crate::models::LviSnapshot;

pub const DEFAULT_THRESHOLD_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Accelerating,
    Stable,
    Decelerating,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub trend: Trend,
    pub percent_change: f64,
}

impl TrendSummary {
    fn stable() -> Self {
        Self {
            trend: Trend::Stable,
            percent_change: 0.0,
        }
    }
}

/// Classify a series ordered oldest → newest with the default ±5% band.
pub fn classify_trend(scores: &[i32]) -> TrendSummary {
    classify_trend_with_threshold(scores, DEFAULT_THRESHOLD_PERCENT)
}

pub fn classify_trend_with_threshold(scores: &[i32], threshold_percent: f64) -> TrendSummary {
    if scores.len() < 2 {
        return TrendSummary::stable();
    }

    let mid = scores.len() / 2;
    let (first, second) = scores.split_at(mid);
    let avg_first = mean(first);
    let avg_second = mean(second);

    let percent_change = if avg_first > 0.0 {
        (avg_second - avg_first) / avg_first * 100.0
    } else {
        0.0
    };

    let trend = if percent_change > threshold_percent {
        Trend::Accelerating
    } else if percent_change < -threshold_percent {
        Trend::Decelerating
    } else {
        Trend::Stable
    };

    TrendSummary {
        trend,
        percent_change,
    }
}

fn mean(values: &[i32]) -> f64 {
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

/// `LVITrendData` as the trend chart consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LviTrendData {
    pub snapshots: Vec<LviSnapshot>,
    pub trend: Trend,
    pub percent_change: f64,
}

impl LviTrendData {
    /// `snapshots` must already be chronological.
    pub fn from_snapshots(snapshots: Vec<LviSnapshot>, threshold_percent: f64) -> Self {
        let scores: Vec<i32> = snapshots.iter().map(|s| s.score).collect();
        let summary = classify_trend_with_threshold(&scores, threshold_percent);
        Self {
            snapshots,
            trend: summary.trend,
            percent_change: summary.percent_change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED_HISTORY: [i32; 12] = [52, 55, 54, 59, 64, 61, 68, 72, 75, 78, 79, 81];

    #[test]
    fn test_fewer_than_two_points_is_stable() {
        assert_eq!(classify_trend(&[]), TrendSummary::stable());
        assert_eq!(classify_trend(&[90]), TrendSummary::stable());
    }

    #[test]
    fn test_flat_pair_is_stable() {
        let s = classify_trend(&[50, 50]);
        assert_eq!(s.trend, Trend::Stable);
        assert_eq!(s.percent_change, 0.0);
    }

    #[test]
    fn test_seed_history_accelerates() {
        // first half mean 57.5, second half mean 75.5
        let s = classify_trend(&SEED_HISTORY);
        assert_eq!(s.trend, Trend::Accelerating);
        assert!((s.percent_change - 31.304_347_826).abs() < 1e-6);
    }

    #[test]
    fn test_reversed_history_decelerates() {
        let mut history = SEED_HISTORY;
        history.reverse();
        let s = classify_trend(&history);
        assert_eq!(s.trend, Trend::Decelerating);
        assert!(s.percent_change < -5.0);
    }

    #[test]
    fn test_odd_length_first_half_is_smaller() {
        // mid = 1: [40] vs [60, 60]
        let s = classify_trend(&[40, 60, 60]);
        assert!((s.percent_change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_first_half_guard() {
        let s = classify_trend(&[0, 0, 70, 80]);
        assert_eq!(s.trend, Trend::Stable);
        assert_eq!(s.percent_change, 0.0);
    }

    #[test]
    fn test_threshold_boundary_is_stable() {
        // exactly +5% stays stable; the band is exclusive
        let s = classify_trend(&[100, 105]);
        assert!((s.percent_change - 5.0).abs() < 1e-9);
        assert_eq!(s.trend, Trend::Stable);

        let s = classify_trend_with_threshold(&[100, 105], 2.0);
        assert_eq!(s.trend, Trend::Accelerating);
    }

    #[test]
    fn test_trend_data_wire_shape() {
        let data = LviTrendData::from_snapshots(vec![], DEFAULT_THRESHOLD_PERCENT);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["trend"], "stable");
        assert_eq!(json["percentChange"], 0.0);
        assert!(json["snapshots"].as_array().unwrap().is_empty());
    }
}
