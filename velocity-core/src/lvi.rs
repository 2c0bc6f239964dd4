//! Learning Velocity Index
//!
//! LVI = round(C × R / T × scale), clamped to [0, 100]
//!
//! Where:
//!   C     = concepts mastered (distinct concept names across the week's sessions)
//!   R     = application rate (mean success rate of the week's skill applications)
//!   T     = average time to mastery in days (total session days / C, or 1 when C = 0)
//!   scale = calibration constant, stored next to every score it produced
//!
//! Application rate and concept mastery are independent signals: applications
//! are never filtered against the concept set.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Session, SkillApplication};

/// Scale applied when none is configured.
pub const DEFAULT_SCALE: u32 = 10;

/// Time-to-mastery used when no concepts were mastered.
const NO_MASTERY_SENTINEL_DAYS: f64 = 1.0;

const MINUTES_PER_DAY: f64 = 60.0 * 24.0;

/// Intermediate metrics and the resulting score for one window of activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LviMetrics {
    pub score: i32,
    pub concepts_mastered: u32,
    pub application_rate: f64,
    pub avg_time_to_mastery: f64,
}

/// Compute the LVI over one week of sessions and skill applications.
pub fn compute_lvi(sessions: &[Session], applications: &[SkillApplication], scale: u32) -> LviMetrics {
    let concepts: HashSet<&str> = sessions
        .iter()
        .flat_map(|s| s.concepts_learned.iter().map(String::as_str))
        .collect();
    let concepts_mastered = concepts.len() as u32;

    let application_rate = if applications.is_empty() {
        0.0
    } else {
        applications.iter().map(|a| a.success_rate).sum::<f64>() / applications.len() as f64
    };

    let total_minutes: f64 = sessions.iter().map(|s| f64::from(s.duration)).sum();
    let total_duration_days = total_minutes / MINUTES_PER_DAY;

    let avg_time_to_mastery = if concepts_mastered > 0 {
        total_duration_days / f64::from(concepts_mastered)
    } else {
        NO_MASTERY_SENTINEL_DAYS
    };

    LviMetrics {
        score: calculate_score(concepts_mastered, application_rate, avg_time_to_mastery, scale),
        concepts_mastered,
        application_rate,
        avg_time_to_mastery,
    }
}

/// Score from the three metrics (pure function, also used to rescore history).
pub fn calculate_score(concepts: u32, rate: f64, avg_time_days: f64, scale: u32) -> i32 {
    if avg_time_days.is_nan() || avg_time_days <= 0.0 {
        return 0;
    }

    let raw = (f64::from(concepts) * rate) / avg_time_days * f64::from(scale);
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as i32
}

/// A Sunday 00:00:00.000 to Saturday 23:59:59.999 calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    pub fn start_label(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_label(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// The week containing `now`. On a Sunday the window starts that same day.
pub fn week_window(now: DateTime<Utc>) -> WeekWindow {
    let days_since_sunday = i64::from(now.weekday().num_days_from_sunday());
    let start = (now.date_naive() - Duration::days(days_since_sunday))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let end = start + Duration::days(7) - Duration::milliseconds(1);
    WeekWindow { start, end }
}

/// `LVIData` as the dashboard card consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LviData {
    pub score: i32,
    pub concepts_mastered: u32,
    pub application_rate: f64,
    pub avg_time_to_mastery: f64,
    pub scaling_factor: u32,
    pub week_start: String,
    pub week_end: String,
}

impl LviData {
    /// Time-to-mastery is floored at `min_display_days` here only; the score
    /// itself was computed from the unfloored value.
    pub fn from_metrics(metrics: LviMetrics, scale: u32, window: &WeekWindow, min_display_days: f64) -> Self {
        Self {
            score: metrics.score,
            concepts_mastered: metrics.concepts_mastered,
            application_rate: metrics.application_rate,
            avg_time_to_mastery: metrics.avg_time_to_mastery.max(min_display_days),
            scaling_factor: scale,
            week_start: window.start_label(),
            week_end: window.end_label(),
        }
    }
}
