use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted weekly LVI score. Ordering key is `(year, week_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LviSnapshot {
    pub id: String,
    pub week_number: i32,
    pub year: i32,
    pub score: i32,
    pub concepts_mastered: i32,
    pub application_rate: f64,
    pub avg_time_to_mastery: f64,
    pub scaling_factor: i32,
    pub created_at: DateTime<Utc>,
}
