use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VelocityError;

/// One logged learning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minutes.
    pub duration: u32,
    pub skills_practiced: Vec<String>,
    pub concepts_learned: Vec<String>,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for Complexity {
    type Err = VelocityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            other => Err(VelocityError::InvalidRecord(format!(
                "unknown complexity '{}'",
                other
            ))),
        }
    }
}

/// A skill put to use in a project, with how well it went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillApplication {
    pub user_id: String,
    pub skill_id: String,
    pub applied_at: DateTime<Utc>,
    pub project_id: String,
    pub success_rate: f64,
    /// Minutes.
    pub time_spent: u32,
    pub complexity: Complexity,
}
