use thiserror::Error;

use crate::graph_rag::AdvisorError;

#[derive(Error, Debug)]
pub enum VelocityError {
    #[error("{0} not configured")]
    NotConfigured(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Skill advisor error: {0}")]
    Advisor(#[from] AdvisorError),
}

impl VelocityError {
    /// True for failures that come from the store read/write path rather than
    /// from configuration or caller input.
    pub fn is_query_failure(&self) -> bool {
        matches!(self, VelocityError::Database(_) | VelocityError::InvalidRecord(_))
    }
}
