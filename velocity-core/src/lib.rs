pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod graph_rag;
pub mod lvi;
pub mod models;
pub mod readiness;
pub mod store;
pub mod trend;

pub use api::{ApiResponse, VelocityRequest};
pub use config::VelocityConfig;
pub use error::VelocityError;
pub use graph::{KnowledgeGraphData, RadarDataPoint};
pub use graph_rag::{FallbackAdvisor, SkillAdvisor};
pub use lvi::{compute_lvi, week_window, LviData, LviMetrics, WeekWindow};
pub use readiness::{suggest_next, SuggestedSkill};
pub use store::{ActivityStore, GraphStore, MemoryStore, PgStore, Stores};
pub use trend::{classify_trend, LviTrendData, Trend, TrendSummary};
