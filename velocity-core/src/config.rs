use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VelocityConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub graph_rag: GraphRagConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
    /// The dashboard is single-user; every query is scoped to this id.
    pub user_id: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            user_id: "user-1".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            connect_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub scale: u32,
    pub suggestion_limit: usize,
    pub snapshot_window: usize,
    pub radar_size: usize,
    pub min_display_time_to_mastery: f64,
    pub trend_threshold_percent: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            scale: crate::lvi::DEFAULT_SCALE,
            suggestion_limit: crate::readiness::DEFAULT_SUGGESTION_LIMIT,
            snapshot_window: 12,
            radar_size: crate::graph::DEFAULT_RADAR_SIZE,
            min_display_time_to_mastery: 0.1,
            trend_threshold_percent: crate::trend::DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:3001".to_string(),
            ],
        }
    }
}

/// OpenAI-compatible chat completion backend for the skill advisor.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphRagConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    /// Ask the advisor for prerequisites and related skills when adding a skill.
    pub discover_relationships: bool,
}

impl Default for GraphRagConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: crate::graph_rag::DEFAULT_MODEL.to_string(),
            base_url: crate::graph_rag::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_delay_ms: 500,
            discover_relationships: true,
        }
    }
}

impl GraphRagConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl VelocityConfig {
    /// Load from an optional TOML file, then `VELOCITY__SECTION__KEY` env vars.
    /// A bare `DATABASE_URL` fills in the database url when nothing else does,
    /// and `OPENAI_API_KEY` does the same for the advisor key.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("VELOCITY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let mut config: VelocityConfig = s.try_deserialize()?;

        if !config.database.is_configured() {
            config.database.url = std::env::var("DATABASE_URL").ok();
        }
        if !config.graph_rag.is_configured() {
            config.graph_rag.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        Ok(config)
    }
}
