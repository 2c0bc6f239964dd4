//! Store seams: the graph store (skills and their relationships) and the
//! activity store (sessions, skill applications, weekly snapshots).
//!
//! Computations never see store rows; implementations map rows to the typed
//! records in `models` before returning. Multi-row writes are atomic: either
//! every row lands or none do.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::VelocityError;
use crate::graph_rag::{FallbackAdvisor, SkillAdvisor};
use crate::models::{LearnedSkill, LviSnapshot, Session, Skill, SkillApplication, SkillEdge};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn skills(&self) -> Result<Vec<Skill>, VelocityError>;

    /// The user's LEARNED edges joined with skill names.
    async fn learned(&self, user_id: &str) -> Result<Vec<LearnedSkill>, VelocityError>;

    /// Every PREREQUISITE_OF and RELATES_TO edge.
    async fn edges(&self) -> Result<Vec<SkillEdge>, VelocityError>;

    /// Find a skill whose id or name equals `id_or_name`.
    async fn resolve_skill(&self, id_or_name: &str) -> Result<Option<Skill>, VelocityError>;

    /// Insert a skill together with its edges and, optionally, a LEARNED edge
    /// `(user_id, confidence)`. Fails with `Conflict` when the id or name is
    /// taken and with `NotFound` when an edge names an unknown skill; nothing
    /// is written on failure.
    async fn create_skill(
        &self,
        skill: &Skill,
        edges: &[SkillEdge],
        learned: Option<(&str, i32)>,
    ) -> Result<(), VelocityError>;

    /// Replace every skill, edge and LEARNED edge with the given graph.
    /// `learned` holds `user_id`'s LEARNED edges; names are ignored.
    async fn replace_graph(
        &self,
        skills: &[Skill],
        edges: &[SkillEdge],
        user_id: &str,
        learned: &[LearnedSkill],
    ) -> Result<(), VelocityError>;

    /// Create or update the LEARNED edge. Fails with `NotFound` for unknown skills.
    async fn upsert_learned(&self, user_id: &str, skill_id: &str, confidence: i32) -> Result<(), VelocityError>;

    /// Returns whether an edge was removed.
    async fn remove_learned(&self, user_id: &str, skill_id: &str) -> Result<bool, VelocityError>;

    /// Delete the skill with every edge touching it. Returns whether it existed.
    async fn delete_skill(&self, skill_id: &str) -> Result<bool, VelocityError>;

    async fn graph_health(&self) -> Result<String, VelocityError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Sessions whose start time falls within `[start, end]`.
    async fn sessions_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, VelocityError>;

    /// Applications whose applied-at time falls within `[start, end]`.
    async fn applications_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SkillApplication>, VelocityError>;

    /// The most recent `limit` snapshots, newest first.
    async fn recent_snapshots(&self, user_id: &str, limit: usize) -> Result<Vec<LviSnapshot>, VelocityError>;

    async fn activity_health(&self) -> Result<String, VelocityError>;
}

static OFFLINE_ADVISOR: FallbackAdvisor = FallbackAdvisor::offline();

/// Store clients handed to each request, plus the skill advisor. Either store
/// may be absent, in which case every operation needing it fails with
/// `NotConfigured`. Without an advisor, deterministic answers are used.
#[derive(Clone, Default)]
pub struct Stores {
    graph: Option<Arc<dyn GraphStore>>,
    activity: Option<Arc<dyn ActivityStore>>,
    advisor: Option<Arc<dyn SkillAdvisor>>,
}

impl Stores {
    pub fn new(graph: Arc<dyn GraphStore>, activity: Arc<dyn ActivityStore>) -> Self {
        Self {
            graph: Some(graph),
            activity: Some(activity),
            advisor: None,
        }
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn SkillAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// One backend serving both sides (Postgres, or the in-memory store).
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: GraphStore + ActivityStore + 'static,
    {
        let graph: Arc<dyn GraphStore> = store.clone();
        let activity: Arc<dyn ActivityStore> = store;
        Self::new(graph, activity)
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.graph.is_some() && self.activity.is_some()
    }

    pub fn graph(&self) -> Result<&dyn GraphStore, VelocityError> {
        self.graph
            .as_deref()
            .ok_or_else(|| VelocityError::NotConfigured("Graph store".to_string()))
    }

    pub fn activity(&self) -> Result<&dyn ActivityStore, VelocityError> {
        self.activity
            .as_deref()
            .ok_or_else(|| VelocityError::NotConfigured("Activity store".to_string()))
    }

    pub fn advisor(&self) -> &dyn SkillAdvisor {
        match self.advisor.as_deref() {
            Some(advisor) => advisor,
            None => &OFFLINE_ADVISOR,
        }
    }
}
