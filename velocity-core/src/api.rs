//! Request and response envelopes shared by the HTTP server and the CLI.

use serde::{Deserialize, Serialize};

use crate::graph::KnowledgeGraphData;
use crate::models::SkillCategory;

pub const PROTOCOL: &str = "velocity/1";

pub const DEFAULT_LEARNED_CONFIDENCE: i32 = 50;

pub const DEFAULT_GENERATED_SKILLS: usize = 20;
pub const MAX_GENERATED_SKILLS: usize = 50;

/// Typed request dispatched by the server router to one subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VelocityRequest {
    Lvi,
    LviTrend,
    KnowledgeGraph,
    SkillConfidence,
    AddSkill(AddSkillRequest),
    UpdateSkillStatus(UpdateSkillStatusRequest),
    DeleteSkill { skill_id: String },
    GenerateSkills(GenerateSkillsRequest),
    GenerateLearningPath(GeneratePathRequest),
    EnrichSkill(EnrichSkillRequest),
    GraphRagStatus,
}

impl VelocityRequest {
    /// Short name used in logs and failure messages.
    pub fn widget(&self) -> &'static str {
        match self {
            VelocityRequest::Lvi => "LVI data",
            VelocityRequest::LviTrend => "LVI trend",
            VelocityRequest::KnowledgeGraph => "knowledge graph",
            VelocityRequest::SkillConfidence => "skill confidence",
            VelocityRequest::AddSkill(_) => "add skill",
            VelocityRequest::UpdateSkillStatus(_) => "update skill status",
            VelocityRequest::DeleteSkill { .. } => "delete skill",
            VelocityRequest::GenerateSkills(_) => "generate skills",
            VelocityRequest::GenerateLearningPath(_) => "learning path",
            VelocityRequest::EnrichSkill(_) => "enrich skill",
            VelocityRequest::GraphRagStatus => "GraphRAG status",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(
            self,
            VelocityRequest::Lvi
                | VelocityRequest::LviTrend
                | VelocityRequest::KnowledgeGraph
                | VelocityRequest::SkillConfidence
                | VelocityRequest::GenerateLearningPath(_)
                | VelocityRequest::EnrichSkill(_)
                | VelocityRequest::GraphRagStatus
        )
    }

    /// The `data` carried by a failure response. Widgets that render
    /// collections get an empty shape instead of null.
    pub fn failure_data(&self) -> serde_json::Value {
        match self {
            VelocityRequest::KnowledgeGraph => {
                serde_json::to_value(KnowledgeGraphData::default()).unwrap_or(serde_json::Value::Null)
            }
            VelocityRequest::SkillConfidence => serde_json::Value::Array(Vec::new()),
            _ => serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSkillRequest {
    pub skill_name: String,
    #[serde(default)]
    pub category: Option<SkillCategory>,
    #[serde(default)]
    pub learned: bool,
    #[serde(default)]
    pub confidence: Option<i32>,
    /// Names or ids of existing skills this one depends on.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Names or ids of existing skills this one relates to.
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSkillStatusRequest {
    pub skill_id: String,
    pub learned: bool,
    #[serde(default)]
    pub confidence: Option<i32>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Replace the graph with skills generated for a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSkillsRequest {
    pub domain: String,
    #[serde(default = "default_generated_skills")]
    pub num_skills: usize,
    /// Owner of the starter LEARNED edges.
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_generated_skills() -> usize {
    DEFAULT_GENERATED_SKILLS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePathRequest {
    pub target_skill_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichSkillRequest {
    pub skill_id: String,
}

/// Envelope every `/api/*` endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            success: true,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(msg.into()),
            success: false,
        }
    }

    /// A failure that still carries a (usually empty) data shape.
    pub fn failure(data: T, msg: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            error: Some(msg.into()),
            success: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tagging() {
        let req: VelocityRequest = serde_json::from_value(serde_json::json!({
            "action": "delete_skill",
            "skill_id": "docker"
        }))
        .unwrap();
        assert!(matches!(req, VelocityRequest::DeleteSkill { ref skill_id } if skill_id == "docker"));

        let json = serde_json::to_value(VelocityRequest::LviTrend).unwrap();
        assert_eq!(json["action"], "lvi_trend");
    }

    #[test]
    fn test_add_skill_request_defaults() {
        let req: AddSkillRequest =
            serde_json::from_value(serde_json::json!({"skill_name": "Rust"})).unwrap();
        assert!(req.category.is_none());
        assert!(!req.learned);
        assert!(req.prerequisites.is_empty());
        assert!(req.related.is_empty());
    }

    #[test]
    fn test_add_skill_request_category_kebab_case() {
        let req: AddSkillRequest = serde_json::from_value(serde_json::json!({
            "skill_name": "PyTorch",
            "category": "ai-ml",
            "learned": true,
            "confidence": 70
        }))
        .unwrap();
        assert_eq!(req.category, Some(SkillCategory::AiMl));
        assert_eq!(req.confidence, Some(70));
    }

    #[test]
    fn test_generate_skills_request_defaults() {
        let req: GenerateSkillsRequest =
            serde_json::from_value(serde_json::json!({"domain": "Data Engineering"})).unwrap();
        assert_eq!(req.num_skills, DEFAULT_GENERATED_SKILLS);
        assert!(req.user_id.is_none());
    }

    #[test]
    fn test_graph_rag_reads_and_writes() {
        assert!(VelocityRequest::GraphRagStatus.is_read());
        assert!(VelocityRequest::EnrichSkill(EnrichSkillRequest {
            skill_id: "docker".to_string()
        })
        .is_read());

        let generate = VelocityRequest::GenerateSkills(GenerateSkillsRequest {
            domain: "Mobile".to_string(),
            num_skills: 5,
            user_id: None,
        });
        assert!(!generate.is_read());
        assert_eq!(generate.widget(), "generate skills");
        assert!(generate.failure_data().is_null());
    }

    #[test]
    fn test_failure_data_shapes() {
        let graph = VelocityRequest::KnowledgeGraph.failure_data();
        assert_eq!(graph["nodes"], serde_json::json!([]));
        assert_eq!(graph["links"], serde_json::json!([]));
        assert_eq!(graph["suggestedNextSkills"], serde_json::json!([]));

        assert_eq!(VelocityRequest::SkillConfidence.failure_data(), serde_json::json!([]));
        assert!(VelocityRequest::Lvi.failure_data().is_null());
    }

    #[test]
    fn test_api_response_envelope() {
        let ok = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(ok, serde_json::json!({"data": 42, "error": null, "success": true}));

        let err = serde_json::to_value(ApiResponse::<i32>::err("Graph store not configured")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({"data": null, "error": "Graph store not configured", "success": false})
        );
    }
}
