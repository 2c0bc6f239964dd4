use anyhow::Result;
use chrono::Utc;
use velocity_core::store::Stores;
use velocity_core::{VelocityConfig, VelocityRequest};

use crate::subsystems::{graph_rag, knowledge_graph, lvi, skill_confidence, skills, trend};

/// Dispatch one request to its subsystem and serialize the payload.
pub async fn handle_request(
    request: VelocityRequest,
    stores: &Stores,
    config: &VelocityConfig,
) -> Result<serde_json::Value> {
    let data = match request {
        VelocityRequest::Lvi => serde_json::to_value(lvi::current_lvi(stores, config, Utc::now()).await?)?,
        VelocityRequest::LviTrend => serde_json::to_value(trend::lvi_trend(stores, config).await?)?,
        VelocityRequest::KnowledgeGraph => {
            serde_json::to_value(knowledge_graph::knowledge_graph(stores, config).await?)?
        }
        VelocityRequest::SkillConfidence => {
            serde_json::to_value(skill_confidence::skill_confidence(stores, config).await?)?
        }
        VelocityRequest::AddSkill(req) => serde_json::to_value(skills::add_skill(stores, config, req).await?)?,
        VelocityRequest::UpdateSkillStatus(req) => {
            serde_json::to_value(skills::update_skill_status(stores, config, req).await?)?
        }
        VelocityRequest::DeleteSkill { skill_id } => {
            serde_json::to_value(skills::delete_skill(stores, &skill_id).await?)?
        }
        VelocityRequest::GenerateSkills(req) => {
            serde_json::to_value(graph_rag::generate_skills(stores, config, req).await?)?
        }
        VelocityRequest::GenerateLearningPath(req) => {
            serde_json::to_value(graph_rag::learning_path(stores, config, req).await?)?
        }
        VelocityRequest::EnrichSkill(req) => serde_json::to_value(graph_rag::enrich_skill(stores, req).await?)?,
        VelocityRequest::GraphRagStatus => serde_json::to_value(graph_rag::status(stores))?,
    };
    Ok(data)
}
