//! Skill management: add, mark learned / not learned, delete.
//!
//! Prerequisite and related references name existing skills by id, name or
//! name slug. Unresolved references are skipped, not rejected. When discovery
//! is enabled, the skill advisor proposes further references from the
//! existing skill names. The skill, its edges and the LEARNED edge are
//! written in one store call.

use std::collections::HashSet;

use anyhow::Result;
use serde::Serialize;
use velocity_core::api::{AddSkillRequest, UpdateSkillStatusRequest, DEFAULT_LEARNED_CONFIDENCE};
use velocity_core::graph_rag::{AdvisorError, SkillProfile};
use velocity_core::models::skill::slugify;
use velocity_core::models::{Skill, SkillCategory, SkillEdge};
use velocity_core::store::{GraphStore, Stores};
use velocity_core::{VelocityConfig, VelocityError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipsCreated {
    pub relates_to: usize,
    pub prerequisites: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddSkillOutcome {
    pub skill_id: String,
    pub skill_name: String,
    pub learned: bool,
    pub relationships_created: RelationshipsCreated,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillStatusOutcome {
    pub skill_id: String,
    pub learned: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteSkillOutcome {
    pub skill_id: String,
    pub message: String,
}

pub async fn add_skill(stores: &Stores, config: &VelocityConfig, req: AddSkillRequest) -> Result<AddSkillOutcome> {
    let graph = stores.graph()?;

    let name = req.skill_name.trim();
    let skill_id = slugify(name);
    if skill_id.is_empty() {
        return Err(VelocityError::InvalidRequest("skill_name is required".to_string()).into());
    }

    let conflict = || VelocityError::Conflict(format!("Skill '{}'", name));
    if graph.resolve_skill(&skill_id).await?.is_some() || graph.resolve_skill(name).await?.is_some() {
        return Err(conflict().into());
    }

    let advisor = stores.advisor();
    let profile = match advisor.profile_skill(name).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(skill_name = name, error = %e, "Skill profile unavailable, using placeholder");
            SkillProfile::placeholder(name)
        }
    };
    let skill = Skill::new(skill_id.clone(), name, req.category.unwrap_or(SkillCategory::Backend)).with_profile(
        profile.description,
        profile.difficulty_level,
        profile.learning_time_hours,
    );

    let mut prerequisite_refs = req.prerequisites.clone();
    let mut related_refs = req.related.clone();
    if config.graph_rag.discover_relationships {
        let existing: Vec<String> = graph.skills().await?.into_iter().map(|s| s.name).collect();
        prerequisite_refs.extend(discovered(
            advisor.find_prerequisites(name, &existing).await,
            "prerequisites",
        ));
        related_refs.extend(discovered(advisor.find_related(name, &existing).await, "related skills"));
    }

    let mut edges: Vec<SkillEdge> = Vec::new();
    let mut seen: HashSet<SkillEdge> = HashSet::new();

    let mut prerequisites = 0;
    for reference in &prerequisite_refs {
        if let Some(prereq) = resolve_reference(graph, reference, &skill_id).await? {
            let edge = SkillEdge::prerequisite(prereq.id, skill_id.clone());
            if seen.insert(edge.clone()) {
                edges.push(edge);
                prerequisites += 1;
            }
        }
    }

    let mut relates_to = 0;
    for reference in &related_refs {
        if let Some(related) = resolve_reference(graph, reference, &skill_id).await? {
            let edge = SkillEdge::relates(skill_id.clone(), related.id);
            if seen.insert(edge.clone()) {
                edges.push(edge);
                relates_to += 1;
            }
        }
    }

    let user_id = req.user_id.as_deref().unwrap_or(&config.service.user_id);
    let learned = req.learned.then(|| (user_id, clamp_confidence(req.confidence)));

    match graph.create_skill(&skill, &edges, learned).await {
        Err(VelocityError::Conflict(_)) => return Err(conflict().into()),
        other => other?,
    }

    tracing::info!(
        skill_id = %skill_id,
        prerequisites,
        relates_to,
        learned = req.learned,
        advisor = advisor.name(),
        "Added skill"
    );

    Ok(AddSkillOutcome {
        skill_id,
        skill_name: name.to_string(),
        learned: req.learned,
        message: format!("Skill added with {} relationships", relates_to + prerequisites),
        relationships_created: RelationshipsCreated {
            relates_to,
            prerequisites,
        },
    })
}

/// Advisor suggestions are best effort; a failed lookup adds nothing.
fn discovered(found: Result<Vec<String>, AdvisorError>, what: &str) -> Vec<String> {
    found.unwrap_or_else(|e| {
        tracing::warn!(what, error = %e, "Relationship discovery failed");
        Vec::new()
    })
}

pub async fn update_skill_status(
    stores: &Stores,
    config: &VelocityConfig,
    req: UpdateSkillStatusRequest,
) -> Result<SkillStatusOutcome> {
    let graph = stores.graph()?;
    let user_id = req.user_id.as_deref().unwrap_or(&config.service.user_id);

    let message = if req.learned {
        graph
            .upsert_learned(user_id, &req.skill_id, clamp_confidence(req.confidence))
            .await?;
        "Skill marked as learned"
    } else {
        let removed = graph.remove_learned(user_id, &req.skill_id).await?;
        tracing::debug!(skill_id = %req.skill_id, removed, "Cleared learned edge");
        "Skill marked as not learned"
    };

    Ok(SkillStatusOutcome {
        skill_id: req.skill_id,
        learned: req.learned,
        message: message.to_string(),
    })
}

pub async fn delete_skill(stores: &Stores, skill_id: &str) -> Result<DeleteSkillOutcome> {
    let graph = stores.graph()?;

    if !graph.delete_skill(skill_id).await? {
        return Err(VelocityError::NotFound(format!("Skill '{}'", skill_id)).into());
    }

    tracing::info!(skill_id, "Deleted skill");
    Ok(DeleteSkillOutcome {
        skill_id: skill_id.to_string(),
        message: "Skill deleted successfully".to_string(),
    })
}

/// Id, then name, then the slug of the name. Self references resolve to None.
async fn resolve_reference(graph: &dyn GraphStore, reference: &str, own_id: &str) -> Result<Option<Skill>> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Ok(None);
    }

    let found = match graph.resolve_skill(reference).await? {
        Some(skill) => Some(skill),
        None => graph.resolve_skill(&slugify(reference)).await?,
    };

    if found.is_none() {
        tracing::debug!(reference, "Skipping unresolved skill reference");
    }
    Ok(found.filter(|s| s.id != own_id))
}

fn clamp_confidence(confidence: Option<i32>) -> i32 {
    confidence.unwrap_or(DEFAULT_LEARNED_CONFIDENCE).clamp(0, 100)
}

// ============================================================================
// TESTS
// ============================================================================
