//! AI-assisted graph building: generate a whole domain, plan a learning path
//! to a target skill, enrich a skill with study material, report status.
//!
//! Every operation goes through the configured skill advisor, which answers
//! deterministically when no language model is available.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use serde::Serialize;
use velocity_core::api::{EnrichSkillRequest, GeneratePathRequest, GenerateSkillsRequest, MAX_GENERATED_SKILLS};
use velocity_core::graph_rag::{prerequisite_path, LearningPath, PathContext, SkillResources};
use velocity_core::models::skill::slugify;
use velocity_core::models::{LearnedSkill, Skill, SkillEdge};
use velocity_core::store::Stores;
use velocity_core::{VelocityConfig, VelocityError};

/// Generated skills at or below this difficulty start out learned.
const STARTER_DIFFICULTY: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateSkillsOutcome {
    pub status: String,
    pub domain: String,
    pub skills_count: usize,
    pub relationships_count: usize,
    pub learned_count: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSkill {
    #[serde(flatten)]
    pub skill: Skill,
    #[serde(flatten)]
    pub resources: SkillResources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphRagStatus {
    pub llm_configured: bool,
    pub graph_store_configured: bool,
    pub ready: bool,
    pub backend: String,
}

pub async fn generate_skills(
    stores: &Stores,
    config: &VelocityConfig,
    req: GenerateSkillsRequest,
) -> Result<GenerateSkillsOutcome> {
    let graph = stores.graph()?;

    let domain = req.domain.trim();
    if domain.is_empty() {
        return Err(VelocityError::InvalidRequest("domain is required".to_string()).into());
    }
    let count = req.num_skills.clamp(1, MAX_GENERATED_SKILLS);

    let advisor = stores.advisor();
    let skills = distinct_skills(advisor.generate_skills(domain, count).await.map_err(VelocityError::from)?);
    if skills.is_empty() {
        return Err(VelocityError::InvalidRequest(format!("No skills generated for '{}'", domain)).into());
    }

    let relationships = advisor
        .generate_relationships(&skills)
        .await
        .map_err(VelocityError::from)?;
    let ids: HashSet<&str> = skills.iter().map(|s| s.id.as_str()).collect();
    let mut seen: HashSet<SkillEdge> = HashSet::new();
    let edges: Vec<SkillEdge> = relationships
        .iter()
        .filter_map(|r| r.to_edge())
        .filter(|e| e.from != e.to && ids.contains(e.from.as_str()) && ids.contains(e.to.as_str()))
        .filter(|e| seen.insert(e.clone()))
        .collect();

    let learned: Vec<LearnedSkill> = skills
        .iter()
        .filter(|s| s.difficulty_level <= STARTER_DIFFICULTY)
        .map(|s| LearnedSkill {
            skill_id: s.id.clone(),
            name: s.name.clone(),
            confidence: starter_confidence(s.difficulty_level),
        })
        .collect();

    let user_id = req.user_id.as_deref().unwrap_or(&config.service.user_id);
    graph.replace_graph(&skills, &edges, user_id, &learned).await?;

    tracing::info!(
        domain,
        skills = skills.len(),
        relationships = edges.len(),
        learned = learned.len(),
        advisor = advisor.name(),
        "Replaced knowledge graph"
    );

    Ok(GenerateSkillsOutcome {
        status: "completed".to_string(),
        domain: domain.to_string(),
        skills_count: skills.len(),
        relationships_count: edges.len(),
        learned_count: learned.len(),
        message: format!(
            "Generated {} skills with {} relationships for {}",
            skills.len(),
            edges.len(),
            domain
        ),
    })
}

pub async fn learning_path(
    stores: &Stores,
    config: &VelocityConfig,
    req: GeneratePathRequest,
) -> Result<LearningPath> {
    let graph = stores.graph()?;

    let target_id = req.target_skill_id.trim();
    let target = graph
        .resolve_skill(target_id)
        .await?
        .ok_or_else(|| VelocityError::NotFound(format!("Skill '{}'", target_id)))?;

    let user_id = req.user_id.as_deref().unwrap_or(&config.service.user_id);
    let skills = graph.skills().await?;
    let edges = graph.edges().await?;
    let learned: HashSet<String> = graph.learned(user_id).await?.into_iter().map(|l| l.skill_id).collect();

    let context = PathContext {
        learned: &learned,
        target: &target,
        skills: &skills,
        edges: &edges,
    };

    let path = stores
        .advisor()
        .learning_path(&context)
        .await
        .map_err(VelocityError::from)?
        .ok_or_else(|| VelocityError::NotFound(format!("Learning path to '{}'", target.id)))?;

    Ok(normalize_path(path, &context))
}

pub async fn enrich_skill(stores: &Stores, req: EnrichSkillRequest) -> Result<EnrichedSkill> {
    let graph = stores.graph()?;

    let skill_id = req.skill_id.trim();
    let skill = graph
        .resolve_skill(skill_id)
        .await?
        .ok_or_else(|| VelocityError::NotFound(format!("Skill '{}'", skill_id)))?;

    let resources = stores
        .advisor()
        .skill_resources(&skill)
        .await
        .map_err(VelocityError::from)?;

    Ok(EnrichedSkill { skill, resources })
}

pub fn status(stores: &Stores) -> GraphRagStatus {
    let advisor = stores.advisor();
    let llm_configured = advisor.is_configured();
    let graph_store_configured = stores.graph().is_ok();

    GraphRagStatus {
        llm_configured,
        graph_store_configured,
        ready: llm_configured && graph_store_configured,
        backend: advisor.name().to_string(),
    }
}

/// Drop duplicate ids and names; a blank id is derived from the name.
fn distinct_skills(generated: Vec<Skill>) -> Vec<Skill> {
    let mut ids: HashSet<String> = HashSet::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut skills = Vec::with_capacity(generated.len());

    for mut skill in generated {
        skill.name = skill.name.trim().to_string();
        if skill.id.trim().is_empty() {
            skill.id = slugify(&skill.name);
        }
        if skill.id.is_empty() || skill.name.is_empty() {
            continue;
        }
        if ids.contains(&skill.id) || names.contains(&skill.name) {
            tracing::debug!(skill_id = %skill.id, "Skipping duplicate generated skill");
            continue;
        }
        ids.insert(skill.id.clone());
        names.insert(skill.name.clone());
        skills.push(skill);
    }
    skills
}

fn starter_confidence(difficulty_level: u8) -> i32 {
    95 - 10 * i32::from(difficulty_level)
}

/// Keep only known skills, each once, and end at the target. Totals come from
/// the stored skills rather than from the advisor's arithmetic.
fn normalize_path(path: LearningPath, context: &PathContext<'_>) -> LearningPath {
    let target = context.target;
    let by_id: HashMap<&str, &Skill> = context.skills.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut steps: Vec<&Skill> = path
        .skills
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .filter(|s| seen.insert(s.id.as_str()))
        .collect();

    if steps.is_empty() {
        tracing::warn!(skill_id = %target.id, "Learning path named no known skills, using prerequisite order");
        return prerequisite_path(context);
    }

    steps.retain(|s| s.id != target.id);
    steps.push(target);

    let mut normalized = LearningPath::through(target, &steps);
    if !path.name.trim().is_empty() {
        normalized.name = path.name;
    }
    normalized
}

// ============================================================================
// TESTS
// ============================================================================
