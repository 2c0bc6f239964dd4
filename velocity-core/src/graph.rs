//! Knowledge graph shaping for presentation
//!
//! - Nodes = every skill, decorated with the user's learned flag and confidence
//! - Links = every PREREQUISITE_OF / RELATES_TO edge, verbatim
//! - Suggestions = readiness-ranked next skills (see `readiness`)
//! - Radar = the user's most confident learned skills

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::VelocityError;
use crate::models::{EdgeKind, LearnedSkill, Skill, SkillCategory, SkillEdge};
use crate::readiness::{suggest_next, SuggestedSkill};
use crate::store::GraphStore;

/// Number of skills plotted on the confidence radar.
pub const DEFAULT_RADAR_SIZE: usize = 6;

/// Upper bound of the radar axis.
const FULL_MARK: i32 = 100;

/// A skill node decorated with the user's learning state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub category: SkillCategory,
    pub confidence: i32,
    pub learned: bool,
}

/// An edge as the graph renderer consumes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// `KnowledgeGraphData` as the graph widget consumes it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub suggested_next_skills: Vec<SuggestedSkill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarDataPoint {
    pub skill: String,
    pub confidence: i32,
    pub full_mark: i32,
}

/// Decorate skills with learned state (testable without a store).
///
/// One node per skill and one link per edge, in input order. No filtering,
/// dedup or sorting.
pub fn shape_graph(skills: &[Skill], learned: &HashMap<String, i32>, edges: &[SkillEdge]) -> ShapedGraph {
    let nodes = skills
        .iter()
        .map(|s| GraphNode {
            id: s.id.clone(),
            name: s.name.clone(),
            category: s.category,
            confidence: learned.get(&s.id).copied().unwrap_or(0),
            learned: learned.contains_key(&s.id),
        })
        .collect();

    let links = edges
        .iter()
        .map(|e| GraphLink {
            source: e.from.clone(),
            target: e.to.clone(),
            kind: e.kind,
        })
        .collect();

    ShapedGraph { nodes, links }
}

/// Most confident learned skills for the radar chart.
/// Ties are ordered by name so the chart is stable between requests.
pub fn top_confidence(learned: &[LearnedSkill], limit: usize) -> Vec<RadarDataPoint> {
    let mut ranked: Vec<&LearnedSkill> = learned.iter().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.name.cmp(&b.name))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|l| RadarDataPoint {
            skill: l.name.clone(),
            confidence: l.confidence,
            full_mark: FULL_MARK,
        })
        .collect()
}

/// Assemble the knowledge graph widget data from already-loaded records.
pub fn build_knowledge_graph(
    skills: &[Skill],
    learned: &[LearnedSkill],
    edges: &[SkillEdge],
    suggestion_limit: usize,
) -> KnowledgeGraphData {
    let confidence: HashMap<String, i32> = learned
        .iter()
        .map(|l| (l.skill_id.clone(), l.confidence))
        .collect();
    let learned_ids: HashSet<String> = confidence.keys().cloned().collect();
    let skills_by_id: HashMap<String, Skill> = skills.iter().map(|s| (s.id.clone(), s.clone())).collect();

    let ShapedGraph { nodes, links } = shape_graph(skills, &confidence, edges);
    let suggested_next_skills = suggest_next(&learned_ids, edges, &skills_by_id, suggestion_limit);

    KnowledgeGraphData {
        nodes,
        links,
        suggested_next_skills,
    }
}

/// Load the user's knowledge graph from the graph store
///
/// # Arguments
/// * `store` - Graph store client for this request
/// * `user_id` - Whose LEARNED edges decorate the nodes
/// * `suggestion_limit` - Maximum number of suggested next skills
///
/// # Returns
/// * `Ok(KnowledgeGraphData)` - Nodes, links and ranked suggestions
/// * `Err(VelocityError)` - On store errors
pub async fn load_knowledge_graph(
    store: &dyn GraphStore,
    user_id: &str,
    suggestion_limit: usize,
) -> Result<KnowledgeGraphData, VelocityError> {
    let skills = store.skills().await?;
    let learned = store.learned(user_id).await?;
    let edges = store.edges().await?;

    tracing::debug!(
        skills = skills.len(),
        learned = learned.len(),
        edges = edges.len(),
        "Loaded knowledge graph records"
    );

    Ok(build_knowledge_graph(&skills, &learned, &edges, suggestion_limit))
}

/// Load the radar points for the user's most confident skills.
pub async fn load_top_confidence(
    store: &dyn GraphStore,
    user_id: &str,
    limit: usize,
) -> Result<Vec<RadarDataPoint>, VelocityError> {
    let learned = store.learned(user_id).await?;
    Ok(top_confidence(&learned, limit))
}

// ============================================================================
// TESTS
// ============================================================================
