//! Readiness scoring for "suggested next skills".
//!
//! A candidate is any unlearned skill that a learned skill is a direct
//! prerequisite of. Readiness is the share of the candidate's direct
//! prerequisites that are already learned (100 when it has none). Only direct
//! prerequisites count; there is no transitive path analysis, so cycles in the
//! prerequisite relation cannot cause non-termination.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{EdgeKind, Skill, SkillCategory, SkillEdge};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedSkill {
    pub id: String,
    pub name: String,
    pub category: SkillCategory,
    /// Names of the learned direct prerequisites.
    pub prerequisites: Vec<String>,
    pub readiness_score: i32,
}

struct Candidate<'a> {
    skill: &'a Skill,
    learned_prereqs: Vec<&'a str>,
    readiness: f64,
}

/// Rank candidate next skills by readiness, highest first.
///
/// `edges` may contain every edge of the graph; only `PREREQUISITE_OF` edges
/// are considered. A candidate must be reached from a learned id that is also
/// a known skill. Prerequisites that do not resolve to a known skill are
/// ignored when counting coverage.
pub fn suggest_next(
    learned: &HashSet<String>,
    edges: &[SkillEdge],
    skills_by_id: &HashMap<String, Skill>,
    limit: usize,
) -> Vec<SuggestedSkill> {
    let prereq_edges = edges.iter().filter(|e| e.kind == EdgeKind::PrerequisiteOf);

    // target id -> distinct direct prerequisite ids, in edge order
    let mut prereqs_of: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut candidate_ids: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for edge in prereq_edges {
        let sources = prereqs_of.entry(edge.to.as_str()).or_default();
        if !sources.contains(&edge.from.as_str()) {
            sources.push(edge.from.as_str());
        }

        if learned.contains(&edge.from)
            && !learned.contains(&edge.to)
            && skills_by_id.contains_key(&edge.from)
            && skills_by_id.contains_key(&edge.to)
            && seen.insert(edge.to.as_str())
        {
            candidate_ids.push(edge.to.as_str());
        }
    }

    let mut candidates: Vec<Candidate<'_>> = candidate_ids
        .into_iter()
        .filter_map(|id| {
            let skill = skills_by_id.get(id)?;
            let all: Vec<&Skill> = prereqs_of
                .get(id)
                .map(|sources| sources.iter().filter_map(|s| skills_by_id.get(*s)).collect())
                .unwrap_or_default();
            let learned_prereqs: Vec<&str> = all
                .iter()
                .filter(|p| learned.contains(&p.id))
                .map(|p| p.name.as_str())
                .collect();

            let readiness = if all.is_empty() {
                100.0
            } else {
                learned_prereqs.len() as f64 / all.len() as f64 * 100.0
            };

            Some(Candidate {
                skill,
                learned_prereqs,
                readiness,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.readiness
            .partial_cmp(&a.readiness)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.learned_prereqs.len().cmp(&a.learned_prereqs.len()))
            .then_with(|| a.skill.id.cmp(&b.skill.id))
    });
    candidates.truncate(limit);

    candidates
        .into_iter()
        .map(|c| SuggestedSkill {
            id: c.skill.id.clone(),
            name: c.skill.name.clone(),
            category: c.skill.category,
            prerequisites: c.learned_prereqs.into_iter().map(str::to_string).collect(),
            readiness_score: c.readiness.round() as i32,
        })
        .collect()
}
