//! Skill advisor for the knowledge graph.
//!
//! Provides a `SkillAdvisor` trait with implementations for:
//! - **OpenAI**: chat completions against an OpenAI-compatible endpoint
//! - **Fallback**: the OpenAI client when a key is configured, degrading to
//!   deterministic answers on any error or when no key is set
//!
//! The advisor describes new skills, picks their prerequisites and related
//! skills from the existing graph, generates whole domains, plans learning
//! paths and suggests study resources.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::config::GraphRagConfig;
use crate::models::{EdgeKind, Skill, SkillCategory, SkillEdge};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const MAX_RELATED: usize = 3;
const MAX_PREREQUISITES: usize = 2;

// ============================================================================
// SkillAdvisor trait
// ============================================================================

#[async_trait]
pub trait SkillAdvisor: Send + Sync {
    /// Description, difficulty and learning time for a skill name.
    async fn profile_skill(&self, skill_name: &str) -> Result<SkillProfile, AdvisorError>;

    /// Names from `existing` in the same ecosystem as `skill_name`.
    async fn find_related(&self, skill_name: &str, existing: &[String]) -> Result<Vec<String>, AdvisorError>;

    /// Names from `existing` that should be learned before `skill_name`.
    async fn find_prerequisites(&self, skill_name: &str, existing: &[String])
        -> Result<Vec<String>, AdvisorError>;

    async fn generate_skills(&self, domain: &str, count: usize) -> Result<Vec<Skill>, AdvisorError>;

    async fn generate_relationships(&self, skills: &[Skill]) -> Result<Vec<SkillRelationship>, AdvisorError>;

    /// `None` when no path to the target can be produced.
    async fn learning_path(&self, context: &PathContext<'_>) -> Result<Option<LearningPath>, AdvisorError>;

    async fn skill_resources(&self, skill: &Skill) -> Result<SkillResources, AdvisorError>;

    /// True when a language model is behind this advisor.
    fn is_configured(&self) -> bool;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error and value types
// ============================================================================

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub description: String,
    pub difficulty_level: u8,
    pub learning_time_hours: u32,
}

impl SkillProfile {
    pub fn placeholder(skill_name: &str) -> Self {
        Self {
            description: format!("User-added skill: {}", skill_name),
            difficulty_level: 2,
            learning_time_hours: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    PrerequisiteOf,
    RelatesTo,
    BuildsOn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRelationship {
    pub source_skill_id: String,
    pub target_skill_id: String,
    pub relationship_type: RelationshipType,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

fn default_strength() -> f64 {
    0.8
}

impl SkillRelationship {
    /// The stored edge. `BUILDS_ON` has no counterpart in the graph store.
    pub fn to_edge(&self) -> Option<SkillEdge> {
        let kind = match self.relationship_type {
            RelationshipType::PrerequisiteOf => EdgeKind::PrerequisiteOf,
            RelationshipType::RelatesTo => EdgeKind::RelatesTo,
            RelationshipType::BuildsOn => return None,
        };
        Some(SkillEdge {
            from: self.source_skill_id.clone(),
            to: self.target_skill_id.clone(),
            kind,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub path_id: String,
    pub name: String,
    pub skills: Vec<String>,
    pub estimated_duration_hours: u32,
    pub difficulty_progression: Vec<u8>,
}

impl LearningPath {
    /// A path through `steps`, with totals taken from the skills themselves.
    pub fn through(target: &Skill, steps: &[&Skill]) -> Self {
        Self {
            path_id: format!("path-to-{}", target.id),
            name: format!("Learning Path to {}", target.name),
            skills: steps.iter().map(|s| s.id.clone()).collect(),
            estimated_duration_hours: steps.iter().map(|s| s.learning_time_hours).sum(),
            difficulty_progression: steps.iter().map(|s| s.difficulty_level).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectIdea {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillResources {
    pub resources: Vec<LearningResource>,
    pub projects: Vec<ProjectIdea>,
    pub key_concepts: Vec<String>,
    pub pitfalls: Vec<String>,
}

/// What the advisor sees when planning a path.
pub struct PathContext<'a> {
    pub learned: &'a HashSet<String>,
    pub target: &'a Skill,
    pub skills: &'a [Skill],
    pub edges: &'a [SkillEdge],
}

// ============================================================================
// Deterministic answers
// ============================================================================

/// Starter skills used when a domain cannot be generated.
pub fn fallback_skills() -> Vec<Skill> {
    vec![
        Skill::new("html-css", "HTML & CSS", SkillCategory::Frontend).with_profile(
            "Fundamentals of web structure and styling",
            1,
            20,
        ),
        Skill::new("javascript", "JavaScript", SkillCategory::Frontend).with_profile(
            "Core programming language for web development",
            2,
            40,
        ),
    ]
}

/// Chain skills by difficulty: each skill is a prerequisite of the next one
/// when both share a category.
pub fn basic_relationships(skills: &[Skill]) -> Vec<SkillRelationship> {
    let mut sorted: Vec<&Skill> = skills.iter().collect();
    sorted.sort_by_key(|s| s.difficulty_level);

    sorted
        .windows(2)
        .filter(|pair| pair[0].category == pair[1].category)
        .map(|pair| SkillRelationship {
            source_skill_id: pair[0].id.clone(),
            target_skill_id: pair[1].id.clone(),
            relationship_type: RelationshipType::PrerequisiteOf,
            strength: default_strength(),
        })
        .collect()
}

/// Every unlearned transitive prerequisite of the target, each placed after
/// its own prerequisites, then the target. Ties go to the easier skill.
pub fn prerequisite_path(context: &PathContext<'_>) -> LearningPath {
    let target = context.target;
    let by_id: HashMap<&str, &Skill> = context.skills.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut prereqs_of: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in context.edges.iter().filter(|e| e.kind == EdgeKind::PrerequisiteOf) {
        prereqs_of.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
    }

    let mut needed: HashSet<&str> = HashSet::new();
    let mut stack = vec![target.id.as_str()];
    while let Some(id) = stack.pop() {
        for &prereq in prereqs_of.get(id).into_iter().flatten() {
            if prereq != target.id
                && !context.learned.contains(prereq)
                && by_id.contains_key(prereq)
                && needed.insert(prereq)
            {
                stack.push(prereq);
            }
        }
    }

    let mut steps: Vec<&Skill> = Vec::with_capacity(needed.len() + 1);
    let mut placed: HashSet<&str> = HashSet::new();
    while placed.len() < needed.len() {
        let pending: Vec<&str> = needed.iter().copied().filter(|id| !placed.contains(id)).collect();
        let mut ready: Vec<&Skill> = pending
            .iter()
            .filter(|id| {
                prereqs_of
                    .get(**id)
                    .into_iter()
                    .flatten()
                    .all(|p| !needed.contains(p) || placed.contains(p))
            })
            .filter_map(|id| by_id.get(id).copied())
            .collect();

        // cycle among the remaining prerequisites
        if ready.is_empty() {
            ready = pending.iter().filter_map(|id| by_id.get(id).copied()).collect();
        }

        ready.sort_by(|a, b| {
            a.difficulty_level
                .cmp(&b.difficulty_level)
                .then_with(|| a.id.cmp(&b.id))
        });
        for skill in ready {
            placed.insert(skill.id.as_str());
            steps.push(skill);
        }
    }

    steps.push(target);
    LearningPath::through(target, &steps)
}

fn pick_existing(names: Vec<String>, existing: &[String], limit: usize) -> Vec<String> {
    let mut picked: Vec<String> = Vec::new();
    for name in names {
        if existing.contains(&name) && !picked.contains(&name) {
            picked.push(name);
        }
    }
    picked.truncate(limit);
    picked
}

// ============================================================================
// OpenAI API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: Option<OpenAiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProfileReply {
    description: Option<String>,
    difficulty_level: Option<u8>,
    learning_time_hours: Option<u32>,
}

struct Completion<'a> {
    system: &'a str,
    prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
    json_object: bool,
}

/// Model replies sometimes wrap JSON in a markdown fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.split("```").next().unwrap_or(rest);
            body.strip_prefix("json").unwrap_or(body).trim()
        }
        None => trimmed,
    }
}

/// JSON-object replies carry their list under `key`; plain replies may be a bare array.
fn listed<T: DeserializeOwned>(value: serde_json::Value, key: &str) -> Result<Vec<T>, AdvisorError> {
    let items = match value {
        serde_json::Value::Array(items) => serde_json::Value::Array(items),
        serde_json::Value::Object(mut map) => map.remove(key).unwrap_or(serde_json::Value::Array(Vec::new())),
        other => {
            return Err(AdvisorError::InvalidResponse(format!(
                "expected {} list, got {}",
                key, other
            )))
        }
    };
    serde_json::from_value(items).map_err(|e| AdvisorError::InvalidResponse(e.to_string()))
}

// ============================================================================
// OpenAiAdvisor
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenAiAdvisor {
    client: Client,
    config: GraphRagConfig,
    api_key: String,
}

impl OpenAiAdvisor {
    pub fn new(config: &GraphRagConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AdvisorError::MissingApiKey)?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    async fn complete(&self, completion: &Completion<'_>) -> Result<String, AdvisorError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        match Retry::spawn(retry_strategy, || self.complete_once(completion)).await {
            Ok(content) => Ok(content),
            Err(e) => {
                tracing::error!(
                    attempts = self.config.max_retries + 1,
                    error = %e,
                    "All chat completion attempts failed"
                );
                Err(AdvisorError::RetryExhausted {
                    attempts: self.config.max_retries + 1,
                })
            }
        }
    }

    async fn complete_once(&self, completion: &Completion<'_>) -> Result<String, AdvisorError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: completion.system,
                },
                ChatMessage {
                    role: "user",
                    content: &completion.prompt,
                },
            ],
            temperature: completion.temperature,
            max_tokens: completion.max_tokens,
            response_format: completion.json_object.then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Chat completion API error");
            return Err(AdvisorError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AdvisorError::InvalidResponse("empty completion".to_string()))
    }

    async fn complete_json<T: DeserializeOwned>(&self, completion: &Completion<'_>) -> Result<T, AdvisorError> {
        let content = self.complete(completion).await?;
        serde_json::from_str(strip_code_fence(&content)).map_err(|e| AdvisorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SkillAdvisor for OpenAiAdvisor {
    async fn profile_skill(&self, skill_name: &str) -> Result<SkillProfile, AdvisorError> {
        let reply: ProfileReply = self
            .complete_json(&Completion {
                system: "You describe technical skills. Reply with JSON only.",
                prompt: format!(
                    "Describe the technical skill \"{}\".\n\
                     Reply with a JSON object with these keys:\n\
                     - description: one sentence\n\
                     - difficulty_level: integer from 1 (beginner) to 5 (expert)\n\
                     - learning_time_hours: realistic hours to learn it\n\
                     No markdown, no commentary.",
                    skill_name
                ),
                temperature: 0.3,
                max_tokens: Some(200),
                json_object: false,
            })
            .await?;

        let placeholder = SkillProfile::placeholder(skill_name);
        Ok(SkillProfile {
            description: reply
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(placeholder.description),
            difficulty_level: reply
                .difficulty_level
                .map(|d| d.clamp(1, 5))
                .unwrap_or(placeholder.difficulty_level),
            learning_time_hours: reply.learning_time_hours.unwrap_or(placeholder.learning_time_hours),
        })
    }

    async fn find_related(&self, skill_name: &str, existing: &[String]) -> Result<Vec<String>, AdvisorError> {
        if existing.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = self
            .complete_json(&Completion {
                system: "You map relationships between technical skills. Reply with JSON only.",
                prompt: format!(
                    "New skill: \"{}\"\nExisting skills: {}\n\n\
                     Which one or two existing skills belong to the same ecosystem as the new \
                     skill, extend it directly, or are always used together with it? \
                     Alternatives, deployment platforms and skills from other domains do not count. \
                     Be strict; an empty list is a valid answer.\n\
                     Reply with a JSON array of names copied exactly from the list.",
                    skill_name,
                    existing.join(", ")
                ),
                temperature: 0.3,
                max_tokens: Some(100),
                json_object: false,
            })
            .await?;

        Ok(pick_existing(names, existing, MAX_RELATED))
    }

    async fn find_prerequisites(
        &self,
        skill_name: &str,
        existing: &[String],
    ) -> Result<Vec<String>, AdvisorError> {
        if existing.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = self
            .complete_json(&Completion {
                system: "You identify true prerequisites between technical skills. Reply with JSON only.",
                prompt: format!(
                    "New skill: \"{}\"\nExisting skills: {}\n\n\
                     Which one or two existing skills should be learned before the new skill? \
                     Only foundational skills count (HTML before React, Python before Django). \
                     An empty list is a valid answer.\n\
                     Reply with a JSON array of names copied exactly from the list.",
                    skill_name,
                    existing.join(", ")
                ),
                temperature: 0.2,
                max_tokens: Some(100),
                json_object: false,
            })
            .await?;

        Ok(pick_existing(names, existing, MAX_PREREQUISITES))
    }

    async fn generate_skills(&self, domain: &str, count: usize) -> Result<Vec<Skill>, AdvisorError> {
        let categories: Vec<&str> = SkillCategory::ALL.iter().map(|c| c.as_str()).collect();
        let value: serde_json::Value = self
            .complete_json(&Completion {
                system: "You design technical curricula. Reply with JSON only.",
                prompt: format!(
                    "Generate {} technical skills for the domain \"{}\", from fundamentals to \
                     advanced topics.\n\
                     Reply with a JSON object {{\"skills\": [...]}} where each skill has:\n\
                     - id: lowercase hyphenated identifier\n\
                     - name: display name\n\
                     - category: one of [{}]\n\
                     - description: one sentence\n\
                     - difficulty_level: 1 to 5\n\
                     - learning_time_hours: 5 to 100",
                    count,
                    domain,
                    categories.join(", ")
                ),
                temperature: 0.7,
                max_tokens: None,
                json_object: true,
            })
            .await?;

        listed(value, "skills")
    }

    async fn generate_relationships(&self, skills: &[Skill]) -> Result<Vec<SkillRelationship>, AdvisorError> {
        let summary: Vec<serde_json::Value> = skills
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "name": s.name,
                    "category": s.category,
                    "difficulty": s.difficulty_level,
                })
            })
            .collect();

        let value: serde_json::Value = self
            .complete_json(&Completion {
                system: "You design knowledge graphs. Reply with JSON only.",
                prompt: format!(
                    "Skills:\n{}\n\n\
                     Link these skills into a learning graph of 30 to 50 relationships. Types:\n\
                     - PREREQUISITE_OF: source must be learned before target\n\
                     - RELATES_TO: complementary skills\n\
                     - BUILDS_ON: target extends source\n\
                     Reply with a JSON object {{\"relationships\": [...]}} where each entry has \
                     source_skill_id, target_skill_id, relationship_type and strength (0.0 to 1.0).",
                    serde_json::to_string_pretty(&summary).unwrap_or_default()
                ),
                temperature: 0.5,
                max_tokens: None,
                json_object: true,
            })
            .await?;

        listed(value, "relationships")
    }

    async fn learning_path(&self, context: &PathContext<'_>) -> Result<Option<LearningPath>, AdvisorError> {
        let available: Vec<serde_json::Value> = context
            .skills
            .iter()
            .filter(|s| !context.learned.contains(&s.id))
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "name": s.name,
                    "difficulty": s.difficulty_level,
                    "hours": s.learning_time_hours,
                })
            })
            .collect();
        let prerequisites: Vec<serde_json::Value> = context
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::PrerequisiteOf)
            .map(|e| serde_json::json!({ "from": e.from, "to": e.to }))
            .collect();
        let mut known: Vec<&str> = context.learned.iter().map(String::as_str).collect();
        known.sort_unstable();

        let situation = serde_json::json!({
            "user_skills": known,
            "target_skill": {
                "id": context.target.id,
                "name": context.target.name,
                "difficulty": context.target.difficulty_level,
            },
            "available_skills": available,
            "prerequisites": prerequisites,
        });

        let path: LearningPath = self
            .complete_json(&Completion {
                system: "You plan learning paths. Reply with JSON only.",
                prompt: format!(
                    "Plan the shortest sensible path from what the student knows to {}.\n{}\n\n\
                     Start at the student's level, include missing prerequisites, go from easier \
                     to harder and finish at the target.\n\
                     Reply with a JSON object with path_id (\"path-to-{}\"), name, skills (ids in \
                     order), estimated_duration_hours and difficulty_progression.",
                    context.target.name,
                    serde_json::to_string_pretty(&situation).unwrap_or_default(),
                    context.target.id
                ),
                temperature: 0.3,
                max_tokens: None,
                json_object: true,
            })
            .await?;

        Ok(Some(path))
    }

    async fn skill_resources(&self, skill: &Skill) -> Result<SkillResources, AdvisorError> {
        self.complete_json(&Completion {
            system: "You are a technical educator. Reply with JSON only.",
            prompt: format!(
                "Skill: {}\nCategory: {}\nDifficulty: {}/5\nDescription: {}\n\n\
                 Suggest three learning resources, two practice projects, three key concepts \
                 and two common pitfalls.\n\
                 Reply with a JSON object with keys resources ([{{title, url, type}}]), \
                 projects ([{{title, description}}]), key_concepts and pitfalls.",
                skill.name, skill.category, skill.difficulty_level, skill.description
            ),
            temperature: 0.6,
            max_tokens: None,
            json_object: true,
        })
        .await
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// FallbackAdvisor
// ============================================================================

/// Wraps `OpenAiAdvisor` when a key is configured. On any error, logs a
/// warning and answers deterministically instead; never returns `Err`.
pub struct FallbackAdvisor {
    inner: Option<OpenAiAdvisor>,
}

impl FallbackAdvisor {
    /// Deterministic answers only.
    pub const fn offline() -> Self {
        Self { inner: None }
    }

    pub fn from_config(config: &GraphRagConfig) -> Self {
        let inner = match OpenAiAdvisor::new(config) {
            Ok(client) => Some(client),
            Err(AdvisorError::MissingApiKey) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Chat completion client unavailable, using offline skill advisor");
                None
            }
        };
        Self { inner }
    }

    fn degrade(&self, what: &str, error: AdvisorError) {
        tracing::warn!(what, error = %error, "Skill advisor failed, using deterministic answer");
    }
}

#[async_trait]
impl SkillAdvisor for FallbackAdvisor {
    async fn profile_skill(&self, skill_name: &str) -> Result<SkillProfile, AdvisorError> {
        if let Some(inner) = &self.inner {
            match inner.profile_skill(skill_name).await {
                Ok(profile) => return Ok(profile),
                Err(e) => self.degrade("profile", e),
            }
        }
        Ok(SkillProfile::placeholder(skill_name))
    }

    async fn find_related(&self, skill_name: &str, existing: &[String]) -> Result<Vec<String>, AdvisorError> {
        if let Some(inner) = &self.inner {
            match inner.find_related(skill_name, existing).await {
                Ok(names) => return Ok(names),
                Err(e) => self.degrade("related skills", e),
            }
        }
        Ok(Vec::new())
    }

    async fn find_prerequisites(
        &self,
        skill_name: &str,
        existing: &[String],
    ) -> Result<Vec<String>, AdvisorError> {
        if let Some(inner) = &self.inner {
            match inner.find_prerequisites(skill_name, existing).await {
                Ok(names) => return Ok(names),
                Err(e) => self.degrade("prerequisites", e),
            }
        }
        Ok(Vec::new())
    }

    async fn generate_skills(&self, domain: &str, count: usize) -> Result<Vec<Skill>, AdvisorError> {
        if let Some(inner) = &self.inner {
            match inner.generate_skills(domain, count).await {
                Ok(skills) if !skills.is_empty() => return Ok(skills),
                Ok(_) => tracing::warn!(domain, "Skill advisor generated no skills, using starter set"),
                Err(e) => self.degrade("domain skills", e),
            }
        }
        Ok(fallback_skills())
    }

    async fn generate_relationships(&self, skills: &[Skill]) -> Result<Vec<SkillRelationship>, AdvisorError> {
        if let Some(inner) = &self.inner {
            match inner.generate_relationships(skills).await {
                Ok(relationships) => return Ok(relationships),
                Err(e) => self.degrade("relationships", e),
            }
        }
        Ok(basic_relationships(skills))
    }

    async fn learning_path(&self, context: &PathContext<'_>) -> Result<Option<LearningPath>, AdvisorError> {
        if let Some(inner) = &self.inner {
            match inner.learning_path(context).await {
                Ok(Some(path)) => return Ok(Some(path)),
                Ok(None) => {}
                Err(e) => self.degrade("learning path", e),
            }
        }
        Ok(Some(prerequisite_path(context)))
    }

    async fn skill_resources(&self, skill: &Skill) -> Result<SkillResources, AdvisorError> {
        if let Some(inner) = &self.inner {
            match inner.skill_resources(skill).await {
                Ok(resources) => return Ok(resources),
                Err(e) => self.degrade("resources", e),
            }
        }
        Ok(SkillResources::default())
    }

    fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    fn name(&self) -> &str {
        match self.inner {
            Some(_) => "openai-fallback-offline",
            None => "offline",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> GraphRagConfig {
        GraphRagConfig {
            api_key: Some("test-api-key".to_string()),
            base_url: base_url.to_string(),
            max_retries: 1,
            retry_delay_ms: 10,
            ..GraphRagConfig::default()
        }
    }

    fn chat_reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn path_skills() -> Vec<Skill> {
        vec![
            Skill::new("html", "HTML5", SkillCategory::Frontend).with_profile("", 1, 10),
            Skill::new("css", "CSS3", SkillCategory::Frontend).with_profile("", 1, 15),
            Skill::new("javascript", "JavaScript", SkillCategory::Frontend).with_profile("", 2, 40),
            Skill::new("typescript", "TypeScript", SkillCategory::Frontend).with_profile("", 3, 20),
            Skill::new("react", "React", SkillCategory::Frontend).with_profile("", 3, 30),
        ]
    }

    fn path_edges() -> Vec<SkillEdge> {
        vec![
            SkillEdge::prerequisite("html", "css"),
            SkillEdge::prerequisite("css", "javascript"),
            SkillEdge::prerequisite("javascript", "react"),
            SkillEdge::prerequisite("typescript", "react"),
            SkillEdge::prerequisite("javascript", "typescript"),
            SkillEdge::relates("react", "html"),
        ]
    }

    // ========================================================================
    // TEST 1: profile_skill posts a chat completion and reads fenced JSON
    // ========================================================================
    #[tokio::test]
    async fn test_profile_skill_calls_chat_completions() {
        let mock_server = MockServer::start().await;
        let advisor = OpenAiAdvisor::new(&test_config(&mock_server.uri())).expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                "```json\n{\"description\": \"Typed JavaScript\", \"difficulty_level\": 9}\n```",
            )))
            .mount(&mock_server)
            .await;

        let profile = advisor.profile_skill("TypeScript").await.unwrap();
        assert_eq!(profile.description, "Typed JavaScript");
        assert_eq!(profile.difficulty_level, 5, "difficulty is clamped");
        assert_eq!(profile.learning_time_hours, 20, "missing keys take the placeholder");
    }

    // ========================================================================
    // TEST 2: discovered names must come from the existing list, capped
    // ========================================================================
    #[tokio::test]
    async fn test_find_prerequisites_keeps_existing_names_only() {
        let mock_server = MockServer::start().await;
        let advisor = OpenAiAdvisor::new(&test_config(&mock_server.uri())).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                "[\"Fortran\", \"JavaScript\", \"JavaScript\", \"HTML5\", \"CSS3\"]",
            )))
            .mount(&mock_server)
            .await;

        let existing = names(&["HTML5", "CSS3", "JavaScript"]);
        let prereqs = advisor.find_prerequisites("React", &existing).await.unwrap();
        assert_eq!(prereqs, names(&["JavaScript", "HTML5"]));

        let none = advisor.find_prerequisites("React", &[]).await.unwrap();
        assert!(none.is_empty(), "no existing skills means no request and no answer");
    }

    // ========================================================================
    // TEST 3: API errors are retried, then reported as exhausted
    // ========================================================================
    #[tokio::test]
    async fn test_api_500_exhausts_retries() {
        let mock_server = MockServer::start().await;
        let advisor = OpenAiAdvisor::new(&test_config(&mock_server.uri())).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "The server had an error", "type": "server_error" }
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        match advisor.profile_skill("Rust").await {
            Err(AdvisorError::RetryExhausted { attempts }) => assert_eq!(attempts, 2),
            other => panic!("Expected RetryExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_api_key() {
        let config = GraphRagConfig {
            api_key: Some("   ".to_string()),
            ..GraphRagConfig::default()
        };
        assert!(matches!(OpenAiAdvisor::new(&config), Err(AdvisorError::MissingApiKey)));
        assert!(!FallbackAdvisor::from_config(&config).is_configured());
    }

    // ========================================================================
    // TEST 4: generated skills may arrive wrapped in an object
    // ========================================================================
    #[tokio::test]
    async fn test_generate_skills_reads_wrapped_list() {
        let mock_server = MockServer::start().await;
        let advisor = OpenAiAdvisor::new(&test_config(&mock_server.uri())).unwrap();

        let reply = serde_json::json!({
            "skills": [
                {"id": "rust-basics", "name": "Rust Basics", "category": "backend",
                 "description": "Ownership and borrowing", "difficulty_level": 2, "learning_time_hours": 30},
                {"id": "tokio", "name": "Tokio", "category": "backend",
                 "description": "Async runtime", "difficulty_level": 4, "learning_time_hours": 25}
            ]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&reply.to_string())))
            .mount(&mock_server)
            .await;

        let skills = advisor.generate_skills("Rust services", 2).await.unwrap();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[1].id, "tokio");
        assert_eq!(skills[1].difficulty_level, 4);
    }

    // ========================================================================
    // TEST 5: fallback advisor degrades instead of failing
    // ========================================================================
    #[tokio::test]
    async fn test_fallback_degrades_on_api_error() {
        let mock_server = MockServer::start().await;
        let fallback = FallbackAdvisor::from_config(&test_config(&mock_server.uri()));
        assert!(fallback.is_configured());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&mock_server)
            .await;

        let profile = fallback.profile_skill("Zig").await.unwrap();
        assert_eq!(profile, SkillProfile::placeholder("Zig"));

        let related = fallback.find_related("Zig", &names(&["C"])).await.unwrap();
        assert!(related.is_empty());

        let skills = fallback.generate_skills("Web", 20).await.unwrap();
        assert_eq!(skills, fallback_skills());
    }

    // ========================================================================
    // TEST 6: offline advisor answers deterministically
    // ========================================================================
    #[tokio::test]
    async fn test_offline_answers() {
        let offline = FallbackAdvisor::offline();
        assert!(!offline.is_configured());
        assert_eq!(offline.name(), "offline");

        let skills = offline.generate_skills("Full-Stack Web Development", 15).await.unwrap();
        let ids: Vec<&str> = skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["html-css", "javascript"]);

        let relationships = offline.generate_relationships(&skills).await.unwrap();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].source_skill_id, "html-css");
        assert_eq!(relationships[0].target_skill_id, "javascript");

        let docker = Skill::new("docker", "Docker", SkillCategory::Devops);
        assert_eq!(offline.skill_resources(&docker).await.unwrap(), SkillResources::default());
    }

    // ========================================================================
    // TEST 7: basic relationships only chain same-category neighbours
    // ========================================================================
    #[test]
    fn test_basic_relationships_by_difficulty() {
        let skills = vec![
            Skill::new("sql", "SQL", SkillCategory::Database).with_profile("", 1, 10),
            Skill::new("k8s", "Kubernetes", SkillCategory::Devops).with_profile("", 4, 60),
            Skill::new("postgres", "PostgreSQL", SkillCategory::Database).with_profile("", 2, 20),
            Skill::new("docker", "Docker", SkillCategory::Devops).with_profile("", 3, 15),
        ];
        let relationships = basic_relationships(&skills);

        let pairs: Vec<(&str, &str)> = relationships
            .iter()
            .map(|r| (r.source_skill_id.as_str(), r.target_skill_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("sql", "postgres"), ("docker", "k8s")]);
        assert!(relationships.iter().all(|r| r.relationship_type == RelationshipType::PrerequisiteOf));
    }

    // ========================================================================
    // TEST 8: deterministic path orders missing prerequisites first
    // ========================================================================
    #[test]
    fn test_prerequisite_path_skips_learned_and_orders_by_dependency() {
        let skills = path_skills();
        let edges = path_edges();
        let learned: HashSet<String> = names(&["html"]).into_iter().collect();
        let target = &skills[4];

        let path = prerequisite_path(&PathContext {
            learned: &learned,
            target,
            skills: &skills,
            edges: &edges,
        });

        assert_eq!(path.path_id, "path-to-react");
        assert_eq!(path.name, "Learning Path to React");
        assert_eq!(path.skills, names(&["css", "javascript", "typescript", "react"]));
        assert_eq!(path.estimated_duration_hours, 15 + 40 + 20 + 30);
        assert_eq!(path.difficulty_progression, vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_prerequisite_path_survives_cycles() {
        let skills = path_skills();
        let edges = vec![
            SkillEdge::prerequisite("css", "javascript"),
            SkillEdge::prerequisite("javascript", "css"),
            SkillEdge::prerequisite("javascript", "react"),
        ];
        let learned = HashSet::new();

        let path = prerequisite_path(&PathContext {
            learned: &learned,
            target: &skills[4],
            skills: &skills,
            edges: &edges,
        });
        assert_eq!(path.skills, names(&["css", "javascript", "react"]));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[\"a\"]\n```"), "[\"a\"]");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  [\"a\"] "), "[\"a\"]");
    }

    #[test]
    fn test_builds_on_has_no_stored_edge() {
        let rel: SkillRelationship = serde_json::from_value(serde_json::json!({
            "source_skill_id": "react",
            "target_skill_id": "nextjs",
            "relationship_type": "BUILDS_ON"
        }))
        .unwrap();
        assert!((rel.strength - 0.8).abs() < f64::EPSILON);
        assert!(rel.to_edge().is_none());

        let rel = SkillRelationship {
            relationship_type: RelationshipType::RelatesTo,
            ..rel
        };
        assert_eq!(rel.to_edge(), Some(SkillEdge::relates("react", "nextjs")));
    }
}
