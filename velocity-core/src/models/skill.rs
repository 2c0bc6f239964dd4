use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VelocityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillCategory {
    Frontend,
    Backend,
    Database,
    Devops,
    AiMl,
    Mobile,
    Security,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 7] = [
        SkillCategory::Frontend,
        SkillCategory::Backend,
        SkillCategory::Database,
        SkillCategory::Devops,
        SkillCategory::AiMl,
        SkillCategory::Mobile,
        SkillCategory::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Frontend => "frontend",
            SkillCategory::Backend => "backend",
            SkillCategory::Database => "database",
            SkillCategory::Devops => "devops",
            SkillCategory::AiMl => "ai-ml",
            SkillCategory::Mobile => "mobile",
            SkillCategory::Security => "security",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = VelocityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| VelocityError::InvalidRecord(format!("unknown skill category '{}'", s)))
    }
}

pub const DEFAULT_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;
pub const DEFAULT_LEARNING_HOURS: u32 = 10;

/// Immutable reference data for one node of the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub category: SkillCategory,
    #[serde(default)]
    pub description: String,
    /// 1 (beginner) to 5 (expert).
    #[serde(default = "default_difficulty")]
    pub difficulty_level: u8,
    #[serde(default = "default_learning_hours")]
    pub learning_time_hours: u32,
}

fn default_difficulty() -> u8 {
    DEFAULT_DIFFICULTY
}

fn default_learning_hours() -> u32 {
    DEFAULT_LEARNING_HOURS
}

impl Skill {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: SkillCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            difficulty_level: DEFAULT_DIFFICULTY,
            learning_time_hours: DEFAULT_LEARNING_HOURS,
        }
    }

    pub fn with_profile(mut self, description: impl Into<String>, difficulty_level: u8, learning_time_hours: u32) -> Self {
        self.description = description.into();
        self.difficulty_level = difficulty_level.clamp(DEFAULT_DIFFICULTY, MAX_DIFFICULTY);
        self.learning_time_hours = learning_time_hours;
        self
    }
}

/// A user's LEARNED edge, joined with the skill name for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedSkill {
    pub skill_id: String,
    pub name: String,
    /// Always within 0..=100.
    pub confidence: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    PrerequisiteOf,
    RelatesTo,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::PrerequisiteOf => "PREREQUISITE_OF",
            EdgeKind::RelatesTo => "RELATES_TO",
        }
    }
}

impl FromStr for EdgeKind {
    type Err = VelocityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREREQUISITE_OF" => Ok(EdgeKind::PrerequisiteOf),
            "RELATES_TO" => Ok(EdgeKind::RelatesTo),
            other => Err(VelocityError::InvalidRecord(format!(
                "unknown edge type '{}'",
                other
            ))),
        }
    }
}

/// A directed skill → skill relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl SkillEdge {
    pub fn prerequisite(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::PrerequisiteOf,
        }
    }

    pub fn relates(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::RelatesTo,
        }
    }
}

/// Skill ids are derived from display names: lowercase, spaces to dashes, dots dropped.
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-").replace('.', "")
}
