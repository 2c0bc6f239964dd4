//! In-memory store backing tests and `--demo` mode.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc};
use tokio::sync::RwLock;

use super::{ActivityStore, GraphStore};
use crate::error::VelocityError;
use crate::lvi::week_window;
use crate::models::{
    Complexity, LearnedSkill, LviSnapshot, Session, Skill, SkillApplication, SkillCategory, SkillEdge,
};

#[derive(Debug, Clone)]
struct LearnedEdge {
    user_id: String,
    skill_id: String,
    confidence: i32,
}

#[derive(Debug, Default)]
struct MemoryData {
    skills: Vec<Skill>,
    learned: Vec<LearnedEdge>,
    edges: Vec<SkillEdge>,
    sessions: Vec<Session>,
    applications: Vec<SkillApplication>,
    snapshots: Vec<(String, LviSnapshot)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skills(mut self, skills: impl IntoIterator<Item = Skill>) -> Self {
        self.data.get_mut().skills.extend(skills);
        self
    }

    pub fn with_edges(mut self, edges: impl IntoIterator<Item = SkillEdge>) -> Self {
        self.data.get_mut().edges.extend(edges);
        self
    }

    pub fn with_learned(mut self, user_id: &str, skill_id: &str, confidence: i32) -> Self {
        self.data.get_mut().learned.push(LearnedEdge {
            user_id: user_id.to_string(),
            skill_id: skill_id.to_string(),
            confidence,
        });
        self
    }

    pub fn with_sessions(mut self, sessions: impl IntoIterator<Item = Session>) -> Self {
        self.data.get_mut().sessions.extend(sessions);
        self
    }

    pub fn with_applications(mut self, applications: impl IntoIterator<Item = SkillApplication>) -> Self {
        self.data.get_mut().applications.extend(applications);
        self
    }

    pub fn with_snapshots(mut self, user_id: &str, snapshots: impl IntoIterator<Item = LviSnapshot>) -> Self {
        self.data
            .get_mut()
            .snapshots
            .extend(snapshots.into_iter().map(|s| (user_id.to_string(), s)));
        self
    }

    /// The demo dataset for `user-1`: a 49-skill web/backend/ops graph,
    /// this week's sessions and applications relative to `now`, and twelve
    /// weeks of snapshot history climbing from 52 to 81.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let user = DEMO_USER;
        let mut store = MemoryStore::new()
            .with_skills(
                DEMO_SKILLS
                    .iter()
                    .map(|(id, name, category)| Skill::new(*id, *name, *category)),
            )
            .with_edges(
                DEMO_PREREQUISITES
                    .iter()
                    .map(|(from, to)| SkillEdge::prerequisite(*from, *to))
                    .chain(DEMO_RELATED.iter().map(|(from, to)| SkillEdge::relates(*from, *to))),
            );

        for (id, confidence) in DEMO_LEARNED {
            store = store.with_learned(user, id, confidence);
        }

        let week = week_window(now);

        let sessions = DEMO_SESSION_MINUTES.iter().enumerate().map(|(i, &duration)| {
            let start = week.start + Duration::days((i / 2) as i64) + Duration::hours(9 + (i % 2) as i64 * 5);
            Session {
                user_id: user.to_string(),
                start_time: start,
                end_time: start + Duration::minutes(i64::from(duration)),
                duration,
                skills_practiced: DEMO_PRACTICED[..(i % 3) + 1].iter().map(|s| s.to_string()).collect(),
                concepts_learned: vec![DEMO_CONCEPTS[(i / 3) % DEMO_CONCEPTS.len()].to_string()],
                completion_rate: 0.7 + (i % 4) as f64 * 0.1,
            }
        });

        let applications = DEMO_SUCCESS_RATES.iter().enumerate().map(|(i, &success_rate)| {
            SkillApplication {
                user_id: user.to_string(),
                skill_id: DEMO_PRACTICED[i % DEMO_PRACTICED.len()].to_string(),
                applied_at: week.start + Duration::days((i / 3) as i64) + Duration::hours(9 + (i % 3) as i64 * 4),
                project_id: DEMO_PROJECTS[i % DEMO_PROJECTS.len()].to_string(),
                success_rate,
                time_spent: 30 + (i as u32 * 7) % 150,
                complexity: [Complexity::Low, Complexity::Medium, Complexity::High][i % 3],
            }
        });

        let snapshots = DEMO_HISTORY.iter().map(|&(weeks_ago, score, concepts, rate, time)| {
            let created_at = now - Duration::weeks(weeks_ago);
            LviSnapshot {
                id: format!("snapshot-{}", weeks_ago),
                week_number: created_at.iso_week().week() as i32,
                year: created_at.year(),
                score,
                concepts_mastered: concepts,
                application_rate: rate,
                avg_time_to_mastery: time,
                scaling_factor: 10,
                created_at,
            }
        });

        store
            .with_sessions(sessions)
            .with_applications(applications)
            .with_snapshots(user, snapshots)
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn skills(&self) -> Result<Vec<Skill>, VelocityError> {
        Ok(self.data.read().await.skills.clone())
    }

    async fn learned(&self, user_id: &str) -> Result<Vec<LearnedSkill>, VelocityError> {
        let data = self.data.read().await;
        Ok(data
            .learned
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| {
                let skill = data.skills.iter().find(|s| s.id == l.skill_id)?;
                Some(LearnedSkill {
                    skill_id: l.skill_id.clone(),
                    name: skill.name.clone(),
                    confidence: l.confidence,
                })
            })
            .collect())
    }

    async fn edges(&self) -> Result<Vec<SkillEdge>, VelocityError> {
        Ok(self.data.read().await.edges.clone())
    }

    async fn resolve_skill(&self, id_or_name: &str) -> Result<Option<Skill>, VelocityError> {
        let data = self.data.read().await;
        Ok(data
            .skills
            .iter()
            .find(|s| s.id == id_or_name || s.name == id_or_name)
            .cloned())
    }

    async fn create_skill(
        &self,
        skill: &Skill,
        edges: &[SkillEdge],
        learned: Option<(&str, i32)>,
    ) -> Result<(), VelocityError> {
        let mut data = self.data.write().await;
        if data.skills.iter().any(|s| s.id == skill.id || s.name == skill.name) {
            return Err(VelocityError::Conflict(format!("Skill '{}'", skill.name)));
        }

        let known: HashSet<&str> = data
            .skills
            .iter()
            .map(|s| s.id.as_str())
            .chain(std::iter::once(skill.id.as_str()))
            .collect();
        for edge in edges {
            for end in [&edge.from, &edge.to] {
                if !known.contains(end.as_str()) {
                    return Err(VelocityError::NotFound(format!("Skill '{}'", end)));
                }
            }
        }

        data.skills.push(skill.clone());
        data.edges.extend_from_slice(edges);
        if let Some((user_id, confidence)) = learned {
            data.learned.push(LearnedEdge {
                user_id: user_id.to_string(),
                skill_id: skill.id.clone(),
                confidence,
            });
        }
        Ok(())
    }

    async fn replace_graph(
        &self,
        skills: &[Skill],
        edges: &[SkillEdge],
        user_id: &str,
        learned: &[LearnedSkill],
    ) -> Result<(), VelocityError> {
        let mut known: HashSet<&str> = HashSet::new();
        let mut names: HashSet<&str> = HashSet::new();
        for skill in skills {
            if !known.insert(skill.id.as_str()) || !names.insert(skill.name.as_str()) {
                return Err(VelocityError::Conflict(format!("Skill '{}'", skill.name)));
            }
        }
        let ends = edges.iter().flat_map(|e| [&e.from, &e.to]);
        for id in ends.chain(learned.iter().map(|l| &l.skill_id)) {
            if !known.contains(id.as_str()) {
                return Err(VelocityError::NotFound(format!("Skill '{}'", id)));
            }
        }

        let mut data = self.data.write().await;
        data.skills = skills.to_vec();
        data.edges = edges.to_vec();
        data.learned = learned
            .iter()
            .map(|l| LearnedEdge {
                user_id: user_id.to_string(),
                skill_id: l.skill_id.clone(),
                confidence: l.confidence,
            })
            .collect();
        Ok(())
    }

    async fn upsert_learned(&self, user_id: &str, skill_id: &str, confidence: i32) -> Result<(), VelocityError> {
        let mut data = self.data.write().await;
        if !data.skills.iter().any(|s| s.id == skill_id) {
            return Err(VelocityError::NotFound(format!("Skill '{}'", skill_id)));
        }

        if let Some(edge) = data
            .learned
            .iter_mut()
            .find(|l| l.user_id == user_id && l.skill_id == skill_id)
        {
            edge.confidence = confidence;
            return Ok(());
        }

        data.learned.push(LearnedEdge {
            user_id: user_id.to_string(),
            skill_id: skill_id.to_string(),
            confidence,
        });
        Ok(())
    }

    async fn remove_learned(&self, user_id: &str, skill_id: &str) -> Result<bool, VelocityError> {
        let mut data = self.data.write().await;
        let before = data.learned.len();
        data.learned
            .retain(|l| !(l.user_id == user_id && l.skill_id == skill_id));
        Ok(data.learned.len() != before)
    }

    async fn delete_skill(&self, skill_id: &str) -> Result<bool, VelocityError> {
        let mut data = self.data.write().await;
        let before = data.skills.len();
        data.skills.retain(|s| s.id != skill_id);
        if data.skills.len() == before {
            return Ok(false);
        }
        data.edges.retain(|e| e.from != skill_id && e.to != skill_id);
        data.learned.retain(|l| l.skill_id != skill_id);
        Ok(true)
    }

    async fn graph_health(&self) -> Result<String, VelocityError> {
        Ok("in-memory".to_string())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn sessions_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, VelocityError> {
        let data = self.data.read().await;
        Ok(data
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.start_time >= start && s.start_time <= end)
            .cloned()
            .collect())
    }

    async fn applications_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SkillApplication>, VelocityError> {
        let data = self.data.read().await;
        Ok(data
            .applications
            .iter()
            .filter(|a| a.user_id == user_id && a.applied_at >= start && a.applied_at <= end)
            .cloned()
            .collect())
    }

    async fn recent_snapshots(&self, user_id: &str, limit: usize) -> Result<Vec<LviSnapshot>, VelocityError> {
        let data = self.data.read().await;
        let mut snapshots: Vec<LviSnapshot> = data
            .snapshots
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, s)| s.clone())
            .collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots.truncate(limit);
        Ok(snapshots)
    }

    async fn activity_health(&self) -> Result<String, VelocityError> {
        Ok("in-memory".to_string())
    }
}

// ============================================================================
// Demo dataset
// ============================================================================

pub const DEMO_USER: &str = "user-1";

const DEMO_SKILLS: [(&str, &str, SkillCategory); 49] = [
    ("html", "HTML5", SkillCategory::Frontend),
    ("css", "CSS3", SkillCategory::Frontend),
    ("javascript", "JavaScript", SkillCategory::Frontend),
    ("typescript", "TypeScript", SkillCategory::Frontend),
    ("react", "React", SkillCategory::Frontend),
    ("nextjs", "Next.js", SkillCategory::Frontend),
    ("tailwind", "Tailwind CSS", SkillCategory::Frontend),
    ("vue", "Vue.js", SkillCategory::Frontend),
    ("angular", "Angular", SkillCategory::Frontend),
    ("svelte", "Svelte", SkillCategory::Frontend),
    ("d3", "D3.js", SkillCategory::Frontend),
    ("nodejs", "Node.js", SkillCategory::Backend),
    ("express", "Express.js", SkillCategory::Backend),
    ("python", "Python", SkillCategory::Backend),
    ("fastapi", "FastAPI", SkillCategory::Backend),
    ("graphql", "GraphQL", SkillCategory::Backend),
    ("rest-api", "REST API", SkillCategory::Backend),
    ("nestjs", "NestJS", SkillCategory::Backend),
    ("websockets", "WebSockets", SkillCategory::Backend),
    ("sql", "SQL", SkillCategory::Database),
    ("mongodb", "MongoDB", SkillCategory::Database),
    ("neo4j", "Neo4j", SkillCategory::Database),
    ("redis", "Redis", SkillCategory::Database),
    ("postgresql", "PostgreSQL", SkillCategory::Database),
    ("prisma", "Prisma", SkillCategory::Database),
    ("firestore", "Firestore", SkillCategory::Database),
    ("docker", "Docker", SkillCategory::Devops),
    ("kubernetes", "Kubernetes", SkillCategory::Devops),
    ("cicd", "CI/CD", SkillCategory::Devops),
    ("aws", "AWS", SkillCategory::Devops),
    ("gcp", "Google Cloud", SkillCategory::Devops),
    ("terraform", "Terraform", SkillCategory::Devops),
    ("github-actions", "GitHub Actions", SkillCategory::Devops),
    ("ml-basics", "ML Basics", SkillCategory::AiMl),
    ("tensorflow", "TensorFlow", SkillCategory::AiMl),
    ("pytorch", "PyTorch", SkillCategory::AiMl),
    ("llm", "LLM Integration", SkillCategory::AiMl),
    ("langchain", "LangChain", SkillCategory::AiMl),
    ("vector-db", "Vector Databases", SkillCategory::AiMl),
    ("react-native", "React Native", SkillCategory::Mobile),
    ("flutter", "Flutter", SkillCategory::Mobile),
    ("swift", "Swift", SkillCategory::Mobile),
    ("kotlin", "Kotlin", SkillCategory::Mobile),
    ("expo", "Expo", SkillCategory::Mobile),
    ("auth", "Authentication", SkillCategory::Security),
    ("oauth", "OAuth 2.0", SkillCategory::Security),
    ("jwt", "JWT", SkillCategory::Security),
    ("encryption", "Encryption", SkillCategory::Security),
    ("owasp", "OWASP Security", SkillCategory::Security),
];

const DEMO_LEARNED: [(&str, i32); 28] = [
    ("html", 95),
    ("css", 92),
    ("javascript", 88),
    ("typescript", 82),
    ("react", 85),
    ("nextjs", 78),
    ("tailwind", 90),
    ("d3", 72),
    ("nodejs", 80),
    ("express", 75),
    ("python", 70),
    ("graphql", 65),
    ("rest-api", 85),
    ("sql", 88),
    ("mongodb", 75),
    ("neo4j", 68),
    ("postgresql", 82),
    ("firestore", 70),
    ("docker", 72),
    ("cicd", 68),
    ("aws", 58),
    ("github-actions", 75),
    ("ml-basics", 55),
    ("llm", 62),
    ("react-native", 45),
    ("auth", 78),
    ("oauth", 65),
    ("jwt", 72),
];

const DEMO_PREREQUISITES: [(&str, &str); 42] = [
    ("html", "css"),
    ("css", "javascript"),
    ("javascript", "typescript"),
    ("javascript", "react"),
    ("javascript", "vue"),
    ("javascript", "angular"),
    ("javascript", "svelte"),
    ("react", "nextjs"),
    ("css", "tailwind"),
    ("javascript", "d3"),
    ("javascript", "nodejs"),
    ("nodejs", "express"),
    ("nodejs", "nestjs"),
    ("typescript", "nestjs"),
    ("python", "fastapi"),
    ("javascript", "graphql"),
    ("nodejs", "rest-api"),
    ("nodejs", "websockets"),
    ("sql", "postgresql"),
    ("sql", "prisma"),
    ("nodejs", "prisma"),
    ("nodejs", "mongodb"),
    ("graphql", "neo4j"),
    ("docker", "kubernetes"),
    ("docker", "cicd"),
    ("cicd", "github-actions"),
    ("aws", "terraform"),
    ("docker", "aws"),
    ("docker", "gcp"),
    ("python", "ml-basics"),
    ("ml-basics", "tensorflow"),
    ("ml-basics", "pytorch"),
    ("python", "llm"),
    ("llm", "langchain"),
    ("llm", "vector-db"),
    ("react", "react-native"),
    ("react-native", "expo"),
    ("javascript", "flutter"),
    ("auth", "oauth"),
    ("auth", "jwt"),
    ("jwt", "encryption"),
    ("auth", "owasp"),
];

const DEMO_RELATED: [(&str, &str); 38] = [
    ("react", "typescript"),
    ("nextjs", "nodejs"),
    ("nextjs", "prisma"),
    ("graphql", "react"),
    ("graphql", "typescript"),
    ("vue", "typescript"),
    ("angular", "typescript"),
    ("nodejs", "mongodb"),
    ("nodejs", "postgresql"),
    ("express", "rest-api"),
    ("nestjs", "graphql"),
    ("neo4j", "graphql"),
    ("fastapi", "postgresql"),
    ("prisma", "postgresql"),
    ("firestore", "nextjs"),
    ("aws", "docker"),
    ("gcp", "docker"),
    ("kubernetes", "aws"),
    ("terraform", "kubernetes"),
    ("github-actions", "docker"),
    ("cicd", "aws"),
    ("ml-basics", "llm"),
    ("tensorflow", "python"),
    ("pytorch", "python"),
    ("langchain", "python"),
    ("vector-db", "mongodb"),
    ("llm", "nodejs"),
    ("react-native", "typescript"),
    ("expo", "react-native"),
    ("nodejs", "auth"),
    ("jwt", "nodejs"),
    ("oauth", "rest-api"),
    ("owasp", "nodejs"),
    ("encryption", "auth"),
    ("d3", "react"),
    ("d3", "typescript"),
    ("websockets", "redis"),
    ("websockets", "react"),
];

const DEMO_PRACTICED: [&str; 10] = [
    "react", "typescript", "nextjs", "nodejs", "graphql", "tailwind", "d3", "postgresql", "docker", "jwt",
];

const DEMO_CONCEPTS: [&str; 5] = [
    "React Hooks Deep Dive",
    "State Management with Zustand",
    "API Routes Design",
    "Query Optimization",
    "Docker Compose Setup",
];

const DEMO_SESSION_MINUTES: [u32; 14] = [270, 280, 260, 250, 270, 280, 260, 250, 270, 280, 260, 250, 270, 280];

const DEMO_PROJECTS: [&str; 5] = ["dash", "shop", "bot", "api", "auth"];

const DEMO_SUCCESS_RATES: [f64; 20] = [
    0.85, 0.75, 0.82, 0.70, 0.85, 0.76, 0.84, 0.72, 0.80, 0.86, 0.74, 0.82, 0.70, 0.85, 0.76, 0.84, 0.72, 0.80,
    0.86, 0.74,
];

/// (weeks ago, score, concepts, application rate, days to mastery), oldest first
const DEMO_HISTORY: [(i64, i32, i32, f64, f64); 12] = [
    (11, 52, 4, 0.48, 7.5),
    (10, 55, 5, 0.51, 7.0),
    (9, 54, 5, 0.50, 7.2),
    (8, 59, 6, 0.55, 6.5),
    (7, 64, 7, 0.60, 6.0),
    (6, 61, 7, 0.58, 6.2),
    (5, 68, 8, 0.64, 5.5),
    (4, 72, 9, 0.68, 5.0),
    (3, 75, 9, 0.71, 4.8),
    (2, 78, 10, 0.73, 4.5),
    (1, 79, 10, 0.74, 4.4),
    (0, 81, 11, 0.75, 4.2),
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // A Wednesday
        Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_demo_graph_counts() {
        let store = MemoryStore::demo(now());
        assert_eq!(store.skills().await.unwrap().len(), 49);
        assert_eq!(store.learned(DEMO_USER).await.unwrap().len(), 28);
        assert_eq!(store.edges().await.unwrap().len(), 42 + 38);
        assert!(store.learned("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_demo_activity_is_in_current_week() {
        let store = MemoryStore::demo(now());
        let week = week_window(now());

        let sessions = store.sessions_between(DEMO_USER, week.start, week.end).await.unwrap();
        let apps = store.applications_between(DEMO_USER, week.start, week.end).await.unwrap();
        assert_eq!(sessions.len(), 14);
        assert_eq!(apps.len(), 20);

        let last_week = week.start - Duration::weeks(1);
        let stale = store
            .sessions_between(DEMO_USER, last_week, week.start - Duration::milliseconds(1))
            .await
            .unwrap();
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn test_recent_snapshots_newest_first_and_limited() {
        let store = MemoryStore::demo(now());
        let snaps = store.recent_snapshots(DEMO_USER, 5).await.unwrap();
        assert_eq!(snaps.len(), 5);
        assert_eq!(snaps[0].score, 81);
        assert!(snaps.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_create_skill_conflict_on_id_or_name() {
        let store = MemoryStore::new().with_skills([Skill::new("gcp", "Google Cloud", SkillCategory::Devops)]);

        let same_id = store
            .create_skill(&Skill::new("gcp", "GCP", SkillCategory::Devops), &[], None)
            .await
            .unwrap_err();
        assert!(matches!(same_id, VelocityError::Conflict(_)));

        let same_name = store
            .create_skill(&Skill::new("google-cloud", "Google Cloud", SkillCategory::Devops), &[], None)
            .await
            .unwrap_err();
        assert_eq!(same_name.to_string(), "Skill 'Google Cloud' already exists");
        assert_eq!(store.skills().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_skill_writes_everything_or_nothing() {
        let store = MemoryStore::demo(now());
        let deno = Skill::new("deno", "Deno", SkillCategory::Backend);

        let err = store
            .create_skill(
                &deno,
                &[
                    SkillEdge::prerequisite("typescript", "deno"),
                    SkillEdge::relates("deno", "cobol"),
                ],
                Some((DEMO_USER, 60)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VelocityError::NotFound(_)));
        assert!(store.resolve_skill("deno").await.unwrap().is_none());
        assert_eq!(store.edges().await.unwrap().len(), 42 + 38);
        assert_eq!(store.learned(DEMO_USER).await.unwrap().len(), 28);

        store
            .create_skill(&deno, &[SkillEdge::prerequisite("typescript", "deno")], Some((DEMO_USER, 60)))
            .await
            .unwrap();
        assert!(store.edges().await.unwrap().contains(&SkillEdge::prerequisite("typescript", "deno")));
        let learned = store.learned(DEMO_USER).await.unwrap();
        assert!(learned.iter().any(|l| l.skill_id == "deno" && l.confidence == 60));
    }

    #[tokio::test]
    async fn test_replace_graph() {
        let store = MemoryStore::demo(now());
        let skills = vec![
            Skill::new("html-css", "HTML & CSS", SkillCategory::Frontend),
            Skill::new("javascript", "JavaScript", SkillCategory::Frontend),
        ];
        let learned = vec![LearnedSkill {
            skill_id: "html-css".to_string(),
            name: String::new(),
            confidence: 85,
        }];

        let err = store
            .replace_graph(&skills, &[SkillEdge::prerequisite("html-css", "react")], DEMO_USER, &learned)
            .await
            .unwrap_err();
        assert!(matches!(err, VelocityError::NotFound(_)));
        assert_eq!(store.skills().await.unwrap().len(), 49);

        store
            .replace_graph(&skills, &[SkillEdge::prerequisite("html-css", "javascript")], DEMO_USER, &learned)
            .await
            .unwrap();
        assert_eq!(store.skills().await.unwrap().len(), 2);
        assert_eq!(store.edges().await.unwrap().len(), 1);
        let learned = store.learned(DEMO_USER).await.unwrap();
        assert_eq!(learned.len(), 1);
        assert_eq!(learned[0].name, "HTML & CSS");
    }

    #[tokio::test]
    async fn test_upsert_and_remove_learned() {
        let store = MemoryStore::new().with_skills([Skill::new("rust", "Rust", SkillCategory::Backend)]);

        store.upsert_learned("u", "rust", 40).await.unwrap();
        store.upsert_learned("u", "rust", 70).await.unwrap();
        let learned = store.learned("u").await.unwrap();
        assert_eq!(learned.len(), 1);
        assert_eq!(learned[0].confidence, 70);

        assert!(store.remove_learned("u", "rust").await.unwrap());
        assert!(!store.remove_learned("u", "rust").await.unwrap());

        let err = store.upsert_learned("u", "zig", 10).await.unwrap_err();
        assert!(matches!(err, VelocityError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_skill_cascades() {
        let store = MemoryStore::demo(now());
        assert!(store.delete_skill("javascript").await.unwrap());
        assert!(!store.delete_skill("javascript").await.unwrap());

        let edges = store.edges().await.unwrap();
        assert!(edges.iter().all(|e| e.from != "javascript" && e.to != "javascript"));
        let learned = store.learned(DEMO_USER).await.unwrap();
        assert!(learned.iter().all(|l| l.skill_id != "javascript"));
    }

    #[tokio::test]
    async fn test_resolve_by_id_or_name() {
        let store = MemoryStore::demo(now());
        assert_eq!(store.resolve_skill("nextjs").await.unwrap().unwrap().name, "Next.js");
        assert_eq!(store.resolve_skill("Next.js").await.unwrap().unwrap().id, "nextjs");
        assert!(store.resolve_skill("cobol").await.unwrap().is_none());
    }
}
