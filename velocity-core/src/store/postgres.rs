//! Postgres-backed graph and activity stores (schema: `sql/schema.sql`).
//!
//! Every query takes a connection from the pool for its own duration only;
//! the pool is constructed once and passed in, never held globally. Multi-row
//! writes run inside one transaction; dropping it on an early return rolls
//! everything back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{ActivityStore, GraphStore};
use crate::error::VelocityError;
use crate::models::skill::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::models::{LearnedSkill, LviSnapshot, Session, Skill, SkillApplication, SkillEdge};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row shapes (mapped to typed records before leaving this module)
// ============================================================================

#[derive(sqlx::FromRow)]
struct SkillRow {
    id: String,
    name: String,
    category: String,
    description: String,
    difficulty_level: i32,
    learning_time_hours: i32,
}

impl TryFrom<SkillRow> for Skill {
    type Error = VelocityError;

    fn try_from(row: SkillRow) -> Result<Self, Self::Error> {
        Ok(Skill {
            category: row.category.parse()?,
            learning_time_hours: non_negative(row.learning_time_hours, "learning time")?,
            difficulty_level: row
                .difficulty_level
                .clamp(i32::from(DEFAULT_DIFFICULTY), i32::from(MAX_DIFFICULTY)) as u8,
            id: row.id,
            name: row.name,
            description: row.description,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LearnedRow {
    skill_id: String,
    name: String,
    confidence: i32,
}

impl From<LearnedRow> for LearnedSkill {
    fn from(row: LearnedRow) -> Self {
        LearnedSkill {
            skill_id: row.skill_id,
            name: row.name,
            confidence: row.confidence.clamp(0, 100),
        }
    }
}

#[derive(sqlx::FromRow)]
struct EdgeRow {
    source_id: String,
    target_id: String,
    edge_type: String,
}

impl TryFrom<EdgeRow> for SkillEdge {
    type Error = VelocityError;

    fn try_from(row: EdgeRow) -> Result<Self, Self::Error> {
        Ok(SkillEdge {
            kind: row.edge_type.parse()?,
            from: row.source_id,
            to: row.target_id,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration: i32,
    skills_practiced: Vec<String>,
    concepts_learned: Vec<String>,
    completion_rate: f64,
}

impl TryFrom<SessionRow> for Session {
    type Error = VelocityError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            duration: non_negative(row.duration, "session duration")?,
            user_id: row.user_id,
            start_time: row.start_time,
            end_time: row.end_time,
            skills_practiced: row.skills_practiced,
            concepts_learned: row.concepts_learned,
            completion_rate: row.completion_rate,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    user_id: String,
    skill_id: String,
    applied_at: DateTime<Utc>,
    project_id: String,
    success_rate: f64,
    time_spent: i32,
    complexity: String,
}

impl TryFrom<ApplicationRow> for SkillApplication {
    type Error = VelocityError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(SkillApplication {
            time_spent: non_negative(row.time_spent, "application time spent")?,
            complexity: row.complexity.parse()?,
            user_id: row.user_id,
            skill_id: row.skill_id,
            applied_at: row.applied_at,
            project_id: row.project_id,
            success_rate: row.success_rate,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    week_number: i32,
    year: i32,
    score: i32,
    concepts_mastered: i32,
    application_rate: f64,
    avg_time_to_mastery: f64,
    scaling_factor: i32,
    created_at: DateTime<Utc>,
}

impl From<SnapshotRow> for LviSnapshot {
    fn from(row: SnapshotRow) -> Self {
        LviSnapshot {
            id: row.id.to_string(),
            week_number: row.week_number,
            year: row.year,
            score: row.score.clamp(0, 100),
            concepts_mastered: row.concepts_mastered,
            application_rate: row.application_rate,
            avg_time_to_mastery: row.avg_time_to_mastery,
            scaling_factor: row.scaling_factor,
            created_at: row.created_at,
        }
    }
}

fn non_negative(value: i32, what: &str) -> Result<u32, VelocityError> {
    u32::try_from(value).map_err(|_| VelocityError::InvalidRecord(format!("negative {}: {}", what, value)))
}

/// A unique violation on `skills` means the id or the name is taken.
fn skill_conflict(err: sqlx::Error, skill: &Skill) -> VelocityError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            VelocityError::Conflict(format!("Skill '{}'", skill.name))
        }
        _ => VelocityError::Database(err),
    }
}

const SKILL_COLUMNS: &str = "id, name, category, description, difficulty_level, learning_time_hours";

async fn insert_skill_row(tx: &mut Transaction<'_, Postgres>, skill: &Skill) -> Result<u64, VelocityError> {
    let result = sqlx::query(
        r#"
        INSERT INTO skills (id, name, category, description, difficulty_level, learning_time_hours)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&skill.id)
    .bind(&skill.name)
    .bind(skill.category.as_str())
    .bind(&skill.description)
    .bind(i32::from(skill.difficulty_level))
    .bind(i32::try_from(skill.learning_time_hours).unwrap_or(i32::MAX))
    .execute(&mut **tx)
    .await
    .map_err(|e| skill_conflict(e, skill))?;
    Ok(result.rows_affected())
}

async fn insert_edge_row(tx: &mut Transaction<'_, Postgres>, edge: &SkillEdge) -> Result<(), VelocityError> {
    let result = sqlx::query(
        r#"
        INSERT INTO skill_edges (source_id, target_id, edge_type)
        SELECT $1, $2, $3
        WHERE EXISTS (SELECT 1 FROM skills WHERE id = $1)
          AND EXISTS (SELECT 1 FROM skills WHERE id = $2)
        "#,
    )
    .bind(&edge.from)
    .bind(&edge.to)
    .bind(edge.kind.as_str())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(VelocityError::NotFound(format!(
            "Skill '{}' or '{}'",
            edge.from, edge.to
        )));
    }
    Ok(())
}

async fn insert_learned_row(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    skill_id: &str,
    confidence: i32,
) -> Result<(), VelocityError> {
    let result = sqlx::query(
        r#"
        INSERT INTO learned_skills (user_id, skill_id, confidence)
        SELECT $1, id, $3 FROM skills WHERE id = $2
        ON CONFLICT (user_id, skill_id) DO UPDATE SET confidence = EXCLUDED.confidence
        "#,
    )
    .bind(user_id)
    .bind(skill_id)
    .bind(confidence)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(VelocityError::NotFound(format!("Skill '{}'", skill_id)));
    }
    Ok(())
}

fn collect_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, VelocityError>
where
    T: TryFrom<R, Error = VelocityError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ============================================================================
// Graph store
// ============================================================================

#[async_trait]
impl GraphStore for PgStore {
    async fn skills(&self) -> Result<Vec<Skill>, VelocityError> {
        let rows = sqlx::query_as::<_, SkillRow>(&format!("SELECT {} FROM skills ORDER BY id", SKILL_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        collect_rows(rows)
    }

    async fn learned(&self, user_id: &str) -> Result<Vec<LearnedSkill>, VelocityError> {
        let rows = sqlx::query_as::<_, LearnedRow>(
            r#"
            SELECT l.skill_id, s.name, l.confidence
            FROM learned_skills l
            JOIN skills s ON s.id = l.skill_id
            WHERE l.user_id = $1
            ORDER BY l.confidence DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LearnedSkill::from).collect())
    }

    async fn edges(&self) -> Result<Vec<SkillEdge>, VelocityError> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT source_id, target_id, edge_type
            FROM skill_edges
            WHERE edge_type IN ('PREREQUISITE_OF', 'RELATES_TO')
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        collect_rows(rows)
    }

    async fn resolve_skill(&self, id_or_name: &str) -> Result<Option<Skill>, VelocityError> {
        let sql = format!(
            "SELECT {} FROM skills WHERE id = $1 OR name = $1 ORDER BY (id = $1) DESC LIMIT 1",
            SKILL_COLUMNS
        );
        let row = sqlx::query_as::<_, SkillRow>(&sql)
        .bind(id_or_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Skill::try_from).transpose()
    }

    async fn create_skill(
        &self,
        skill: &Skill,
        edges: &[SkillEdge],
        learned: Option<(&str, i32)>,
    ) -> Result<(), VelocityError> {
        let mut tx = self.pool.begin().await?;

        if insert_skill_row(&mut tx, skill).await? == 0 {
            return Err(VelocityError::Conflict(format!("Skill '{}'", skill.name)));
        }
        for edge in edges {
            insert_edge_row(&mut tx, edge).await?;
        }
        if let Some((user_id, confidence)) = learned {
            insert_learned_row(&mut tx, user_id, &skill.id, confidence).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn replace_graph(
        &self,
        skills: &[Skill],
        edges: &[SkillEdge],
        user_id: &str,
        learned: &[LearnedSkill],
    ) -> Result<(), VelocityError> {
        let mut tx = self.pool.begin().await?;

        // learned_skills and skill_edges cascade
        sqlx::query("DELETE FROM skills").execute(&mut *tx).await?;

        for skill in skills {
            if insert_skill_row(&mut tx, skill).await? == 0 {
                return Err(VelocityError::Conflict(format!("Skill '{}'", skill.name)));
            }
        }
        for edge in edges {
            insert_edge_row(&mut tx, edge).await?;
        }
        for entry in learned {
            insert_learned_row(&mut tx, user_id, &entry.skill_id, entry.confidence).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_learned(&self, user_id: &str, skill_id: &str, confidence: i32) -> Result<(), VelocityError> {
        let result = sqlx::query(
            r#"
            INSERT INTO learned_skills (user_id, skill_id, confidence)
            SELECT $1, id, $3 FROM skills WHERE id = $2
            ON CONFLICT (user_id, skill_id) DO UPDATE SET confidence = EXCLUDED.confidence
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(confidence)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(VelocityError::NotFound(format!("Skill '{}'", skill_id)));
        }
        Ok(())
    }

    async fn remove_learned(&self, user_id: &str, skill_id: &str) -> Result<bool, VelocityError> {
        let result = sqlx::query("DELETE FROM learned_skills WHERE user_id = $1 AND skill_id = $2")
            .bind(user_id)
            .bind(skill_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_skill(&self, skill_id: &str) -> Result<bool, VelocityError> {
        // learned_skills and skill_edges cascade
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(skill_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn graph_health(&self) -> Result<String, VelocityError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }
}

// ============================================================================
// Activity store
// ============================================================================

#[async_trait]
impl ActivityStore for PgStore {
    async fn sessions_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, VelocityError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT user_id, start_time, end_time, duration,
                   skills_practiced, concepts_learned, completion_rate
            FROM learning_sessions
            WHERE user_id = $1
              AND start_time >= $2
              AND start_time <= $3
            ORDER BY start_time
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        collect_rows(rows)
    }

    async fn applications_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SkillApplication>, VelocityError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT user_id, skill_id, applied_at, project_id,
                   success_rate, time_spent, complexity
            FROM skill_applications
            WHERE user_id = $1
              AND applied_at >= $2
              AND applied_at <= $3
            ORDER BY applied_at
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        collect_rows(rows)
    }

    async fn recent_snapshots(&self, user_id: &str, limit: usize) -> Result<Vec<LviSnapshot>, VelocityError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, week_number, year, score, concepts_mastered,
                   application_rate, avg_time_to_mastery, scaling_factor, created_at
            FROM lvi_snapshots
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LviSnapshot::from).collect())
    }

    async fn activity_health(&self) -> Result<String, VelocityError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }
}

// ============================================================================
// TESTS (live database; skipped when unreachable)
// ============================================================================
