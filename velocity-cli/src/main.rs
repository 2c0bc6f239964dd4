//! velocity-cli — terminal view of the learning velocity dashboard
//!
//! Reads the same endpoints the dashboard widgets use and prints them either
//! human readable or as the raw `data` JSON.
//!
//! # Subcommands
//! - `lvi [--json]`    — this week's Learning Velocity Index
//! - `trend [--json]`  — weekly snapshot history and trend
//! - `graph [--json]`  — knowledge graph summary and suggested next skills
//! - `radar [--json]`  — most confident skills
//! - `path <target> [--user U] [--json]` — learning path to a skill
//! - `add-skill <name> [--category C] [--learned] [--confidence N]
//!   [--prerequisite P]... [--related R]...` — create a skill
//! - `learn <skill_id> [--confidence N]` / `unlearn <skill_id>`
//! - `delete-skill <skill_id>`
//! - `status`          — show server health

use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "velocity-cli", version, about = "Learning velocity dashboard in the terminal")]
struct Cli {
    /// Velocity HTTP server URL (overrides VELOCITY_HTTP_URL env var)
    #[arg(long, env = "VELOCITY_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// This week's Learning Velocity Index
    Lvi {
        #[arg(long)]
        json: bool,
    },

    /// Weekly LVI history with trend classification
    Trend {
        #[arg(long)]
        json: bool,
    },

    /// Knowledge graph summary and suggested next skills
    Graph {
        #[arg(long)]
        json: bool,
    },

    /// Skill confidence radar
    Radar {
        #[arg(long)]
        json: bool,
    },

    /// Learning path from what the user knows to a target skill
    Path {
        /// Target skill id or name
        target: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Add a skill to the knowledge graph
    AddSkill(AddSkillArgs),

    /// Mark a skill as learned
    Learn {
        skill_id: String,
        #[arg(long)]
        confidence: Option<i32>,
        #[arg(long)]
        user: Option<String>,
    },

    /// Mark a skill as not learned
    Unlearn {
        skill_id: String,
        #[arg(long)]
        user: Option<String>,
    },

    /// Delete a skill and every relationship touching it
    DeleteSkill { skill_id: String },

    /// Show Velocity server status
    Status,
}

#[derive(Debug, Args)]
pub struct AddSkillArgs {
    /// Display name; the id is derived from it
    pub name: String,
    /// frontend, backend, database, devops, ai-ml, mobile or security
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub learned: bool,
    #[arg(long)]
    pub confidence: Option<i32>,
    /// Existing skill to learn first (repeatable)
    #[arg(long = "prerequisite")]
    pub prerequisites: Vec<String>,
    /// Existing related skill (repeatable)
    #[arg(long = "related")]
    pub related: Vec<String>,
    #[arg(long)]
    pub user: Option<String>,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LviCard {
    pub score: i64,
    pub concepts_mastered: u64,
    pub application_rate: f64,
    pub avg_time_to_mastery: f64,
    pub scaling_factor: u64,
    pub week_start: String,
    pub week_end: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub week_number: i64,
    pub year: i64,
    pub score: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendView {
    pub snapshots: Vec<Snapshot>,
    pub trend: String,
    pub percent_change: f64,
}

#[derive(Debug, Deserialize)]
pub struct GraphNode {
    pub category: String,
    pub learned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub name: String,
    pub category: String,
    pub prerequisites: Vec<String>,
    pub readiness_score: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<serde_json::Value>,
    pub suggested_next_skills: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarPoint {
    pub skill: String,
    pub confidence: i64,
    pub full_mark: i64,
}

#[derive(Debug, Deserialize)]
pub struct Relationships {
    pub relates_to: u64,
    pub prerequisites: u64,
}

#[derive(Debug, Deserialize)]
pub struct AddedSkill {
    pub skill_id: String,
    pub skill_name: String,
    pub learned: bool,
    pub relationships_created: Relationships,
}

/// Outcome of update-skill-status and delete-skill.
#[derive(Debug, Deserialize)]
pub struct SkillMessage {
    pub skill_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PathView {
    pub name: String,
    pub skills: Vec<String>,
    pub estimated_duration_hours: u64,
    pub difficulty_progression: Vec<u8>,
}

// ============================================================================
// Request bodies
// ============================================================================

pub fn add_skill_body(args: &AddSkillArgs) -> serde_json::Value {
    serde_json::json!({
        "skill_name": args.name,
        "category": args.category,
        "learned": args.learned,
        "confidence": args.confidence,
        "prerequisites": args.prerequisites,
        "related": args.related,
        "user_id": args.user,
    })
}

pub fn skill_status_body(
    skill_id: &str,
    learned: bool,
    confidence: Option<i32>,
    user: Option<&str>,
) -> serde_json::Value {
    serde_json::json!({
        "skill_id": skill_id,
        "learned": learned,
        "confidence": confidence,
        "user_id": user,
    })
}

pub fn path_body(target: &str, user: Option<&str>) -> serde_json::Value {
    serde_json::json!({ "target_skill_id": target, "user_id": user })
}

// ============================================================================
// Formatting
// ============================================================================

/// Horizontal bar of `width` cells filled in proportion to `value / max`.
pub fn bar(value: i64, max: i64, width: usize) -> String {
    let filled = if max <= 0 {
        0
    } else {
        ((value.clamp(0, max) as f64 / max as f64) * width as f64).round() as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn format_lvi(card: &LviCard) -> String {
    format!(
        "Learning Velocity Index  {} – {}\n\
         Score:              {:>3} {}\n\
         Concepts mastered:  {}\n\
         Application rate:   {:.1}%\n\
         Time to mastery:    {:.1} days\n\
         Scaling factor:     {}",
        card.week_start,
        card.week_end,
        card.score,
        bar(card.score, 100, 20),
        card.concepts_mastered,
        card.application_rate * 100.0,
        card.avg_time_to_mastery,
        card.scaling_factor,
    )
}

pub fn format_trend(view: &TrendView) -> String {
    let arrow = match view.trend.as_str() {
        "accelerating" => "↑",
        "decelerating" => "↓",
        _ => "→",
    };
    let mut out = format!("Trend: {} {} ({:+.1}%)\n", view.trend, arrow, view.percent_change);
    if view.snapshots.is_empty() {
        out.push_str("No snapshots recorded yet");
        return out;
    }
    for s in &view.snapshots {
        out.push_str(&format!(
            "{}-W{:02}  {:>3} {}\n",
            s.year,
            s.week_number,
            s.score,
            bar(s.score, 100, 30)
        ));
    }
    out.trim_end().to_string()
}

pub fn format_graph(view: &GraphView) -> String {
    let learned = view.nodes.iter().filter(|n| n.learned).count();
    let mut out = format!(
        "Skills: {} ({} learned)  Links: {}\n",
        view.nodes.len(),
        learned,
        view.links.len()
    );

    let mut categories: Vec<&str> = view.nodes.iter().map(|n| n.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();
    for category in categories {
        let total = view.nodes.iter().filter(|n| n.category == category).count();
        let done = view
            .nodes
            .iter()
            .filter(|n| n.category == category && n.learned)
            .count();
        out.push_str(&format!("  {:<10} {}/{}\n", category, done, total));
    }

    if view.suggested_next_skills.is_empty() {
        out.push_str("\nNo suggestions: every reachable skill is learned");
        return out;
    }

    out.push_str("\nSuggested next skills:\n");
    for s in &view.suggested_next_skills {
        let prereqs = if s.prerequisites.is_empty() {
            "none".to_string()
        } else {
            s.prerequisites.join(", ")
        };
        out.push_str(&format!(
            "  {:>3}%  {} [{}]  needs: {}\n",
            s.readiness_score, s.name, s.category, prereqs
        ));
    }
    out.trim_end().to_string()
}

pub fn format_radar(points: &[RadarPoint]) -> String {
    if points.is_empty() {
        return "No learned skills yet".to_string();
    }
    let width = points.iter().map(|p| p.skill.chars().count()).max().unwrap_or(0);
    points
        .iter()
        .map(|p| {
            format!(
                "{:<width$}  {:>3} {}",
                p.skill,
                p.confidence,
                bar(p.confidence, p.full_mark, 20),
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_added(added: &AddedSkill) -> String {
    let mut out = format!(
        "Added {} ({}): {} prerequisite(s), {} related",
        added.skill_name,
        added.skill_id,
        added.relationships_created.prerequisites,
        added.relationships_created.relates_to
    );
    if added.learned {
        out.push_str(", marked learned");
    }
    out
}

pub fn format_skill_message(outcome: &SkillMessage) -> String {
    format!("{}: {}", outcome.skill_id, outcome.message)
}

pub fn format_path(view: &PathView) -> String {
    let mut out = format!("{}  ({} hours)\n", view.name, view.estimated_duration_hours);
    for (i, skill) in view.skills.iter().enumerate() {
        let level = view.difficulty_progression.get(i).copied().unwrap_or(0);
        out.push_str(&format!("  {:>2}. {:<20} {}\n", i + 1, skill, "★".repeat(usize::from(level))));
    }
    out.trim_end().to_string()
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Call an `/api/*` endpoint and unwrap the `ApiResponse` envelope.
fn request_data(
    server: &str,
    method: Method,
    path: &str,
    body: Option<&serde_json::Value>,
) -> anyhow::Result<serde_json::Value> {
    let url = format!("{}{}", server, path);
    let mut request = client(30)?.request(method, &url);
    if let Some(body) = body {
        request = request.json(body);
    }
    let resp = request
        .send()
        .map_err(|e| anyhow::anyhow!("connection failed to {}: {}", url, e))?;

    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    let envelope: Envelope = match serde_json::from_str(&text) {
        Ok(env) => env,
        Err(_) if !status.is_success() => anyhow::bail!("server returned {}: {}", status, text),
        Err(e) => anyhow::bail!("failed to parse response from {}: {}", url, e),
    };

    unwrap_envelope(envelope, status.is_success())
}

fn fetch_data(server: &str, path: &str) -> anyhow::Result<serde_json::Value> {
    request_data(server, Method::GET, path, None)
}

pub fn unwrap_envelope(envelope: Envelope, http_ok: bool) -> anyhow::Result<serde_json::Value> {
    if !http_ok || !envelope.success {
        let msg = envelope.error.unwrap_or_else(|| "unknown error".to_string());
        anyhow::bail!("{}", msg);
    }
    Ok(envelope.data.unwrap_or(serde_json::Value::Null))
}

fn show<T, F>(server: &str, path: &str, json_output: bool, format: F) -> anyhow::Result<()>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce(&T) -> String,
{
    let data = fetch_data(server, path)?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }
    let view: T = serde_json::from_value(data)?;
    println!("{}", format(&view));
    Ok(())
}

/// Send a write request and print its outcome.
fn submit<T, F>(
    server: &str,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
    format: F,
) -> anyhow::Result<()>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce(&T) -> String,
{
    let data = request_data(server, method, path, body.as_ref())?;
    let outcome: T = serde_json::from_value(data)?;
    println!("{}", format(&outcome));
    Ok(())
}

fn do_path(server: &str, target: &str, user: Option<&str>, json_output: bool) -> anyhow::Result<()> {
    let data = request_data(
        server,
        Method::POST,
        "/api/graph-rag/generate-learning-path",
        Some(&path_body(target, user)),
    )?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }
    let view: PathView = serde_json::from_value(data)?;
    println!("{}", format_path(&view));
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client(10)?
        .get(&url)
        .send()
        .map_err(|e| anyhow::anyhow!("cannot reach {}: {}", url, e))?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!(
            "server unhealthy (HTTP {}): {}",
            status,
            body["error"].as_str().unwrap_or("unknown error")
        );
    }

    println!("Velocity server: {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version:         {}", body["version"].as_str().unwrap_or("?"));
    println!("Database:        {}", body["database"].as_str().unwrap_or("-"));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Lvi { json } => show(&server, "/api/lvi", json, format_lvi),
        Commands::Trend { json } => show(&server, "/api/lvi-trend", json, format_trend),
        Commands::Graph { json } => show(&server, "/api/knowledge-graph", json, format_graph),
        Commands::Radar { json } => {
            show(&server, "/api/skill-confidence", json, |p: &Vec<RadarPoint>| format_radar(p))
        }
        Commands::Path { target, user, json } => do_path(&server, &target, user.as_deref(), json),
        Commands::AddSkill(args) => submit(
            &server,
            Method::POST,
            "/api/skills/add-skill",
            Some(add_skill_body(&args)),
            format_added,
        ),
        Commands::Learn {
            skill_id,
            confidence,
            user,
        } => submit(
            &server,
            Method::POST,
            "/api/skills/update-skill-status",
            Some(skill_status_body(&skill_id, true, confidence, user.as_deref())),
            format_skill_message,
        ),
        Commands::Unlearn { skill_id, user } => submit(
            &server,
            Method::POST,
            "/api/skills/update-skill-status",
            Some(skill_status_body(&skill_id, false, None, user.as_deref())),
            format_skill_message,
        ),
        Commands::DeleteSkill { skill_id } => submit(
            &server,
            Method::DELETE,
            &format!("/api/skills/delete-skill/{}", skill_id),
            None,
            format_skill_message,
        ),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("velocity-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
