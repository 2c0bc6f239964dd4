use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};
use velocity_core::store::{MemoryStore, PgStore, Stores};
use velocity_core::{FallbackAdvisor, SkillAdvisor, VelocityConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "velocity.toml")]
    config: String,

    /// Serve the built-in demo data set instead of Postgres.
    #[arg(long)]
    demo: bool,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match VelocityConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging
    let default_directive = config
        .service
        .log_level
        .parse::<Directive>()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive))
        .init();

    let stores = if args.demo {
        tracing::info!("Serving in-memory demo data");
        Stores::shared(Arc::new(MemoryStore::demo(Utc::now())))
    } else if config.database.is_configured() {
        match velocity_core::db::create_pool(&config.database).await {
            Ok(pool) => Stores::shared(Arc::new(PgStore::new(pool))),
            Err(e) => {
                eprintln!("Failed to connect to database: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        tracing::warn!("No database url configured; data endpoints will answer 'not configured'");
        Stores::unconfigured()
    };

    let advisor = FallbackAdvisor::from_config(&config.graph_rag);
    if !config.graph_rag.is_configured() {
        tracing::info!("No OpenAI API key configured; skill advisor answers offline");
    }
    tracing::info!(backend = advisor.name(), "Skill advisor ready");
    let stores = stores.with_advisor(Arc::new(advisor));

    if args.health {
        let (status, body) = velocity_server::http::health_inner(&stores).await;
        match body["status"].as_str() {
            Some("healthy") => println!("✅ Store connected: {}", body["database"]),
            Some("not_configured") => println!("⚠️  No store configured"),
            _ => {
                println!("❌ Store health check failed ({}): {}", status, body["error"]);
                std::process::exit(1);
            }
        }
        println!("✅ Velocity health check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(());
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    velocity_server::http::start_http_server(stores, config, tx.subscribe()).await?;

    tracing::info!("Velocity server stopped");
    Ok(())
}
