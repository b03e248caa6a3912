//! LeadHub Worker - Backend service for CRM lead imports
//!
//! This worker connects to NATS and handles messages from the frontend.

mod auth;
mod cli;
mod config;
mod db;
mod error;
mod handlers;
mod services;
mod tenancy;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::handlers::AppState;
use crate::services::status_cache::StatusNameCache;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first so LOGS_DIR from .env applies
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "worker.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,leadhub_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(&config).await,
        Command::Import { file, token } => import(&config, &file, &token).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting LeadHub Worker...");

    let store = db::create_store(&config).await?;

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (&config.nats_user, &config.nats_password) {
        (Some(user), Some(password)) => {
            async_nats::ConnectOptions::new()
                .user_and_password(user.clone(), password.clone())
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    let state = AppState {
        store,
        status_cache: Arc::new(StatusNameCache::new(config.status_cache_ttl)),
        jwt_secret: Arc::new(config.jwt_secret.clone()),
    };

    if let Err(e) = handlers::start_handlers(nats_client, state).await {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn migrate(config: &Config) -> Result<()> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to run migrations")?;
    let pool = db::create_pool(database_url).await?;
    db::run_migrations(&pool).await
}

async fn import(config: &Config, file: &Path, token: &str) -> Result<()> {
    let session = auth::session_from_token(token, &config.jwt_secret)?;
    let ctx = tenancy::resolve_tenant_context(&session)?;

    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("Import path has no file name")?;
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let store = db::create_store(config).await?;
    let outcome = services::import_pipeline::import_file(store.as_ref(), &ctx, file_name, &bytes).await?;

    info!(
        "Imported {}: {} inserted, {} updated, {} failed, {} rows skipped",
        file_name, outcome.report.inserted, outcome.report.updated, outcome.report.failed, outcome.skipped_rows
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
