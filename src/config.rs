//! Configuration management

use std::time::Duration;

use anyhow::{self, Context, Result};

/// Persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// Optional NATS credentials
    pub nats_user: Option<String>,
    pub nats_password: Option<String>,

    /// PostgreSQL connection string (required for the postgres backend)
    pub database_url: Option<String>,

    pub store_backend: StoreBackend,

    /// Secret used to validate session tokens
    pub jwt_secret: String,

    /// Lifetime of cached status names
    pub status_cache_ttl: Duration,

    pub logs_dir: String,
}

const DEFAULT_STATUS_CACHE_TTL_SECS: u64 = 300;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nats_url = var("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string());
        let nats_user = var("NATS_USER").filter(|u| !u.is_empty());
        let nats_password = var("NATS_PASSWORD");

        let store_backend = match var("STORE_BACKEND") {
            Some(s) => StoreBackend::parse(&s)?,
            None => StoreBackend::Postgres,
        };

        let database_url = var("DATABASE_URL").filter(|u| !u.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND is postgres");
        }

        let jwt_secret = var("JWT_SECRET")
            .context("JWT_SECRET must be set — generate one with: openssl rand -base64 48")?;

        if jwt_secret.len() < 32 {
            anyhow::bail!(
                "JWT_SECRET must be at least 32 bytes (current: {} bytes). Generate one with: openssl rand -base64 48",
                jwt_secret.len()
            );
        }

        const KNOWN_DEV_SECRETS: &[&str] = &[
            "dev-secret-change-in-production-min-32-bytes!!",
        ];
        if KNOWN_DEV_SECRETS.contains(&jwt_secret.as_str()) {
            tracing::warn!("⚠ JWT_SECRET matches a known default — change it for production!");
        }

        let status_cache_ttl_secs = match var("STATUS_CACHE_TTL_SECS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .with_context(|| format!("STATUS_CACHE_TTL_SECS must be a number of seconds, got '{}'", s))?,
            None => DEFAULT_STATUS_CACHE_TTL_SECS,
        };

        let logs_dir = var("LOGS_DIR").unwrap_or_else(|| "../logs".to_string());

        Ok(Self {
            nats_url,
            nats_user,
            nats_password,
            database_url,
            store_backend,
            jwt_secret,
            status_cache_ttl: Duration::from_secs(status_cache_ttl_secs),
            logs_dir,
        })
    }
}
