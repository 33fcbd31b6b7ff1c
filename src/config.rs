//! Environment-driven configuration.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::analytics::DEFAULT_LOOKBACK_DAYS;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub model_dir: PathBuf,
    pub jwt_secret: String,
    pub default_lookback_days: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {}", raw))?,
            None => 5,
        };

        let default_lookback_days = match lookup("DEFAULT_LOOKBACK_DAYS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DEFAULT_LOOKBACK_DAYS is not a number: {}", raw))?,
            None => DEFAULT_LOOKBACK_DAYS,
        };

        let jwt_secret = lookup("JWT_SECRET")
            .or_else(|| lookup("SUPABASE_JWT_SECRET"))
            .unwrap_or_else(|| "demo-secret".to_string());

        Ok(Self {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            model_dir: lookup("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            jwt_secret,
            default_lookback_days,
        })
    }
}
