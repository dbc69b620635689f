//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The database DSN is wrapped in secrecy::SecretString to prevent log leaks.

use crate::error::{Error, Result};
use secrecy::SecretString;

/// Default page size for contact batches.
pub const DEFAULT_BATCH_LIMIT: usize = 100;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,

    /// Contact page size used when the caller does not pass one.
    pub batch_limit: usize,

    /// Prefix for the host tables, empty for a standalone schema.
    pub table_prefix: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        let batch_limit = match std::env::var("KICKOFF_BATCH_LIMIT") {
            Ok(raw) => raw.parse::<usize>().map_err(|_| {
                Error::Config(format!("KICKOFF_BATCH_LIMIT is not a valid size: {raw:?}"))
            })?,
            Err(_) => DEFAULT_BATCH_LIMIT,
        };

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            batch_limit,
            table_prefix: std::env::var("KICKOFF_TABLE_PREFIX").unwrap_or_default(),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}
