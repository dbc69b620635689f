//! Database connection pool, migrations, and health check.
//!
//! One shared Postgres pool serves the campaign reads, the contact finder,
//! the scheduler, and the executor.

pub mod campaign;
pub mod queue;

use crate::error::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Database handle. Owns the connection pool shared across all modules.
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::Error::Other(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Simple health check, a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool. Collaborators issue their own
    /// queries through it; hosts may use it for seeding.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Names of the host tables this crate reads and writes.
///
/// Hosts that embed the engine into an existing schema set a prefix; the
/// standalone migrations create the unprefixed variants. Passed explicitly
/// to every collaborator that touches the schema.
#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    prefix: String,
}

impl TableConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn campaigns(&self) -> String {
        self.qualified("campaigns")
    }

    pub fn campaign_events(&self) -> String {
        self.qualified("campaign_events")
    }

    pub fn campaign_members(&self) -> String {
        self.qualified("campaign_members")
    }

    pub fn campaign_event_log(&self) -> String {
        self.qualified("campaign_event_log")
    }

    pub fn contacts(&self) -> String {
        self.qualified("contacts")
    }

    pub fn kickoff_schedule(&self) -> String {
        self.qualified("kickoff_schedule")
    }

    pub fn kickoff_runs(&self) -> String {
        self.qualified("kickoff_runs")
    }
}
