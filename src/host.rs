//! Host application integration.
//!
//! Newer host schemas carry a `kickoff_runs` audit table and want a record
//! plus a NOTIFY after every run; older schemas predate run auditing and
//! must be left untouched. The variant is picked once at composition time
//! by probing the schema, never inside the engine.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{Db, TableConfig};
use crate::error::Result;
use crate::executioner::Counter;
use crate::model::CampaignId;

pub enum HostHooks {
    /// Host with run auditing: record the run, notify listeners.
    Modern { db: Arc<Db>, tables: TableConfig },
    /// Host without run auditing: do nothing.
    Legacy,
}

impl HostHooks {
    /// Probe the schema and pick the variant the host supports.
    pub async fn detect(db: &Arc<Db>, tables: &TableConfig) -> Result<Self> {
        let audit_table: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(tables.kickoff_runs())
            .fetch_one(db.pool())
            .await?;

        Ok(match audit_table {
            Some(_) => Self::Modern {
                db: Arc::clone(db),
                tables: tables.clone(),
            },
            None => {
                debug!("host schema has no run auditing, using legacy hooks");
                Self::Legacy
            }
        })
    }

    /// Record a finished run with the host, when it supports that.
    pub async fn kickoff_finished(
        &self,
        campaign_id: CampaignId,
        counter: &Counter,
    ) -> Result<()> {
        let Self::Modern { db, tables } = self else {
            return Ok(());
        };

        let run_id = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO {runs}
                 (run_id, campaign_id, events_total, evaluated, scheduled, executed, finished_at)
             VALUES ($1, $2, $3, $4, $5, $6, now())",
            runs = tables.kickoff_runs(),
        );
        sqlx::query(&sql)
            .bind(run_id)
            .bind(campaign_id.0)
            .bind(counter.events_total() as i64)
            .bind(counter.evaluated() as i64)
            .bind(counter.scheduled() as i64)
            .bind(counter.executed() as i64)
            .execute(db.pool())
            .await?;

        sqlx::query("SELECT pg_notify('kickoff_finished', $1)")
            .bind(campaign_id.0.to_string())
            .execute(db.pool())
            .await?;

        info!(campaign_id = %campaign_id, run_id = %run_id, "kickoff run recorded");
        Ok(())
    }
}
