//! Eligible-contact retrieval for kickoff runs.
//!
//! The finder answers two questions: how many contacts are still waiting to
//! enter the campaign, and what is the next ascending-id page of them. A
//! contact is eligible while it is an active campaign member with no event
//! log entry for any of the campaign's kickoff events.

use std::collections::HashMap;
use std::sync::Arc;

use opentelemetry::KeyValue;
use tracing::debug;

use crate::db::{Db, TableConfig};
use crate::error::Result;
use crate::executioner::ContactLimiter;
use crate::model::{CampaignId, Contact, ContactBatch, ContactId, EventId};
use crate::telemetry::metrics;

/// Source of eligible contacts, consumed one page at a time.
pub trait ContactSource {
    /// Estimate of eligible contacts for the given kickoff events, within
    /// the limiter's bounds.
    async fn contact_count(
        &self,
        campaign_id: CampaignId,
        root_events: &[EventId],
        limiter: &ContactLimiter,
    ) -> Result<u64>;

    /// The next page of eligible contacts, ordered by ascending id.
    async fn contacts(
        &mut self,
        campaign_id: CampaignId,
        limiter: &ContactLimiter,
    ) -> Result<ContactBatch>;

    /// Drop any state cached for the current page.
    fn clear(&mut self);
}

/// Postgres-backed contact finder.
pub struct KickoffContactFinder {
    db: Arc<Db>,
    tables: TableConfig,
    cache: HashMap<ContactId, Contact>,
}

impl KickoffContactFinder {
    pub fn new(db: Arc<Db>, tables: TableConfig) -> Self {
        Self {
            db,
            tables,
            cache: HashMap::new(),
        }
    }

    /// Contact from the current page's cache, if still held.
    pub fn cached(&self, id: ContactId) -> Option<&Contact> {
        self.cache.get(&id)
    }
}

impl ContactSource for KickoffContactFinder {
    async fn contact_count(
        &self,
        campaign_id: CampaignId,
        root_events: &[EventId],
        limiter: &ContactLimiter,
    ) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(c.id)
             FROM {contacts} c
             JOIN {members} m ON m.contact_id = c.id
             WHERE m.campaign_id = $1
               AND m.removed = FALSE
               AND NOT EXISTS (
                   SELECT 1 FROM {log} l
                   WHERE l.contact_id = c.id AND l.event_id = ANY($2)
               )
               AND c.id >= $3
               AND ($4::bigint IS NULL OR c.id = $4)",
            contacts = self.tables.contacts(),
            members = self.tables.campaign_members(),
            log = self.tables.campaign_event_log(),
        );

        let event_ids: Vec<i64> = root_events.iter().map(|e| e.0).collect();
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(campaign_id.0)
            .bind(&event_ids)
            .bind(limiter.batch_min_contact_id().map_or(0, |id| id.0))
            .bind(limiter.contact_id().map(|id| id.0))
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn contacts(
        &mut self,
        campaign_id: CampaignId,
        limiter: &ContactLimiter,
    ) -> Result<ContactBatch> {
        let sql = format!(
            "SELECT c.id, c.email, c.timezone, c.date_added
             FROM {contacts} c
             JOIN {members} m ON m.contact_id = c.id
             WHERE m.campaign_id = $1
               AND m.removed = FALSE
               AND NOT EXISTS (
                   SELECT 1 FROM {log} l
                   JOIN {events} e ON e.id = l.event_id
                   WHERE l.contact_id = c.id
                     AND e.campaign_id = $1
                     AND e.parent_event_id IS NULL
               )
               AND c.id >= $2
               AND ($3::bigint IS NULL OR c.id = $3)
             ORDER BY c.id
             LIMIT $4",
            contacts = self.tables.contacts(),
            members = self.tables.campaign_members(),
            log = self.tables.campaign_event_log(),
            events = self.tables.campaign_events(),
        );

        let rows: Vec<ContactRow> = sqlx::query_as(&sql)
            .bind(campaign_id.0)
            .bind(limiter.batch_min_contact_id().map_or(0, |id| id.0))
            .bind(limiter.contact_id().map(|id| id.0))
            .bind(limiter.batch_limit() as i64)
            .fetch_all(self.db.pool())
            .await?;

        let mut batch = ContactBatch::new();
        for row in rows {
            let contact = row.into_contact();
            self.cache.insert(contact.id, contact.clone());
            batch.insert(contact.id, contact);
        }

        metrics::contacts_fetched().add(
            batch.len() as u64,
            &[KeyValue::new("campaign_id", campaign_id.0)],
        );
        debug!(
            campaign_id = %campaign_id,
            fetched = batch.len(),
            cached = self.cache.len(),
            "fetched kickoff contacts"
        );

        Ok(batch)
    }

    fn clear(&mut self) {
        self.cache.clear();
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i64,
    email: Option<String>,
    timezone: Option<String>,
    date_added: chrono::DateTime<chrono::Utc>,
}

impl ContactRow {
    fn into_contact(self) -> Contact {
        Contact {
            id: ContactId(self.id),
            email: self.email,
            timezone: self.timezone,
            date_added: self.date_added,
        }
    }
}
