//! Immediate execution of kickoff events.
//!
//! Takes the events that survived a batch's scheduling pass together with
//! the whole batch of contacts, records an event-log row per pair, and
//! hands each pair to its action handler's queue.

use std::sync::Arc;

use opentelemetry::KeyValue;
use tracing::info;

use crate::actions::ActionRegistry;
use crate::db::{Db, TableConfig};
use crate::error::{Error, Result};
use crate::executioner::Counter;
use crate::model::{CampaignEvent, ContactBatch};
use crate::telemetry::metrics;

/// Executes a set of events against a set of contacts, synchronously from
/// the caller's point of view, and tallies the executed pairs.
pub trait EventExecutor {
    async fn execute_events_for_contacts(
        &self,
        events: &[CampaignEvent],
        contacts: &ContactBatch,
        counter: &mut Counter,
    ) -> Result<()>;
}

/// Postgres-backed executor dispatching through the action registry.
pub struct ActionExecutor {
    db: Arc<Db>,
    tables: TableConfig,
    registry: Arc<ActionRegistry>,
}

impl ActionExecutor {
    pub fn new(db: Arc<Db>, tables: TableConfig, registry: Arc<ActionRegistry>) -> Self {
        Self {
            db,
            tables,
            registry,
        }
    }
}

impl EventExecutor for ActionExecutor {
    async fn execute_events_for_contacts(
        &self,
        events: &[CampaignEvent],
        contacts: &ContactBatch,
        counter: &mut Counter,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {log} (event_id, contact_id, triggered_at, is_scheduled)
             VALUES ($1, $2, now(), FALSE)",
            log = self.tables.campaign_event_log(),
        );

        for event in events {
            let action = self
                .registry
                .get(&event.action_type)
                .ok_or_else(|| Error::UnknownAction(event.action_type.clone()))?;

            for contact in contacts.values() {
                sqlx::query(&sql)
                    .bind(event.id.0)
                    .bind(contact.id.0)
                    .execute(self.db.pool())
                    .await?;

                let payload = serde_json::json!({
                    "event_id": event.id,
                    "contact_id": contact.id,
                    "action": event.action_type,
                    "params": event.params,
                });
                self.db.send_to_queue(&action.queue, &payload, 0).await?;
            }

            metrics::events_executed().add(
                contacts.len() as u64,
                &[KeyValue::new("action", event.action_type.clone())],
            );
            info!(
                event_id = %event.id,
                action = %event.action_type,
                contacts = contacts.len(),
                "kickoff event dispatched"
            );
        }

        counter.advance_executed((events.len() * contacts.len()) as u64);
        Ok(())
    }
}
