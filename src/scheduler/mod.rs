//! Scheduling decisions and deferred-event persistence.
//!
//! The scheduler answers "when would this event run for this contact" and,
//! for decisions that land in the future or outside an allowed window,
//! persists the deferral: a schedule row plus a delayed queue message that
//! reappears when the execution time arrives.

pub mod window;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use opentelemetry::KeyValue;
use tracing::{debug, warn};

use crate::db::{Db, TableConfig};
use crate::error::{Error, Result};
use crate::model::{CampaignEvent, Contact};
use crate::telemetry::metrics;

/// Queue that deferred kickoff events are delivered on.
pub const DEFERRED_QUEUE: &str = "kickoff_deferred";

/// When `event` would run for a contact in `tz`, relative to `now`.
///
/// The trigger mode gives the base time; an attached timing window pushes it
/// to the window's next opening. `tz` only matters for windows that evaluate
/// in the contact's timezone.
pub fn resolve_execution_time(
    event: &CampaignEvent,
    now: DateTime<Utc>,
    tz: Option<Tz>,
) -> Result<DateTime<Utc>> {
    let base = event.trigger.base_time(now);
    let Some(window) = &event.timing else {
        return Ok(base);
    };

    let tz = if window.use_contact_timezone { tz } else { None };
    window
        .next_open(base, tz)
        .ok_or_else(|| Error::NotSchedulable {
            event_id: event.id.0,
            reason: "timing window never opens".to_string(),
        })
}

/// Per-contact scheduling decisions for campaign events.
///
/// Callers bind the contact under consideration with `set_current_contact`
/// before asking for an execution time; the original host API works this
/// way and the decision depends on the contact's timezone.
pub trait EventScheduler {
    fn set_current_contact(&mut self, contact: &Contact);

    /// When the event would execute for the current contact, given the
    /// run's frozen reference instant.
    fn execution_date_time(
        &self,
        event: &CampaignEvent,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>>;

    /// True when the pair must be deferred instead of executed in this run.
    fn should_schedule(&self, execution_at: DateTime<Utc>, now: DateTime<Utc>) -> bool;

    /// Persist a deferral of `event` at `execution_at` for `contacts`.
    async fn schedule(
        &mut self,
        event: &CampaignEvent,
        execution_at: DateTime<Utc>,
        contacts: &[Contact],
    ) -> Result<()>;
}

/// Postgres-backed scheduler with timing-window support.
pub struct TimingScheduler {
    db: Arc<Db>,
    tables: TableConfig,
    current_contact: Option<Contact>,
}

impl TimingScheduler {
    pub fn new(db: Arc<Db>, tables: TableConfig) -> Self {
        Self {
            db,
            tables,
            current_contact: None,
        }
    }

    fn contact_zone(&self) -> Option<Tz> {
        let contact = self.current_contact.as_ref()?;
        let name = contact.timezone.as_deref()?;
        match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                warn!(contact_id = %contact.id, timezone = name, "unparseable contact timezone, falling back to UTC");
                None
            }
        }
    }
}

impl EventScheduler for TimingScheduler {
    fn set_current_contact(&mut self, contact: &Contact) {
        self.current_contact = Some(contact.clone());
    }

    fn execution_date_time(
        &self,
        event: &CampaignEvent,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        resolve_execution_time(event, now, self.contact_zone())
    }

    fn should_schedule(&self, execution_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        execution_at > now
    }

    async fn schedule(
        &mut self,
        event: &CampaignEvent,
        execution_at: DateTime<Utc>,
        contacts: &[Contact],
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {schedule} (event_id, contact_id, scheduled_at, created_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (event_id, contact_id) DO NOTHING",
            schedule = self.tables.kickoff_schedule(),
        );

        for contact in contacts {
            let inserted = sqlx::query(&sql)
                .bind(event.id.0)
                .bind(contact.id.0)
                .bind(execution_at)
                .execute(self.db.pool())
                .await?
                .rows_affected();

            if inserted == 0 {
                return Err(Error::AlreadyScheduled {
                    event_id: event.id.0,
                    contact_id: contact.id.0,
                });
            }

            let delay = (execution_at - Utc::now()).num_seconds().max(0);
            let payload = serde_json::json!({
                "event_id": event.id,
                "contact_id": contact.id,
                "execute_at": execution_at,
            });
            self.db
                .send_to_queue(DEFERRED_QUEUE, &payload, delay.min(i32::MAX as i64) as i32)
                .await?;

            debug!(
                event_id = %event.id,
                contact_id = %contact.id,
                execute_at = %execution_at,
                "kickoff event deferred"
            );
        }

        metrics::events_scheduled().add(
            contacts.len() as u64,
            &[KeyValue::new("action", event.action_type.clone())],
        );

        Ok(())
    }
}
