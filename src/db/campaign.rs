//! Campaign and kickoff-event retrieval.

use chrono::{DateTime, Utc};

use crate::db::TableConfig;
use crate::error::{Error, Result};
use crate::model::{
    Campaign, CampaignEvent, CampaignId, EventId, IntervalUnit, TriggerMode,
};
use crate::scheduler::window::TimingWindow;

/// A campaign row with its kickoff-event count, for operator listings.
#[derive(Debug)]
pub struct CampaignSummary {
    pub id: CampaignId,
    pub name: String,
    pub published: bool,
    pub root_event_count: i64,
    pub created_at: DateTime<Utc>,
}

impl super::Db {
    /// Fetch a campaign with its kickoff events in campaign order.
    pub async fn get_campaign(&self, tables: &TableConfig, id: CampaignId) -> Result<Campaign> {
        let sql = format!(
            "SELECT id, name, published, created_at FROM {campaigns} WHERE id = $1",
            campaigns = tables.campaigns(),
        );
        let row: Option<CampaignRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(self.pool())
            .await?;
        let row = row.ok_or_else(|| Error::NotFound(format!("campaign {id}")))?;

        let sql = format!(
            "SELECT id, campaign_id, name, action_type, params, trigger_mode,
                    trigger_interval, trigger_interval_unit, trigger_date, timing, event_order
             FROM {events}
             WHERE campaign_id = $1 AND parent_event_id IS NULL
             ORDER BY event_order, id",
            events = tables.campaign_events(),
        );
        let event_rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_all(self.pool())
            .await?;

        let mut root_events = Vec::with_capacity(event_rows.len());
        for event_row in event_rows {
            root_events.push(event_row.try_into_event()?);
        }

        Ok(Campaign {
            id: CampaignId(row.id),
            name: row.name,
            published: row.published,
            root_events,
            created_at: row.created_at,
        })
    }

    /// List campaigns with their kickoff-event counts, newest first.
    pub async fn list_campaigns(
        &self,
        tables: &TableConfig,
        limit: i64,
    ) -> Result<Vec<CampaignSummary>> {
        let sql = format!(
            "SELECT c.id, c.name, c.published, c.created_at,
                    (SELECT COUNT(*) FROM {events} e
                     WHERE e.campaign_id = c.id AND e.parent_event_id IS NULL) AS root_event_count
             FROM {campaigns} c
             ORDER BY c.created_at DESC
             LIMIT $1",
            campaigns = tables.campaigns(),
            events = tables.campaign_events(),
        );
        let rows: Vec<(i64, String, bool, DateTime<Utc>, i64)> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, name, published, created_at, root_event_count)| CampaignSummary {
                    id: CampaignId(id),
                    name,
                    published,
                    root_event_count,
                    created_at,
                },
            )
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: i64,
    name: String,
    published: bool,
    created_at: DateTime<Utc>,
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    campaign_id: i64,
    name: String,
    action_type: String,
    params: serde_json::Value,
    trigger_mode: String,
    trigger_interval: Option<i64>,
    trigger_interval_unit: Option<String>,
    trigger_date: Option<DateTime<Utc>>,
    timing: Option<serde_json::Value>,
    event_order: i32,
}

impl EventRow {
    fn try_into_event(self) -> Result<CampaignEvent> {
        let trigger = match self.trigger_mode.as_str() {
            "immediate" => TriggerMode::Immediate,
            "interval" => TriggerMode::Interval {
                value: self.trigger_interval.ok_or_else(|| {
                    Error::Other(format!("event {}: interval trigger without interval", self.id))
                })?,
                unit: match self.trigger_interval_unit.as_deref() {
                    Some("minutes") => IntervalUnit::Minutes,
                    Some("hours") => IntervalUnit::Hours,
                    Some("days") => IntervalUnit::Days,
                    other => {
                        return Err(Error::Other(format!(
                            "event {}: unknown interval unit {other:?}",
                            self.id
                        )));
                    }
                },
            },
            "date" => TriggerMode::Date {
                at: self.trigger_date.ok_or_else(|| {
                    Error::Other(format!("event {}: date trigger without date", self.id))
                })?,
            },
            other => {
                return Err(Error::Other(format!(
                    "event {}: unknown trigger mode {other:?}",
                    self.id
                )));
            }
        };

        let timing: Option<TimingWindow> = match self.timing {
            Some(value) => Some(serde_json::from_value(value).map_err(|e| {
                Error::Other(format!("event {}: bad timing window: {e}", self.id))
            })?),
            None => None,
        };

        Ok(CampaignEvent {
            id: EventId(self.id),
            campaign_id: CampaignId(self.campaign_id),
            name: self.name,
            action_type: self.action_type,
            params: self.params,
            trigger,
            timing,
            event_order: self.event_order,
        })
    }
}
