//! Campaign and event definitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::window::TimingWindow;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Newtype for campaign IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub i64);

/// Newtype for campaign event IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub i64);

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// A campaign definition. Immutable for the duration of one execution run.
///
/// `root_events` is ordered by the campaign's own event ordering and is never
/// mutated by the executioner; each batch works on its own copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub published: bool,
    pub root_events: Vec<CampaignEvent>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Ids of the kickoff events, in campaign order.
    pub fn root_event_ids(&self) -> Vec<EventId> {
        self.root_events.iter().map(|e| e.id).collect()
    }
}

// ---------------------------------------------------------------------------
// Campaign Event
// ---------------------------------------------------------------------------

/// A single campaign event. Kickoff events are those with no parent in the
/// campaign graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignEvent {
    pub id: EventId,
    pub campaign_id: CampaignId,
    pub name: String,

    /// Which action handler runs this event (e.g. "email.send").
    pub action_type: String,

    /// Handler parameters. Opaque to the engine.
    pub params: serde_json::Value,

    /// When the event wants to fire relative to evaluation time.
    pub trigger: TriggerMode,

    /// Optional restriction on when execution is allowed at all.
    pub timing: Option<TimingWindow>,

    pub event_order: i32,
}

// ---------------------------------------------------------------------------
// Trigger mode
// ---------------------------------------------------------------------------

/// When an event wants to execute, relative to the evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TriggerMode {
    /// Execute as part of the current run.
    Immediate,
    /// Execute after a fixed delay.
    Interval { value: i64, unit: IntervalUnit },
    /// Execute at a fixed point in time.
    Date { at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Minutes,
    Hours,
    Days,
}

impl TriggerMode {
    /// The base execution time before timing windows are applied.
    pub fn base_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            TriggerMode::Immediate => now,
            TriggerMode::Interval { value, unit } => {
                now + match unit {
                    IntervalUnit::Minutes => Duration::minutes(value),
                    IntervalUnit::Hours => Duration::hours(value),
                    IntervalUnit::Days => Duration::days(value),
                }
            }
            TriggerMode::Date { at } => at,
        }
    }
}
