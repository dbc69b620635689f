//! Core data model.
//!
//! A campaign is a directed graph of events; the events with no parent are
//! the kickoff events through which eligible contacts enter. The executioner
//! only ever reads these definitions.

pub mod campaign;
pub mod contact;

pub use campaign::{Campaign, CampaignEvent, CampaignId, EventId, IntervalUnit, TriggerMode};
pub use contact::{Contact, ContactBatch, ContactId};
