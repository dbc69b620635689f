//! Error types for kickoff-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("event {event_id} cannot be scheduled: {reason}")]
    NotSchedulable { event_id: i64, reason: String },

    #[error("event {event_id} already has a pending schedule for contact {contact_id}")]
    AlreadyScheduled { event_id: i64, contact_id: i64 },

    #[error("no action handler registered for type {0:?}")]
    UnknownAction(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
