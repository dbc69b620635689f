//! Contact types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype for contact IDs. Ids are assigned monotonically by the host, so
/// the maximum id of a batch doubles as the paging cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactId(pub i64);

impl ContactId {
    /// The first id strictly after this one, for use as the next page's
    /// lower bound.
    pub fn next(self) -> ContactId {
        ContactId(self.0 + 1)
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contact eligible for a campaign. Read-only to the executioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub email: Option<String>,

    /// IANA timezone name (e.g. "America/Denver"), when the contact has one.
    /// Timing windows with `use_contact_timezone` evaluate in this zone.
    pub timezone: Option<String>,

    pub date_added: DateTime<Utc>,
}

/// One page of eligible contacts, keyed and iterated in ascending id order.
pub type ContactBatch = BTreeMap<ContactId, Contact>;
