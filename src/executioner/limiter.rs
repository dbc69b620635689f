//! Contact paging directive.

use crate::model::ContactId;

/// Bounds which contacts a batch fetch returns.
///
/// Request-scoped: one limiter belongs to one `execute` call. The executioner
/// advances `batch_min_contact_id` between pages; the contact source treats
/// it as an inclusive lower bound on contact id.
#[derive(Debug, Clone)]
pub struct ContactLimiter {
    batch_limit: usize,
    contact_id: Option<ContactId>,
    batch_min_contact_id: Option<ContactId>,
}

impl ContactLimiter {
    /// Create a limiter with the given page size. Sizes below 1 are clamped.
    pub fn new(batch_limit: usize) -> Self {
        Self {
            batch_limit: batch_limit.max(1),
            contact_id: None,
            batch_min_contact_id: None,
        }
    }

    /// Restrict the run to a single contact. Single-contact runs never page.
    pub fn for_contact(mut self, contact_id: ContactId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    pub fn contact_id(&self) -> Option<ContactId> {
        self.contact_id
    }

    pub fn batch_min_contact_id(&self) -> Option<ContactId> {
        self.batch_min_contact_id
    }

    pub fn set_batch_min_contact_id(&mut self, id: ContactId) {
        self.batch_min_contact_id = Some(id);
    }
}
