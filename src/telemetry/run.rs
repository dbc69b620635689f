//! Run span helpers.
//!
//! One span wraps the whole batch loop of an execution run; batch
//! completions are recorded as events on it.

use tracing::Span;
use uuid::Uuid;

use crate::model::CampaignId;

/// Start a span for one kickoff run.
pub fn start_run_span(campaign_id: CampaignId, run_id: &Uuid) -> Span {
    tracing::info_span!(
        "kickoff.execute",
        "campaign.id" = %campaign_id,
        "run.id" = %run_id,
    )
}

/// Record a completed batch on the given span.
pub fn record_batch(span: &Span, batch_index: usize, contacts: usize) {
    span.in_scope(|| {
        tracing::info!(batch_index, contacts, "batch_processed");
    });
}
