//! Metric instrument factories for kickoff-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"kickoff-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for kickoff-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("kickoff-rs")
}

/// Counter: kickoff runs started.
/// Labels: `result` ("ok" | "error").
pub fn runs() -> Counter<u64> {
    meter()
        .u64_counter("kickoff.runs")
        .with_description("Number of kickoff runs")
        .build()
}

/// Counter: (event, contact) pairs deferred to a future execution time.
/// Labels: `action`.
pub fn events_scheduled() -> Counter<u64> {
    meter()
        .u64_counter("kickoff.events.scheduled")
        .with_description("Kickoff event pairs deferred for later execution")
        .build()
}

/// Counter: (event, contact) pairs dispatched for immediate execution.
/// Labels: `action`.
pub fn events_executed() -> Counter<u64> {
    meter()
        .u64_counter("kickoff.events.executed")
        .with_description("Kickoff event pairs dispatched immediately")
        .build()
}

/// Counter: eligible contacts fetched from the host schema.
/// Labels: `campaign_id`.
pub fn contacts_fetched() -> Counter<u64> {
    meter()
        .u64_counter("kickoff.contacts.fetched")
        .with_description("Eligible contacts fetched for kickoff runs")
        .build()
}

/// Counter: queue-level operations (create, send, read, archive).
/// Labels: `queue`, `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("kickoff.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Histogram: wall-clock time spent per contact batch.
pub fn batch_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("kickoff.batch.duration_ms")
        .with_description("Batch processing duration in milliseconds")
        .with_unit("ms")
        .build()
}
