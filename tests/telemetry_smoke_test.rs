//! Smoke test for telemetry initialization without an OTLP endpoint.
//!
//! Lives in its own test binary: a tracing subscriber can only be installed
//! once per process.

use kickoff_rs::telemetry::{TelemetryConfig, init_telemetry};

#[test]
fn initializes_and_shuts_down_without_an_endpoint() {
    let guard = init_telemetry(TelemetryConfig {
        endpoint: None,
        service_name: "kickoff-test".to_string(),
    })
    .unwrap();

    tracing::info!("telemetry smoke");
    kickoff_rs::telemetry::metrics::runs().add(1, &[]);

    drop(guard);
}
