//! Metric instrument factories for wksp-retrain.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without a provider (no OTLP endpoint) the instruments are no-ops.

use opentelemetry::metrics::{Counter, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("wksp-retrain")
}

/// Counter: workspaces handled by the sweep.
/// Labels: `outcome` ("retrained" | "failed" | "skipped").
pub fn workspaces_processed() -> Counter<u64> {
    meter()
        .u64_counter("retrain.workspaces.processed")
        .with_description("Number of workspaces handled by the retraining sweep")
        .build()
}

/// Counter: rate-limit cooldowns taken.
pub fn throttle_pauses() -> Counter<u64> {
    meter()
        .u64_counter("retrain.throttle.pauses")
        .with_description("Number of rate-limit cooldowns")
        .build()
}
