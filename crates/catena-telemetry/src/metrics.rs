//! Metric names emitted by Catena chains.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `catena_chain_runs_total` | Counter | `outcome` | Chain runs by outcome |
//! | `catena_stage_failures_total` | Counter | `stage` | Stage failures by stage name |
//!
//! Chains record through the `metrics` facade; without an installed
//! recorder the calls are no-ops. Call [`describe_metrics`] after
//! installing a recorder to register help text.

use metrics::{describe_counter, Unit};

/// Chain runs, labelled by `outcome`.
pub const CHAIN_RUNS_TOTAL: &str = "catena_chain_runs_total";

/// Stage failures, labelled by `stage`.
pub const STAGE_FAILURES_TOTAL: &str = "catena_stage_failures_total";

/// Values of the `outcome` label.
pub mod outcome {
    /// The terminal handler or a short-circuiting stage produced the result.
    pub const COMPLETED: &str = "completed";

    /// An error handler produced the result, either a stage's own recovery
    /// or the default error handler. Failures are also counted per stage
    /// in [`STAGE_FAILURES_TOTAL`](super::STAGE_FAILURES_TOTAL).
    pub const RECOVERED: &str = "recovered";

    /// The chain had no terminal handler.
    pub const MISCONFIGURED: &str = "misconfigured";
}

/// Registers descriptions for the Catena metrics with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(CHAIN_RUNS_TOTAL, Unit::Count, "Total number of chain runs by outcome");
    describe_counter!(
        STAGE_FAILURES_TOTAL,
        Unit::Count,
        "Total number of stage failures by stage name"
    );
}
