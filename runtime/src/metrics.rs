//! Metric descriptions for the list engine.
//!
//! Metrics are emitted through the `metrics` facade; whichever recorder the
//! host installs receives them. Without a recorder every macro is a no-op.
//!
//! # Example
//!
//! ```
//! use pantry_runtime::metrics::{register_metrics, METRIC_NAMES};
//!
//! register_metrics();
//! assert!(METRIC_NAMES.contains(&"store.commands.total"));
//! ```

use metrics::{Unit, describe_counter, describe_histogram};

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Every metric name emitted by the runtime and the animation driver.
pub const METRIC_NAMES: &[&str] = &[
    "store.commands.total",
    "store.reducer.duration_seconds",
    "store.effects.executed",
    "store.effects.cancelled",
    "store.shutdown.rejected_actions",
    "motion.transitions.started",
    "motion.transitions.finished",
    "motion.transitions.abandoned",
    "motion.replay.executed",
    "motion.replay.dropped",
];

/// Register all metric descriptions with the installed recorder.
pub fn register_metrics() {
    // Store
    describe_counter!(
        "store.commands.total",
        "Total number of actions reduced by stores"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        Unit::Seconds,
        "Time taken to run a reducer"
    );
    describe_counter!(
        "store.effects.executed",
        "Total number of effects executed, labelled by effect type"
    );
    describe_counter!(
        "store.effects.cancelled",
        "Total number of in-flight effects aborted by cancellation"
    );
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );

    // Expand / collapse animation
    describe_counter!(
        "motion.transitions.started",
        "Expand/collapse transitions started"
    );
    describe_counter!(
        "motion.transitions.finished",
        "Expand/collapse transitions that ran to completion"
    );
    describe_counter!(
        "motion.transitions.abandoned",
        "Transitions abandoned because their view was recycled"
    );
    describe_counter!(
        "motion.replay.executed",
        "Queued edit-button presses replayed after an animation"
    );
    describe_counter!(
        "motion.replay.dropped",
        "Queued edit-button presses dropped as stale"
    );
}
