//! Metric name and label definitions.
//!
//! Every metric the bridge records is named here so the set of exported series
//! is documented in one place.

/// Bridge core metrics
pub mod bridge {
    /// Inbound events taken off a platform queue
    pub const EVENTS_RECEIVED_TOTAL: &str = "chatbridge_events_received_total";
    /// Events relayed to the other platform
    pub const EVENTS_RELAYED_TOTAL: &str = "chatbridge_events_relayed_total";
    /// Events dropped by gating or a correlation miss, labelled by reason
    pub const EVENTS_IGNORED_TOTAL: &str = "chatbridge_events_ignored_total";
    /// Time from dequeue to completion of an event, in seconds
    pub const EVENT_DURATION_SECONDS: &str = "chatbridge_event_duration_seconds";
    /// Failed outbound adapter calls, labelled by platform and operation
    pub const ADAPTER_FAILURES_TOTAL: &str = "chatbridge_adapter_failures_total";
    /// Mentions or reaction names with no mapping, labelled by kind
    pub const TRANSLATION_MISSES_TOTAL: &str = "chatbridge_translation_misses_total";
}

/// History store metrics
pub mod history {
    /// Correlations dropped because the per-direction capacity was reached
    pub const EVICTIONS_TOTAL: &str = "chatbridge_history_evictions_total";
    /// Current number of correlations, labelled by direction
    pub const ENTRIES: &str = "chatbridge_history_entries";
}

/// Common label keys used across metrics
pub mod labels {
    pub const PLATFORM: &str = "platform";
    pub const KIND: &str = "kind";
    pub const OPERATION: &str = "operation";
    pub const REASON: &str = "reason";
    pub const DIRECTION: &str = "direction";
}

/// Standard histogram buckets
pub mod buckets {
    use std::sync::LazyLock;

    /// Event handling duration buckets (in seconds)
    /// Covers 1ms to 30s; a relay is one or two platform API round trips
    pub static EVENT_DURATION: LazyLock<Vec<f64>> = LazyLock::new(|| {
        vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]
    });
}
