//! Metrics collection and export for chatbridge.
//!
//! This crate provides a unified metrics interface using the `metrics` crate facade.
//! When the `prometheus` feature is enabled, metrics are exported in Prometheus format.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chatbridge_metrics::{bridge, counter, labels};
//!
//! counter!(bridge::EVENTS_RECEIVED_TOTAL, labels::PLATFORM => "a").increment(1);
//! ```
//!
//! # Features
//!
//! - `prometheus`: Render collected metrics in the Prometheus text format

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
