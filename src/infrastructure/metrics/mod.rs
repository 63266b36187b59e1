//! Prometheus metrics for the push dispatch service.
//!
//! Counters cover the dispatch pipeline:
//! - Dispatch calls by variant (single, cohort, batch)
//! - Per-message delivery outcomes
//! - Skips and hard failures by kind

mod helpers;

pub use helpers::{encode_metrics, DispatchMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "campus_push";

lazy_static! {
    /// Total dispatch calls by variant
    pub static ref DISPATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatches_total", METRIC_PREFIX),
        "Total dispatch calls",
        &["variant"]
    ).unwrap();

    /// Dispatch calls that resolved no device token and were skipped
    pub static ref DISPATCHES_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_dispatches_skipped_total", METRIC_PREFIX),
        "Dispatch calls skipped because no device token was found"
    ).unwrap();

    /// Dispatch calls aborted by a hard fault, by fault kind
    pub static ref DISPATCH_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatch_failures_total", METRIC_PREFIX),
        "Dispatch calls aborted by a hard fault",
        &["kind"]
    ).unwrap();

    /// Total messages accepted by the push service
    pub static ref MESSAGES_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_delivered_total", METRIC_PREFIX),
        "Messages accepted by the push service"
    ).unwrap();

    /// Total messages rejected by the push service
    pub static ref MESSAGES_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Messages rejected by the push service"
    ).unwrap();

    /// Total chunk-send transport calls
    pub static ref CHUNKS_SENT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_chunks_sent_total", METRIC_PREFIX),
        "Chunk-send calls issued to the push transport"
    ).unwrap();
}
