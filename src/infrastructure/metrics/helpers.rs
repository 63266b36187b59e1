//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    CHUNKS_SENT_TOTAL, DISPATCHES_SKIPPED_TOTAL, DISPATCHES_TOTAL, DISPATCH_FAILURES_TOTAL,
    MESSAGES_DELIVERED_TOTAL, MESSAGES_FAILED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Record a single-recipient dispatch call
    pub fn record_single() {
        DISPATCHES_TOTAL.with_label_values(&["single"]).inc();
    }

    /// Record a cohort dispatch call
    pub fn record_cohort() {
        DISPATCHES_TOTAL.with_label_values(&["cohort"]).inc();
    }

    /// Record a fixed-list batch dispatch call
    pub fn record_batch() {
        DISPATCHES_TOTAL.with_label_values(&["batch"]).inc();
    }

    /// Record a dispatch skipped for lack of a device token
    pub fn record_skipped() {
        DISPATCHES_SKIPPED_TOTAL.inc();
    }

    /// Record a dispatch aborted by a hard fault
    pub fn record_failure(kind: &str) {
        DISPATCH_FAILURES_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record messages accepted by the push service
    pub fn record_delivered(count: u64) {
        MESSAGES_DELIVERED_TOTAL.inc_by(count);
    }

    /// Record messages rejected by the push service
    pub fn record_failed(count: u64) {
        MESSAGES_FAILED_TOTAL.inc_by(count);
    }

    /// Record a chunk-send transport call
    pub fn record_chunk_sent() {
        CHUNKS_SENT_TOTAL.inc();
    }
}
