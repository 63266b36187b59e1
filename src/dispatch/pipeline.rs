use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::directory::{CohortKey, DeviceDirectory, RecipientRef};
use crate::metrics::DispatchMetrics;
use crate::push::{chunk_messages, PushMessage, PushNotification, PushTransport, FCM_BATCH_LIMIT};

use super::{BatchTally, DispatchEnvelope};

/// Orchestrates one dispatch call: resolve tokens, build messages, deliver,
/// wrap the outcome.
///
/// Each entry point runs to completion (or hard fault) within the calling
/// request; no state is shared between calls. Every fault is converted into
/// the failure envelope here — callers never see an `Err`.
pub struct DispatchPipeline {
    directory: Arc<dyn DeviceDirectory>,
    transport: Arc<dyn PushTransport>,
    partial_counts_on_abort: bool,
}

impl DispatchPipeline {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        transport: Arc<dyn PushTransport>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            directory,
            transport,
            partial_counts_on_abort: config.partial_counts_on_abort,
        }
    }

    /// Send to one recipient resolved through the directory.
    #[tracing::instrument(
        name = "dispatch.single",
        skip(self, notification, data),
        fields(title = %notification.title)
    )]
    pub async fn dispatch_single(
        &self,
        recipient: &RecipientRef,
        notification: PushNotification,
        data: HashMap<String, String>,
    ) -> DispatchEnvelope {
        DispatchMetrics::record_single();

        let token = match self.directory.resolve_single(recipient).await {
            Ok(token) => token,
            Err(e) => {
                DispatchMetrics::record_failure("directory");
                tracing::error!(error = %e, "Recipient lookup failed");
                return DispatchEnvelope::failure("Failed to resolve recipient device token", e);
            }
        };

        let Some(token) = token else {
            DispatchMetrics::record_skipped();
            tracing::debug!("Recipient has no device token, skipping");
            return DispatchEnvelope::skipped();
        };

        let message = PushMessage::new(token, Arc::new(notification), data);
        match self.transport.send_one(&message).await {
            Ok(response) => {
                DispatchMetrics::record_delivered(1);
                tracing::debug!(message_id = %response.message_id, "Notification sent");
                DispatchEnvelope::sent(&response)
            }
            Err(e) => {
                DispatchMetrics::record_failure("transport");
                tracing::error!(error = %e, "Notification send failed");
                DispatchEnvelope::failure("Failed to send notification", e)
            }
        }
    }

    /// Send to every member of a cohort, all at once in one batch call.
    #[tracing::instrument(
        name = "dispatch.cohort",
        skip(self, notification, data),
        fields(title = %notification.title)
    )]
    pub async fn dispatch_cohort(
        &self,
        cohort: &CohortKey,
        notification: PushNotification,
        data: HashMap<String, String>,
    ) -> DispatchEnvelope {
        DispatchMetrics::record_cohort();

        let tokens = match self.directory.resolve_cohort(cohort).await {
            Ok(tokens) => tokens,
            Err(e) => {
                DispatchMetrics::record_failure("directory");
                tracing::error!(error = %e, "Cohort lookup failed");
                return DispatchEnvelope::failure("Failed to resolve cohort device tokens", e);
            }
        };

        if tokens.is_empty() {
            DispatchMetrics::record_skipped();
            tracing::debug!("Cohort resolved no device tokens, skipping");
            return DispatchEnvelope::skipped();
        }

        let messages = build_messages(tokens, notification, &data);
        match self.transport.send_chunk(&messages).await {
            Ok(outcome) => {
                DispatchMetrics::record_chunk_sent();
                DispatchMetrics::record_delivered(outcome.successes as u64);
                DispatchMetrics::record_failed(outcome.failures as u64);
                tracing::debug!(
                    successes = outcome.successes,
                    failures = outcome.failures,
                    "Cohort notification sent"
                );
                DispatchEnvelope::delivered(outcome)
            }
            Err(e) => {
                DispatchMetrics::record_failure("transport");
                tracing::error!(error = %e, "Cohort send failed");
                DispatchEnvelope::failure("Failed to send cohort notification", e)
            }
        }
    }

    /// Send to a literal token list, chunked at the transport limit.
    ///
    /// Chunks go out strictly sequentially; the first hard fault aborts the
    /// loop. Whether counts accumulated before the fault appear in the
    /// failure envelope is controlled by `dispatch.partial_counts_on_abort`.
    #[tracing::instrument(
        name = "dispatch.batch",
        skip(self, tokens, notification, data),
        fields(token_count = tokens.len(), title = %notification.title)
    )]
    pub async fn dispatch_fixed_list(
        &self,
        tokens: Vec<String>,
        notification: PushNotification,
        data: HashMap<String, String>,
    ) -> DispatchEnvelope {
        DispatchMetrics::record_batch();

        if tokens.is_empty() {
            DispatchMetrics::record_failure("config");
            return DispatchEnvelope::failure(
                "Batch notification not sent",
                "no device tokens supplied",
            );
        }

        if let Err(e) = self.transport.ensure_ready().await {
            DispatchMetrics::record_failure("config");
            tracing::error!(error = %e, "Push transport not ready");
            return DispatchEnvelope::failure("Push transport is not configured", e);
        }

        let messages = build_messages(tokens, notification, &data);
        let mut tally = BatchTally::default();

        for chunk in chunk_messages(&messages, FCM_BATCH_LIMIT) {
            match self.transport.send_chunk(chunk).await {
                Ok(outcome) => {
                    DispatchMetrics::record_chunk_sent();
                    DispatchMetrics::record_delivered(outcome.successes as u64);
                    DispatchMetrics::record_failed(outcome.failures as u64);
                    tally.record(outcome);
                }
                Err(e) => {
                    DispatchMetrics::record_failure("transport");
                    tracing::error!(
                        error = %e,
                        sent_so_far = tally.total,
                        "Batch dispatch aborted by transport fault"
                    );
                    return if self.partial_counts_on_abort && !tally.is_empty() {
                        DispatchEnvelope::failure_with_tally("Batch dispatch aborted", e, &tally)
                    } else {
                        DispatchEnvelope::failure("Batch dispatch aborted", e)
                    };
                }
            }
        }

        tracing::info!(
            total = tally.total,
            success_count = tally.success_count,
            failure_count = tally.failure_count,
            "Batch dispatch complete"
        );
        DispatchEnvelope::batch(&tally)
    }
}

/// One message per token, all sharing one notification instance.
fn build_messages(
    tokens: Vec<String>,
    notification: PushNotification,
    data: &HashMap<String, String>,
) -> Vec<PushMessage> {
    let notification = Arc::new(notification);
    tokens
        .into_iter()
        .map(|token| PushMessage::new(token, notification.clone(), data.clone()))
        .collect()
}
