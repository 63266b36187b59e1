use serde::Serialize;
use serde_json::json;

use crate::push::{ChunkOutcome, TransportResponse};

use super::BatchTally;

/// Wording of the skip case, shared by all dispatch variants.
pub const SKIP_MESSAGE: &str = "No device token(s) found, notification skipped";

/// JSON result envelope returned by every dispatch variant.
///
/// Absent fields are omitted from the serialized form, not emitted as null.
/// A dispatch call always yields an envelope; faults never propagate past
/// the pipeline as errors.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<usize>,
}

impl DispatchEnvelope {
    fn base(success: bool) -> Self {
        Self {
            success,
            message: None,
            response: None,
            error: None,
            total: None,
            success_count: None,
            failure_count: None,
        }
    }

    /// No usable device token: reported as success, nothing was sent.
    pub fn skipped() -> Self {
        Self {
            message: Some(SKIP_MESSAGE.to_string()),
            ..Self::base(true)
        }
    }

    /// Successful single send, wrapping the transport response.
    pub fn sent(response: &TransportResponse) -> Self {
        Self {
            response: Some(json!({ "message_id": response.message_id })),
            ..Self::base(true)
        }
    }

    /// Successful cohort send, wrapping the chunk outcome.
    pub fn delivered(outcome: ChunkOutcome) -> Self {
        Self {
            response: Some(json!({
                "successes": outcome.successes,
                "failures": outcome.failures,
            })),
            ..Self::base(true)
        }
    }

    /// Fully completed batch dispatch.
    pub fn batch(tally: &BatchTally) -> Self {
        Self {
            message: Some("Batch notification dispatched".to_string()),
            total: Some(tally.total),
            success_count: Some(tally.success_count),
            failure_count: Some(tally.failure_count),
            ..Self::base(true)
        }
    }

    /// Hard fault, converted at the dispatch boundary.
    pub fn failure(message: &str, error: impl std::fmt::Display) -> Self {
        Self {
            message: Some(message.to_string()),
            error: Some(error.to_string()),
            ..Self::base(false)
        }
    }

    /// Hard fault mid-batch, with the counts accumulated before the fault.
    pub fn failure_with_tally(
        message: &str,
        error: impl std::fmt::Display,
        tally: &BatchTally,
    ) -> Self {
        Self {
            total: Some(tally.total),
            success_count: Some(tally.success_count),
            failure_count: Some(tally.failure_count),
            ..Self::failure(message, error)
        }
    }
}
