use async_trait::async_trait;
use thiserror::Error;

use super::{ChunkOutcome, PushMessage, TransportResponse};

/// Errors surfaced by the push transport.
///
/// `Credentials` and `Auth` are call-level hard faults: they fail the whole
/// transport call, never a single message within a chunk.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Push credentials unavailable: {0}")]
    Credentials(String),

    #[error("Push service authentication failed: {0}")]
    Auth(String),

    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push service rejected the request ({status}): {detail}")]
    Service { status: u16, detail: String },
}

/// Delivery transport seam.
///
/// The dispatch pipeline only talks to this trait; tests substitute a
/// recording double, production wires in `FcmTransport`.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Verify the transport can send at all (credential resource present and
    /// parseable). Used by the batch path to fail fast before building
    /// messages.
    async fn ensure_ready(&self) -> Result<(), TransportError>;

    /// Send a single message. Errors are surfaced, not retried.
    async fn send_one(&self, message: &PushMessage) -> Result<TransportResponse, TransportError>;

    /// Send up to `FCM_BATCH_LIMIT` messages in one transport call.
    ///
    /// Per-message rejections are reported via the outcome counts; an `Err`
    /// means the whole call failed before any per-message verdicts existed.
    async fn send_chunk(&self, messages: &[PushMessage]) -> Result<ChunkOutcome, TransportError>;
}
