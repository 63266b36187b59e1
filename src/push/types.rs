use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Notification content shared by every message of one dispatch call.
///
/// Built once per call; messages hold it behind an `Arc` so a cohort of
/// thousands of recipients shares a single allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

impl PushNotification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// One device-addressed message: a token, the shared notification, and an
/// opaque key/value payload forwarded verbatim to the push service.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub token: String,
    pub notification: Arc<PushNotification>,
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn new(
        token: impl Into<String>,
        notification: Arc<PushNotification>,
        data: HashMap<String, String>,
    ) -> Self {
        Self {
            token: token.into(),
            notification,
            data,
        }
    }
}

/// Response for a successful single send.
#[derive(Debug, Clone, Serialize)]
pub struct TransportResponse {
    /// Message name/id assigned by the push service
    pub message_id: String,
}

/// Per-message pass/fail counts for one chunk-send call.
///
/// A chunk where some messages fail and others succeed is still an `Ok`
/// outcome; only call-level faults (credentials, auth) are errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChunkOutcome {
    pub successes: usize,
    pub failures: usize,
}

impl ChunkOutcome {
    pub fn total(&self) -> usize {
        self.successes + self.failures
    }
}
