//! Dispatch pipeline integration tests
//!
//! These tests drive the pipeline end to end against stub directory and
//! transport implementations, without a database or network. The transport
//! double records call counts and chunk sizes so the tests can assert what
//! the pipeline actually sent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use campus_push_service::config::DispatchConfig;
use campus_push_service::directory::{CohortKey, DeviceDirectory, DirectoryError, RecipientRef};
use campus_push_service::dispatch::{DispatchPipeline, SKIP_MESSAGE};
use campus_push_service::push::{
    ChunkOutcome, PushMessage, PushNotification, PushTransport, TransportError, TransportResponse,
};

struct StubDirectory {
    single: Option<String>,
    cohort: Vec<String>,
}

impl StubDirectory {
    fn empty() -> Self {
        Self {
            single: None,
            cohort: vec![],
        }
    }

    fn with_single(token: &str) -> Self {
        Self {
            single: Some(token.to_string()),
            cohort: vec![],
        }
    }

    fn with_cohort(tokens: &[&str]) -> Self {
        Self {
            single: None,
            cohort: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl DeviceDirectory for StubDirectory {
    async fn resolve_single(
        &self,
        _recipient: &RecipientRef,
    ) -> Result<Option<String>, DirectoryError> {
        Ok(self.single.clone())
    }

    async fn resolve_cohort(&self, _cohort: &CohortKey) -> Result<Vec<String>, DirectoryError> {
        Ok(self.cohort.clone())
    }
}

/// Transport double recording every call made against it.
#[derive(Default)]
struct RecordingTransport {
    /// When set, `ensure_ready` fails with this credentials message
    not_ready: Option<String>,
    /// 1-based index of the chunk call that hard-faults
    fail_on_chunk: Option<usize>,
    /// Per-message failures reported in each successful chunk outcome
    failures_per_chunk: usize,
    send_one_calls: AtomicUsize,
    send_chunk_calls: AtomicUsize,
    chunk_sizes: Mutex<Vec<usize>>,
}

impl RecordingTransport {
    fn send_one_count(&self) -> usize {
        self.send_one_calls.load(Ordering::SeqCst)
    }

    fn send_chunk_count(&self) -> usize {
        self.send_chunk_calls.load(Ordering::SeqCst)
    }

    fn sizes(&self) -> Vec<usize> {
        self.chunk_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn ensure_ready(&self) -> Result<(), TransportError> {
        match &self.not_ready {
            Some(msg) => Err(TransportError::Credentials(msg.clone())),
            None => Ok(()),
        }
    }

    async fn send_one(
        &self,
        _message: &PushMessage,
    ) -> Result<TransportResponse, TransportError> {
        self.send_one_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TransportResponse {
            message_id: "projects/campus-test/messages/1".to_string(),
        })
    }

    async fn send_chunk(&self, messages: &[PushMessage]) -> Result<ChunkOutcome, TransportError> {
        let call = self.send_chunk_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_chunk == Some(call) {
            return Err(TransportError::Auth("token endpoint returned 503".to_string()));
        }

        self.chunk_sizes.lock().unwrap().push(messages.len());
        let failures = self.failures_per_chunk.min(messages.len());
        Ok(ChunkOutcome {
            successes: messages.len() - failures,
            failures,
        })
    }
}

fn pipeline(
    directory: StubDirectory,
    transport: Arc<RecordingTransport>,
    partial_counts_on_abort: bool,
) -> DispatchPipeline {
    DispatchPipeline::new(
        Arc::new(directory),
        transport,
        &DispatchConfig {
            partial_counts_on_abort,
        },
    )
}

fn notification() -> PushNotification {
    PushNotification::new("Exam results", "Semester results are published")
}

fn tokens(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("device-{i}")).collect()
}

// =============================================================================
// Single dispatch
// =============================================================================

#[tokio::test]
async fn single_without_token_skips_and_sends_nothing() {
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), true);

    let envelope = pipeline
        .dispatch_single(
            &RecipientRef::Username("guardian01".to_string()),
            notification(),
            HashMap::new(),
        )
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value, json!({ "success": true, "message": SKIP_MESSAGE }));
    assert_eq!(transport.send_one_count(), 0);
    assert_eq!(transport.send_chunk_count(), 0);
}

#[tokio::test]
async fn single_with_token_sends_one_message() {
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        StubDirectory::with_single("device-a"),
        transport.clone(),
        true,
    );

    let envelope = pipeline
        .dispatch_single(
            &RecipientRef::Enrollment("EN2024-117".to_string()),
            notification(),
            HashMap::from([("screen".to_string(), "results".to_string())]),
        )
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(
        value["response"]["message_id"],
        json!("projects/campus-test/messages/1")
    );
    assert_eq!(transport.send_one_count(), 1);
    assert_eq!(transport.send_chunk_count(), 0);
}

// =============================================================================
// Cohort dispatch
// =============================================================================

#[tokio::test]
async fn empty_cohort_skips_like_missing_token() {
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), true);

    let envelope = pipeline
        .dispatch_cohort(
            &CohortKey::GuardiansOfSemester(5),
            notification(),
            HashMap::new(),
        )
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value, json!({ "success": true, "message": SKIP_MESSAGE }));
    assert_eq!(transport.send_chunk_count(), 0);
}

#[tokio::test]
async fn cohort_sends_all_tokens_in_one_batch_call() {
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        StubDirectory::with_cohort(&["device-a", "device-b", "device-c"]),
        transport.clone(),
        true,
    );

    let envelope = pipeline
        .dispatch_cohort(
            &CohortKey::GuardiansOfSemester(5),
            notification(),
            HashMap::new(),
        )
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["response"]["successes"], json!(3));
    assert_eq!(value["response"]["failures"], json!(0));
    assert_eq!(transport.send_chunk_count(), 1);
    assert_eq!(transport.sizes(), vec![3]);
}

// =============================================================================
// Fixed-list batch dispatch
// =============================================================================

#[tokio::test]
async fn batch_with_empty_token_list_fails_without_transport_call() {
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), true);

    let envelope = pipeline
        .dispatch_fixed_list(vec![], notification(), HashMap::new())
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(transport.send_chunk_count(), 0);
    assert_eq!(transport.send_one_count(), 0);
}

#[tokio::test]
async fn batch_fails_fast_when_credentials_are_missing() {
    let transport = Arc::new(RecordingTransport {
        not_ready: Some("config/service-account.json: No such file".to_string()),
        ..RecordingTransport::default()
    });
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), true);

    let envelope = pipeline
        .dispatch_fixed_list(tokens(10), notification(), HashMap::new())
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(false));
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("config/service-account.json"));
    assert_eq!(transport.send_chunk_count(), 0);
}

#[tokio::test]
async fn batch_of_1200_tokens_issues_three_chunk_calls() {
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), true);

    let envelope = pipeline
        .dispatch_fixed_list(tokens(1200), notification(), HashMap::new())
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["total"], json!(1200));
    assert_eq!(value["success_count"], json!(1200));
    assert_eq!(value["failure_count"], json!(0));
    assert_eq!(transport.send_chunk_count(), 3);
    assert_eq!(transport.sizes(), vec![500, 500, 200]);
}

#[tokio::test]
async fn batch_aggregates_per_message_failures_as_counts() {
    let transport = Arc::new(RecordingTransport {
        failures_per_chunk: 2,
        ..RecordingTransport::default()
    });
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), true);

    let envelope = pipeline
        .dispatch_fixed_list(tokens(600), notification(), HashMap::new())
        .await;

    // Per-message rejections are counts, not a pipeline error
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["total"], json!(600));
    assert_eq!(value["success_count"], json!(596));
    assert_eq!(value["failure_count"], json!(4));
}

#[tokio::test]
async fn hard_fault_on_second_chunk_aborts_before_third() {
    let transport = Arc::new(RecordingTransport {
        fail_on_chunk: Some(2),
        ..RecordingTransport::default()
    });
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), true);

    let envelope = pipeline
        .dispatch_fixed_list(tokens(1500), notification(), HashMap::new())
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(false));
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("token endpoint returned 503"));
    // The third chunk was never attempted
    assert_eq!(transport.send_chunk_count(), 2);
    // Default policy reports the counts accumulated before the fault
    assert_eq!(value["total"], json!(500));
    assert_eq!(value["success_count"], json!(500));
}

#[tokio::test]
async fn abort_counts_are_suppressed_when_disabled() {
    let transport = Arc::new(RecordingTransport {
        fail_on_chunk: Some(2),
        ..RecordingTransport::default()
    });
    let pipeline = pipeline(StubDirectory::empty(), transport.clone(), false);

    let envelope = pipeline
        .dispatch_fixed_list(tokens(1500), notification(), HashMap::new())
        .await;

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["success"], json!(false));
    assert!(value.get("total").is_none());
    assert!(value.get("success_count").is_none());
    assert!(value.get("failure_count").is_none());
}
