//! Dispatch endpoint handlers.
//!
//! Every handler returns HTTP 200 with the dispatch envelope; the envelope's
//! `success` field carries the outcome. Error-to-envelope conversion happens
//! inside the pipeline.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::directory::{CohortKey, RecipientRef};
use crate::dispatch::DispatchEnvelope;
use crate::push::PushNotification;
use crate::server::AppState;

/// Recipient address for a single send: a guardian username or a student
/// enrollment number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipientParam {
    Username { username: String },
    Enrollment { enrollment_no: String },
}

impl RecipientParam {
    fn into_ref(self) -> RecipientRef {
        match self {
            RecipientParam::Username { username } => RecipientRef::Username(username),
            RecipientParam::Enrollment { enrollment_no } => {
                RecipientRef::Enrollment(enrollment_no)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(flatten)]
    pub recipient: RecipientParam,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct CohortNotificationRequest {
    /// Semester whose students' guardians receive the notification
    pub semester: i32,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchNotificationRequest {
    /// Literal device-token list; no directory lookup
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

/// Send a notification to one recipient
#[tracing::instrument(
    name = "http.send_notification",
    skip(state, request),
    fields(recipient = ?request.recipient)
)]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Json<DispatchEnvelope> {
    let notification = PushNotification::new(request.title, request.body);
    let recipient = request.recipient.into_ref();

    let envelope = state
        .pipeline
        .dispatch_single(&recipient, notification, request.data)
        .await;

    Json(envelope)
}

/// Send a notification to the guardians of a semester's students
#[tracing::instrument(
    name = "http.cohort_notification",
    skip(state, request),
    fields(semester = request.semester)
)]
pub async fn cohort_notification(
    State(state): State<AppState>,
    Json(request): Json<CohortNotificationRequest>,
) -> Json<DispatchEnvelope> {
    let notification = PushNotification::new(request.title, request.body);
    let cohort = CohortKey::GuardiansOfSemester(request.semester);

    let envelope = state
        .pipeline
        .dispatch_cohort(&cohort, notification, request.data)
        .await;

    Json(envelope)
}

/// Send a notification to a literal list of device tokens
#[tracing::instrument(
    name = "http.batch_notification",
    skip(state, request),
    fields(token_count = request.tokens.len())
)]
pub async fn batch_notification(
    State(state): State<AppState>,
    Json(request): Json<BatchNotificationRequest>,
) -> Json<DispatchEnvelope> {
    let notification = PushNotification::new(request.title, request.body);

    let envelope = state
        .pipeline
        .dispatch_fixed_list(request.tokens, notification, request.data)
        .await;

    Json(envelope)
}
