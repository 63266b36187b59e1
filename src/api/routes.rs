use axum::{routing::post, Router};

use crate::server::AppState;

use super::handlers::{batch_notification, cohort_notification, send_notification};

/// Notification dispatch routes, guarded by the API-key middleware in
/// `server::create_app`.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest(
        "/api/v1",
        Router::new()
            // Single recipient
            .route("/notifications/send", post(send_notification))
            // Cohort broadcast
            .route("/notifications/cohort", post(cohort_notification))
            // Fixed token list
            .route("/notifications/batch", post(batch_notification)),
    )
}
