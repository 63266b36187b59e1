//! API layer - HTTP endpoint handlers.

mod handlers;
mod health;
mod metrics;
mod routes;

pub use handlers::{
    batch_notification, cohort_notification, send_notification, BatchNotificationRequest,
    CohortNotificationRequest, RecipientParam, SendNotificationRequest,
};
pub use health::{health, HealthResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
