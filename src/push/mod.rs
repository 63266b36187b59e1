//! Push messaging domain: message construction, chunking, and delivery.
//!
//! The transport seam is the `PushTransport` trait; `FcmTransport` is the
//! production implementation speaking the FCM HTTP v1 API.

mod chunk;
mod credentials;
mod fcm;
mod transport;
mod types;

pub use chunk::{chunk_messages, FCM_BATCH_LIMIT};
pub use credentials::ServiceAccountKey;
pub use fcm::FcmTransport;
pub use transport::{PushTransport, TransportError};
pub use types::{ChunkOutcome, PushMessage, PushNotification, TransportResponse};
