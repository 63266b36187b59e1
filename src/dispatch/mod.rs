//! Dispatch pipeline: token resolution, message construction, chunked
//! delivery, and aggregated result reporting.

mod aggregate;
mod envelope;
mod pipeline;

pub use aggregate::BatchTally;
pub use envelope::{DispatchEnvelope, SKIP_MESSAGE};
pub use pipeline::DispatchPipeline;
