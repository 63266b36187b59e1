//! Recipient directory: resolves device tokens from the campus database.
//!
//! The directory is read-only. Tokens are written by the login/registration
//! flow of the wider platform; a missing or empty token is a skip condition
//! for the dispatch pipeline, never an error.

mod pg;

pub use pg::PgDeviceDirectory;

use async_trait::async_trait;
use thiserror::Error;

/// Reference to one recipient in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientRef {
    /// Guardian account, addressed by username
    Username(String),
    /// Student, addressed by enrollment number
    Enrollment(String),
}

/// A derived set of recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CohortKey {
    /// Guardians of every student enrolled in the given semester
    GuardiansOfSemester(i32),
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Device-token lookup seam.
///
/// The store handle is injected at construction; there is no ambient
/// connection state.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Resolve one recipient's device token. `None` means the recipient has
    /// no usable token (absent row, NULL, or empty string).
    async fn resolve_single(
        &self,
        recipient: &RecipientRef,
    ) -> Result<Option<String>, DirectoryError>;

    /// Resolve every usable token in a cohort. Never yields an empty token;
    /// an empty result set is not an error.
    async fn resolve_cohort(&self, cohort: &CohortKey) -> Result<Vec<String>, DirectoryError>;
}
