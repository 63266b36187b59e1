use async_trait::async_trait;
use sqlx::PgPool;

use super::{CohortKey, DeviceDirectory, DirectoryError, RecipientRef};

/// PostgreSQL-backed device directory.
///
/// All queries are short single-statement reads against the campus schema:
/// `students` and `guardians` hold one optional `device_token` each;
/// `student_guardians` links the two.
pub struct PgDeviceDirectory {
    pool: PgPool,
}

impl PgDeviceDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Treat NULL and empty-string tokens the same: no usable token.
fn usable(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

#[async_trait]
impl DeviceDirectory for PgDeviceDirectory {
    #[tracing::instrument(name = "directory.resolve_single", skip(self))]
    async fn resolve_single(
        &self,
        recipient: &RecipientRef,
    ) -> Result<Option<String>, DirectoryError> {
        let row: Option<Option<String>> = match recipient {
            RecipientRef::Username(username) => {
                sqlx::query_scalar("SELECT device_token FROM guardians WHERE username = $1")
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await?
            }
            RecipientRef::Enrollment(enrollment_no) => {
                sqlx::query_scalar("SELECT device_token FROM students WHERE enrollment_no = $1")
                    .bind(enrollment_no)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        Ok(usable(row.flatten()))
    }

    #[tracing::instrument(name = "directory.resolve_cohort", skip(self))]
    async fn resolve_cohort(&self, cohort: &CohortKey) -> Result<Vec<String>, DirectoryError> {
        let tokens: Vec<String> = match cohort {
            CohortKey::GuardiansOfSemester(semester) => {
                sqlx::query_scalar(
                    r#"
                    SELECT g.device_token
                    FROM guardians g
                    JOIN student_guardians sg ON sg.guardian_id = g.id
                    JOIN students s ON s.id = sg.student_id
                    WHERE s.semester = $1
                      AND g.device_token IS NOT NULL
                      AND g.device_token <> ''
                    "#,
                )
                .bind(semester)
                .fetch_all(&self.pool)
                .await?
            }
        };

        tracing::debug!(count = tokens.len(), "Resolved cohort device tokens");
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_filters_null_and_empty() {
        assert_eq!(usable(None), None);
        assert_eq!(usable(Some(String::new())), None);
        assert_eq!(usable(Some("tok".to_string())), Some("tok".to_string()));
    }
}
