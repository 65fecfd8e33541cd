//! Postgres submission store
//!
//! `compare_and_set` is a single `UPDATE ... WHERE id = $1 AND status = ANY($2)`;
//! the row count tells whether this caller won.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use motionbooth_common::{RepositoryError, Result};

use super::{ensure_edges, SubmissionStore};
use crate::domain::entities::{FieldUpdates, Submission, SubmissionStatus};

/// All columns in the submissions table, used for SELECT and RETURNING clauses.
pub(crate) const SUBMISSION_COLUMNS: &str = "id, submission_code, status, photo_ref, video_ref, user_prompt, user_name, email, error_message, moderation_comment, photo_moderated_at, video_moderated_at, created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn create(&self, submission: &Submission) -> Result<Submission> {
        let query = format!(
            r#"
            INSERT INTO submissions (
                id, submission_code, status, photo_ref, video_ref, user_prompt,
                user_name, email, error_message, moderation_comment,
                photo_moderated_at, video_moderated_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, Submission>(&query)
            .bind(submission.id)
            .bind(&submission.submission_code)
            .bind(submission.status)
            .bind(&submission.photo_ref)
            .bind(&submission.video_ref)
            .bind(&submission.user_prompt)
            .bind(&submission.user_name)
            .bind(&submission.email)
            .bind(&submission.error_message)
            .bind(&submission.moderation_comment)
            .bind(submission.photo_moderated_at)
            .bind(submission.video_moderated_at)
            .bind(submission.created_at)
            .bind(submission.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e.as_database_error().and_then(|db| db.code()) {
                Some(code) if code == UNIQUE_VIOLATION => {
                    RepositoryError::AlreadyExists("Submission".to_string())
                }
                _ => RepositoryError::Connection(e),
            })?;

        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>> {
        let query = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1");
        let row = sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Submission>> {
        let query =
            format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE submission_code = $1");
        let row = sqlx::query_as::<_, Submission>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_by_status(
        &self,
        status: SubmissionStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Submission>> {
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE status = $1 ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, Submission>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_by_status(&self, status: SubmissionStatus) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn compare_and_set(
        &self,
        id: Uuid,
        expected: &[SubmissionStatus],
        new_status: SubmissionStatus,
        fields: FieldUpdates,
    ) -> Result<bool> {
        ensure_edges(expected, new_status)?;

        let (set_error, error_message) = match fields.error_message {
            Some(message) => (true, message),
            None => (false, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = $3,
                video_ref = COALESCE($4, video_ref),
                error_message = CASE WHEN $5 THEN $6 ELSE error_message END,
                moderation_comment = COALESCE($7, moderation_comment),
                photo_moderated_at = COALESCE($8, photo_moderated_at),
                video_moderated_at = COALESCE($9, video_moderated_at),
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            "#,
        )
        .bind(id)
        .bind(expected.to_vec())
        .bind(new_status)
        .bind(fields.video_ref)
        .bind(set_error)
        .bind(error_message)
        .bind(fields.moderation_comment)
        .bind(fields.photo_moderated_at)
        .bind(fields.video_moderated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_prompt(&self, id: Uuid, prompt: Option<String>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE submissions SET user_prompt = $2, updated_at = NOW() WHERE id = $1 AND status = ANY($3)",
        )
        .bind(id)
        .bind(prompt)
        .bind(SubmissionStatus::pre_generation())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_stale(
        &self,
        status: SubmissionStatus,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Submission>> {
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE status = $1 AND updated_at < $2 ORDER BY updated_at ASC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, Submission>(&query)
            .bind(status)
            .bind(older_than)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
