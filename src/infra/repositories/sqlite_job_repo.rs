use crate::domain::{models::job::Job, ports::JobRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

pub struct SqliteJobRepo {
    pool: SqlitePool,
}

impl SqliteJobRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

/// Inserts a job on the caller's connection so it commits with the state change that caused it.
pub async fn enqueue(conn: &mut SqliteConnection, job: &Job) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO jobs (id, job_type, payload, execute_at, status, attempts, error_message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    )
        .bind(&job.id)
        .bind(&job.job_type)
        .bind(&job.payload)
        .bind(job.execute_at)
        .bind(&job.status)
        .bind(job.attempts)
        .bind(&job.error_message)
        .bind(job.created_at)
        .execute(conn)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

#[async_trait]
impl JobRepository for SqliteJobRepo {
    // single statement claim; SQLite serializes writers
    async fn claim_due(&self, limit: i32) -> Result<Vec<Job>, AppError> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'PROCESSING', attempts = attempts + 1
             WHERE id IN (SELECT id FROM jobs WHERE status = 'PENDING' AND execute_at <= ? ORDER BY execute_at ASC LIMIT ?)
             RETURNING *"
        )
            .bind(Utc::now())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn requeue_interrupted(&self) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE jobs SET status = 'PENDING', execute_at = ? WHERE status = 'PROCESSING'")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Job>, AppError> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE json_extract(payload, '$.event_id') = ? ORDER BY created_at DESC LIMIT 100"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn complete(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE jobs SET status = 'COMPLETED', error_message = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn fail(&self, id: &str, error: &str, retry_at: Option<DateTime<Utc>>) -> Result<(), AppError> {
        let query = match retry_at {
            Some(at) => sqlx::query("UPDATE jobs SET status = 'PENDING', execute_at = ?, error_message = ? WHERE id = ?")
                .bind(at)
                .bind(error)
                .bind(id),
            None => sqlx::query("UPDATE jobs SET status = 'FAILED', error_message = ? WHERE id = ?")
                .bind(error)
                .bind(id),
        };
        query.execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn retry(&self, event_id: &str, id: &str) -> Result<Job, AppError> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'PENDING', attempts = 0, execute_at = ?, error_message = NULL
             WHERE id = ? AND json_extract(payload, '$.event_id') = ? AND status = 'FAILED'
             RETURNING *"
        )
            .bind(Utc::now())
            .bind(id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("No failed job to retry".into()))
    }
}
