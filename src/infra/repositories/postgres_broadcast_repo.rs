use crate::domain::{models::{broadcast::Broadcast, job::Job}, ports::BroadcastRepository};
use crate::error::AppError;
use crate::infra::repositories::postgres_job_repo::enqueue;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresBroadcastRepo {
    pool: PgPool,
}

impl PostgresBroadcastRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl BroadcastRepository for PostgresBroadcastRepo {
    async fn create(&self, broadcast: &Broadcast) -> Result<Broadcast, AppError> {
        sqlx::query_as::<_, Broadcast>(
            "INSERT INTO broadcasts (id, event_id, title, body, channel, status, recipient_count, sent_at, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *"
        )
            .bind(&broadcast.id)
            .bind(&broadcast.event_id)
            .bind(&broadcast.title)
            .bind(&broadcast.body)
            .bind(&broadcast.channel)
            .bind(&broadcast.status)
            .bind(broadcast.recipient_count)
            .bind(broadcast.sent_at)
            .bind(broadcast.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Broadcast>, AppError> {
        sqlx::query_as::<_, Broadcast>("SELECT * FROM broadcasts WHERE event_id = $1 AND id = $2")
            .bind(event_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Broadcast>, AppError> {
        sqlx::query_as::<_, Broadcast>("SELECT * FROM broadcasts WHERE event_id = $1 ORDER BY created_at DESC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_sent(&self, event_id: &str) -> Result<Vec<Broadcast>, AppError> {
        sqlx::query_as::<_, Broadcast>("SELECT * FROM broadcasts WHERE event_id = $1 AND status = 'sent' ORDER BY sent_at DESC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_sent(&self, broadcast: &Broadcast, jobs: Vec<Job>) -> Result<Broadcast, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, Broadcast>(
            "UPDATE broadcasts SET status=$1, recipient_count=$2, sent_at=$3 WHERE id=$4 AND event_id=$5 AND status <> 'sent' RETURNING *"
        )
            .bind(&broadcast.status)
            .bind(broadcast.recipient_count)
            .bind(broadcast.sent_at)
            .bind(&broadcast.id)
            .bind(&broadcast.event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::Conflict("Broadcast already sent".into()))?;

        for job in &jobs {
            enqueue(&mut *tx, job).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM broadcasts WHERE id = $1 AND event_id = $2")
            .bind(id)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Broadcast not found".into()));
        }
        Ok(())
    }
}
