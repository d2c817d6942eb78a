use crate::domain::{models::{invite::Invite, job::Job}, ports::{ImportCounts, InviteRepository}};
use crate::error::AppError;
use crate::infra::repositories::sqlite_job_repo::enqueue;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteInviteRepo {
    pool: SqlitePool,
}

impl SqliteInviteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const INVITE_COLUMNS: &str = "id, event_id, email, first_name, last_name, phone, country_code, status, created_at, last_sent_at, accepted_at";

#[async_trait]
impl InviteRepository for SqliteInviteRepo {
    async fn create(&self, invite: &Invite) -> Result<Invite, AppError> {
        sqlx::query_as::<_, Invite>(
            "INSERT INTO invites (id, event_id, email, first_name, last_name, phone, country_code, status, created_at, last_sent_at, accepted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
            .bind(&invite.id)
            .bind(&invite.event_id)
            .bind(&invite.email)
            .bind(&invite.first_name)
            .bind(&invite.last_name)
            .bind(&invite.phone)
            .bind(&invite.country_code)
            .bind(invite.status)
            .bind(invite.created_at)
            .bind(invite.last_sent_at)
            .bind(invite.accepted_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Invite>, AppError> {
        sqlx::query_as::<_, Invite>(&format!("SELECT {} FROM invites WHERE event_id = ? AND id = ?", INVITE_COLUMNS))
            .bind(event_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_email(&self, event_id: &str, email: &str) -> Result<Option<Invite>, AppError> {
        sqlx::query_as::<_, Invite>(&format!("SELECT {} FROM invites WHERE event_id = ? AND email = ?", INVITE_COLUMNS))
            .bind(event_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Invite>, AppError> {
        sqlx::query_as::<_, Invite>(&format!("SELECT {} FROM invites WHERE event_id = ? ORDER BY created_at DESC", INVITE_COLUMNS))
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_pending(&self, event_id: &str) -> Result<Vec<Invite>, AppError> {
        sqlx::query_as::<_, Invite>(&format!("SELECT {} FROM invites WHERE event_id = ? AND status = 'pending' ORDER BY created_at ASC", INVITE_COLUMNS))
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn import(&self, event_id: &str, rows: &[Invite]) -> Result<ImportCounts, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut counts = ImportCounts::default();

        for row in rows {
            let updated = sqlx::query(
                "UPDATE invites SET
                    first_name = COALESCE(?, first_name),
                    last_name = COALESCE(?, last_name),
                    phone = COALESCE(?, phone),
                    country_code = COALESCE(?, country_code)
                 WHERE event_id = ? AND email = ?"
            )
                .bind(&row.first_name)
                .bind(&row.last_name)
                .bind(&row.phone)
                .bind(&row.country_code)
                .bind(event_id)
                .bind(&row.email)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;

            if updated.rows_affected() > 0 {
                counts.updated += 1;
                continue;
            }

            sqlx::query(
                "INSERT INTO invites (id, event_id, email, first_name, last_name, phone, country_code, status, created_at, last_sent_at, accepted_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            )
                .bind(&row.id)
                .bind(event_id)
                .bind(&row.email)
                .bind(&row.first_name)
                .bind(&row.last_name)
                .bind(&row.phone)
                .bind(&row.country_code)
                .bind(row.status)
                .bind(row.created_at)
                .bind(row.last_sent_at)
                .bind(row.accepted_at)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            counts.created += 1;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(counts)
    }

    async fn update(&self, invite: &Invite) -> Result<Invite, AppError> {
        sqlx::query_as::<_, Invite>(
            "UPDATE invites SET email=?, first_name=?, last_name=?, phone=?, country_code=?, status=?, last_sent_at=?, accepted_at=?
             WHERE id=? AND event_id=? RETURNING *"
        )
            .bind(&invite.email)
            .bind(&invite.first_name)
            .bind(&invite.last_name)
            .bind(&invite.phone)
            .bind(&invite.country_code)
            .bind(invite.status)
            .bind(invite.last_sent_at)
            .bind(invite.accepted_at)
            .bind(&invite.id)
            .bind(&invite.event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_sent(&self, invite: &Invite, job: &Job) -> Result<Invite, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, Invite>(
            "UPDATE invites SET status=?, last_sent_at=? WHERE id=? AND event_id=? RETURNING *"
        )
            .bind(invite.status)
            .bind(invite.last_sent_at)
            .bind(&invite.id)
            .bind(&invite.event_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        enqueue(&mut *tx, job).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM invites WHERE id = ? AND event_id = ?")
            .bind(id)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invite not found".into()));
        }
        Ok(())
    }
}
