use crate::domain::{models::otp::OtpRecord, ports::OtpRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresOtpRepo { pool: PgPool }
impl PostgresOtpRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl OtpRepository for PostgresOtpRepo {
    async fn upsert(&self, record: &OtpRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO otp_codes (key, code_hash, attempts, expires_at) VALUES ($1, $2, $3, $4)
             ON CONFLICT (key) DO UPDATE SET code_hash = excluded.code_hash, attempts = excluded.attempts, expires_at = excluded.expires_at"
        )
            .bind(&record.key)
            .bind(&record.code_hash)
            .bind(record.attempts)
            .bind(record.expires_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find(&self, key: &str) -> Result<Option<OtpRecord>, AppError> {
        sqlx::query_as::<_, OtpRecord>("SELECT key, code_hash, attempts, expires_at FROM otp_codes WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn claim_attempt(&self, key: &str, max_attempts: i32, now: DateTime<Utc>) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "UPDATE otp_codes SET attempts = attempts + 1
             WHERE key = $1 AND attempts < $2 AND expires_at > $3
             RETURNING code_hash"
        )
            .bind(key)
            .bind(max_attempts)
            .bind(now)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE key = $1")
            .bind(key)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
