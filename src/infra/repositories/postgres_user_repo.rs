use crate::domain::{models::user::AdminUser, ports::UserRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, username, password_hash, role, last_login_at, created_at";

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepo {
    async fn create(&self, user: &AdminUser) -> Result<AdminUser, AppError> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "INSERT INTO admin_users ({}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS, USER_COLUMNS
        ))
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.role)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError> {
        sqlx::query_as::<_, AdminUser>(&format!("SELECT {} FROM admin_users WHERE username = $1", USER_COLUMNS))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AdminUser>, AppError> {
        sqlx::query_as::<_, AdminUser>(&format!("SELECT {} FROM admin_users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE admin_users SET last_login_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
