use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "ADMIN";

/// A console operator. Attendees never get a row here.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn seeded(username: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
            last_login_at: None,
            created_at: Utc::now(),
        }
    }
}
