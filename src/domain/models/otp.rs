use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow, Clone)]
pub struct OtpRecord {
    pub key: String,
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
}

pub fn email_otp_key(event_id: &str, email: &str) -> String {
    format!("otp:{}:{}", event_id, email)
}

pub fn phone_otp_key(event_id: &str, email: &str) -> String {
    format!("phone:{}:{}", event_id, email)
}
