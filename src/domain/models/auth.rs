use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::user::AdminUser;

pub const ADMIN_AUDIENCE: &str = "admin-console";
pub const ATTENDEE_AUDIENCE: &str = "attendee-app";

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://event-guests.local/claims/role")]
    pub role: String,

    #[serde(rename = "https://event-guests.local/claims/csrf")]
    pub csrf_token: String,
}

/// Bearer claims of a guest who proved ownership of an invited email via OTP.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttendeeClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://event-guests.local/claims/event_id")]
    pub event_id: String,
}

/// Stored form of a refresh token. Rotation marks the row consumed instead of
/// deleting it, so a replayed token can still be traced to its family.
#[derive(Debug, FromRow, Clone)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: String,
    pub family_id: Uuid,
    pub generation_id: i32,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// What a successful login or refresh hands back to the console.
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub csrf_token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<AdminUser> for UserProfile {
    fn from(user: AdminUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
