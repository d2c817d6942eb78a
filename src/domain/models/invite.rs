use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Raw lifecycle field persisted on the invite row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Sent,
    Accepted,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: String,
    pub event_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct InviteContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

impl Invite {
    pub fn new(event_id: String, email: String, contact: InviteContact) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            email,
            first_name: contact.first_name,
            last_name: contact.last_name,
            phone: contact.phone,
            country_code: contact.country_code,
            status: InviteStatus::Pending,
            created_at: Utc::now(),
            last_sent_at: None,
            accepted_at: None,
        }
    }

    /// Records a send or resend. Any earlier state, accepted included, becomes `sent`.
    pub fn mark_sent(&mut self, at: DateTime<Utc>) {
        self.status = InviteStatus::Sent;
        self.last_sent_at = Some(at);
    }

    pub fn mark_accepted(&mut self, at: DateTime<Utc>) {
        self.status = InviteStatus::Accepted;
        self.accepted_at = Some(at);
    }

    /// Overwrites contact fields that are present in `contact`.
    pub fn apply_contact(&mut self, contact: InviteContact) {
        if contact.first_name.is_some() { self.first_name = contact.first_name; }
        if contact.last_name.is_some() { self.last_name = contact.last_name; }
        if contact.phone.is_some() { self.phone = contact.phone; }
        if contact.country_code.is_some() { self.country_code = contact.country_code; }
    }
}

/// Trims and lower-cases an address; `None` when it cannot be an email.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return None;
    }
    Some(email)
}
