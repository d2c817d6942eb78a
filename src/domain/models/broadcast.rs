use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastChannel {
    Email,
    Sms,
    Push,
}

impl BroadcastChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastChannel::Email => "email",
            BroadcastChannel::Sms => "sms",
            BroadcastChannel::Push => "push",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "email" => Some(BroadcastChannel::Email),
            "sms" => Some(BroadcastChannel::Sms),
            "push" => Some(BroadcastChannel::Push),
            _ => None,
        }
    }
}

pub const BROADCAST_DRAFT: &str = "draft";
pub const BROADCAST_SENT: &str = "sent";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub id: String,
    pub event_id: String,
    pub title: String,
    pub body: String,
    pub channel: String,
    pub status: String,
    pub recipient_count: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Broadcast {
    pub fn new(event_id: String, title: String, body: String, channel: BroadcastChannel) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            title,
            body,
            channel: channel.as_str().to_string(),
            status: BROADCAST_DRAFT.to_string(),
            recipient_count: 0,
            sent_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == BROADCAST_SENT
    }
}
