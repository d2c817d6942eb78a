use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewEventParams {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub cover_image_url: Option<String>,
}

impl Event {
    pub fn new(params: NewEventParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: params.name,
            slug: params.slug,
            description: params.description,
            location: params.location,
            timezone: params.timezone,
            starts_at: params.starts_at,
            ends_at: params.ends_at,
            cover_image_url: params.cover_image_url,
            created_at: Utc::now(),
        }
    }
}
