use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const JOB_INVITE_EMAIL: &str = "INVITE_EMAIL";
pub const JOB_BROADCAST: &str = "BROADCAST";

pub const JOB_PENDING: &str = "PENDING";

/// Deliveries are tried this many times before the job is parked as FAILED.
pub const MAX_JOB_ATTEMPTS: i32 = 3;
const RETRY_BASE_SECS: i64 = 30;

/// Points a job at the row it delivers (invite or broadcast) and, for
/// broadcasts, the attendee it goes to.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeliveryTarget {
    pub event_id: String,
    pub target_id: String,
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub job_type: String,
    pub payload: Json<DeliveryTarget>,
    pub execute_at: DateTime<Utc>,
    pub status: String,
    pub attempts: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn delivery(job_type: &str, event_id: &str, target_id: &str, recipient: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.to_string(),
            payload: Json(DeliveryTarget {
                event_id: event_id.to_string(),
                target_id: target_id.to_string(),
                recipient,
            }),
            execute_at: at,
            status: JOB_PENDING.to_string(),
            attempts: 0,
            error_message: None,
            created_at: at,
        }
    }

    pub fn target(&self) -> &DeliveryTarget {
        &self.payload.0
    }

    /// When a failed claim should run again, or `None` once attempts are used up.
    /// `attempts` already counts the claim that just failed.
    pub fn next_retry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.attempts >= MAX_JOB_ATTEMPTS {
            return None;
        }
        let backoff = RETRY_BASE_SECS << (self.attempts.max(1) - 1);
        Some(now + Duration::seconds(backoff))
    }
}
