use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::{job::Job, room::RoomView};
use crate::domain::services::room_assignment::SlotRef;
use crate::error::error_body;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPendingResponse {
    pub sent: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequestedResponse {
    pub expires_in: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileRoomResponse {
    pub room: Option<RoomView>,
    pub slot: Option<i32>,
}

/// Delivery job as shown on the event's outbox page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: String,
    pub job_type: String,
    pub target_id: String,
    pub recipient: Option<String>,
    pub status: String,
    pub attempts: i32,
    pub error_message: Option<String>,
    pub execute_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        let target = job.payload.0;
        Self {
            id: job.id,
            job_type: job.job_type,
            target_id: target.target_id,
            recipient: target.recipient,
            status: job.status,
            attempts: job.attempts,
            error_message: job.error_message,
            execute_at: job.execute_at,
            created_at: job.created_at,
        }
    }
}

/// 400 body for an attendee already placed in another room.
pub struct AlreadyAssigned(pub SlotRef);

impl IntoResponse for AlreadyAssigned {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;
        let mut body = error_body(status, "ALREADY_ASSIGNED", "Attendee is already assigned to another room");
        body["alreadyAssigned"] = serde_json::json!(self.0);
        (status, Json(body)).into_response()
    }
}
