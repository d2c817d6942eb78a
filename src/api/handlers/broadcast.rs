use axum::{extract::{Path, State}, response::IntoResponse, Json};
use chrono::Utc;
use crate::state::AppState;
use crate::api::dtos::requests::CreateBroadcastRequest;
use crate::api::extractors::{auth::AdminAuth, event::EventScope};
use crate::domain::models::{
    attendee::Attendee,
    broadcast::{Broadcast, BroadcastChannel, BROADCAST_SENT},
    job::{Job, JOB_BROADCAST},
};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_broadcasts(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    let broadcasts = state.broadcast_repo.list_by_event(&event.id).await?;
    Ok(Json(broadcasts))
}

pub async fn create_broadcast(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Json(payload): Json<CreateBroadcastRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() || payload.body.trim().is_empty() {
        return Err(AppError::Validation("Title and body are required".into()));
    }

    let channel = match payload.channel.as_deref() {
        None => BroadcastChannel::Email,
        Some(raw) => BroadcastChannel::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown channel {}", raw)))?,
    };

    let broadcast = Broadcast::new(event.id.clone(), title, payload.body, channel);
    let created = state.broadcast_repo.create(&broadcast).await?;

    info!("Created {} broadcast {} for event {}", created.channel, created.id, event.id);
    Ok(Json(created))
}

pub async fn delete_broadcast(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, broadcast_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.broadcast_repo.delete(&event.id, &broadcast_id).await?;
    info!("Deleted broadcast {}", broadcast_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn send_broadcast(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, broadcast_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut broadcast = state.broadcast_repo.find_by_id(&event.id, &broadcast_id).await?
        .ok_or_else(|| AppError::NotFound("Broadcast not found".into()))?;

    if broadcast.is_sent() {
        return Err(AppError::Conflict("Broadcast already sent".into()));
    }

    let channel = BroadcastChannel::parse(&broadcast.channel)
        .ok_or_else(|| AppError::InternalWithMsg(format!("Stored broadcast has unknown channel {}", broadcast.channel)))?;

    let now = Utc::now();
    let attendees = state.attendee_repo.list_by_event(&event.id).await?;
    let jobs: Vec<Job> = attendees.iter()
        .filter(|a| reachable(a, channel))
        .map(|a| Job::delivery(JOB_BROADCAST, &event.id, &broadcast.id, Some(a.id.clone()), now))
        .collect();

    broadcast.status = BROADCAST_SENT.to_string();
    broadcast.recipient_count = jobs.len() as i32;
    broadcast.sent_at = Some(now);

    let sent = state.broadcast_repo.mark_sent(&broadcast, jobs).await?;
    info!("Broadcast {} queued for {} recipients", sent.id, sent.recipient_count);
    Ok(Json(sent))
}

fn reachable(attendee: &Attendee, channel: BroadcastChannel) -> bool {
    match channel {
        BroadcastChannel::Sms => attendee.phone.as_deref().is_some_and(|p| !p.trim().is_empty()),
        BroadcastChannel::Email | BroadcastChannel::Push => true,
    }
}
