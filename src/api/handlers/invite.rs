use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use chrono::Utc;
use crate::state::AppState;
use crate::api::dtos::{
    requests::{CreateInviteRequest, GuestListQuery, ImportInvitesRequest, UpdateInviteRequest},
    responses::SendPendingResponse,
};
use crate::api::extractors::{auth::AdminAuth, event::EventScope};
use crate::domain::models::{
    invite::{normalize_email, Invite},
    job::{Job, JOB_INVITE_EMAIL},
};
use crate::domain::services::guest_list::{build_guests, list_guests, GuestListParams};
use crate::domain::ports::ImportCounts;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn list_invites(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Query(query): Query<GuestListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let invites = state.invite_repo.list_by_event(&event.id).await?;
    let attendees = state.attendee_repo.list_by_event(&event.id).await?;

    let params = GuestListParams::from_raw(
        query.q.as_deref(),
        query.status.as_deref(),
        query.sort.as_deref(),
        query.page,
        query.page_size,
    );

    Ok(Json(list_guests(build_guests(invites, attendees), &params)))
}

pub async fn create_invite(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Json(payload): Json<CreateInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email)
        .ok_or_else(|| AppError::Validation("Invalid email".into()))?;

    let invite = Invite::new(event.id.clone(), email, payload.contact());
    let created = state.invite_repo.create(&invite).await?;

    info!("Created invite {} for event {}", created.id, event.id);
    Ok(Json(created))
}

pub async fn import_invites(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Json(payload): Json<ImportInvitesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut skipped = 0;
    let rows: Vec<Invite> = payload.rows.iter()
        .filter_map(|row| match normalize_email(&row.email) {
            Some(email) => Some(Invite::new(event.id.clone(), email, row.contact())),
            None => {
                skipped += 1;
                None
            }
        })
        .collect();

    let counts = state.invite_repo.import(&event.id, &rows).await?;
    let counts = ImportCounts { skipped, ..counts };

    info!(
        "Imported invites for event {}: {} created, {} updated, {} skipped",
        event.id, counts.created, counts.updated, counts.skipped
    );
    Ok(Json(counts))
}

pub async fn update_invite(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, invite_id)): Path<(String, String)>,
    Json(payload): Json<UpdateInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut invite = state.invite_repo.find_by_id(&event.id, &invite_id).await?
        .ok_or_else(|| AppError::NotFound("Invite not found".into()))?;

    if let Some(raw) = &payload.email {
        invite.email = normalize_email(raw)
            .ok_or_else(|| AppError::Validation("Invalid email".into()))?;
    }
    invite.apply_contact(payload.contact());

    let updated = state.invite_repo.update(&invite).await?;
    info!("Updated invite {}", invite_id);
    Ok(Json(updated))
}

pub async fn delete_invite(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, invite_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    // the attendee row, if any, is intentionally left in place
    state.invite_repo.delete(&event.id, &invite_id).await?;
    info!("Deleted invite {}", invite_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn send_invite(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, invite_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let invite = state.invite_repo.find_by_id(&event.id, &invite_id).await?
        .ok_or_else(|| AppError::NotFound("Invite not found".into()))?;

    let sent = dispatch_invite(&state, invite).await?;
    info!("Queued invitation {} to {}", sent.id, sent.email);
    Ok(Json(sent))
}

pub async fn resend_invite(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, invite_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let invite = state.invite_repo.find_by_id(&event.id, &invite_id).await?
        .ok_or_else(|| AppError::NotFound("Invite not found".into()))?;

    if invite.last_sent_at.is_none() {
        warn!("Resend requested for never-sent invite {}", invite.id);
    }

    let sent = dispatch_invite(&state, invite).await?;
    info!("Re-queued invitation {} to {}", sent.id, sent.email);
    Ok(Json(sent))
}

pub async fn send_pending(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    let pending = state.invite_repo.list_pending(&event.id).await?;
    let mut sent = 0;

    for invite in pending {
        dispatch_invite(&state, invite).await?;
        sent += 1;
    }

    info!("Queued {} pending invitations for event {}", sent, event.id);
    Ok(Json(SendPendingResponse { sent }))
}

/// Marks the invite sent and queues its email in the same transaction.
async fn dispatch_invite(state: &AppState, mut invite: Invite) -> Result<Invite, AppError> {
    let now = Utc::now();
    invite.mark_sent(now);

    let job = Job::delivery(JOB_INVITE_EMAIL, &invite.event_id, &invite.id, Some(invite.email.clone()), now);

    state.invite_repo.mark_sent(&invite, &job).await
}
