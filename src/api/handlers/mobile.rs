use axum::{extract::{multipart::MultipartError, Multipart, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use tera::Context;
use uuid::Uuid;
use crate::state::AppState;
use crate::api::dtos::{
    requests::{non_blank, RequestOtpRequest, UpdateProfileRequest, VerifyOtpRequest, VerifyPhoneRequest},
    responses::{MobileRoomResponse, OtpRequestedResponse},
};
use crate::api::extractors::attendee_auth::AttendeeAuth;
use crate::background::render_template;
use crate::domain::models::{
    attendee::{Attendee, TASK_BASIC, TASK_ID, TASK_PHONE},
    auth::AttendeeTokenResponse,
    invite::{normalize_email, Invite},
    otp::{email_otp_key, phone_otp_key},
    room::RoomView,
};
use crate::domain::services::auth_service::ATTENDEE_TOKEN_DAYS;
use crate::error::AppError;
use crate::infra::factory::OTP_TEMPLATE;
use std::sync::Arc;
use tracing::{info, warn};

pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
/// Request body cap on the upload route. Files between the two limits reach
/// the document size check; larger bodies fail while the multipart is read.
pub const DOCUMENT_BODY_LIMIT: usize = 2 * MAX_DOCUMENT_BYTES;

pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email)
        .ok_or_else(|| AppError::Validation("Invalid email".into()))?;

    let event = state.event_repo.find_by_id(&payload.event_id).await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    state.invite_repo.find_by_email(&event.id, &email).await?
        .ok_or_else(|| AppError::NotFound("No invitation found for this email".into()))?;

    let code = state.otp_service.issue(&email_otp_key(&event.id, &email)).await?;

    let mut context = Context::new();
    context.insert("event_name", &event.name);
    context.insert("code", &code);
    context.insert("ttl_minutes", &(state.otp_service.ttl_secs() / 60).max(1));
    let html = render_template(&state.templates, OTP_TEMPLATE, &context)?;

    // delivery problems must not reveal anything to the caller
    if let Err(e) = state.email_service.send(&email, &format!("Your {} sign-in code", event.name), &html).await {
        warn!("OTP email to {} failed: {}", email, e);
    }

    Ok(Json(OtpRequestedResponse { expires_in: state.otp_service.ttl_secs() }))
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email)
        .ok_or_else(|| AppError::Validation("Invalid email".into()))?;

    state.otp_service.verify(&email_otp_key(&payload.event_id, &email), &payload.code).await?;

    let access_token = state.auth_service.issue_attendee_token(&payload.event_id, &email)?;
    info!("Attendee {} signed in to event {}", email, payload.event_id);

    Ok(Json(AttendeeTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: ATTENDEE_TOKEN_DAYS * 24 * 60 * 60,
    }))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
) -> Result<impl IntoResponse, AppError> {
    let attendee = load_or_create_attendee(&state, &auth).await?;
    Ok(Json(attendee))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut attendee = load_or_create_attendee(&state, &auth).await?;

    if payload.first_name.is_some() { attendee.first_name = non_blank(&payload.first_name); }
    if payload.last_name.is_some() { attendee.last_name = non_blank(&payload.last_name); }
    if payload.phone.is_some() {
        let phone = non_blank(&payload.phone);
        if phone != attendee.phone {
            attendee.phone_verified = false;
            attendee.set_task(TASK_PHONE, false);
        }
        attendee.phone = phone;
    }
    if payload.work_email.is_some() { attendee.work_email = non_blank(&payload.work_email); }
    if payload.location.is_some() { attendee.location = non_blank(&payload.location); }
    if payload.gender.is_some() { attendee.gender = non_blank(&payload.gender); }
    if payload.dietary_requirements.is_some() {
        attendee.dietary_requirements = non_blank(&payload.dietary_requirements);
    }

    if attendee.has_basic_profile() {
        attendee.set_task(TASK_BASIC, true);
    }

    let updated = state.attendee_repo.update(&attendee).await?;
    info!("Profile updated for attendee {}", updated.id);
    Ok(Json(updated))
}

pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
) -> Result<impl IntoResponse, AppError> {
    let mut attendee = load_or_create_attendee(&state, &auth).await?;
    let mut invite = find_invite(&state, &auth).await?;

    let now = Utc::now();
    if attendee.accepted_at.is_none() {
        attendee.accepted_at = Some(now);
    }
    invite.mark_accepted(attendee.accepted_at.unwrap_or(now));

    let accepted = state.attendee_repo.accept(&attendee, &invite).await?;
    info!("Attendee {} accepted invitation {}", accepted.id, invite.id);
    Ok(Json(accepted))
}

pub async fn upload_id_document(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut attendee = load_or_create_attendee(&state, &auth).await?;

    let mut upload = None;
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let extension = field.file_name().and_then(file_extension);

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if data.len() + chunk.len() > MAX_DOCUMENT_BYTES {
                return Err(document_too_large());
            }
            data.extend_from_slice(&chunk);
        }
        upload = Some((extension, data));
        break;
    }

    let (extension, data) = upload.ok_or_else(|| AppError::Validation("Missing file field".into()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }

    let file_name = format!("{}-{}.{}", attendee.id, Uuid::new_v4(), extension.unwrap_or_else(|| "bin".to_string()));
    let folder = format!("{}/documents", attendee.event_id);
    let url = state.file_storage.save(&folder, &file_name, &data).await?;

    attendee.id_doc_url = Some(url);
    attendee.set_task(TASK_ID, true);

    let updated = state.attendee_repo.update(&attendee).await?;
    info!("ID document stored for attendee {}", updated.id);
    Ok(Json(updated))
}

fn document_too_large() -> AppError {
    AppError::Validation(format!("Uploaded file is too large (max {} MiB)", MAX_DOCUMENT_BYTES / (1024 * 1024)))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return document_too_large();
    }
    AppError::Validation(format!("Invalid multipart body: {}", e))
}

pub async fn request_phone_otp(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
) -> Result<impl IntoResponse, AppError> {
    let attendee = load_or_create_attendee(&state, &auth).await?;
    let phone = attendee.phone.as_deref()
        .ok_or_else(|| AppError::Validation("Add a phone number to your profile first".into()))?;

    let code = state.otp_service.issue(&phone_otp_key(&auth.event_id, &auth.email)).await?;

    if let Err(e) = state.sms_service.send(phone, &format!("Your verification code is {}", code)).await {
        warn!("Phone OTP for attendee {} failed: {}", attendee.id, e);
    }

    Ok(Json(OtpRequestedResponse { expires_in: state.otp_service.ttl_secs() }))
}

pub async fn verify_phone(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
    Json(payload): Json<VerifyPhoneRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut attendee = load_or_create_attendee(&state, &auth).await?;

    state.otp_service.verify(&phone_otp_key(&auth.event_id, &auth.email), &payload.code).await?;

    attendee.phone_verified = true;
    attendee.set_task(TASK_PHONE, true);

    let updated = state.attendee_repo.update(&attendee).await?;
    info!("Phone verified for attendee {}", updated.id);
    Ok(Json(updated))
}

pub async fn itinerary(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
) -> Result<impl IntoResponse, AppError> {
    let items = state.itinerary_repo.list_by_event(&auth.event_id).await?;
    Ok(Json(items))
}

pub async fn broadcasts(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
) -> Result<impl IntoResponse, AppError> {
    let sent = state.broadcast_repo.list_sent(&auth.event_id).await?;
    Ok(Json(sent))
}

pub async fn my_room(
    State(state): State<Arc<AppState>>,
    auth: AttendeeAuth,
) -> Result<impl IntoResponse, AppError> {
    let attendee = load_or_create_attendee(&state, &auth).await?;

    let Some(assignment) = state.room_repo.find_assignment_for_attendee(&auth.event_id, &attendee.id).await? else {
        return Ok(Json(MobileRoomResponse { room: None, slot: None }));
    };

    let room = state.room_repo.find_by_id(&auth.event_id, &assignment.room_id).await?
        .ok_or_else(|| AppError::NotFound("Room not found".into()))?;
    let assignments = state.room_repo.list_assignments(&auth.event_id).await?;

    Ok(Json(MobileRoomResponse {
        room: Some(RoomView::build(room, &assignments)),
        slot: Some(assignment.slot),
    }))
}

async fn find_invite(state: &AppState, auth: &AttendeeAuth) -> Result<Invite, AppError> {
    state.invite_repo.find_by_email(&auth.event_id, &auth.email).await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".into()))
}

/// The attendee record is created on first use, seeded from the invite.
async fn load_or_create_attendee(state: &AppState, auth: &AttendeeAuth) -> Result<Attendee, AppError> {
    if let Some(existing) = state.attendee_repo.find_by_email(&auth.event_id, &auth.email).await? {
        return Ok(existing);
    }

    let invite = find_invite(state, auth).await?;
    match state.attendee_repo.create(&Attendee::from_invite(&invite)).await {
        Ok(created) => {
            info!("Created attendee {} from invite {}", created.id, invite.id);
            Ok(created)
        }
        // a concurrent request created it first
        Err(e) if e.is_unique_violation() => state.attendee_repo.find_by_email(&auth.event_id, &auth.email).await?
            .ok_or(e),
        Err(e) => Err(e),
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::file_extension;

    #[test]
    fn extension_is_sanitised() {
        assert_eq!(file_extension("passport.PNG"), Some("png".to_string()));
        assert_eq!(file_extension("scan.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("evil.p/hp"), None);
    }
}
