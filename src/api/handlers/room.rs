use axum::{extract::{Path, Query, State}, response::{IntoResponse, Response}, Json};
use crate::state::AppState;
use crate::api::dtos::{
    requests::{non_blank, AssignRoomRequest, ClearSlotRequest, CreateRoomRequest, UnassignQuery, UpdateRoomRequest},
    responses::AlreadyAssigned,
};
use crate::api::extractors::{auth::AdminAuth, event::EventScope};
use crate::domain::models::{
    event::Event,
    room::{Room, RoomView, MAX_GUESTS_PER_ROOM, MIN_GUESTS_PER_ROOM},
};
use crate::domain::services::room_assignment::AssignmentOutcome;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    let rooms = state.room_repo.list_by_event(&event.id).await?;
    let assignments = state.room_repo.list_assignments(&event.id).await?;

    let views: Vec<RoomView> = rooms.into_iter()
        .map(|room| RoomView::build(room, &assignments))
        .collect();
    Ok(Json(views))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let room_no = payload.room_no.trim().to_string();
    if room_no.is_empty() {
        return Err(AppError::Validation("Room number is required".into()));
    }
    validate_capacity(payload.max_guests)?;

    let room = Room::new(event.id.clone(), room_no, non_blank(&payload.category), payload.max_guests);
    let created = state.room_repo.create(&room).await?;

    info!("Created room {} ({}) for event {}", created.room_no, created.id, event.id);
    room_view(&state, &event, created).await
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, room_id)): Path<(String, String)>,
    Json(payload): Json<UpdateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut room = find_room(&state, &event, &room_id).await?;

    if let Some(room_no) = non_blank(&payload.room_no) { room.room_no = room_no; }
    if payload.category.is_some() { room.category = non_blank(&payload.category); }
    if let Some(max_guests) = payload.max_guests {
        validate_capacity(max_guests)?;
        room.max_guests = max_guests;
    }

    let updated = state.room_repo.update(&room).await?;
    info!("Updated room {}", room_id);
    room_view(&state, &event, updated).await
}

pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, room_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.room_repo.delete(&event.id, &room_id).await?;
    info!("Deleted room {}", room_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn assign_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Json(payload): Json<AssignRoomRequest>,
) -> Result<Response, AppError> {
    let attendee_id = non_blank(&payload.attendee_id);
    if let Some(id) = &attendee_id {
        state.attendee_repo.find_by_id(&event.id, id).await?
            .ok_or_else(|| AppError::NotFound("Attendee not found".into()))?;
    }

    set_slot(&state, &event, &payload.room_id, payload.slot, attendee_id.as_deref()).await
}

pub async fn clear_slot(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Json(payload): Json<ClearSlotRequest>,
) -> Result<Response, AppError> {
    set_slot(&state, &event, &payload.room_id, payload.slot, None).await
}

pub async fn unassign_slot(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, room_id)): Path<(String, String)>,
    Query(query): Query<UnassignQuery>,
) -> Result<Response, AppError> {
    set_slot(&state, &event, &room_id, query.slot, None).await
}

async fn set_slot(
    state: &AppState,
    event: &Event,
    room_id: &str,
    slot: i32,
    attendee_id: Option<&str>,
) -> Result<Response, AppError> {
    let room = find_room(state, event, room_id).await?;
    if !room.has_slot(slot) {
        return Err(AppError::Validation(format!("Slot must be between 1 and {}", room.max_guests)));
    }

    match state.room_repo.apply_assignment(&event.id, room_id, slot, attendee_id).await? {
        AssignmentOutcome::Conflict(at) => Ok(AlreadyAssigned(at).into_response()),
        AssignmentOutcome::Applied => {
            match attendee_id {
                Some(id) => info!("Assigned attendee {} to room {} slot {}", id, room.room_no, slot),
                None => info!("Cleared room {} slot {}", room.room_no, slot),
            }
            Ok(room_view(state, event, room).await?.into_response())
        }
    }
}

async fn find_room(state: &AppState, event: &Event, room_id: &str) -> Result<Room, AppError> {
    state.room_repo.find_by_id(&event.id, room_id).await?
        .ok_or_else(|| AppError::NotFound("Room not found".into()))
}

async fn room_view(state: &AppState, event: &Event, room: Room) -> Result<Json<RoomView>, AppError> {
    let assignments = state.room_repo.list_assignments(&event.id).await?;
    Ok(Json(RoomView::build(room, &assignments)))
}

fn validate_capacity(max_guests: i32) -> Result<(), AppError> {
    if !(MIN_GUESTS_PER_ROOM..=MAX_GUESTS_PER_ROOM).contains(&max_guests) {
        return Err(AppError::Validation(format!(
            "maxGuests must be between {} and {}",
            MIN_GUESTS_PER_ROOM, MAX_GUESTS_PER_ROOM
        )));
    }
    Ok(())
}
