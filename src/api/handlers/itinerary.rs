use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{non_blank, CreateItineraryRequest, UpdateItineraryRequest};
use crate::api::extractors::{auth::AdminAuth, event::EventScope};
use crate::domain::models::itinerary::ItineraryItem;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    let items = state.itinerary_repo.list_by_event(&event.id).await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Json(payload): Json<CreateItineraryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if payload.ends_at < payload.starts_at {
        return Err(AppError::Validation("End must not be before start".into()));
    }

    let item = ItineraryItem::new(
        event.id.clone(),
        title,
        non_blank(&payload.description),
        non_blank(&payload.location),
        payload.starts_at,
        payload.ends_at,
    );

    let created = state.itinerary_repo.create(&item).await?;
    info!("Created itinerary item {} for event {}", created.id, event.id);
    Ok(Json(created))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, item_id)): Path<(String, String)>,
    Json(payload): Json<UpdateItineraryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut item = state.itinerary_repo.find_by_id(&event.id, &item_id).await?
        .ok_or_else(|| AppError::NotFound("Itinerary item not found".into()))?;

    if let Some(title) = non_blank(&payload.title) { item.title = title; }
    if payload.description.is_some() { item.description = non_blank(&payload.description); }
    if payload.location.is_some() { item.location = non_blank(&payload.location); }
    if let Some(starts_at) = payload.starts_at { item.starts_at = starts_at; }
    if let Some(ends_at) = payload.ends_at { item.ends_at = ends_at; }

    if item.ends_at < item.starts_at {
        return Err(AppError::Validation("End must not be before start".into()));
    }

    let updated = state.itinerary_repo.update(&item).await?;
    info!("Updated itinerary item {}", item_id);
    Ok(Json(updated))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
    Path((_, item_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.itinerary_repo.delete(&event.id, &item_id).await?;
    info!("Deleted itinerary item {}", item_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
