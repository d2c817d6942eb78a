use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{non_blank, CreateEventRequest, UpdateEventRequest};
use crate::api::extractors::{auth::AdminAuth, event::EventScope};
use crate::domain::models::event::{Event, NewEventParams};
use crate::error::AppError;
use std::sync::Arc;
use chrono_tz::Tz;
use tracing::info;

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim().to_string();
    let slug = payload.slug.trim().to_lowercase();
    if name.is_empty() || slug.is_empty() {
        return Err(AppError::Validation("Name and slug are required".into()));
    }

    let timezone = payload.timezone.unwrap_or_else(|| "UTC".to_string());
    validate_schedule(&timezone, &payload.starts_at, &payload.ends_at)?;

    let event = Event::new(NewEventParams {
        name,
        slug,
        description: non_blank(&payload.description),
        location: non_blank(&payload.location),
        timezone,
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
        cover_image_url: non_blank(&payload.cover_image_url),
    });

    let created = state.event_repo.create(&event).await?;
    info!("Created event {} ({})", created.slug, created.id);
    Ok(Json(created))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_repo.list().await?;
    Ok(Json(events))
}

pub async fn get_event(
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(mut event): EventScope,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(name) = non_blank(&payload.name) { event.name = name; }
    if let Some(slug) = non_blank(&payload.slug) { event.slug = slug.to_lowercase(); }
    if payload.description.is_some() { event.description = non_blank(&payload.description); }
    if payload.location.is_some() { event.location = non_blank(&payload.location); }
    if let Some(tz) = payload.timezone { event.timezone = tz; }
    if let Some(starts_at) = payload.starts_at { event.starts_at = starts_at; }
    if let Some(ends_at) = payload.ends_at { event.ends_at = ends_at; }
    if payload.cover_image_url.is_some() { event.cover_image_url = non_blank(&payload.cover_image_url); }

    validate_schedule(&event.timezone, &event.starts_at, &event.ends_at)?;

    let updated = state.event_repo.update(&event).await?;
    info!("Updated event {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    state.event_repo.delete(&event.id).await?;
    info!("Deleted event {}", event.id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

fn validate_schedule(
    timezone: &str,
    starts_at: &chrono::DateTime<chrono::Utc>,
    ends_at: &chrono::DateTime<chrono::Utc>,
) -> Result<(), AppError> {
    if timezone.parse::<Tz>().is_err() {
        return Err(AppError::Validation("Invalid timezone".into()));
    }
    if ends_at < starts_at {
        return Err(AppError::Validation("End must not be before start".into()));
    }
    Ok(())
}
