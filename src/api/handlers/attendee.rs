use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AdminAuth, event::EventScope};
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_attendees(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    let attendees = state.attendee_repo.list_by_event(&event.id).await?;
    Ok(Json(attendees))
}
