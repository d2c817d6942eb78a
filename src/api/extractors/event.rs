use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use crate::domain::models::event::Event;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// Resolves the `{event_id}` path segment to an existing event.
pub struct EventScope(pub Event);

impl FromRequestParts<Arc<AppState>> for EventScope {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid path".into()))?;

        let event_id = params.get("event_id")
            .ok_or_else(|| AppError::Validation("Missing event id".into()))?;

        state.event_repo.find_by_id(event_id).await?
            .map(EventScope)
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }
}
