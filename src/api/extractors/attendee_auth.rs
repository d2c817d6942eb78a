use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::state::AppState;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

/// Guest signed in through the email OTP flow. The token is scoped to one event.
pub struct AttendeeAuth {
    pub event_id: String,
    pub email: String,
}

impl<S> FromRequestParts<S> for AttendeeAuth
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = app_state.auth_service.decode_attendee(token.trim())?;

        Span::current().record("attendee", claims.sub.as_str());

        Ok(AttendeeAuth {
            event_id: claims.event_id,
            email: claims.sub,
        })
    }
}
