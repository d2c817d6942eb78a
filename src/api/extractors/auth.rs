use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, Method},
};
use crate::state::AppState;
use crate::domain::models::auth::AdminClaims;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Console admin authenticated by the `access_token` cookie.
/// State-changing requests must also echo the CSRF token from the JWT.
pub struct AdminAuth(pub AdminClaims);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(AppError::Internal)?;

        let access_token = cookies.get("access_token")
            .ok_or(AppError::Unauthorized)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = app_state.auth_service.decode_admin(&access_token)?;

        if !matches!(parts.method, Method::GET | Method::HEAD | Method::OPTIONS) {
            let csrf_header_val = parts.headers.get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| AppError::Forbidden("Missing CSRF token".into()))?;

            if csrf_header_val != claims.csrf_token {
                return Err(AppError::Forbidden("CSRF token mismatch".into()));
            }
        }

        Span::current().record("user_id", claims.sub.as_str());

        Ok(AdminAuth(claims))
    }
}
