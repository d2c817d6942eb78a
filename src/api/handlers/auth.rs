use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::LoginRequest;
use crate::api::extractors::auth::AdminAuth;
use crate::domain::models::{
    auth::{AuthResponse, SessionTokens, UserProfile},
    user::AdminUser,
};
use crate::domain::services::auth_service::{ACCESS_TOKEN_MINUTES, REFRESH_TOKEN_DAYS};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::{info, warn};

const ACCESS_COOKIE: &str = "access_token";
const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/auth";

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, session) = state.auth_service.login(&payload.username, &payload.password).await?;
    info!("Admin logged in: {}", user.id);
    Ok(Json(start_session(&cookies, user, session)))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let raw_token = cookies.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let (user, session) = state.auth_service.refresh(&raw_token).await?;
    info!("Token refreshed for admin: {}", user.id);
    Ok(Json(start_session(&cookies, user, session)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = cookies.get(REFRESH_COOKIE) {
        if let Err(e) = state.auth_service.logout(cookie.value()).await {
            warn!("Refresh token revoke failed on logout: {}", e);
        }
    }

    cookies.remove(Cookie::build((ACCESS_COOKIE, "")).path("/").into());
    cookies.remove(Cookie::build((REFRESH_COOKIE, "")).path(REFRESH_COOKIE_PATH).into());

    info!("Admin logged out");
    Ok(StatusCode::OK)
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AdminAuth(claims): AdminAuth,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&claims.sub).await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(UserProfile::from(user)))
}

/// Sets both session cookies and returns the body carrying the CSRF token.
fn start_session(cookies: &Cookies, user: AdminUser, session: SessionTokens) -> AuthResponse {
    cookies.add(session_cookie(ACCESS_COOKIE, session.access_token, "/", Duration::minutes(ACCESS_TOKEN_MINUTES)));
    cookies.add(session_cookie(REFRESH_COOKIE, session.refresh_token, REFRESH_COOKIE_PATH, Duration::days(REFRESH_TOKEN_DAYS)));

    AuthResponse {
        csrf_token: session.csrf_token,
        user: user.into(),
    }
}

fn session_cookie(name: &'static str, value: String, path: &'static str, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path(path);
    cookie.set_max_age(max_age);
    cookie
}
