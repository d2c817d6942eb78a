use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{attendee, auth, broadcast, event, health, invite, itinerary, job, mobile, room};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
    services::ServeDir,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/health", get(health::health_check))

        // Admin auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))

        // Events
        .route("/api/events", get(event::list_events).post(event::create_event))
        .route("/api/events/{event_id}", get(event::get_event).put(event::update_event).delete(event::delete_event))

        // Invites & guest list
        .route("/api/events/{event_id}/invites", get(invite::list_invites).post(invite::create_invite))
        .route("/api/events/{event_id}/invites/import", post(invite::import_invites))
        .route("/api/events/{event_id}/invites/send-pending", post(invite::send_pending))
        .route("/api/events/{event_id}/invites/{invite_id}", put(invite::update_invite).delete(invite::delete_invite))
        .route("/api/events/{event_id}/invites/{invite_id}/send", post(invite::send_invite))
        .route("/api/events/{event_id}/invites/{invite_id}/resend", post(invite::resend_invite))

        .route("/api/events/{event_id}/attendees", get(attendee::list_attendees))

        // Rooms
        .route("/api/events/{event_id}/rooms", get(room::list_rooms).post(room::create_room))
        .route("/api/events/{event_id}/rooms/assign", post(room::assign_room))
        .route("/api/events/{event_id}/rooms/clear", post(room::clear_slot))
        .route("/api/events/{event_id}/rooms/{room_id}", put(room::update_room).delete(room::delete_room))
        .route("/api/events/{event_id}/rooms/{room_id}/unassign", delete(room::unassign_slot))

        // Itinerary
        .route("/api/events/{event_id}/itinerary", get(itinerary::list_items).post(itinerary::create_item))
        .route("/api/events/{event_id}/itinerary/{item_id}", put(itinerary::update_item).delete(itinerary::delete_item))

        // Broadcasts
        .route("/api/events/{event_id}/broadcasts", get(broadcast::list_broadcasts).post(broadcast::create_broadcast))
        .route("/api/events/{event_id}/broadcasts/{broadcast_id}", delete(broadcast::delete_broadcast))
        .route("/api/events/{event_id}/broadcasts/{broadcast_id}/send", post(broadcast::send_broadcast))

        // Delivery outbox
        .route("/api/events/{event_id}/jobs", get(job::list_jobs))
        .route("/api/events/{event_id}/jobs/{job_id}/retry", post(job::retry_job))

        // Attendee app
        .route("/api/mobile/auth/request-otp", post(mobile::request_otp))
        .route("/api/mobile/auth/verify-otp", post(mobile::verify_otp))
        .route("/api/mobile/profile", get(mobile::get_profile).put(mobile::update_profile))
        .route("/api/mobile/profile/accept", post(mobile::accept_invitation))
        .route(
            "/api/mobile/profile/id-document",
            post(mobile::upload_id_document).layer(DefaultBodyLimit::max(mobile::DOCUMENT_BODY_LIMIT)),
        )
        .route("/api/mobile/phone/request-otp", post(mobile::request_phone_otp))
        .route("/api/mobile/phone/verify", post(mobile::verify_phone))
        .route("/api/mobile/itinerary", get(mobile::itinerary))
        .route("/api/mobile/broadcasts", get(mobile::broadcasts))
        .route("/api/mobile/room", get(mobile::my_room))

        .nest_service("/uploads", uploads)

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                        attendee = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
