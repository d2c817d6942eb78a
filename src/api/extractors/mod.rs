pub mod attendee_auth;
pub mod auth;
pub mod event;
