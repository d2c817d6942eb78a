pub mod attendee;
pub mod auth;
pub mod broadcast;
pub mod event;
pub mod health;
pub mod invite;
pub mod itinerary;
pub mod job;
pub mod mobile;
pub mod room;
