pub mod attendee;
pub mod auth;
pub mod broadcast;
pub mod event;
pub mod invite;
pub mod itinerary;
pub mod job;
pub mod otp;
pub mod room;
pub mod user;
