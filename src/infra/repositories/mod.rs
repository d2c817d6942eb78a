pub mod sqlite_attendee_repo;
pub mod sqlite_auth_repo;
pub mod sqlite_broadcast_repo;
pub mod sqlite_event_repo;
pub mod sqlite_invite_repo;
pub mod sqlite_itinerary_repo;
pub mod sqlite_job_repo;
pub mod sqlite_otp_repo;
pub mod sqlite_room_repo;
pub mod sqlite_user_repo;

pub mod postgres_attendee_repo;
pub mod postgres_auth_repo;
pub mod postgres_broadcast_repo;
pub mod postgres_event_repo;
pub mod postgres_invite_repo;
pub mod postgres_itinerary_repo;
pub mod postgres_job_repo;
pub mod postgres_otp_repo;
pub mod postgres_room_repo;
pub mod postgres_user_repo;
