use std::sync::Arc;
use crate::domain::ports::{
    AttendeeRepository, BroadcastRepository, EmailService, EventRepository, FileStorage,
    InviteRepository, ItineraryRepository, JobRepository, RoomRepository, SmsService,
    UserRepository,
};
use crate::domain::services::{auth_service::AuthService, otp_service::OtpService};
use crate::config::Config;
use tera::Tera;

/// Shared handles for handlers and the job worker. Token and OTP storage are
/// only reached through their services.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub invite_repo: Arc<dyn InviteRepository>,
    pub attendee_repo: Arc<dyn AttendeeRepository>,
    pub room_repo: Arc<dyn RoomRepository>,
    pub itinerary_repo: Arc<dyn ItineraryRepository>,
    pub broadcast_repo: Arc<dyn BroadcastRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub auth_service: Arc<AuthService>,
    pub otp_service: Arc<OtpService>,
    pub email_service: Arc<dyn EmailService>,
    pub sms_service: Arc<dyn SmsService>,
    pub file_storage: Arc<dyn FileStorage>,
    pub templates: Arc<Tera>,
}
