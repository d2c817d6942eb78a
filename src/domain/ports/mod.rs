use crate::domain::models::{
    attendee::Attendee, auth::RefreshTokenRecord, broadcast::Broadcast, event::Event,
    invite::Invite, itinerary::ItineraryItem, job::Job, otp::OtpRecord,
    room::{Room, RoomAssignment}, user::AdminUser,
};
use crate::domain::services::room_assignment::AssignmentOutcome;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &AdminUser) -> Result<AdminUser, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<AdminUser>, AppError>;
    async fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn store_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    /// Marks an unconsumed token as used and returns it. `None` if it is unknown or already used.
    async fn consume_refresh_token(&self, token_hash: &str, at: DateTime<Utc>) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn revoke_family(&self, family_id: Uuid) -> Result<u64, AppError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn upsert(&self, record: &OtpRecord) -> Result<(), AppError>;
    async fn find(&self, key: &str) -> Result<Option<OtpRecord>, AppError>;
    /// Spends one attempt on a live code in a single statement and returns its hash.
    /// `None` when the code is missing, expired or already out of attempts.
    async fn claim_attempt(&self, key: &str, max_attempts: i32, now: DateTime<Utc>) -> Result<Option<String>, AppError>;
    /// Returns whether a row was removed.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn list(&self) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ImportCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &Invite) -> Result<Invite, AppError>;
    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Invite>, AppError>;
    async fn find_by_email(&self, event_id: &str, email: &str) -> Result<Option<Invite>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Invite>, AppError>;
    async fn list_pending(&self, event_id: &str) -> Result<Vec<Invite>, AppError>;
    /// Inserts new emails and refreshes contact fields of existing ones, in one transaction.
    async fn import(&self, event_id: &str, rows: &[Invite]) -> Result<ImportCounts, AppError>;
    async fn update(&self, invite: &Invite) -> Result<Invite, AppError>;
    /// Persists the send state together with the outbound email job.
    async fn mark_sent(&self, invite: &Invite, job: &Job) -> Result<Invite, AppError>;
    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    async fn create(&self, attendee: &Attendee) -> Result<Attendee, AppError>;
    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Attendee>, AppError>;
    async fn find_by_email(&self, event_id: &str, email: &str) -> Result<Option<Attendee>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Attendee>, AppError>;
    async fn update(&self, attendee: &Attendee) -> Result<Attendee, AppError>;
    /// Accepts the attendee and its invite together.
    async fn accept(&self, attendee: &Attendee, invite: &Invite) -> Result<Attendee, AppError>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Creates the room with one empty assignment row per slot.
    async fn create(&self, room: &Room) -> Result<Room, AppError>;
    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Room>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Room>, AppError>;
    /// Resizes slot rows to the new capacity; refuses to drop an occupied slot.
    async fn update(&self, room: &Room) -> Result<Room, AppError>;
    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError>;
    async fn list_assignments(&self, event_id: &str) -> Result<Vec<RoomAssignment>, AppError>;
    async fn find_assignment_for_attendee(&self, event_id: &str, attendee_id: &str) -> Result<Option<RoomAssignment>, AppError>;
    /// Guarded check-and-set of one slot, executed in a single transaction.
    async fn apply_assignment(
        &self,
        event_id: &str,
        room_id: &str,
        slot: i32,
        attendee_id: Option<&str>,
    ) -> Result<AssignmentOutcome, AppError>;
}

#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    async fn create(&self, item: &ItineraryItem) -> Result<ItineraryItem, AppError>;
    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<ItineraryItem>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<ItineraryItem>, AppError>;
    async fn update(&self, item: &ItineraryItem) -> Result<ItineraryItem, AppError>;
    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BroadcastRepository: Send + Sync {
    async fn create(&self, broadcast: &Broadcast) -> Result<Broadcast, AppError>;
    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Broadcast>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Broadcast>, AppError>;
    async fn list_sent(&self, event_id: &str) -> Result<Vec<Broadcast>, AppError>;
    /// Marks the broadcast sent and queues its delivery jobs atomically.
    async fn mark_sent(&self, broadcast: &Broadcast, jobs: Vec<Job>) -> Result<Broadcast, AppError>;
    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Atomically moves due PENDING jobs to PROCESSING and bumps their attempt count.
    async fn claim_due(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    /// Returns jobs left in PROCESSING by a stopped worker to the queue.
    async fn requeue_interrupted(&self) -> Result<u64, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Job>, AppError>;
    async fn complete(&self, id: &str) -> Result<(), AppError>;
    /// Puts the job back to PENDING at `retry_at`, or parks it as FAILED when `None`.
    async fn fail(&self, id: &str, error: &str, retry_at: Option<DateTime<Utc>>) -> Result<(), AppError>;
    /// Requeues a FAILED job of the event with a fresh attempt budget.
    async fn retry(&self, event_id: &str, id: &str) -> Result<Job, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SmsService: Send + Sync {
    async fn send(&self, phone: &str, body: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `data` under `folder` and returns its public URL path.
    async fn save(&self, folder: &str, file_name: &str, data: &[u8]) -> Result<String, AppError>;
}
