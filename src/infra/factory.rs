use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::models::user::AdminUser;
use crate::domain::ports::{
    AttendeeRepository, AuthRepository, BroadcastRepository, EmailService, EventRepository,
    InviteRepository, ItineraryRepository, JobRepository, OtpRepository, RoomRepository,
    SmsService, UserRepository,
};
use crate::domain::services::{auth_service::{hash_password, AuthService}, otp_service::OtpService};
use crate::error::AppError;
use crate::infra::email::{http_email_service::HttpEmailService, log_email_service::LogEmailService};
use crate::infra::sms::log_sms_service::LogSmsService;
use crate::infra::storage::local_file_storage::LocalFileStorage;
use crate::infra::repositories::{
    postgres_attendee_repo::PostgresAttendeeRepo, postgres_auth_repo::PostgresAuthRepo,
    postgres_broadcast_repo::PostgresBroadcastRepo, postgres_event_repo::PostgresEventRepo,
    postgres_invite_repo::PostgresInviteRepo, postgres_itinerary_repo::PostgresItineraryRepo,
    postgres_job_repo::PostgresJobRepo, postgres_otp_repo::PostgresOtpRepo,
    postgres_room_repo::PostgresRoomRepo, postgres_user_repo::PostgresUserRepo,
    sqlite_attendee_repo::SqliteAttendeeRepo, sqlite_auth_repo::SqliteAuthRepo,
    sqlite_broadcast_repo::SqliteBroadcastRepo, sqlite_event_repo::SqliteEventRepo,
    sqlite_invite_repo::SqliteInviteRepo, sqlite_itinerary_repo::SqliteItineraryRepo,
    sqlite_job_repo::SqliteJobRepo, sqlite_otp_repo::SqliteOtpRepo,
    sqlite_room_repo::SqliteRoomRepo, sqlite_user_repo::SqliteUserRepo,
};

pub const INVITATION_TEMPLATE: &str = "invitation.html";
pub const OTP_TEMPLATE: &str = "otp.html";
pub const BROADCAST_TEMPLATE: &str = "broadcast.html";

/// One storage backend's repositories, before they are wired into services.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn AuthRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub events: Arc<dyn EventRepository>,
    pub invites: Arc<dyn InviteRepository>,
    pub attendees: Arc<dyn AttendeeRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub itinerary: Arc<dyn ItineraryRepository>,
    pub broadcasts: Arc<dyn BroadcastRepository>,
    pub jobs: Arc<dyn JobRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            tokens: Arc::new(PostgresAuthRepo::new(pool.clone())),
            otps: Arc::new(PostgresOtpRepo::new(pool.clone())),
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            invites: Arc::new(PostgresInviteRepo::new(pool.clone())),
            attendees: Arc::new(PostgresAttendeeRepo::new(pool.clone())),
            rooms: Arc::new(PostgresRoomRepo::new(pool.clone())),
            itinerary: Arc::new(PostgresItineraryRepo::new(pool.clone())),
            broadcasts: Arc::new(PostgresBroadcastRepo::new(pool.clone())),
            jobs: Arc::new(PostgresJobRepo::new(pool)),
        }
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepo::new(pool.clone())),
            tokens: Arc::new(SqliteAuthRepo::new(pool.clone())),
            otps: Arc::new(SqliteOtpRepo::new(pool.clone())),
            events: Arc::new(SqliteEventRepo::new(pool.clone())),
            invites: Arc::new(SqliteInviteRepo::new(pool.clone())),
            attendees: Arc::new(SqliteAttendeeRepo::new(pool.clone())),
            rooms: Arc::new(SqliteRoomRepo::new(pool.clone())),
            itinerary: Arc::new(SqliteItineraryRepo::new(pool.clone())),
            broadcasts: Arc::new(SqliteBroadcastRepo::new(pool.clone())),
            jobs: Arc::new(SqliteJobRepo::new(pool)),
        }
    }
}

pub fn load_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (INVITATION_TEMPLATE, include_str!("../templates/invitation.html")),
        (OTP_TEMPLATE, include_str!("../templates/otp.html")),
        (BROADCAST_TEMPLATE, include_str!("../templates/broadcast.html")),
    ])
    .expect("Failed to load email templates");
    Arc::new(tera)
}

/// Wires services around a backend. Delivery channels are passed in so tests can capture them.
pub fn build_state(
    config: &Config,
    repos: Repositories,
    email_service: Arc<dyn EmailService>,
    sms_service: Arc<dyn SmsService>,
) -> AppState {
    AppState {
        config: config.clone(),
        auth_service: Arc::new(AuthService::new(repos.tokens, repos.users.clone(), config.clone())),
        otp_service: Arc::new(OtpService::new(repos.otps, config.otp_ttl_secs, config.otp_max_attempts)),
        user_repo: repos.users,
        event_repo: repos.events,
        invite_repo: repos.invites,
        attendee_repo: repos.attendees,
        room_repo: repos.rooms,
        itinerary_repo: repos.itinerary,
        broadcast_repo: repos.broadcasts,
        job_repo: repos.jobs,
        email_service,
        sms_service,
        file_storage: Arc::new(LocalFileStorage::new(&config.upload_dir)),
        templates: load_templates(),
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let email_service: Arc<dyn EmailService> = match &config.mail_service_url {
        Some(url) => Arc::new(HttpEmailService::new(url.clone(), config.mail_service_token.clone())),
        None => {
            warn!("MAIL_SERVICE_URL not set, outgoing email will only be logged");
            Arc::new(LogEmailService)
        }
    };

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .expect("Failed to run Postgres migrations");

        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to run SQLite migrations");

        Repositories::sqlite(pool)
    };

    let state = build_state(config, repos, email_service, Arc::new(LogSmsService));

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        if let Err(e) = seed_admin(state.user_repo.as_ref(), username, password).await {
            warn!("Admin seed failed: {}", e);
        }
    }

    state
}

/// Creates the console admin unless a user with that name already exists.
pub async fn seed_admin(users: &dyn UserRepository, username: &str, password: &str) -> Result<(), AppError> {
    if users.find_by_username(username.trim()).await?.is_some() {
        return Ok(());
    }

    users.create(&AdminUser::seeded(username, hash_password(password)?)).await?;
    info!("Seeded admin user {}", username);
    Ok(())
}
