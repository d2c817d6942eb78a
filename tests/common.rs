#![allow(dead_code)]

use event_guest_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::{build_state, seed_admin, Repositories},
    domain::ports::{EmailService, SmsService},
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    /// When set, every send fails as if the provider were down.
    pub failing: AtomicBool,
}

impl MockEmailService {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("Mail provider unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSmsService {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SmsService for MockSmsService {
    async fn send(&self, phone: &str, body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push((phone.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub upload_dir: String,
    pub state: Arc<AppState>,
    pub emails: Arc<MockEmailService>,
    pub sms: Arc<MockSmsService>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);
        let upload_dir = std::env::temp_dir()
            .join(format!("uploads-{}", Uuid::new_v4()))
            .to_string_lossy()
            .to_string();

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            log_dir: std::env::temp_dir().to_string_lossy().to_string(),
            mail_service_url: None,
            mail_service_token: String::new(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            admin_username: Some(ADMIN_USERNAME.to_string()),
            admin_password: Some(ADMIN_PASSWORD.to_string()),
            upload_dir: upload_dir.clone(),
            otp_ttl_secs: 300,
            otp_max_attempts: 3,
            mobile_app_url: "https://app.test".to_string(),
        };

        let emails = Arc::new(MockEmailService::default());
        let sms = Arc::new(MockSmsService::default());

        let repos = Repositories::sqlite(pool.clone());
        seed_admin(repos.users.as_ref(), ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("Failed to seed admin");

        let state = Arc::new(build_state(&config, repos, emails.clone(), sms.clone()));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            upload_dir,
            state,
            emails,
            sms,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthHeaders {
        let payload = json!({
            "username": username,
            "password": password
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let access_token = cookie_value(&response, "access_token").expect("No access_token cookie returned");

        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrfToken"].as_str().expect("No csrfToken in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    /// Makes every queued job due now, skipping retry backoff.
    pub async fn make_jobs_due(&self) {
        sqlx::query("UPDATE jobs SET execute_at = ? WHERE status = 'PENDING'")
            .bind(chrono::Utc::now() - chrono::Duration::seconds(1))
            .execute(&self.pool)
            .await
            .unwrap();
    }

    pub async fn admin(&self) -> AuthHeaders {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Sends an admin request with the session cookie and CSRF header.
    pub async fn admin_request(&self, auth: &AuthHeaders, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header("X-CSRF-Token", &auth.csrf_token);

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn public_request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn mobile_request(&self, token: &str, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn create_event(&self, auth: &AuthHeaders, slug: &str) -> String {
        let (status, body) = self.admin_request(auth, "POST", "/api/events", Some(json!({
            "name": format!("Event {}", slug),
            "slug": slug,
            "location": "Lisbon",
            "timezone": "Europe/Lisbon",
            "startsAt": "2026-06-01T09:00:00Z",
            "endsAt": "2026-06-03T18:00:00Z"
        }))).await;
        assert_eq!(status, StatusCode::OK, "create event failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_invite(&self, auth: &AuthHeaders, event_id: &str, email: &str, first: &str, last: &str) -> Value {
        let (status, body) = self.admin_request(auth, "POST", &format!("/api/events/{}/invites", event_id), Some(json!({
            "email": email,
            "firstName": first,
            "lastName": last
        }))).await;
        assert_eq!(status, StatusCode::OK, "create invite failed: {}", body);
        body
    }

    /// Returns the code from the newest OTP email sent to `email`.
    pub fn last_otp_for(&self, email: &str) -> String {
        let sent = self.emails.sent.lock().unwrap();
        let mail = sent.iter().rev()
            .find(|m| m.recipient == email && m.subject.contains("sign-in code"))
            .expect("No OTP email captured");
        extract_code(&mail.html_body).expect("No code in OTP email")
    }

    /// Runs the email OTP flow and returns the attendee bearer token.
    pub async fn mobile_login(&self, event_id: &str, email: &str) -> String {
        let (status, _) = self.public_request("POST", "/api/mobile/auth/request-otp", Some(json!({
            "eventId": event_id,
            "email": email
        }))).await;
        assert_eq!(status, StatusCode::OK);

        let code = self.last_otp_for(email);
        let (status, body) = self.public_request("POST", "/api/mobile/auth/verify-otp", Some(json!({
            "eventId": event_id,
            "email": email,
            "code": code
        }))).await;
        assert_eq!(status, StatusCode::OK, "verify-otp failed: {}", body);
        body["accessToken"].as_str().unwrap().to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub fn cookie_value(response: &axum::response::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .map(|c| c[prefix.len()..].split(';').next().unwrap_or("").to_string())
}

/// First run of exactly six digits in `text`.
pub fn extract_code(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 6 {
                return Some(chars[start..i].iter().collect());
            }
        } else {
            i += 1;
        }
    }
    None
}
