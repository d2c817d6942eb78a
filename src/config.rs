use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub log_dir: String,
    pub mail_service_url: Option<String>,
    pub mail_service_token: String,
    pub jwt_secret_key: String, // Ed25519 private key (PEM)
    pub jwt_public_key: String, // Ed25519 public key (PEM)
    pub auth_issuer: String,
    /// Seeded console admin; both must be set.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub upload_dir: String,
    pub otp_ttl_secs: i64,
    pub otp_max_attempts: i32,
    /// Linked from invitation emails.
    pub mobile_app_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: required("DATABASE_URL"),
            port: parsed("PORT", 3000),
            log_dir: text("LOG_DIR", "./logs"),
            mail_service_url: optional("MAIL_SERVICE_URL"),
            mail_service_token: text("MAIL_SERVICE_TOKEN", ""),
            jwt_secret_key: required("JWT_SECRET_KEY"),
            jwt_public_key: required("JWT_PUBLIC_KEY"),
            auth_issuer: text("AUTH_ISSUER", "https://api.event-guests.local"),
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
            upload_dir: text("UPLOAD_DIR", "./uploads"),
            otp_ttl_secs: parsed("OTP_TTL_SECS", 300),
            otp_max_attempts: parsed("OTP_MAX_ATTEMPTS", 3),
            mobile_app_url: text("MOBILE_APP_URL", "https://app.event-guests.local"),
        }
    }
}

fn required(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{} must be set", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn text(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

// Unparseable values fall back to the default rather than aborting startup.
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    optional(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
