use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::domain::models::otp::OtpRecord;
use crate::domain::ports::OtpRepository;
use crate::error::AppError;

pub const OTP_LENGTH: usize = 6;

/// Short-lived numeric codes, stored hashed and keyed by purpose + identity.
pub struct OtpService {
    repo: Arc<dyn OtpRepository>,
    ttl_secs: i64,
    max_attempts: i32,
}

impl OtpService {
    pub fn new(repo: Arc<dyn OtpRepository>, ttl_secs: i64, max_attempts: i32) -> Self {
        Self { repo, ttl_secs, max_attempts }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Generates a fresh code for `key`, replacing any outstanding one.
    pub async fn issue(&self, key: &str) -> Result<String, AppError> {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));

        let record = OtpRecord {
            key: key.to_string(),
            code_hash: hash_code(key, &code),
            attempts: 0,
            expires_at: Utc::now() + Duration::seconds(self.ttl_secs),
        };
        self.repo.upsert(&record).await?;

        info!("Issued OTP for key {}", key);
        Ok(code)
    }

    /// Each call spends one attempt before the code is compared, so concurrent guesses
    /// can never evaluate more than `max_attempts` codes. A successful match consumes the code.
    pub async fn verify(&self, key: &str, code: &str) -> Result<(), AppError> {
        let now = Utc::now();
        let Some(code_hash) = self.repo.claim_attempt(key, self.max_attempts, now).await? else {
            return match self.repo.find(key).await? {
                Some(record) if record.expires_at <= now => {
                    self.repo.delete(key).await?;
                    Err(AppError::Unauthorized)
                }
                Some(record) if record.attempts >= self.max_attempts => {
                    warn!("OTP attempts exhausted for key {}", key);
                    Err(AppError::TooManyRequests("Too many OTP attempts, request a new code".into()))
                }
                _ => Err(AppError::Unauthorized),
            };
        };

        if code_hash != hash_code(key, code.trim()) {
            return Err(AppError::Unauthorized);
        }

        if !self.repo.delete(key).await? {
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }

    /// Drops codes past their expiry. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.repo.purge_expired(Utc::now()).await
    }
}

fn hash_code(key: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}
