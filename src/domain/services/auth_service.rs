use std::sync::Arc;
use crate::domain::{
    models::{
        auth::{AdminClaims, AttendeeClaims, RefreshTokenRecord, SessionTokens, ADMIN_AUDIENCE, ATTENDEE_AUDIENCE},
        user::AdminUser,
    },
    ports::{AuthRepository, UserRepository},
};
use crate::error::AppError;
use crate::config::Config;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Sha256, Digest};
use tracing::{info, warn};

pub const ACCESS_TOKEN_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_DAYS: i64 = 7;
pub const ATTENDEE_TOKEN_DAYS: i64 = 7;

/// Console sessions (cookie JWT + rotating refresh token) and attendee bearer tokens.
pub struct AuthService {
    tokens: Arc<dyn AuthRepository>,
    users: Arc<dyn UserRepository>,
    config: Config,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(tokens: Arc<dyn AuthRepository>, users: Arc<dyn UserRepository>, config: Config) -> Self {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .expect("Invalid JWT Private Key PEM");
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())
            .expect("Invalid JWT Public Key PEM");

        Self { tokens, users, config, encoding_key, decoding_key }
    }

    /// Checks credentials and opens a new refresh-token family.
    pub async fn login(&self, username: &str, password: &str) -> Result<(AdminUser, SessionTokens), AppError> {
        let mut user = self.users.find_by_username(username.trim()).await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            warn!("Failed login for {}", username);
            return Err(AppError::Unauthorized);
        }

        let now = Utc::now();
        self.users.record_login(&user.id, now).await?;
        user.last_login_at = Some(now);

        let session = self.issue_session(&user, Uuid::new_v4(), 1).await?;
        Ok((user, session))
    }

    /// Rotates a refresh token. Presenting a token that was already rotated
    /// revokes every token of its family, logging out whoever holds the live one.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<(AdminUser, SessionTokens), AppError> {
        let token_hash = hash_token(raw_refresh_token);
        let now = Utc::now();

        let Some(record) = self.tokens.consume_refresh_token(&token_hash, now).await? else {
            if let Some(replayed) = self.tokens.find_refresh_token(&token_hash).await? {
                let revoked = self.tokens.revoke_family(replayed.family_id).await?;
                warn!(
                    "Refresh token replay for user {}; revoked {} tokens of family {}",
                    replayed.user_id, revoked, replayed.family_id
                );
            }
            return Err(AppError::Unauthorized);
        };

        if record.expires_at < now {
            return Err(AppError::Unauthorized);
        }

        let user = self.users.find_by_id(&record.user_id).await?
            .ok_or(AppError::Unauthorized)?;

        let session = self.issue_session(&user, record.family_id, record.generation_id + 1).await?;
        Ok((user, session))
    }

    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        if let Some(record) = self.tokens.find_refresh_token(&hash_token(raw_refresh_token)).await? {
            self.tokens.revoke_family(record.family_id).await?;
        }
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.tokens.purge_expired(Utc::now()).await
    }

    async fn issue_session(&self, user: &AdminUser, family_id: Uuid, generation_id: i32) -> Result<SessionTokens, AppError> {
        let csrf_token = random_token(32);
        let now = Utc::now();

        let claims = AdminClaims {
            iss: self.config.auth_issuer.clone(),
            sub: user.id.clone(),
            aud: ADMIN_AUDIENCE.to_string(),
            exp: (now + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            role: user.role.clone(),
            csrf_token: csrf_token.clone(),
        };
        let access_token = self.sign(&claims)?;

        let refresh_token = random_token(64);
        self.tokens.store_refresh_token(&RefreshTokenRecord {
            token_hash: hash_token(&refresh_token),
            user_id: user.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(REFRESH_TOKEN_DAYS),
            consumed_at: None,
            created_at: now,
        }).await?;

        info!("Issued session generation {} for user {}", generation_id, user.id);
        Ok(SessionTokens { access_token, refresh_token, csrf_token })
    }

    pub fn issue_attendee_token(&self, event_id: &str, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        self.sign(&AttendeeClaims {
            iss: self.config.auth_issuer.clone(),
            sub: email.to_string(),
            aud: ATTENDEE_AUDIENCE.to_string(),
            exp: (now + Duration::days(ATTENDEE_TOKEN_DAYS)).timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            event_id: event_id.to_string(),
        })
    }

    pub fn decode_admin(&self, token: &str) -> Result<AdminClaims, AppError> {
        self.verify(token, ADMIN_AUDIENCE)
    }

    pub fn decode_attendee(&self, token: &str) -> Result<AttendeeClaims, AppError> {
        self.verify(token, ATTENDEE_AUDIENCE)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::EdDSA), claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })
    }

    // audience separates console sessions from attendee tokens signed with the same key
    fn verify<T: DeserializeOwned>(&self, token: &str, audience: &str) -> Result<T, AppError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[audience]);
        validation.set_issuer(&[self.config.auth_issuer.as_str()]);

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalWithMsg(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AppError::Internal)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn random_token(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}
