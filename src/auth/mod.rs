//! Login throttling, session registry and account storage.
//!
//! Storage is split into four narrow traits so the orchestration in
//! [`service::Authenticator`] can run against Postgres in production and an
//! in-memory store in tests:
//! - [`users::UserDirectory`]: identities and registration.
//! - [`attempts::AttemptLedger`]: append-only login attempt rows; the throttle reads these.
//! - [`sessions::SessionRegistry`]: one row per transport session key.
//! - [`activity::ActivityLog`]: best-effort audit trail.

pub mod activity;
pub mod attempts;
pub mod clock;
pub mod models;
pub mod password;
pub mod registration;
pub mod service;
pub mod sessions;
pub mod throttle;
pub mod tokens;
pub mod users;

#[cfg(test)]
pub(crate) mod memory;

use secrecy::SecretString;
use sqlx::PgPool;
use std::sync::Arc;

pub use service::{Authenticator, LoginError, LoginRequest, LoginSuccess, SessionStatus};

use activity::{ActivityLog, PgActivityLog};
use attempts::{AttemptLedger, PgAttemptLedger};
use clock::SystemClock;
use sessions::{PgSessionRegistry, SessionRegistry};
use throttle::ThrottlePolicy;
use tokens::TokenIssuer;
use users::{PgUserDirectory, UserDirectory};

#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub attempts: Arc<dyn AttemptLedger>,
    pub sessions: Arc<dyn SessionRegistry>,
    pub activity: Arc<dyn ActivityLog>,
}

impl Stores {
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserDirectory::new(pool.clone())),
            attempts: Arc::new(PgAttemptLedger::new(pool.clone())),
            sessions: Arc::new(PgSessionRegistry::new(pool.clone())),
            activity: Arc::new(PgActivityLog::new(pool)),
        }
    }
}

/// Startup knobs for the [`Authenticator`].
#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub throttle: ThrottlePolicy,
    pub session_idle_timeout_seconds: u32,
}

impl AuthSettings {
    #[must_use]
    pub fn into_authenticator(self, stores: Stores) -> Authenticator {
        let tokens = TokenIssuer::new(self.jwt_secret)
            .with_access_ttl_seconds(self.access_token_ttl_seconds)
            .with_refresh_ttl_seconds(self.refresh_token_ttl_seconds);
        Authenticator::new(stores, tokens, Arc::new(SystemClock))
            .with_throttle_policy(self.throttle)
            .with_session_idle_timeout_seconds(self.session_idle_timeout_seconds)
    }
}
