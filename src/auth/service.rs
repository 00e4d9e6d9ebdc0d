//! Login, logout and session status orchestration.
//!
//! Flow Overview (login):
//! 1) Reject blank credentials before touching storage.
//! 2) Consult the throttle; a locked pair gets no credential check and no ledger row.
//! 3) Resolve the identity by username, then by email, and verify the password.
//! 4) Record the outcome in the attempt ledger.
//! 5) On success upsert the session (when the transport has a key), log activity,
//!    and issue the token pair.
//!
//! Ledger, session and activity writes are best-effort: failures are logged and
//! never change the outcome returned to the caller.

use anyhow::anyhow;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    clock::Clock,
    models::{
        ActivityAction, ClientInfo, NewActivity, NewLoginAttempt, SessionUpsert, UserIdentity,
        UserSession,
    },
    password::verify_password,
    throttle::{Throttle, ThrottlePolicy},
    tokens::{TokenIssuer, TokenPair},
    Stores,
};

pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS: u32 = 5 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Too many failed login attempts. Please try again later")]
    TooManyAttempts,
    #[error("No account found with the given credentials")]
    UserNotFound,
    #[error("Incorrect password")]
    InvalidPassword,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LoginError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::TooManyAttempts => "too_many_attempts",
            Self::UserNotFound => "user_not_found",
            Self::InvalidPassword => "invalid_password",
            Self::Internal(_) => "internal_error",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub client: ClientInfo,
    pub session_key: Option<String>,
}

#[derive(Debug)]
pub struct LoginSuccess {
    pub user: UserIdentity,
    pub tokens: TokenPair,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// No row, or the row was already deactivated.
    Missing,
    /// Idle for longer than the timeout; the row has just been deactivated.
    Expired,
    Active(UserSession),
}

pub struct Authenticator {
    stores: Stores,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
    throttle: Throttle,
    session_idle_timeout: TimeDelta,
}

impl Authenticator {
    #[must_use]
    pub fn new(stores: Stores, tokens: TokenIssuer, clock: Arc<dyn Clock>) -> Self {
        let throttle = Throttle::new(
            stores.attempts.clone(),
            clock.clone(),
            ThrottlePolicy::default(),
        );
        Self {
            stores,
            tokens,
            clock,
            throttle,
            session_idle_timeout: TimeDelta::seconds(i64::from(
                DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS,
            )),
        }
    }

    #[must_use]
    pub fn with_throttle_policy(mut self, policy: ThrottlePolicy) -> Self {
        self.throttle = Throttle::new(self.stores.attempts.clone(), self.clock.clone(), policy);
        self
    }

    #[must_use]
    pub fn with_session_idle_timeout_seconds(mut self, seconds: u32) -> Self {
        self.session_idle_timeout = TimeDelta::seconds(i64::from(seconds));
        self
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run one login request through the throttle/credential state machine.
    ///
    /// # Errors
    /// Returns a `LoginError` describing why the login was refused.
    #[instrument(skip_all, fields(username = tracing::field::Empty))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginSuccess, LoginError> {
        let (Some(username), Some(password)) =
            (non_blank(request.username), non_blank(request.password))
        else {
            return Err(LoginError::MissingCredentials);
        };
        tracing::Span::current().record("username", username.as_str());
        let client = request.client;

        if self
            .throttle
            .is_locked_out(&username, client.ip_address)
            .await?
        {
            warn!(ip = %client.ip_address, "Login locked out");
            return Err(LoginError::TooManyAttempts);
        }

        let Some(user) = self.resolve_identity(&username).await? else {
            self.record_attempt(&username, &client, false, None).await;
            return Err(LoginError::UserNotFound);
        };

        if !user.is_active || !password_matches(&password, &user) {
            self.record_attempt(&username, &client, false, Some(user.id))
                .await;
            return Err(LoginError::InvalidPassword);
        }

        self.record_attempt(&username, &client, true, Some(user.id))
            .await;

        if let Some(session_key) = request.session_key {
            self.upsert_session(session_key, user.id, &client).await;
        }

        self.record_activity(user.id, ActivityAction::Login, &client)
            .await;

        let tokens = self
            .tokens
            .issue_login_pair(&user, self.clock.now())
            .map_err(|err| LoginError::Internal(anyhow!(err)))?;

        info!(user_id = %user.id, role = user.role.as_str(), "Login succeeded");

        Ok(LoginSuccess { user, tokens })
    }

    /// Deactivate the caller's session row, if the transport has one.
    ///
    /// Only a row owned by `user_id` is touched; a key bound to another user
    /// is left as is.
    ///
    /// # Errors
    /// Returns an error only if the deactivation itself fails.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn logout(
        &self,
        user_id: Uuid,
        session_key: Option<&str>,
        client: &ClientInfo,
    ) -> anyhow::Result<()> {
        if let Some(session_key) = session_key {
            let deactivated = self
                .stores
                .sessions
                .deactivate_owned_session(session_key, user_id)
                .await?;
            if !deactivated {
                warn!("Logout session key is not bound to the caller");
            }
        }
        self.record_activity(user_id, ActivityAction::Logout, client)
            .await;
        Ok(())
    }

    /// Resolve a session key, enforcing the idle timeout and touching live rows.
    ///
    /// # Errors
    /// Returns an error if the registry cannot be read or updated.
    pub async fn session_status(&self, session_key: &str) -> anyhow::Result<SessionStatus> {
        let Some(mut session) = self.stores.sessions.find_session(session_key).await? else {
            return Ok(SessionStatus::Missing);
        };
        if !session.is_active {
            return Ok(SessionStatus::Missing);
        }

        let now = self.clock.now();
        if now.signed_duration_since(session.last_activity) > self.session_idle_timeout {
            self.stores.sessions.deactivate_session(session_key).await?;
            info!(user_id = %session.user_id, "Session expired after inactivity");
            return Ok(SessionStatus::Expired);
        }

        self.stores.sessions.touch_session(session_key, now).await?;
        session.last_activity = now;
        Ok(SessionStatus::Active(session))
    }

    async fn resolve_identity(&self, username: &str) -> anyhow::Result<Option<UserIdentity>> {
        if let Some(user) = self.stores.users.find_by_username(username).await? {
            return Ok(Some(user));
        }
        self.stores.users.find_by_email(username).await
    }

    async fn record_attempt(
        &self,
        username: &str,
        client: &ClientInfo,
        success: bool,
        user_id: Option<Uuid>,
    ) {
        let attempt = NewLoginAttempt {
            username: username.to_string(),
            ip_address: client.ip_address,
            user_agent: client.user_agent.clone(),
            success,
            user_id,
        };
        if let Err(err) = self
            .stores
            .attempts
            .record_attempt(attempt, self.clock.now())
            .await
        {
            error!("Failed to record login attempt: {err:#}");
        }
    }

    async fn upsert_session(&self, session_key: String, user_id: Uuid, client: &ClientInfo) {
        let session = SessionUpsert {
            session_key,
            user_id,
            ip_address: client.ip_address,
            user_agent: client.user_agent.clone(),
        };
        if let Err(err) = self
            .stores
            .sessions
            .upsert_session(session, self.clock.now())
            .await
        {
            error!("Failed to upsert user session: {err:#}");
        }
    }

    async fn record_activity(&self, user_id: Uuid, action: ActivityAction, client: &ClientInfo) {
        let activity = NewActivity {
            user_id,
            action,
            ip_address: client.ip_address,
            user_agent: client.user_agent.clone(),
        };
        if let Err(err) = self
            .stores
            .activity
            .record_activity(activity, self.clock.now())
            .await
        {
            error!("Failed to record {} activity: {err:#}", action.as_str());
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn password_matches(password: &str, user: &UserIdentity) -> bool {
    match verify_password(password, &user.password_hash) {
        Ok(matches) => matches,
        Err(err) => {
            // Unusable stored hashes fail closed.
            error!(user_id = %user.id, "Stored password hash is invalid: {err}");
            false
        }
    }
}
