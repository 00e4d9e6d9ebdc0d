//! In-memory stores used by unit and handler tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    net::IpAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};
use uuid::Uuid;

use super::{
    activity::ActivityLog,
    attempts::AttemptLedger,
    models::{
        LoginAttempt, NewActivity, NewLoginAttempt, Role, SessionUpsert, UserIdentity, UserSession,
    },
    sessions::SessionRegistry,
    users::{DriverProfile, NewAccount, NewProfile, RegisterOutcome, UserDirectory},
    Stores,
};

#[derive(Default)]
struct State {
    users: Vec<StoredUser>,
    attempts: Vec<LoginAttempt>,
    sessions: HashMap<String, UserSession>,
    activity: Vec<(NewActivity, DateTime<Utc>)>,
}

struct StoredUser {
    identity: UserIdentity,
    company_profile_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_session_writes: AtomicBool,
    fail_attempt_writes: AtomicBool,
    fail_activity_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            users: self.clone(),
            attempts: self.clone(),
            sessions: self.clone(),
            activity: self.clone(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a user directly, bypassing registration.
    pub fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> UserIdentity {
        let identity = UserIdentity {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_staff: role == Role::Admin,
            is_superuser: false,
            has_company: role == Role::Company,
            has_driver: role == Role::Driver,
            role,
        };
        self.state().users.push(StoredUser {
            identity: identity.clone(),
            company_profile_id: (role == Role::Company).then(Uuid::new_v4),
            created_at: Utc::now(),
        });
        identity
    }

    pub fn set_active(&self, user_id: Uuid, is_active: bool) {
        for user in &mut self.state().users {
            if user.identity.id == user_id {
                user.identity.is_active = is_active;
            }
        }
    }

    pub fn attempts(&self) -> Vec<LoginAttempt> {
        self.state().attempts.clone()
    }

    pub fn session(&self, session_key: &str) -> Option<UserSession> {
        self.state().sessions.get(session_key).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }

    pub fn activity(&self) -> Vec<NewActivity> {
        self.state()
            .activity
            .iter()
            .map(|(activity, _)| activity.clone())
            .collect()
    }

    pub fn fail_session_writes(&self, fail: bool) {
        self.fail_session_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_attempt_writes(&self, fail: bool) {
        self.fail_attempt_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_activity_writes(&self, fail: bool) {
        self.fail_activity_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttemptLedger for MemoryStore {
    async fn record_attempt(&self, attempt: NewLoginAttempt, at: DateTime<Utc>) -> Result<()> {
        if self.fail_attempt_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("attempt ledger unavailable"));
        }
        let mut state = self.state();
        let id = i64::try_from(state.attempts.len())? + 1;
        state.attempts.push(LoginAttempt {
            id,
            username: attempt.username,
            ip_address: attempt.ip_address,
            user_agent: attempt.user_agent,
            success: attempt.success,
            user_id: attempt.user_id,
            created_at: at,
        });
        Ok(())
    }

    async fn count_failures_since(
        &self,
        username: &str,
        ip_address: IpAddr,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count = self
            .state()
            .attempts
            .iter()
            .filter(|attempt| {
                attempt.username == username
                    && attempt.ip_address == ip_address
                    && !attempt.success
                    && attempt.created_at >= since
            })
            .count();
        Ok(i64::try_from(count)?)
    }
}

#[async_trait]
impl SessionRegistry for MemoryStore {
    async fn upsert_session(&self, session: SessionUpsert, at: DateTime<Utc>) -> Result<()> {
        if self.fail_session_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("session registry unavailable"));
        }
        let mut state = self.state();
        state
            .sessions
            .entry(session.session_key.clone())
            .and_modify(|existing| {
                existing.user_id = session.user_id;
                existing.ip_address = session.ip_address;
                existing.user_agent.clone_from(&session.user_agent);
                existing.is_active = true;
                existing.last_activity = at;
            })
            .or_insert_with(|| UserSession {
                session_key: session.session_key.clone(),
                user_id: session.user_id,
                created_at: at,
                last_activity: at,
                ip_address: session.ip_address,
                user_agent: session.user_agent.clone(),
                is_active: true,
            });
        Ok(())
    }

    async fn deactivate_session(&self, session_key: &str) -> Result<()> {
        if self.fail_session_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("session registry unavailable"));
        }
        if let Some(session) = self.state().sessions.get_mut(session_key) {
            session.is_active = false;
        }
        Ok(())
    }

    async fn deactivate_owned_session(&self, session_key: &str, user_id: Uuid) -> Result<bool> {
        if self.fail_session_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("session registry unavailable"));
        }
        match self.state().sessions.get_mut(session_key) {
            Some(session) if session.user_id == user_id => {
                session.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_session(&self, session_key: &str) -> Result<Option<UserSession>> {
        Ok(self.session(session_key))
    }

    async fn touch_session(&self, session_key: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(session) = self.state().sessions.get_mut(session_key) {
            session.last_activity = at;
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserIdentity>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|user| user.identity.username == username)
            .map(|user| user.identity.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>> {
        Ok(self
            .state()
            .users
            .iter()
            .filter(|user| user.identity.email.eq_ignore_ascii_case(email))
            .min_by_key(|user| user.created_at)
            .map(|user| user.identity.clone()))
    }

    async fn register(&self, account: NewAccount, at: DateTime<Utc>) -> Result<RegisterOutcome> {
        let mut state = self.state();
        if state
            .users
            .iter()
            .any(|user| user.identity.username == account.username)
        {
            return Ok(RegisterOutcome::UsernameTaken);
        }
        if let NewProfile::Driver(DriverProfile {
            company_id: Some(company_id),
            ..
        }) = &account.profile
        {
            if !state
                .users
                .iter()
                .any(|user| user.company_profile_id == Some(*company_id))
            {
                return Ok(RegisterOutcome::UnknownCompany);
            }
        }
        let profile_id = Uuid::new_v4();
        let is_company = matches!(account.profile, NewProfile::Company(_));
        let identity = UserIdentity {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            has_company: is_company,
            has_driver: !is_company,
            role: if is_company { Role::Company } else { Role::Driver },
        };
        state.users.push(StoredUser {
            identity: identity.clone(),
            company_profile_id: is_company.then_some(profile_id),
            created_at: at,
        });
        Ok(RegisterOutcome::Created {
            user: identity,
            profile_id,
        })
    }
}

#[async_trait]
impl ActivityLog for MemoryStore {
    async fn record_activity(&self, activity: NewActivity, at: DateTime<Utc>) -> Result<()> {
        if self.fail_activity_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("activity log unavailable"));
        }
        self.state().activity.push((activity, at));
        Ok(())
    }
}
