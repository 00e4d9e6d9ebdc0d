//! Session registry: one row per transport session key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use super::models::{SessionUpsert, UserSession};

#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Insert or refresh the row for `session.session_key`.
    ///
    /// An existing row gets the new user, address and agent, is reactivated,
    /// and has `last_activity` set to `at`; `created_at` is kept.
    async fn upsert_session(&self, session: SessionUpsert, at: DateTime<Utc>) -> Result<()>;

    /// Mark the row inactive. Missing rows are ignored.
    async fn deactivate_session(&self, session_key: &str) -> Result<()>;

    /// Mark the row inactive only if it belongs to `user_id`.
    /// Returns whether a row was deactivated.
    async fn deactivate_owned_session(&self, session_key: &str, user_id: Uuid) -> Result<bool>;

    async fn find_session(&self, session_key: &str) -> Result<Option<UserSession>>;

    async fn touch_session(&self, session_key: &str, at: DateTime<Utc>) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct PgSessionRegistry {
    pool: PgPool,
}

impl PgSessionRegistry {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRegistry for PgSessionRegistry {
    async fn upsert_session(&self, session: SessionUpsert, at: DateTime<Utc>) -> Result<()> {
        // Single statement so concurrent logins on one key resolve to last writer wins.
        let query = r"
            INSERT INTO user_sessions
                (session_key, user_id, ip_address, user_agent, is_active, created_at, last_activity)
            VALUES ($1, $2, $3, $4, TRUE, $5, $5)
            ON CONFLICT (session_key) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                ip_address = EXCLUDED.ip_address,
                user_agent = EXCLUDED.user_agent,
                is_active = TRUE,
                last_activity = EXCLUDED.last_activity
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&session.session_key)
            .bind(session.user_id)
            .bind(session.ip_address)
            .bind(&session.user_agent)
            .bind(at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to upsert user session")?;

        Ok(())
    }

    async fn deactivate_session(&self, session_key: &str) -> Result<()> {
        let query = "UPDATE user_sessions SET is_active = FALSE WHERE session_key = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_key)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to deactivate user session")?;

        Ok(())
    }

    async fn deactivate_owned_session(&self, session_key: &str, user_id: Uuid) -> Result<bool> {
        let query =
            "UPDATE user_sessions SET is_active = FALSE WHERE session_key = $1 AND user_id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(session_key)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to deactivate user session")?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_session(&self, session_key: &str) -> Result<Option<UserSession>> {
        let query = r"
            SELECT session_key, user_id, created_at, last_activity, ip_address, user_agent, is_active
            FROM user_sessions
            WHERE session_key = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, UserSession>(query)
            .bind(session_key)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user session")
    }

    async fn touch_session(&self, session_key: &str, at: DateTime<Utc>) -> Result<()> {
        let query = "UPDATE user_sessions SET last_activity = $2 WHERE session_key = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_key)
            .bind(at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to touch user session")?;

        Ok(())
    }
}
