//! Append-only ledger of login attempts.
//!
//! Every login request that reaches credential verification leaves exactly one
//! row here. Rows are never updated or deleted by the service; retention is an
//! operator concern.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::net::IpAddr;
use tracing::Instrument;

use super::models::NewLoginAttempt;

#[async_trait]
pub trait AttemptLedger: Send + Sync {
    /// Append one attempt stamped with `at`.
    async fn record_attempt(&self, attempt: NewLoginAttempt, at: DateTime<Utc>) -> Result<()>;

    /// Count failed attempts for the exact `(username, ip)` pair at or after `since`.
    async fn count_failures_since(
        &self,
        username: &str,
        ip_address: IpAddr,
        since: DateTime<Utc>,
    ) -> Result<i64>;
}

#[derive(Clone, Debug)]
pub struct PgAttemptLedger {
    pool: PgPool,
}

impl PgAttemptLedger {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptLedger for PgAttemptLedger {
    async fn record_attempt(&self, attempt: NewLoginAttempt, at: DateTime<Utc>) -> Result<()> {
        let query = r"
            INSERT INTO login_attempts
                (username, ip_address, user_agent, success, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&attempt.username)
            .bind(attempt.ip_address)
            .bind(&attempt.user_agent)
            .bind(attempt.success)
            .bind(attempt.user_id)
            .bind(at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert login attempt")?;

        Ok(())
    }

    async fn count_failures_since(
        &self,
        username: &str,
        ip_address: IpAddr,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let query = r"
            SELECT COUNT(*) AS failures
            FROM login_attempts
            WHERE username = $1
              AND ip_address = $2
              AND success = FALSE
              AND created_at >= $3
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .bind(ip_address)
            .bind(since)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to count failed login attempts")?;

        Ok(row.get("failures"))
    }
}
