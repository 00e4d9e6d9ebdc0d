//! Best-effort activity log.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::Instrument;

use super::models::NewActivity;

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record_activity(&self, activity: NewActivity, at: DateTime<Utc>) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct PgActivityLog {
    pool: PgPool,
}

impl PgActivityLog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    async fn record_activity(&self, activity: NewActivity, at: DateTime<Utc>) -> Result<()> {
        let query = r"
            INSERT INTO activity_logs (user_id, action, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(activity.user_id)
            .bind(activity.action.as_str())
            .bind(activity.ip_address)
            .bind(&activity.user_agent)
            .bind(at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert activity log")?;

        Ok(())
    }
}
