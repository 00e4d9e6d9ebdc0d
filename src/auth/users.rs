//! User directory: identity lookup and account registration.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{error, Instrument};
use uuid::Uuid;

use super::models::UserIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyProfile {
    pub company_name: String,
    pub manager_full_name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverProfile {
    pub full_name: String,
    pub mobile: String,
    pub plate_number: String,
    pub vehicle_type: String,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewProfile {
    Company(CompanyProfile),
    Driver(DriverProfile),
}

/// Already validated account; the password is hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: NewProfile,
}

#[derive(Debug)]
pub enum RegisterOutcome {
    /// Identity plus the id of the created profile row.
    Created { user: UserIdentity, profile_id: Uuid },
    UsernameTaken,
    /// The driver referenced a company that does not exist.
    UnknownCompany,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserIdentity>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>>;

    async fn register(&self, account: NewAccount, at: DateTime<Utc>) -> Result<RegisterOutcome>;
}

// Role is derived from profile presence in the same round trip.
const IDENTITY_SELECT: &str = r"
    SELECT u.id, u.username, u.email, u.password_hash, u.is_active, u.is_staff, u.is_superuser,
           EXISTS (SELECT 1 FROM companies c WHERE c.user_id = u.id) AS has_company,
           EXISTS (SELECT 1 FROM drivers d WHERE d.user_id = u.id) AS has_driver
    FROM users u
";

#[derive(Clone, Debug)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> Result<Option<UserIdentity>> {
        let query = format!("{IDENTITY_SELECT} {filter}");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        sqlx::query_as::<_, UserIdentity>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserIdentity>> {
        self.find_one("WHERE u.username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>> {
        // Emails are not unique; the oldest account wins.
        self.find_one(
            "WHERE lower(u.email) = lower($1) ORDER BY u.created_at ASC LIMIT 1",
            email,
        )
        .await
    }

    async fn register(&self, account: NewAccount, at: DateTime<Utc>) -> Result<RegisterOutcome> {
        // User and profile are created together or not at all.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("begin registration transaction")?;

        let query = r"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(at)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to insert user")?;

        let Some(row) = row else {
            rollback(tx).await;
            return Ok(RegisterOutcome::UsernameTaken);
        };
        let user_id: Uuid = row.get("id");

        let profile_id: Uuid = match &account.profile {
            NewProfile::Company(company) => {
                let query = r"
                    INSERT INTO companies (user_id, company_name, manager_full_name, phone, address)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                ";
                let span = tracing::info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "INSERT",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(user_id)
                    .bind(&company.company_name)
                    .bind(&company.manager_full_name)
                    .bind(&company.phone)
                    .bind(&company.address)
                    .fetch_one(&mut *tx)
                    .instrument(span)
                    .await
                    .context("failed to insert company profile")?
                    .get("id")
            }
            NewProfile::Driver(driver) => {
                let query = r"
                    INSERT INTO drivers
                        (user_id, full_name, mobile, plate_number, vehicle_type, company_id)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id
                ";
                let span = tracing::info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "INSERT",
                    db.statement = query
                );
                let inserted = sqlx::query(query)
                    .bind(user_id)
                    .bind(&driver.full_name)
                    .bind(&driver.mobile)
                    .bind(&driver.plate_number)
                    .bind(&driver.vehicle_type)
                    .bind(driver.company_id)
                    .fetch_one(&mut *tx)
                    .instrument(span)
                    .await;
                match inserted {
                    Ok(row) => row.get("id"),
                    // Only company_id can dangle; user_id was inserted above.
                    Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
                        rollback(tx).await;
                        return Ok(RegisterOutcome::UnknownCompany);
                    }
                    Err(err) => {
                        return Err(anyhow::Error::new(err).context("failed to insert driver profile"));
                    }
                }
            }
        };

        tx.commit().await.context("commit registration transaction")?;

        let user = self
            .find_by_username(&account.username)
            .await?
            .context("registered user not found after commit")?;

        Ok(RegisterOutcome::Created { user, profile_id })
    }
}

async fn rollback(tx: Transaction<'_, Postgres>) {
    if let Err(err) = tx.rollback().await {
        error!("Failed to roll back registration transaction: {err}");
    }
}
