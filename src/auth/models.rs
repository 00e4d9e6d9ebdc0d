use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::net::{IpAddr, Ipv4Addr};
use utoipa::ToSchema;
use uuid::Uuid;

/// Network identity of the caller, extracted once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: IpAddr,
    pub user_agent: String,
}

impl ClientInfo {
    #[must_use]
    pub fn new(ip_address: IpAddr, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address,
            user_agent: user_agent.into(),
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), String::new())
    }
}

/// One row of the attempt ledger. Rows are never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub id: i64,
    pub username: String,
    pub ip_address: IpAddr,
    pub user_agent: String,
    pub success: bool,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLoginAttempt {
    pub username: String,
    pub ip_address: IpAddr,
    pub user_agent: String,
    pub success: bool,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub session_key: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ip_address: IpAddr,
    pub user_agent: String,
    pub is_active: bool,
}

impl<'r> FromRow<'r, PgRow> for UserSession {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_key: row.try_get("session_key")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            last_activity: row.try_get("last_activity")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

/// Values written by a session upsert.
#[derive(Debug, Clone)]
pub struct SessionUpsert {
    pub session_key: String,
    pub user_id: Uuid,
    pub ip_address: IpAddr,
    pub user_agent: String,
}

/// Account role, resolved once when the identity is loaded.
///
/// A company profile wins over a driver profile; staff and superusers without
/// a marketplace profile are `Admin`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Plain,
    Company,
    Driver,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn resolve(
        has_company: bool,
        has_driver: bool,
        is_staff: bool,
        is_superuser: bool,
    ) -> Self {
        if has_company {
            Self::Company
        } else if has_driver {
            Self::Driver
        } else if is_staff || is_superuser {
            Self::Admin
        } else {
            Self::Plain
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Company => "company",
            Self::Driver => "driver",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub has_company: bool,
    pub has_driver: bool,
    pub role: Role,
}

impl UserIdentity {
    /// True when a company profile is linked to this user.
    #[must_use]
    pub const fn is_company(&self) -> bool {
        self.has_company
    }

    /// True when a driver profile is linked to this user, whatever the role.
    #[must_use]
    pub const fn is_driver(&self) -> bool {
        self.has_driver
    }
}

impl<'r> FromRow<'r, PgRow> for UserIdentity {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let is_staff: bool = row.try_get("is_staff")?;
        let is_superuser: bool = row.try_get("is_superuser")?;
        let has_company: bool = row.try_get("has_company")?;
        let has_driver: bool = row.try_get("has_driver")?;
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_active: row.try_get("is_active")?,
            is_staff,
            is_superuser,
            has_company,
            has_driver,
            role: Role::resolve(has_company, has_driver, is_staff, is_superuser),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    Login,
    Logout,
}

impl ActivityAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub action: ActivityAction,
    pub ip_address: IpAddr,
    pub user_agent: String,
}
