//! Request/response types for auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::models::{Role, UserIdentity, UserSession};

/// Both fields are optional so blank and missing values share one error path.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_company: bool,
    pub is_driver: bool,
}

impl From<&UserIdentity> for UserSummary {
    fn from(user: &UserIdentity) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            is_company: user.is_company(),
            is_driver: user.is_driver(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserSummary,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DetailResponse {
    pub detail: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl From<UserSession> for SessionResponse {
    fn from(session: UserSession) -> Self {
        Self {
            user_id: session.user_id,
            ip_address: session.ip_address.to_string(),
            user_agent: session.user_agent,
            created_at: session.created_at,
            last_activity: session.last_activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(has_company: bool, has_driver: bool) -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            username: "dual".to_string(),
            email: "dual@example.com".to_string(),
            password_hash: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            has_company,
            has_driver,
            role: Role::resolve(has_company, has_driver, false, false),
        }
    }

    #[test]
    fn summary_flags_follow_linked_profiles() {
        let summary = UserSummary::from(&identity(true, true));
        assert_eq!(summary.role, Role::Company);
        assert!(summary.is_company);
        assert!(summary.is_driver);

        let summary = UserSummary::from(&identity(false, true));
        assert_eq!(summary.role, Role::Driver);
        assert!(!summary.is_company);
        assert!(summary.is_driver);
    }
}
