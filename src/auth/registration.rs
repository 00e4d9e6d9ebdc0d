//! Company and driver account registration.

use anyhow::anyhow;
use regex::Regex;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    models::UserIdentity,
    password::{hash_password, MIN_PASSWORD_LENGTH},
    users::{CompanyProfile, DriverProfile, NewAccount, NewProfile, RegisterOutcome},
    Authenticator,
};

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("{0}")]
    Invalid(String),
    #[error("Username is already taken")]
    UsernameTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RegisterError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_registration",
            Self::UsernameTaken => "username_taken",
            Self::Internal(_) => "internal_error",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug)]
pub struct Registered {
    pub user: UserIdentity,
    pub profile_id: Uuid,
}

pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn require(field: &str, value: &str) -> Result<String, RegisterError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegisterError::Invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Validate and hash credentials shared by both account kinds.
fn prepare(registration: &Registration, profile: NewProfile) -> Result<NewAccount, RegisterError> {
    let username = require("username", &registration.username)?;
    if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(RegisterError::Invalid(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let email = match registration.email.as_deref().map(normalize_email) {
        Some(email) if !email.is_empty() => {
            if !valid_email(&email) {
                return Err(RegisterError::Invalid("email is invalid".to_string()));
            }
            email
        }
        _ => String::new(),
    };

    let password_hash =
        hash_password(&registration.password).map_err(|err| anyhow!("hash password: {err}"))?;

    Ok(NewAccount {
        username,
        email,
        password_hash,
        profile,
    })
}

impl Authenticator {
    /// Create a user with a company profile.
    ///
    /// # Errors
    /// Returns `RegisterError` on invalid input, a taken username or storage failure.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register_company(
        &self,
        registration: Registration,
        company: CompanyProfile,
    ) -> Result<Registered, RegisterError> {
        let company = CompanyProfile {
            company_name: require("company_name", &company.company_name)?,
            manager_full_name: company.manager_full_name.trim().to_string(),
            phone: company.phone.trim().to_string(),
            address: company.address.trim().to_string(),
        };
        let account = prepare(&registration, NewProfile::Company(company))?;
        self.register(account).await
    }

    /// Create a user with a driver profile, optionally attached to a company.
    ///
    /// # Errors
    /// Returns `RegisterError` on invalid input, a taken username or storage failure.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register_driver(
        &self,
        registration: Registration,
        driver: DriverProfile,
    ) -> Result<Registered, RegisterError> {
        let driver = DriverProfile {
            full_name: require("full_name", &driver.full_name)?,
            mobile: driver.mobile.trim().to_string(),
            plate_number: driver.plate_number.trim().to_string(),
            vehicle_type: driver.vehicle_type.trim().to_string(),
            company_id: driver.company_id,
        };
        let account = prepare(&registration, NewProfile::Driver(driver))?;
        self.register(account).await
    }

    async fn register(&self, account: NewAccount) -> Result<Registered, RegisterError> {
        match self.stores().users.register(account, self.now()).await? {
            RegisterOutcome::Created { user, profile_id } => {
                info!(user_id = %user.id, role = user.role.as_str(), "Account registered");
                Ok(Registered { user, profile_id })
            }
            RegisterOutcome::UsernameTaken => Err(RegisterError::UsernameTaken),
            RegisterOutcome::UnknownCompany => Err(RegisterError::Invalid(
                "company_id does not exist".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        clock::SystemClock,
        memory::MemoryStore,
        service::LoginRequest,
        tokens::TokenIssuer,
    };
    use anyhow::Result;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn authenticator() -> Authenticator {
        let store = Arc::new(MemoryStore::new());
        Authenticator::new(
            store.stores(),
            TokenIssuer::new(SecretString::from("test-secret".to_string())),
            Arc::new(SystemClock),
        )
    }

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: "long-enough".to_string(),
            email: Some(format!(" {username}@Example.com ")),
        }
    }

    fn company() -> CompanyProfile {
        CompanyProfile {
            company_name: "Acme Haulage".to_string(),
            manager_full_name: "Ada Manager".to_string(),
            phone: "+1 555 0100".to_string(),
            address: "1 Depot Road".to_string(),
        }
    }

    fn driver() -> DriverProfile {
        DriverProfile {
            full_name: "Dee Driver".to_string(),
            mobile: "+1 555 0199".to_string(),
            plate_number: "TRK-001".to_string(),
            vehicle_type: "box truck".to_string(),
            company_id: None,
        }
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(valid_email("a@example.com"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-domain@"));
    }

    #[tokio::test]
    async fn company_registration_can_login() -> Result<()> {
        let auth = authenticator();
        let registered = auth
            .register_company(registration("acme"), company())
            .await?;
        assert!(registered.user.is_company());
        assert_eq!(registered.user.email, "acme@example.com");

        let success = auth
            .login(LoginRequest {
                username: Some("acme".to_string()),
                password: Some("long-enough".to_string()),
                ..LoginRequest::default()
            })
            .await?;
        assert_eq!(success.user.id, registered.user.id);
        Ok(())
    }

    #[tokio::test]
    async fn driver_registration_sets_driver_flag() -> Result<()> {
        let auth = authenticator();
        let registered = auth.register_driver(registration("dee"), driver()).await?;
        assert!(registered.user.is_driver());
        assert!(!registered.user.is_company());
        Ok(())
    }

    #[tokio::test]
    async fn driver_company_must_exist() -> Result<()> {
        let auth = authenticator();

        let mut orphan = driver();
        orphan.company_id = Some(uuid::Uuid::new_v4());
        let result = auth.register_driver(registration("orphan"), orphan).await;
        assert!(
            matches!(&result, Err(RegisterError::Invalid(detail)) if detail == "company_id does not exist")
        );

        let company = auth
            .register_company(registration("acme"), company())
            .await?;
        let mut employed = driver();
        employed.company_id = Some(company.profile_id);
        let registered = auth.register_driver(registration("dee"), employed).await?;
        assert!(registered.user.is_driver());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() -> Result<()> {
        let auth = authenticator();
        auth.register_driver(registration("dee"), driver()).await?;
        let result = auth.register_company(registration("dee"), company()).await;
        assert!(matches!(result, Err(RegisterError::UsernameTaken)));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let auth = authenticator();

        let mut short = registration("shorty");
        short.password = "short".to_string();
        let result = auth.register_driver(short, driver()).await;
        assert!(matches!(result, Err(RegisterError::Invalid(_))));

        let mut bad_email = registration("mailer");
        bad_email.email = Some("nope".to_string());
        let result = auth.register_driver(bad_email, driver()).await;
        assert!(matches!(result, Err(RegisterError::Invalid(_))));

        let result = auth.register_driver(registration("  "), driver()).await;
        assert!(matches!(result, Err(RegisterError::Invalid(_))));

        let mut nameless = company();
        nameless.company_name = " ".to_string();
        let result = auth.register_company(registration("acme"), nameless).await;
        assert!(matches!(result, Err(RegisterError::Invalid(_))));
    }
}
