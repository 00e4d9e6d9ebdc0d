//! HS256 access/refresh token pairs.
//!
//! Both tokens are JWTs signed with the same secret and told apart by the
//! `token_type` claim. Login forces a 5-day access token; access tokens minted
//! from a refresh token use the configured default lifetime.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::UserIdentity;

pub const LOGIN_ACCESS_TOKEN_TTL_SECONDS: i64 = 5 * 24 * 60 * 60;
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 5 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
/// Upper bound for configured TTLs (ten years).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is invalid or expired")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("Token has wrong type")]
    WrongType,
    #[error("Failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            access_ttl: TimeDelta::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
            refresh_ttl: TimeDelta::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl = TimeDelta::seconds(seconds.clamp(1, MAX_TOKEN_TTL_SECONDS));
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl = TimeDelta::seconds(seconds.clamp(1, MAX_TOKEN_TTL_SECONDS));
        self
    }

    /// Token pair issued by a successful login.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_login_pair(
        &self,
        user: &UserIdentity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let access = self.sign(
            user.id,
            &user.username,
            TokenType::Access,
            now,
            TimeDelta::seconds(LOGIN_ACCESS_TOKEN_TTL_SECONDS),
        )?;
        let refresh = self.sign(
            user.id,
            &user.username,
            TokenType::Refresh,
            now,
            self.refresh_ttl,
        )?;
        Ok(TokenPair { access, refresh })
    }

    /// Mint a fresh access token from a valid refresh token.
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` or `TokenError::WrongType` for unusable input.
    pub fn refresh_access(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.verify(refresh_token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongType);
        }
        self.sign(
            claims.sub,
            &claims.username,
            TokenType::Access,
            now,
            self.access_ttl,
        )
    }

    /// Only access tokens authenticate requests.
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` or `TokenError::WrongType`.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Access {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    /// Check signature and expiry of either token type.
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` when the token does not validate.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(TokenError::Invalid)?;
        Ok(data.claims)
    }

    fn sign(
        &self,
        user_id: Uuid,
        username: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            token_type,
            iat,
            exp: iat + ttl.num_seconds(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(TokenError::Signing)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"***")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use anyhow::Result;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(SecretString::from(secret.to_string()))
    }

    fn user() -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password_hash: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            has_company: false,
            has_driver: true,
            role: Role::Driver,
        }
    }

    #[test]
    fn oversized_ttl_is_clamped() -> Result<()> {
        let issuer = issuer("test-secret-that-is-long-enough")
            .with_access_ttl_seconds(i64::MAX)
            .with_refresh_ttl_seconds(i64::MAX);
        let now = Utc::now();
        let pair = issuer.issue_login_pair(&user(), now)?;
        let claims = issuer.verify(&pair.refresh)?;
        assert_eq!(claims.exp, (now + TimeDelta::seconds(MAX_TOKEN_TTL_SECONDS)).timestamp());
        Ok(())
    }

    #[test]
    fn login_access_token_lasts_five_days() -> Result<()> {
        let issuer = issuer("test-secret-that-is-long-enough");
        let user = user();
        let now = Utc::now();
        let pair = issuer.issue_login_pair(&user, now)?;

        let access = issuer.verify_access(&pair.access)?;
        assert_eq!(access.sub, user.id);
        assert_eq!(access.exp - access.iat, LOGIN_ACCESS_TOKEN_TTL_SECONDS);

        let refresh = issuer.verify(&pair.refresh)?;
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(refresh.exp - refresh.iat, DEFAULT_REFRESH_TOKEN_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn refresh_mints_default_access_token() -> Result<()> {
        let issuer = issuer("test-secret-that-is-long-enough").with_access_ttl_seconds(120);
        let pair = issuer.issue_login_pair(&user(), Utc::now())?;
        let access = issuer.refresh_access(&pair.refresh, Utc::now())?;
        let claims = issuer.verify_access(&access)?;
        assert_eq!(claims.exp - claims.iat, 120);
        Ok(())
    }

    #[test]
    fn access_token_cannot_refresh() -> Result<()> {
        let issuer = issuer("test-secret-that-is-long-enough");
        let pair = issuer.issue_login_pair(&user(), Utc::now())?;
        assert!(matches!(
            issuer.refresh_access(&pair.access, Utc::now()),
            Err(TokenError::WrongType)
        ));
        assert!(matches!(
            issuer.verify_access(&pair.refresh),
            Err(TokenError::WrongType)
        ));
        Ok(())
    }

    #[test]
    fn different_secret_fails() -> Result<()> {
        let pair = issuer("secret-alpha").issue_login_pair(&user(), Utc::now())?;
        assert!(matches!(
            issuer("secret-bravo").verify(&pair.access),
            Err(TokenError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn expired_token_fails() -> Result<()> {
        let issuer = issuer("test-secret-that-is-long-enough").with_refresh_ttl_seconds(60);
        // Well past the default 60 second leeway.
        let issued = Utc::now() - TimeDelta::hours(1);
        let pair = issuer.issue_login_pair(&user(), issued)?;
        assert!(matches!(
            issuer.verify(&pair.refresh),
            Err(TokenError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", issuer("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
