//! Auth state and configuration shared by handlers.

use url::Url;

use crate::auth::Authenticator;

const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_cookie_secure: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        // Only mark cookies secure when the frontend is served over HTTPS.
        let session_cookie_secure = Url::parse(&frontend_base_url)
            .map(|url| url.scheme() == "https")
            .unwrap_or(false);
        Self {
            frontend_base_url,
            session_cookie_secure,
        }
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTEND_BASE_URL.to_string())
    }
}

pub struct AuthState {
    config: AuthConfig,
    authenticator: Authenticator,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, authenticator: Authenticator) -> Self {
        Self {
            config,
            authenticator,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}
