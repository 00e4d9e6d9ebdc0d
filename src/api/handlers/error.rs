//! JSON error responses shared by all handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{registration::RegisterError, tokens::TokenError, LoginError};

const INTERNAL_DETAIL: &str = "Internal server error";

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    detail: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            code,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn not_authenticated() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "not_authenticated",
            "Authentication credentials were not provided",
        )
    }

    /// Log the cause and hide it from the client.
    #[must_use]
    pub fn internal(err: &anyhow::Error) -> Self {
        error!("Request failed: {err:#}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            INTERNAL_DETAIL,
        )
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        let status = match &err {
            LoginError::MissingCredentials => StatusCode::BAD_REQUEST,
            LoginError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            LoginError::UserNotFound | LoginError::InvalidPassword => StatusCode::UNAUTHORIZED,
            LoginError::Internal(source) => return Self::internal(source),
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> Self {
        let status = match &err {
            RegisterError::Invalid(_) => StatusCode::BAD_REQUEST,
            RegisterError::UsernameTaken => StatusCode::CONFLICT,
            RegisterError::Internal(source) => return Self::internal(source),
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        if let TokenError::Signing(source) = &err {
            error!("Failed to sign token: {source}");
            return Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                INTERNAL_DETAIL,
            );
        }
        Self::new(StatusCode::UNAUTHORIZED, "token_not_valid", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn login_errors_map_to_status() {
        let cases = [
            (LoginError::MissingCredentials, StatusCode::BAD_REQUEST),
            (LoginError::TooManyAttempts, StatusCode::TOO_MANY_REQUESTS),
            (LoginError::UserNotFound, StatusCode::UNAUTHORIZED),
            (LoginError::InvalidPassword, StatusCode::UNAUTHORIZED),
            (
                LoginError::Internal(anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let code = err.code();
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = ApiError::from(RegisterError::Internal(anyhow!("password=hunter2")));
        assert_eq!(api.detail, INTERNAL_DETAIL);
    }

    #[test]
    fn token_errors_are_unauthorized() {
        let api = ApiError::from(TokenError::WrongType);
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(api.code(), "token_not_valid");
    }
}
