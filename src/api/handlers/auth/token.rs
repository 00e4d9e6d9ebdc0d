//! Stateless token refresh and verification.

use axum::{extract::Extension, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    state::AuthState,
    types::{RefreshRequest, RefreshResponse, VerifyRequest},
};
use crate::api::handlers::error::{ApiError, ErrorBody};

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "missing_credentials",
                format!("{field} is required"),
            )
        })
}

#[utoipa::path(
    post,
    path = "/v1/auth/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 400, description = "Refresh token missing", body = ErrorBody),
        (status = 401, description = "Refresh token invalid or expired", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let body = payload.map(|Json(body)| body).unwrap_or_default();
    let refresh_token = required(body.refresh, "refresh")?;

    let authenticator = auth_state.authenticator();
    let access = authenticator
        .tokens()
        .refresh_access(&refresh_token, authenticator.now())?;

    Ok(Json(RefreshResponse { access }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/token/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Token signature and expiry are valid"),
        (status = 400, description = "Token missing", body = ErrorBody),
        (status = 401, description = "Token invalid or expired", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn verify(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyRequest>>,
) -> Result<Json<Value>, ApiError> {
    let body = payload.map(|Json(body)| body).unwrap_or_default();
    let token = required(body.token, "token")?;

    auth_state.authenticator().tokens().verify(&token)?;

    Ok(Json(json!({})))
}
