use axum::{
    extract::{ConnectInfo, Extension},
    http::HeaderMap,
    Json,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::instrument;

use super::{
    state::AuthState,
    types::{LoginRequest, LoginResponse, UserSummary},
    utils::{client_info, extract_session_key},
};
use crate::{api::handlers::error::{ApiError, ErrorBody}, auth};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Username or password missing", body = ErrorBody),
        (status = 401, description = "Unknown user or wrong password", body = ErrorBody),
        (status = 429, description = "Too many failed attempts for this username and IP", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, ApiError> {
    let body = payload.map(|Json(body)| body).unwrap_or_default();

    let request = auth::LoginRequest {
        username: body.username,
        password: body.password,
        client: client_info(&headers, peer.map(|ConnectInfo(addr)| addr)),
        session_key: extract_session_key(&headers),
    };

    let success = auth_state.authenticator().login(request).await?;

    Ok(Json(LoginResponse {
        access: success.tokens.access,
        refresh: success.tokens.refresh,
        user: UserSummary::from(&success.user),
    }))
}
