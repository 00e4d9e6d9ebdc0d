//! Session endpoints and the transport session cookie.

use axum::{
    extract::{ConnectInfo, Extension, Request, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{debug, error};

use super::{
    state::AuthState,
    types::{DetailResponse, SessionResponse},
    utils::{
        clear_session_cookie, client_info, extract_bearer_token, extract_session_key,
        generate_session_key, session_cookie,
    },
};
use crate::{
    api::handlers::error::{ApiError, ErrorBody},
    auth::SessionStatus,
};

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Session deactivated and cookie cleared", body = DetailResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorBody),
        (status = 500, description = "Session could not be deactivated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<Response, ApiError> {
    let authenticator = auth_state.authenticator();
    let claims = extract_bearer_token(&headers)
        .and_then(|token| authenticator.tokens().verify_access(&token).ok())
        .ok_or_else(ApiError::not_authenticated)?;

    let session_key = extract_session_key(&headers);
    let client = client_info(&headers, peer.map(|ConnectInfo(addr)| addr));

    if let Err(err) = authenticator
        .logout(claims.sub, session_key.as_deref(), &client)
        .await
    {
        error!("Failed to deactivate session: {err:#}");
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Logout failed",
        ));
    }

    let mut response_headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config().session_cookie_secure()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err:#}"),
    }

    Ok((
        StatusCode::OK,
        response_headers,
        Json(DetailResponse {
            detail: "Successfully logged out".to_string(),
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session"),
        (status = 401, description = "Session expired after inactivity", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn session(
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    // Missing cookies are treated as "no session".
    let Some(session_key) = extract_session_key(&headers) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    match auth_state
        .authenticator()
        .session_status(&session_key)
        .await
        .map_err(|err| ApiError::internal(&err))?
    {
        SessionStatus::Missing => Ok(StatusCode::NO_CONTENT.into_response()),
        SessionStatus::Expired => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "session_expired",
            "Session expired due to inactivity",
        )),
        SessionStatus::Active(session) => {
            Ok((StatusCode::OK, Json(SessionResponse::from(session))).into_response())
        }
    }
}

/// Issue a transport session key to clients that do not have one yet.
pub async fn ensure_session_cookie(
    State(auth_state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    if extract_session_key(request.headers()).is_some() {
        return next.run(request).await;
    }

    let mut response = next.run(request).await;
    // Handlers that already manage the cookie (logout) win.
    if response.headers().contains_key(SET_COOKIE) {
        return response;
    }

    let cookie = generate_session_key().and_then(|key| {
        session_cookie(&key, auth_state.config().session_cookie_secure())
    });
    match cookie {
        Ok(cookie) => {
            debug!("Issued transport session cookie");
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to issue session cookie: {err:#}"),
    }
    response
}
