//! Company and driver self-registration.

pub(crate) mod types;

use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;
use tracing::instrument;

use super::{
    auth::{types::UserSummary, AuthState},
    error::{ApiError, ErrorBody},
};
use crate::auth::registration::Registered;
use types::{RegisterCompanyRequest, RegisterDriverRequest, RegisteredResponse};

fn missing_payload() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "invalid_registration",
        "Missing payload",
    )
}

fn created(registered: &Registered) -> (StatusCode, Json<RegisteredResponse>) {
    (
        StatusCode::CREATED,
        Json(RegisteredResponse {
            id: registered.profile_id,
            user: UserSummary::from(&registered.user),
        }),
    )
}

#[utoipa::path(
    post,
    path = "/v1/accounts/register/company",
    request_body = RegisterCompanyRequest,
    responses(
        (status = 201, description = "Company account created", body = RegisteredResponse),
        (status = 400, description = "Invalid registration payload", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody)
    ),
    tag = "accounts"
)]
#[instrument(skip_all)]
pub async fn register_company(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterCompanyRequest>>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let Some(Json(request)) = payload else {
        return Err(missing_payload());
    };
    let (registration, company) = request.into_parts();
    let registered = auth_state
        .authenticator()
        .register_company(registration, company)
        .await?;
    Ok(created(&registered))
}

#[utoipa::path(
    post,
    path = "/v1/accounts/register/driver",
    request_body = RegisterDriverRequest,
    responses(
        (status = 201, description = "Driver account created", body = RegisteredResponse),
        (status = 400, description = "Invalid registration payload", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody)
    ),
    tag = "accounts"
)]
#[instrument(skip_all)]
pub async fn register_driver(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterDriverRequest>>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let Some(Json(request)) = payload else {
        return Err(missing_payload());
    };
    let (registration, driver) = request.into_parts();
    let registered = auth_state
        .authenticator()
        .register_driver(registration, driver)
        .await?;
    Ok(created(&registered))
}
