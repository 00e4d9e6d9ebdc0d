//! Request/response types for account registration.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::handlers::auth::types::UserSummary,
    auth::{
        registration::Registration,
        users::{CompanyProfile, DriverProfile},
    },
};

// Missing fields deserialize to empty strings and are rejected by validation,
// so every bad payload gets the same error shape.

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UserFields {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl From<UserFields> for Registration {
    fn from(user: UserFields) -> Self {
        Self {
            username: user.username,
            password: user.password,
            email: user.email,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RegisterCompanyRequest {
    #[serde(default)]
    pub user: UserFields,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub manager_full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl RegisterCompanyRequest {
    pub(super) fn into_parts(self) -> (Registration, CompanyProfile) {
        let profile = CompanyProfile {
            company_name: self.company_name,
            manager_full_name: self.manager_full_name,
            phone: self.phone,
            address: self.address.unwrap_or_default(),
        };
        (self.user.into(), profile)
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RegisterDriverRequest {
    #[serde(default)]
    pub user: UserFields,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub plate_number: String,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub company_id: Option<Uuid>,
}

impl RegisterDriverRequest {
    pub(super) fn into_parts(self) -> (Registration, DriverProfile) {
        let profile = DriverProfile {
            full_name: self.full_name,
            mobile: self.mobile,
            plate_number: self.plate_number,
            vehicle_type: self.vehicle_type.unwrap_or_default(),
            company_id: self.company_id,
        };
        (self.user.into(), profile)
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisteredResponse {
    /// Id of the created company or driver profile.
    pub id: Uuid,
    pub user: UserSummary,
}
