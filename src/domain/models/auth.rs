use crate::domain::models::membership::Role;
use crate::domain::models::tenant::Tenant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://shipment-tracking.local/claims/tenant_id")]
    pub tenant_id: String,

    #[serde(rename = "https://shipment-tracking.local/claims/role")]
    pub role: Role,

    #[serde(rename = "https://shipment-tracking.local/claims/email")]
    pub email: String,
}

#[derive(Debug, FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: String,
    pub tenant_id: String,
    pub family_id: String,
    pub generation_id: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The tenant-scoped identity every gated operation runs as. Derived from a
/// verified access token, never constructed from unauthenticated input.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub tenant_id: String,
    pub role: Role,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
    pub tenant: Tenant,
}
