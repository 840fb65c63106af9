use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// The closed role vocabulary. Stored as snake_case TEXT; there is no
/// hierarchy beyond what the capability matrix grants each variant.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    PlatformAdmin,
    TenantOwner,
    OperatorOrigin,
    OperatorDestination,
    Sender,
    Recipient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformAdmin => "platform_admin",
            Role::TenantOwner => "tenant_owner",
            Role::OperatorOrigin => "operator_origin",
            Role::OperatorDestination => "operator_destination",
            Role::Sender => "sender",
            Role::Recipient => "recipient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(user_id: String, tenant_id: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            tenant_id,
            role,
            active: true,
            created_at: Utc::now(),
        }
    }
}
