use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_platform_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String, is_platform_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            is_platform_admin,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
