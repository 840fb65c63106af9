use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Tenant {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub domain: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: String, slug: String, domain: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug,
            name,
            domain,
            active: true,
            created_at: Utc::now(),
        }
    }
}
