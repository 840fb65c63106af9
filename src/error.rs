use crate::domain::models::shipment::ShipmentStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Tenant not found")]
    TenantNotFound,
    #[error("Tenant is deactivated")]
    TenantInactive,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("No access to this tenant")]
    NoAccessToTenant,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Stable machine-readable kind for the HTTP layer to map onto status
    /// codes. Infrastructure failures collapse to "internal" so no store
    /// detail leaks to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal => "internal",
            AppError::TenantNotFound => "tenant_not_found",
            AppError::TenantInactive => "tenant_inactive",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::NoAccessToTenant => "no_access_to_tenant",
            AppError::Forbidden(_) => "forbidden",
            AppError::IllegalTransition { .. } => "illegal_transition",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation",
        }
    }
}

// 2067 / 1555 = SQLite unique constraint, 23505 = PostgreSQL unique violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        let code = db_err.code().unwrap_or_default();
        return code == "2067" || code == "1555" || code == "23505";
    }
    false
}
