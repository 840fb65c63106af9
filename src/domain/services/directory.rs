use crate::domain::models::tenant::Tenant;
use crate::domain::ports::TenantRepository;
use crate::error::{is_unique_violation, AppError};
use std::sync::Arc;
use tracing::info;

/// Read-mostly lookup over the tenant set. The identifier is a slug or a
/// domain name extracted by the request router upstream.
pub struct TenantDirectory {
    repo: Arc<dyn TenantRepository>,
}

impl TenantDirectory {
    pub fn new(repo: Arc<dyn TenantRepository>) -> Self {
        Self { repo }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<Tenant, AppError> {
        let tenant = match self.repo.find_by_slug(identifier).await? {
            Some(t) => Some(t),
            None => self.repo.find_by_domain(identifier).await?,
        };

        let tenant = tenant.ok_or(AppError::TenantNotFound)?;
        if !tenant.active {
            return Err(AppError::TenantInactive);
        }
        Ok(tenant)
    }

    pub async fn provision(
        &self,
        name: String,
        slug: String,
        domain: Option<String>,
    ) -> Result<Tenant, AppError> {
        let tenant = Tenant::new(name, slug, domain);
        let created = self.repo.create(&tenant).await.map_err(|e| match e {
            AppError::Database(db) if is_unique_violation(&db) => {
                AppError::Conflict(format!("Tenant slug '{}' is already taken", tenant.slug))
            }
            other => other,
        })?;
        info!("Provisioned tenant {} ({})", created.slug, created.id);
        Ok(created)
    }

    /// Tenants are never hard-deleted; deactivation hides the tenant and
    /// everything scoped to it.
    pub async fn deactivate(&self, tenant_id: &str) -> Result<Tenant, AppError> {
        let mut tenant = self
            .repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::TenantNotFound)?;
        tenant.active = false;
        let updated = self.repo.update(&tenant).await?;
        info!("Deactivated tenant {}", updated.slug);
        Ok(updated)
    }
}
