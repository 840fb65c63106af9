use crate::domain::models::auth::Actor;
use crate::domain::models::membership::{Membership, Role};
use crate::domain::ports::MembershipRepository;
use crate::domain::services::access::{can, Action, Resource};
use crate::error::{is_unique_violation, AppError};
use std::sync::Arc;
use tracing::info;

/// Maps (user, tenant) to a role. Uniqueness of the pair is a schema
/// constraint, not retry logic; memberships are deactivated, never deleted.
pub struct MembershipRegistry {
    repo: Arc<dyn MembershipRepository>,
}

impl MembershipRegistry {
    pub fn new(repo: Arc<dyn MembershipRepository>) -> Self {
        Self { repo }
    }

    /// Active membership lookup used by the Authenticator. Not gated: it runs
    /// before any session exists.
    pub async fn active_membership(
        &self,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<Option<Membership>, AppError> {
        let membership = self.repo.find_by_user_and_tenant(user_id, tenant_id).await?;
        Ok(membership.filter(|m| m.active))
    }

    pub async fn grant(
        &self,
        actor: &Actor,
        tenant_id: &str,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, AppError> {
        self.check(actor, Action::Create, tenant_id)?;

        let membership = Membership::new(user_id.to_string(), tenant_id.to_string(), role);
        let created = self.repo.create(&membership).await.map_err(|e| match e {
            AppError::Database(db) if is_unique_violation(&db) => {
                AppError::Conflict("User already has a membership in this tenant".to_string())
            }
            other => other,
        })?;
        info!(
            "Granted role {} to user {} in tenant {}",
            created.role, created.user_id, created.tenant_id
        );
        Ok(created)
    }

    pub async fn change_role(
        &self,
        actor: &Actor,
        tenant_id: &str,
        membership_id: &str,
        role: Role,
    ) -> Result<Membership, AppError> {
        self.check(actor, Action::Update, tenant_id)?;

        let mut membership = self
            .repo
            .find_by_id(tenant_id, membership_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;
        membership.role = role;
        self.repo.update(&membership).await
    }

    pub async fn revoke(
        &self,
        actor: &Actor,
        tenant_id: &str,
        membership_id: &str,
    ) -> Result<Membership, AppError> {
        self.check(actor, Action::Delete, tenant_id)?;

        let mut membership = self
            .repo
            .find_by_id(tenant_id, membership_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;
        membership.active = false;
        let revoked = self.repo.update(&membership).await?;
        info!(
            "Revoked membership {} for user {} in tenant {}",
            revoked.id, revoked.user_id, revoked.tenant_id
        );
        Ok(revoked)
    }

    pub async fn list(&self, actor: &Actor, tenant_id: &str) -> Result<Vec<Membership>, AppError> {
        self.check(actor, Action::View, tenant_id)?;
        self.repo.list_by_tenant(tenant_id).await
    }

    fn check(&self, actor: &Actor, action: Action, tenant_id: &str) -> Result<(), AppError> {
        // Platform admins may act across tenants; everyone else only inside
        // the tenant their session is scoped to.
        if actor.role != Role::PlatformAdmin && actor.tenant_id != tenant_id {
            return Err(AppError::NotFound("Membership not found".to_string()));
        }
        if !can(actor.role, action, Resource::Memberships) {
            return Err(AppError::Forbidden(
                "Not allowed to manage memberships".to_string(),
            ));
        }
        Ok(())
    }
}
