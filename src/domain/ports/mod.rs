use crate::domain::models::{
    auth::RefreshTokenRecord,
    membership::Membership,
    shipment::{HistoryEntry, Shipment, ShipmentStatus},
    tenant::Tenant,
    user::User,
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, AppError>;
    async fn update(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn create(&self, membership: &Membership) -> Result<Membership, AppError>;
    async fn find_by_user_and_tenant(
        &self,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<Option<Membership>, AppError>;
    async fn find_by_id(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<Option<Membership>, AppError>;
    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Membership>, AppError>;
    async fn update(&self, membership: &Membership) -> Result<Membership, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    /// Inserts the shipment row and its first history entry in one
    /// transaction. A shipment must never exist without history.
    async fn create_with_history(
        &self,
        shipment: &Shipment,
        entry: &HistoryEntry,
    ) -> Result<Shipment, AppError>;

    async fn find_by_id(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<Option<Shipment>, AppError>;

    /// Tenant-agnostic lookup for the public tracking endpoint.
    async fn find_by_tracking_code(&self, code: &str) -> Result<Option<Shipment>, AppError>;

    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Shipment>, AppError>;

    /// Compare-and-swap transition: bumps the version and appends the history
    /// entry in one transaction. Returns `Conflict` when `expected_version`
    /// lost a race, leaving the shipment untouched.
    async fn append_transition(
        &self,
        tenant_id: &str,
        shipment_id: &str,
        expected_version: i64,
        new_status: ShipmentStatus,
        entry: &HistoryEntry,
    ) -> Result<Shipment, AppError>;

    async fn list_history(&self, shipment_id: &str) -> Result<Vec<HistoryEntry>, AppError>;
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to_address: &str, subject: &str, body: &str) -> Result<(), AppError>;
}
