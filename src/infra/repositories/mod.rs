pub mod sqlite_tenant_repo;
pub mod sqlite_user_repo;
pub mod sqlite_membership_repo;
pub mod sqlite_shipment_repo;
pub mod sqlite_auth_repo;

pub mod postgres_tenant_repo;
pub mod postgres_user_repo;
pub mod postgres_membership_repo;
pub mod postgres_shipment_repo;
pub mod postgres_auth_repo;
