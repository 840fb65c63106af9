use crate::config::Config;
use crate::domain::ports::{
    AuthRepository, MailTransport, MembershipRepository, ShipmentRepository, TenantRepository,
    UserRepository,
};
use crate::domain::services::auth_service::Authenticator;
use crate::domain::services::directory::TenantDirectory;
use crate::domain::services::ledger::ShipmentLedger;
use crate::domain::services::notifier::NotificationDispatcher;
use crate::domain::services::registry::MembershipRegistry;
use std::sync::Arc;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub membership_repo: Arc<dyn MembershipRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub shipment_repo: Arc<dyn ShipmentRepository>,
    pub mail_transport: Arc<dyn MailTransport>,
    pub directory: Arc<TenantDirectory>,
    pub registry: Arc<MembershipRegistry>,
    pub authenticator: Arc<Authenticator>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub ledger: Arc<ShipmentLedger>,
    pub templates: Arc<Tera>,
}
