use shipment_backend::{
    config::Config,
    domain::models::{
        auth::{Actor, LoginOutcome},
        membership::{Membership, Role},
        shipment::{Contact, NewShipment},
        tenant::Tenant,
        user::User,
    },
    domain::ports::MailTransport,
    domain::services::auth_service::Authenticator,
    domain::services::directory::TenantDirectory,
    domain::services::ledger::ShipmentLedger,
    domain::services::notifier::NotificationDispatcher,
    domain::services::registry::MembershipRegistry,
    error::AppError,
    infra::factory::load_templates,
    infra::repositories::{
        sqlite_auth_repo::SqliteAuthRepo, sqlite_membership_repo::SqliteMembershipRepo,
        sqlite_shipment_repo::SqliteShipmentRepo, sqlite_tenant_repo::SqliteTenantRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    state::AppState,
};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records every send; addresses in `fail_addresses` get a simulated
/// transport failure instead.
pub struct MockMailTransport {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    pub fail_addresses: Arc<Mutex<HashSet<String>>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_addresses: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, to_address: &str, subject: &str, body: &str) -> Result<(), AppError> {
        if self
            .fail_addresses
            .lock()
            .unwrap()
            .contains(to_address)
        {
            return Err(AppError::Internal);
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to_address.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub state: Arc<AppState>,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub mailbox: Arc<Mutex<Vec<SentMail>>>,
    pub fail_addresses: Arc<Mutex<HashSet<String>>>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
        };

        let transport = MockMailTransport::new();
        let mailbox = transport.sent.clone();
        let fail_addresses = transport.fail_addresses.clone();
        let mail_transport: Arc<dyn MailTransport> = Arc::new(transport);

        let tenant_repo = Arc::new(SqliteTenantRepo::new(pool.clone()));
        let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));
        let membership_repo = Arc::new(SqliteMembershipRepo::new(pool.clone()));
        let auth_repo = Arc::new(SqliteAuthRepo::new(pool.clone()));
        let shipment_repo = Arc::new(SqliteShipmentRepo::new(pool.clone()));

        let templates = Arc::new(load_templates());
        let directory = Arc::new(TenantDirectory::new(tenant_repo.clone()));
        let registry = Arc::new(MembershipRegistry::new(membership_repo.clone()));
        let authenticator = Arc::new(Authenticator::new(
            user_repo.clone(),
            tenant_repo.clone(),
            auth_repo.clone(),
            directory.clone(),
            registry.clone(),
            config.clone(),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            mail_transport.clone(),
            templates.clone(),
        ));
        let ledger = Arc::new(ShipmentLedger::new(shipment_repo.clone(), dispatcher.clone()));

        let state = Arc::new(AppState {
            config,
            tenant_repo,
            user_repo,
            membership_repo,
            auth_repo,
            shipment_repo,
            mail_transport,
            directory,
            registry,
            authenticator,
            dispatcher,
            ledger,
            templates,
        });

        Self {
            state,
            pool,
            db_filename,
            mailbox,
            fail_addresses,
        }
    }

    /// Synthetic platform-scoped superuser for seeding fixtures.
    pub fn platform_actor() -> Actor {
        Actor {
            user_id: "seed-admin".to_string(),
            tenant_id: "platform".to_string(),
            role: Role::PlatformAdmin,
            email: "seed@platform.local".to_string(),
        }
    }

    pub async fn seed_tenant(&self, name: &str, slug: &str) -> Tenant {
        self.state
            .directory
            .provision(name.to_string(), slug.to_string(), None)
            .await
            .expect("Failed to seed tenant")
    }

    pub async fn seed_user(&self, email: &str, password: &str) -> User {
        self.state
            .authenticator
            .register_user(email, password, false)
            .await
            .expect("Failed to seed user")
    }

    pub async fn seed_platform_admin(&self, email: &str, password: &str) -> User {
        self.state
            .authenticator
            .register_user(email, password, true)
            .await
            .expect("Failed to seed platform admin")
    }

    pub async fn grant(&self, tenant: &Tenant, user: &User, role: Role) -> Membership {
        self.state
            .registry
            .grant(&Self::platform_actor(), &tenant.id, &user.id, role)
            .await
            .expect("Failed to grant membership")
    }

    pub async fn login(&self, email: &str, password: &str, tenant_slug: &str) -> LoginOutcome {
        self.state
            .authenticator
            .login(email, password, tenant_slug)
            .await
            .expect("Login failed in test helper")
    }

    /// Login and decode the access token into the actor identity.
    pub async fn actor(&self, email: &str, password: &str, tenant_slug: &str) -> Actor {
        let outcome = self.login(email, password, tenant_slug).await;
        self.state
            .authenticator
            .verify_token(&outcome.access_token)
            .expect("Access token failed verification")
    }

    /// Fully provisioned operator in a fresh tenant, ready to use the ledger.
    pub async fn seed_operator(&self, slug: &str) -> Actor {
        let tenant = self.seed_tenant(&format!("{} Logistics", slug), slug).await;
        let email = format!("ops@{}.example.com", slug);
        let user = self.seed_user(&email, "op-password-123").await;
        self.grant(&tenant, &user, Role::OperatorOrigin).await;
        self.actor(&email, "op-password-123", slug).await
    }
}

#[allow(dead_code)]
pub fn sample_payload(sender_email: &str, recipient_email: &str) -> NewShipment {
    NewShipment {
        sender: Contact {
            name: "Ada Sender".to_string(),
            address: "1 Origin Street, Springfield".to_string(),
            phone: "+1 555 0100".to_string(),
            email: sender_email.to_string(),
        },
        recipient: Contact {
            name: "Bob Recipient".to_string(),
            address: "9 Destination Avenue, Shelbyville".to_string(),
            phone: "+1 555 0200".to_string(),
            email: recipient_email.to_string(),
        },
        weight_kg: 2.5,
        declared_value: 120.0,
        description: "Ceramic teapot".to_string(),
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
