use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, PgPool, SqlitePool};
use tera::Tera;
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::services::auth_service::Authenticator;
use crate::domain::services::directory::TenantDirectory;
use crate::domain::services::ledger::ShipmentLedger;
use crate::domain::services::notifier::NotificationDispatcher;
use crate::domain::services::registry::MembershipRegistry;
use crate::infra::email::http_mail::HttpMailTransport;
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_membership_repo::PostgresMembershipRepo,
    postgres_shipment_repo::PostgresShipmentRepo, postgres_tenant_repo::PostgresTenantRepo,
    postgres_user_repo::PostgresUserRepo, sqlite_auth_repo::SqliteAuthRepo,
    sqlite_membership_repo::SqliteMembershipRepo, sqlite_shipment_repo::SqliteShipmentRepo,
    sqlite_tenant_repo::SqliteTenantRepo, sqlite_user_repo::SqliteUserRepo,
};
use crate::state::AppState;

pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template(
        "status_update_subject",
        include_str!("../templates/status_update_subject.txt"),
    )
    .expect("Failed to load status update subject template");
    tera.add_raw_template(
        "status_update_body",
        include_str!("../templates/status_update_body.html"),
    )
    .expect("Failed to load status update body template");
    tera
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let mail_transport = Arc::new(HttpMailTransport::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let templates = Arc::new(load_templates());

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        build_state(
            config,
            Arc::new(PostgresTenantRepo::new(pool.clone())),
            Arc::new(PostgresUserRepo::new(pool.clone())),
            Arc::new(PostgresMembershipRepo::new(pool.clone())),
            Arc::new(PostgresAuthRepo::new(pool.clone())),
            Arc::new(PostgresShipmentRepo::new(pool.clone())),
            mail_transport,
            templates,
        )
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        build_state(
            config,
            Arc::new(SqliteTenantRepo::new(pool.clone())),
            Arc::new(SqliteUserRepo::new(pool.clone())),
            Arc::new(SqliteMembershipRepo::new(pool.clone())),
            Arc::new(SqliteAuthRepo::new(pool.clone())),
            Arc::new(SqliteShipmentRepo::new(pool.clone())),
            mail_transport,
            templates,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn build_state(
    config: &Config,
    tenant_repo: Arc<dyn crate::domain::ports::TenantRepository>,
    user_repo: Arc<dyn crate::domain::ports::UserRepository>,
    membership_repo: Arc<dyn crate::domain::ports::MembershipRepository>,
    auth_repo: Arc<dyn crate::domain::ports::AuthRepository>,
    shipment_repo: Arc<dyn crate::domain::ports::ShipmentRepository>,
    mail_transport: Arc<dyn crate::domain::ports::MailTransport>,
    templates: Arc<Tera>,
) -> AppState {
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

    AppState {
        config: config.clone(),
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
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
