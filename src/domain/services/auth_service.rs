use crate::config::Config;
use crate::domain::models::{
    auth::{Actor, Claims, LoginOutcome, RefreshTokenRecord},
    membership::Role,
    user::User,
};
use crate::domain::ports::{AuthRepository, TenantRepository, UserRepository};
use crate::domain::services::directory::TenantDirectory;
use crate::domain::services::registry::MembershipRegistry;
use crate::error::{is_unique_violation, AppError};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const TOKEN_AUDIENCE: &str = "shipment-backoffice";

// Verified against when the email does not resolve to a usable account, so
// the failure path costs one full argon2 computation either way.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    tenants: Arc<dyn TenantRepository>,
    auth_repo: Arc<dyn AuthRepository>,
    directory: Arc<TenantDirectory>,
    registry: Arc<MembershipRegistry>,
    config: Config,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tenants: Arc<dyn TenantRepository>,
        auth_repo: Arc<dyn AuthRepository>,
        directory: Arc<TenantDirectory>,
        registry: Arc<MembershipRegistry>,
        config: Config,
    ) -> Self {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .expect("Invalid JWT Private Key PEM");
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())
            .expect("Invalid JWT Public Key PEM");

        Self {
            users,
            tenants,
            auth_repo,
            directory,
            registry,
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Provisioning/registration entry point of the credential store.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        is_platform_admin: bool,
    ) -> Result<User, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password must not be empty".to_string(),
            ));
        }
        let password_hash = self.hash_password(password)?;
        let user = User::new(email.to_lowercase(), password_hash, is_platform_admin);
        let created = self.users.create(&user).await.map_err(|e| match e {
            AppError::Database(db) if is_unique_violation(&db) => {
                AppError::Conflict("Email is already registered".to_string())
            }
            other => other,
        })?;
        info!("Registered user {}", created.id);
        Ok(created)
    }

    /// Users are never deleted; history entries reference them immutably.
    pub async fn deactivate_user(&self, user_id: &str) -> Result<User, AppError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.is_active = false;
        self.users.update(&user).await
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        tenant_identifier: &str,
    ) -> Result<LoginOutcome, AppError> {
        // Tenant context first: a bad tenant must fail before any password
        // work, otherwise the response leaks whether the account exists.
        let tenant = self.directory.resolve(tenant_identifier).await?;

        let user = self.users.find_by_email(&email.to_lowercase()).await?;
        let user = match user {
            Some(u) if u.is_active => u,
            _ => {
                let _ = Self::verify_password(password, DUMMY_HASH);
                warn!("Failed login attempt for tenant {}", tenant.slug);
                return Err(AppError::InvalidCredentials);
            }
        };

        if Self::verify_password(password, &user.password_hash).is_err() {
            warn!("Failed login attempt for tenant {}", tenant.slug);
            return Err(AppError::InvalidCredentials);
        }

        let role = if user.is_platform_admin {
            Role::PlatformAdmin
        } else {
            self.registry
                .active_membership(&user.id, &tenant.id)
                .await?
                .map(|m| m.role)
                .ok_or(AppError::NoAccessToTenant)?
        };

        let family_id = Uuid::new_v4().to_string();
        let (access_token, refresh_token) = self
            .issue_token_pair(&user, &tenant.id, role, family_id, 1)
            .await?;

        info!("User {} logged in to tenant {}", user.id, tenant.slug);

        Ok(LoginOutcome {
            access_token,
            refresh_token,
            role,
            tenant,
        })
    }

    /// Decodes and validates an access token into the tenant-scoped actor.
    pub fn verify_token(&self, access_token: &str) -> Result<Actor, AppError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[&self.config.auth_issuer]);

        let token_data = decode::<Claims>(access_token, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidCredentials)?;

        Ok(Actor {
            user_id: token_data.claims.sub,
            tenant_id: token_data.claims.tenant_id,
            role: token_data.claims.role,
            email: token_data.claims.email,
        })
    }

    /// Single-use refresh: the presented token is consumed and a new pair in
    /// the same family is issued. Role and tenant standing are re-derived, so
    /// a membership revoked since login stops here.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<LoginOutcome, AppError> {
        let token_hash = self.hash_token(raw_refresh_token);

        let record = self
            .auth_repo
            .find_refresh_token(&token_hash)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if record.expires_at < Utc::now() {
            self.auth_repo.delete_refresh_token(&token_hash).await?;
            return Err(AppError::InvalidCredentials);
        }
        self.auth_repo.delete_refresh_token(&token_hash).await?;

        let user = self
            .users
            .find_by_id(&record.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let tenant = self
            .tenants
            .find_by_id(&record.tenant_id)
            .await?
            .ok_or(AppError::TenantNotFound)?;
        if !tenant.active {
            return Err(AppError::TenantInactive);
        }

        let role = if user.is_platform_admin {
            Role::PlatformAdmin
        } else {
            self.registry
                .active_membership(&user.id, &tenant.id)
                .await?
                .map(|m| m.role)
                .ok_or(AppError::NoAccessToTenant)?
        };

        let (access_token, refresh_token) = self
            .issue_token_pair(
                &user,
                &tenant.id,
                role,
                record.family_id,
                record.generation_id + 1,
            )
            .await?;

        info!("Token refreshed for user {}", user.id);

        Ok(LoginOutcome {
            access_token,
            refresh_token,
            role,
            tenant,
        })
    }

    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        self.auth_repo.delete_refresh_token(&token_hash).await
    }

    /// Kills every refresh token descended from one login.
    pub async fn revoke_family(&self, family_id: &str) -> Result<(), AppError> {
        self.auth_repo.delete_refresh_family(family_id).await
    }

    async fn issue_token_pair(
        &self,
        user: &User,
        tenant_id: &str,
        role: Role,
        family_id: String,
        generation_id: i32,
    ) -> Result<(String, String), AppError> {
        let now = Utc::now();
        let exp = (now + Duration::minutes(15)).timestamp() as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: user.id.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            role,
            email: user.email.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        let refresh_token_hash = self.hash_token(&refresh_token);

        let record = RefreshTokenRecord {
            token_hash: refresh_token_hash,
            user_id: user.id.clone(),
            tenant_id: tenant_id.to_string(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(7),
            created_at: now,
        };
        self.auth_repo.create_refresh_token(&record).await?;

        Ok((access_token, refresh_token))
    }

    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| AppError::Internal)
    }

    fn verify_password(password: &str, hash: &str) -> Result<(), AppError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AppError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AppError::InvalidCredentials)
    }
}
