// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AdminStore, RbacStore},
    models::auth::{Admin, Claims},
};

#[derive(Clone)]
pub struct AuthService {
    admins: Arc<dyn AdminStore>,
    rbac: Arc<dyn RbacStore>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(admins: Arc<dyn AdminStore>, rbac: Arc<dyn RbacStore>, jwt_secret: String) -> Self {
        Self {
            admins,
            rbac,
            jwt_secret,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let admin = self
            .admins
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_owned();
        let password_hash = admin.password_hash.clone();

        // bcrypt is CPU-bound, keep it off the async workers
        let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;

        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("Admin {} logged in", admin.id);
        self.create_token(admin.id)
    }

    pub async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role_id: Uuid,
    ) -> Result<Admin, AppError> {
        self.rbac
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found."))?;

        let password = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))??;

        let admin = self
            .admins
            .create_admin(name.trim(), &email.trim().to_lowercase(), &hashed, role_id)
            .await?;

        tracing::info!("Admin {} created with role {}", admin.id, role_id);
        Ok(admin)
    }

    /// Creates the first super administrator when the table is empty.
    pub async fn bootstrap_super_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.admins.count_admins().await? > 0 {
            return Ok(());
        }

        let role = self
            .rbac
            .find_system_role()
            .await?
            .ok_or_else(|| anyhow::anyhow!("System role missing, were the migrations run?"))?;

        self.create_admin("Administrator", email, password, role.id).await?;
        tracing::info!("Bootstrap super administrator {} created", email);
        Ok(())
    }

    pub async fn validate_token(&self, token: &str) -> Result<Admin, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        // A deleted admin's token stops working immediately.
        self.admins
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub(crate) fn create_token(&self, admin_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: admin_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
