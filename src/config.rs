// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{AdminRepository, AdminStore, OrderRepository, OrderStore, RbacRepository, RbacStore},
    services::{
        auth::AuthService,
        notification::{EmailService, Notifier},
        order_service::OrderService,
        payment_service::PaymentService,
        rbac_service::RbacService,
        shipping::{DelhiveryClient, DEFAULT_BASE_URL},
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub razorpay_key_secret: String,
    pub delhivery_api_token: Option<String>,
    pub delhivery_base_url: String,
    pub bind_addr: String,
    pub mail_from: String,
    pub bootstrap_admin: Option<(String, String)>,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} must be set", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bootstrap_admin = match (
            optional("BOOTSTRAP_ADMIN_EMAIL"),
            optional("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            razorpay_key_secret: required("RAZORPAY_KEY_SECRET")?,
            delhivery_api_token: optional("DELHIVERY_API_TOKEN"),
            delhivery_base_url: optional("DELHIVERY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            mail_from: optional("MAIL_FROM").unwrap_or_else(|| "orders@localhost".to_string()),
            bootstrap_admin,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Could not connect to the database")?;

        tracing::info!("✅ Database connection established");
        Ok(pool)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub order_service: OrderService,
    pub payment_service: PaymentService,
    pub shipping_client: DelhiveryClient,
}

impl AppState {
    /// Wires the Postgres repositories and starts the notification worker.
    pub fn new(config: &Config, pool: PgPool) -> Self {
        let notifier = Notifier::spawn(EmailService::new(config.mail_from.clone()));

        Self::from_stores(
            config,
            Arc::new(RbacRepository::new(pool.clone())),
            Arc::new(AdminRepository::new(pool.clone())),
            Arc::new(OrderRepository::new(pool)),
            notifier,
        )
    }

    // --- Dependency graph ---
    pub fn from_stores(
        config: &Config,
        rbac: Arc<dyn RbacStore>,
        admins: Arc<dyn AdminStore>,
        orders: Arc<dyn OrderStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            auth_service: AuthService::new(admins.clone(), rbac.clone(), config.jwt_secret.clone()),
            rbac_service: RbacService::new(rbac, admins),
            order_service: OrderService::new(orders.clone()),
            payment_service: PaymentService::new(
                orders,
                notifier,
                config.razorpay_key_secret.clone(),
            ),
            shipping_client: DelhiveryClient::new(
                config.delhivery_base_url.clone(),
                config.delhivery_api_token.clone(),
            ),
        }
    }
}
