// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppState, Config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Startup failures are fatal.
    let config = Config::from_env().expect("Failed to load configuration.");
    let db_pool = config.connect().await.expect("Failed to connect to the database.");

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations.");
    tracing::info!("✅ Database migrations applied");

    let app_state = AppState::new(&config, db_pool);

    if let Some((email, password)) = &config.bootstrap_admin {
        app_state
            .auth_service
            .bootstrap_super_admin(email, password)
            .await
            .expect("Failed to create the bootstrap administrator.");
    }

    let app = routes::app(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind the TCP listener.");
    tracing::info!("🚀 Listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Axum server error.");
}
