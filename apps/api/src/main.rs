mod auth;
mod backend;
mod compose;
mod config;
mod errors;
mod models;
mod routes;
mod selection;
mod state;
mod store;
mod validation;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::session::SessionStore;
use crate::backend::http::HttpBackend;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::DomainStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV builder API v{}", env!("CARGO_PKG_VERSION"));

    let backend = HttpBackend::new(
        &config.crud_api_url,
        config.crud_api_key.clone(),
        config.crud_api_timeout,
    )?;
    info!("CRUD backend client initialized ({})", config.crud_api_url);

    let store = Arc::new(DomainStore::new(Arc::new(backend)));

    match &config.admin_password {
        Some(password) => match store.initialize_admin_user(password).await {
            Ok(true) => info!("Admin account created"),
            Ok(false) => info!("Admin account already present"),
            Err(e) => warn!("Admin account initialization failed: {e}"),
        },
        None => warn!("ADMIN_PASSWORD not set, skipping admin account initialization"),
    }

    let sessions = Arc::new(SessionStore::new(config.session_file.clone()));
    match sessions.rehydrate().await {
        Ok(count) => info!("Rehydrated {count} sessions"),
        Err(e) => warn!("Starting with no sessions: {e:#}"),
    }

    let state = AppState { store, sessions };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
