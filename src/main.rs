// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EasyCook API Server
//!
//! Serves the recipe browsing core (listing, detail, favorites) to the
//! frontend, backed by TheMealDB and the DummyJSON auth API.

use easycook::{
    config::Config,
    services::{AuthService, CatalogClient, FavoritesStore},
    storage::JsonFileStore,
    AppState,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting EasyCook API");

    let storage = Arc::new(JsonFileStore::open(&config.storage_path)?);
    tracing::info!(path = %config.storage_path.display(), "Local storage opened");

    let favorites = FavoritesStore::load(storage);
    tracing::info!(count = favorites.len(), "Favorites loaded");

    let catalog = Arc::new(CatalogClient::new(config.mealdb_api_base.clone()));
    let auth = AuthService::new(config.auth_api_base.clone(), config.auth_session_minutes);

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::new(
        config.clone(),
        catalog,
        favorites,
        auth,
        shutdown.clone(),
    ));

    let app = easycook::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, cancelling every open pipeline and view.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown requested");
    shutdown.cancel();
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("easycook=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
