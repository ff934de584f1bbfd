//! payment-relay - service entry point
//!
//! Loads configuration, wires the configured store behind the webhook router
//! and serves until SIGINT/SIGTERM.

use std::error::Error;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use payment_relay::adapters::{
    app_router, AppState, InMemoryBillingStore, PostgresBillingStore, PostgrestBillingStore,
    PostgrestConfig,
};
use payment_relay::config::{AppConfig, ServerConfig, StoreBackend, StoreConfig, ValidationError};
use payment_relay::ports::BillingStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    config.validate()?;

    if let Err(e) = config.payment.validate() {
        tracing::warn!(
            error = %e,
            "Stripe is not fully configured; webhooks without a usable secret will be rejected"
        );
    } else if config.payment.is_live_mode() {
        tracing::info!("Stripe configured in live mode");
    } else if config.payment.is_test_mode() {
        tracing::info!("Stripe configured in test mode");
    } else {
        tracing::warn!("Stripe API key is neither a live nor a test key");
    }

    tracing::info!(backend = config.store.backend.as_str(), "Connecting billing store");
    let store = build_store(&config.store).await?;
    tracing::info!(backend = store.backend_name(), "Billing store ready");

    let state = AppState::new(store, config.payment.webhook_verifier());
    let app = app_router(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn BillingStore>, Box<dyn Error>> {
    let store: Arc<dyn BillingStore> = match config.backend {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .min_connections(config.min_connections)
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout())
                .idle_timeout(config.idle_timeout())
                .max_lifetime(config.max_lifetime())
                .connect(&config.database_url)
                .await?;
            Arc::new(PostgresBillingStore::new(pool))
        }
        StoreBackend::Postgrest => {
            let service_key = config
                .service_key
                .clone()
                .ok_or(ValidationError::MissingRequired("STORE__SERVICE_KEY"))?;
            Arc::new(PostgrestBillingStore::new(PostgrestConfig::new(
                config.rest_url.clone(),
                service_key,
            )))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory billing store; updates are not persisted");
            Arc::new(InMemoryBillingStore::new())
        }
    };
    Ok(store)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, starting graceful shutdown");
        },
    }
}
