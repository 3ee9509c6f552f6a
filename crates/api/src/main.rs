use std::sync::Arc;

use anyhow::Context;

use coffeeshop_api::app::{SharedStore, build_app};
use coffeeshop_api::config::AppConfig;
use coffeeshop_auth::{AuthorizationGate, HttpKeySetSource, KeySetCache, TokenVerifier};
use coffeeshop_infra::{InMemoryDrinkStore, PostgresDrinkStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    coffeeshop_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let source = HttpKeySetSource::new(config.auth.jwks_url.clone(), config.auth.jwks_timeout)
        .context("failed to build JWKS client")?;
    let keys = Arc::new(
        KeySetCache::new(Arc::new(source))
            .with_fetch_timeout(config.auth.jwks_timeout)
            .with_min_refresh_interval(config.auth.min_refresh_interval),
    );
    // Warm the cache; a failure here is retried on the first request.
    if let Err(e) = keys.refresh().await {
        tracing::warn!(error = %e, url = %config.auth.jwks_url, "initial signing key fetch failed");
    }
    let gate = AuthorizationGate::new(TokenVerifier::new(config.auth.clone(), keys));

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let store = PostgresDrinkStore::connect(url, config.db_max_connections)
                .await
                .context("failed to connect to Postgres")?;
            store.ensure_schema().await.context("failed to create schema")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; drinks are kept in memory");
            Arc::new(InMemoryDrinkStore::new())
        }
    };

    let app = build_app(gate, store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    let addr = listener.local_addr()?;
    tracing::info!(
        addr = %addr,
        audience = %config.auth.audience,
        issuer = %config.auth.issuer,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
