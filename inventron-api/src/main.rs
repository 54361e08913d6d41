//! Inventron API Server Entry Point
//!
//! Bootstraps configuration, selects the storage and cache backends, and
//! starts the Axum HTTP server.

use std::sync::Arc;

use inventron_api::config::{ApiConfig, CacheBackendKind, CacheSettings, StorageBackend};
use inventron_api::telemetry::{init_tracing, TelemetryConfig};
use inventron_api::{
    create_api_router, ApiError, ApiResult, AppContext, AuthConfig, DbClient, DbConfig,
    TokenIssuer,
};
use inventron_core::{ConfigError, InventronError};
use inventron_storage::{
    CacheBackend, InMemoryCacheBackend, InMemoryItemRepository, InMemoryUserStore, ItemRepository,
    ReadThroughCache, UserStore,
};

fn config_error(err: ConfigError) -> ApiError {
    ApiError::from(InventronError::from(err))
}

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env().map_err(config_error)?;
    let cache_settings = CacheSettings::from_env().map_err(config_error)?;
    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production()?;

    let (items, users) = build_storage(api_config.storage).await?;
    let backend = build_cache_backend(&cache_settings).await?;
    let cache = ReadThroughCache::new(backend, cache_settings.cache_config());
    tracing::info!(
        backend = cache.backend().name(),
        ttl_secs = cache_settings.ttl.as_secs(),
        "Item cache ready"
    );

    let app = create_api_router(
        &api_config,
        AppContext {
            items,
            users,
            cache,
            issuer: Arc::new(TokenIssuer::new(Arc::new(auth_config))),
        },
    );

    let addr = api_config.socket_addr();
    tracing::info!(%addr, "Starting Inventron API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_storage(
    backend: StorageBackend,
) -> ApiResult<(Arc<dyn ItemRepository>, Arc<dyn UserStore>)> {
    match backend {
        StorageBackend::Postgres => {
            let db = DbClient::from_config(&DbConfig::from_env())?;
            db.bootstrap_schema().await?;
            tracing::info!(pool_size = db.pool_size(), "Using PostgreSQL storage");
            Ok((Arc::new(db.item_repository()), Arc::new(db.user_store())))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok((
                Arc::new(InMemoryItemRepository::new()),
                Arc::new(InMemoryUserStore::new()),
            ))
        }
    }
}

async fn build_cache_backend(settings: &CacheSettings) -> ApiResult<Arc<dyn CacheBackend>> {
    match settings.backend {
        CacheBackendKind::Memory => Ok(Arc::new(InMemoryCacheBackend::new())),

        #[cfg(feature = "redis")]
        CacheBackendKind::Redis => {
            let backend = inventron_storage::RedisCacheBackend::connect(&settings.redis_url).await?;
            Ok(Arc::new(backend))
        }

        #[cfg(not(feature = "redis"))]
        CacheBackendKind::Redis => Err(ApiError::internal_error(
            "Redis cache backend selected but the 'redis' feature is not enabled. \
             Rebuild with --features redis or set INVENTRON_CACHE_BACKEND=memory",
        )),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
