use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_engine::{
    api::{create_router, AppState},
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, InMemoryCatalog, InMemoryCouponStore, PgCatalog,
        PgCouponStore, Seed,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront_engine=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let mut state = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections).await?;
            tracing::info!("Using PostgreSQL backend");
            AppState::new(
                Arc::new(PgCatalog::new(pool.clone())),
                Arc::new(PgCouponStore::new(pool)),
            )
        }
        None => {
            let catalog = Arc::new(InMemoryCatalog::new());
            let coupons = Arc::new(InMemoryCouponStore::new());
            match config.seed_path.as_deref() {
                Some(path) => {
                    Seed::from_file(path)?.apply(&catalog, &coupons).await?;
                    tracing::info!(path = %path, "Using in-memory backend loaded from seed file");
                }
                None => tracing::warn!(
                    "DATABASE_URL and SEED_PATH not set, in-memory backend starts empty \
                     and can only be filled through the coupon admin endpoint"
                ),
            }
            AppState::new(catalog, coupons)
        }
    };

    let cache_writer = match config.redis_url.as_deref() {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?);
            state = state.with_cache(cache, config.recommendation_cache_ttl_secs);
            tracing::info!(ttl = config.recommendation_cache_ttl_secs, "Recommendation cache enabled");
            Some(handle)
        }
        None => None,
    };

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
