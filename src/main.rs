use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use movora::{
    cache::{create_redis_client, Cache},
    config::Config,
    create_router,
    services::{
        favorites::{FavoritesStorage, JsonFileStorage, RedisStorage},
        recommendations::GeminiClient,
        FavoritesStore, TmdbProvider,
    },
    state::SessionLimits,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movora=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let mut catalog = TmdbProvider::new(config.tmdb_api_key.clone(), config.tmdb_api_url.clone());
    let mut cache_writer = None;

    let favorites_storage: Box<dyn FavoritesStorage> = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let client = create_redis_client(redis_url).context("invalid REDIS_URL")?;
            let (cache, writer) = Cache::new(client.clone()).await;
            catalog = catalog.with_cache(cache, config.cache_ttl_secs);
            cache_writer = Some(writer);
            tracing::info!(ttl_secs = config.cache_ttl_secs, "Redis response cache enabled");
            Box::new(RedisStorage::new(client))
        }
        None => {
            tracing::info!(path = %config.favorites_path, "Using file-backed watch-later list");
            Box::new(JsonFileStorage::new(&config.favorites_path))
        }
    };

    let session_limits = SessionLimits {
        idle_ttl: Duration::from_secs(config.list_session_ttl_secs),
        max_sessions: config.max_list_sessions,
    };
    let mut state = AppState::new(Arc::new(catalog), FavoritesStore::from_boxed(favorites_storage))
        .with_session_limits(session_limits);

    match config.recommendation_api_key.clone() {
        Some(api_key) if !api_key.trim().is_empty() => {
            state = state.with_recommender(Arc::new(GeminiClient::new(
                config.recommendation_api_url.clone(),
                api_key,
                config.recommendation_model.clone(),
            )));
            tracing::info!(model = %config.recommendation_model, "Recommendations enabled");
        }
        _ => tracing::warn!("RECOMMENDATION_API_KEY not set, recommendations disabled"),
    }

    if config.tmdb_api_key.is_none() {
        tracing::warn!("TMDB_API_KEY not set, catalog endpoints will return empty lists");
    }

    tracing::info!(categories = state.registry.len(), "Category registry loaded");

    let sweeper = spawn_session_sweeper(state.clone());

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    sweeper.abort();

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    Ok(())
}

/// Periodically drops list sessions that outlived their idle TTL
fn spawn_session_sweeper(state: AppState) -> tokio::task::JoinHandle<()> {
    let period = (state.session_limits.idle_ttl / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            state.evict_idle_lists().await;
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}
