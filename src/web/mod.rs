mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::ApiResponse;

use crate::api::ExchangeCatalog;
use crate::models::Ticker24h;
use crate::refresh::RefreshService;

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Drop list of the current cache bucket.
#[derive(Default)]
pub struct DropListCache {
    entry: Mutex<Option<(i64, Vec<Ticker24h>)>>,
}

impl DropListCache {
    pub async fn get(&self, bucket: i64) -> Option<Vec<Ticker24h>> {
        match &*self.entry.lock().await {
            Some((cached, list)) if *cached == bucket => Some(list.clone()),
            _ => None,
        }
    }

    pub async fn put(&self, bucket: i64, list: Vec<Ticker24h>) {
        *self.entry.lock().await = Some((bucket, list));
    }
}

#[derive(Clone)]
pub struct AppState {
    pub refresh: Arc<RefreshService>,
    pub catalog: Arc<dyn ExchangeCatalog>,
    pub drop_list: Arc<DropListCache>,
    pub drop_list_size: usize,
}

impl AppState {
    pub fn new(refresh: Arc<RefreshService>, catalog: Arc<dyn ExchangeCatalog>, drop_list_size: usize) -> Self {
        Self {
            refresh,
            catalog,
            drop_list: Arc::new(DropListCache::default()),
            drop_list_size,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/coins", get(handlers::get_coins))
        .route("/api/update", get(handlers::trigger_update))
        .route("/api/coin-detail/:symbol", get(handlers::coin_detail))
        .route("/api/drop-list", get(handlers::drop_list))
        .route("/api/config/coins", get(handlers::get_coin_config))
        .route("/api/config/coins/sync", post(handlers::sync_coins))
        .route(
            "/api/config/coins/:symbol",
            post(handlers::set_coin_tracking).delete(handlers::delete_coin),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the dashboard API until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: &str, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Dashboard API listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
