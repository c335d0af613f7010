use coinx::api::{BinanceClient, ExchangeCatalog, MarketDataSource};
use coinx::config::Settings;
use coinx::refresh::{RefreshService, SymbolAggregator};
use coinx::scheduler::{run_daily_sync, run_refresh_loop, sync_registry};
use coinx::storage::{BucketMarkerStore, JsonMarkerStore, JsonSnapshotStore, SnapshotStore, SymbolRegistry};
use coinx::web::{self, AppState};

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coinx=info".parse()?),
        )
        .init();

    info!("coinx starting - open interest dashboard");

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Configuration loaded: {} intervals, refresh every {}s, data in {}",
        settings.refresh.time_intervals.len(),
        settings.refresh.interval_secs,
        settings.storage.data_dir.display()
    );

    // Initialize clients and stores
    let binance = Arc::new(BinanceClient::new(&settings.binance)?);
    let source: Arc<dyn MarketDataSource> = binance.clone();
    let catalog: Arc<dyn ExchangeCatalog> = binance;

    let data_dir = &settings.storage.data_dir;
    let registry = Arc::new(SymbolRegistry::open(data_dir).await?);
    let snapshots: Arc<dyn SnapshotStore> = Arc::new(JsonSnapshotStore::new(
        data_dir,
        settings.refresh.history_retention,
    ));
    let markers: Arc<dyn BucketMarkerStore> = Arc::new(JsonMarkerStore::new(data_dir));

    if registry.needs_sync().await {
        info!("Symbol registry never synced, fetching exchange info...");
        match sync_registry(catalog.as_ref(), &registry).await {
            Ok(added) => info!("Registry synced, {} new symbols", added),
            Err(e) => warn!("Initial registry sync failed: {}", e),
        }
    }

    let aggregator = Arc::new(SymbolAggregator::new(source, &settings.refresh));
    let refresh = Arc::new(RefreshService::new(
        aggregator,
        Arc::clone(&registry),
        snapshots,
        markers,
        &settings.refresh,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let refresh_task = tokio::spawn(run_refresh_loop(
        Arc::clone(&refresh),
        settings.refresh.interval(),
        shutdown_rx.clone(),
    ));
    let sync_task = tokio::spawn(run_daily_sync(
        Arc::clone(&catalog),
        registry,
        shutdown_rx.clone(),
    ));

    let state = AppState::new(refresh, catalog, settings.refresh.drop_list_size);
    let addr = settings.server.bind_addr();
    let mut server_shutdown = shutdown_rx;
    let mut server = tokio::spawn(async move {
        web::serve(state, &addr, async move {
            let _ = server_shutdown.changed().await;
        })
        .await
    });

    let mut server_done = false;
    tokio::select! {
        result = &mut server => {
            server_done = true;
            match result {
                Ok(Ok(())) => warn!("Dashboard server exited"),
                Ok(Err(e)) => error!("Dashboard server failed: {}", e),
                Err(e) => error!("Dashboard server task failed: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    let _ = shutdown_tx.send(true);
    if !server_done {
        if let Ok(Err(e)) = server.await {
            error!("Dashboard server failed during shutdown: {}", e);
        }
    }
    for task in [refresh_task, sync_task] {
        if let Err(e) = task.await {
            error!("Background task ended abnormally: {}", e);
        }
    }

    info!("coinx stopped");
    Ok(())
}
