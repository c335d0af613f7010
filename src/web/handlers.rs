use super::error::ApiError;
use super::AppState;
use crate::analysis::{net_inflow, top_losers, CoinView};
use crate::models::{FundingRate, NetInflow, OpenInterestSample, Ticker24h};
use crate::refresh::bucket_key;
use crate::scheduler::sync_registry;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn success<T>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        status: "success",
        message: message.into(),
        data: Some(data),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    pub tracked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinsPayload {
    pub coins: Vec<CoinView>,
    pub cache_update_time: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinDetail {
    pub symbol: String,
    pub latest_price: Option<f64>,
    pub ticker: Option<Ticker24h>,
    pub open_interest: Option<OpenInterestSample>,
    pub funding_rate: Option<FundingRate>,
    pub net_inflow: NetInflow,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 获取所有跟踪币种的最新数据
pub async fn get_coins(State(state): State<AppState>) -> ApiResult<CoinsPayload> {
    let tracked: HashSet<String> = state.refresh.registry().tracked_symbols().await.into_iter().collect();
    let records = state.refresh.snapshots().latest_per_symbol().await?;
    let cache_update_time = state.refresh.snapshots().last_updated().await?;
    let intervals = state.refresh.aggregator().intervals();

    let coins: Vec<CoinView> = records
        .iter()
        .filter(|r| tracked.contains(&r.symbol))
        .map(|r| CoinView::from_record(r, intervals))
        .collect();

    success(
        format!("{} coins", coins.len()),
        CoinsPayload {
            coins,
            cache_update_time,
        },
    )
}

/// 触发数据更新, never waits for the refresh itself.
pub async fn trigger_update(
    State(state): State<AppState>,
    Query(query): Query<ForceQuery>,
) -> ApiResult<serde_json::Value> {
    if !query.force && state.refresh.is_current().await {
        return success("Data is already up to date", json!({ "started": false }));
    }
    if state.refresh.is_running() {
        return success("Refresh already in progress", json!({ "started": false }));
    }

    let refresh = Arc::clone(&state.refresh);
    tokio::spawn(async move {
        match refresh.refresh_all(None, true).await {
            Some(records) => info!("Manual refresh stored {} records", records.len()),
            None => info!("Manual refresh skipped"),
        }
    });

    success("Update started", json!({ "started": true }))
}

/// 币种详情: live data straight from the exchange.
pub async fn coin_detail(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<CoinDetail> {
    let symbol = symbol.to_uppercase();
    let source = state.refresh.aggregator().source();

    let (latest_price, ticker, open_interest, funding_rate, net_inflow) = tokio::join!(
        source.latest_price(&symbol),
        source.ticker_24h(&symbol),
        source.current_open_interest(&symbol),
        source.funding_rate(&symbol),
        net_inflow(source.as_ref(), &symbol),
    );

    if latest_price.is_none() && ticker.is_none() && open_interest.is_none() {
        return Err(ApiError::Upstream(format!("no market data for {symbol}")));
    }

    success(
        symbol.clone(),
        CoinDetail {
            symbol,
            latest_price,
            ticker,
            open_interest,
            funding_rate,
            net_inflow,
        },
    )
}

/// 跌幅榜
pub async fn drop_list(
    State(state): State<AppState>,
    Query(query): Query<ForceQuery>,
) -> ApiResult<Vec<Ticker24h>> {
    let bucket = bucket_key(state.refresh.now());

    if !query.force {
        if let Some(cached) = state.drop_list.get(bucket).await {
            return success("cached", cached);
        }
    }

    let tickers = state.catalog.all_tickers().await?;
    let valid: HashSet<String> = match state.catalog.instruments().await {
        Ok(instruments) => instruments.into_iter().map(|i| i.symbol).collect(),
        Err(e) => {
            warn!("Failed to load instruments, drop list unfiltered: {}", e);
            HashSet::new()
        }
    };

    let losers = top_losers(tickers, &valid, state.drop_list_size);
    state.drop_list.put(bucket, losers.clone()).await;
    success("fresh", losers)
}

pub async fn get_coin_config(State(state): State<AppState>) -> ApiResult<BTreeMap<String, bool>> {
    let map = state.refresh.registry().tracking_map().await;
    success(format!("{} coins", map.len()), map)
}

pub async fn set_coin_tracking(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Json(request): Json<TrackingRequest>,
) -> ApiResult<serde_json::Value> {
    let symbol = symbol.to_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::BadRequest("empty symbol".to_string()));
    }

    state
        .refresh
        .registry()
        .set_tracking(&symbol, request.tracked)
        .await?;
    success(
        format!("{} tracking set to {}", symbol, request.tracked),
        json!({ "symbol": symbol, "tracked": request.tracked }),
    )
}

pub async fn delete_coin(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<serde_json::Value> {
    let symbol = symbol.to_uppercase();
    state.refresh.registry().remove(&symbol).await?;
    success(format!("{} removed", symbol), json!({ "symbol": symbol }))
}

pub async fn sync_coins(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let added = sync_registry(state.catalog.as_ref(), state.refresh.registry())
        .await
        .map_err(|e| {
            error!("Registry sync failed: {}", e);
            ApiError::from(e)
        })?;
    success(format!("{} new symbols", added), json!({ "added": added }))
}
