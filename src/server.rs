use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::error::{ApiError, UpstreamError};
use crate::external::AlphaVantageClient;
use crate::structs::ClosesResult;
use crate::trailing_window::compute_closes;

/// Shared application state, handed to the handler via `axum::extract::State`.
pub struct AppState {
    pub config: ServiceConfig,
    pub client: AlphaVantageClient,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Arc<Self>, UpstreamError> {
        let client = AlphaVantageClient::new(
            config.stock_api_addr.clone(),
            config.api_key.clone(),
            config.upstream_timeout,
        )?;
        Ok(Arc::new(Self { config, client }))
    }
}

/// `GET /`. Preflight `OPTIONS` requests are answered by the CORS layer.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(get_stock_closes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Closes for the configured symbol over the trailing window, plus their average.
async fn get_stock_closes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClosesResult>, ApiError> {
    let series = state.client.fetch_daily_series(&state.config.symbol).await?;
    let today = Local::now().date_naive();
    Ok(Json(compute_closes(
        &state.config.symbol,
        today,
        state.config.day_count,
        &series,
    )))
}
