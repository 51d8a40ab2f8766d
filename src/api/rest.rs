// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
//   GET /trade-analytics/:ticker?apiKey=...   indicator snapshot + recommendation
//   GET /health                               liveness
//
// Unmatched paths fall through to the static file service when it is enabled.
// CORS is permissive: the endpoint is meant to be called from browsers and
// plugin hosts on other origins.
// =============================================================================

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Json, Path as UrlPath, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::analyze;
use crate::app_state::AppState;
use crate::error::AnalyticsError;
use crate::indicators::macd::MacdPoint;
use crate::types::Recommendation;

// =============================================================================
// Router construction
// =============================================================================

/// Build the router with CORS, request tracing, and (optionally) static files
/// rooted at `static_dir`.
pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/trade-analytics/:ticker", get(trade_analytics));

    if let Some(dir) = static_dir {
        app = app
            .nest_service("/.well-known", ServeDir::new(dir.join(".well-known")))
            .fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Trade analytics
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    #[serde(rename = "apiKey", default)]
    api_key: Option<String>,
}

/// Response body. Field names are part of the public contract.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub ticker: String,
    pub latest_close: f64,
    pub indicators: IndicatorValues,
    pub recommendation: Recommendation,
}

/// Latest value of each indicator; `null` when undefined for the window.
#[derive(Debug, Serialize)]
pub struct IndicatorValues {
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "VWAP")]
    pub vwap: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<MacdPoint>,
}

async fn trade_analytics(
    State(state): State<Arc<AppState>>,
    UrlPath(ticker): UrlPath<String>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsResponse>, AnalyticsError> {
    let span = info_span!("trade_analytics", request_id = %Uuid::new_v4(), ticker = %ticker);

    async move {
        let result = match query {
            Ok(Query(query)) => run_analytics(&state, &ticker, query.api_key.as_deref()).await,
            Err(rejection) => Err(AnalyticsError::from(rejection)),
        };
        match result {
            Ok(resp) => {
                info!(
                    latest_close = resp.latest_close,
                    recommendation = %resp.recommendation,
                    "analytics computed"
                );
                Ok(Json(resp))
            }
            Err(e) => {
                warn!(error = %e, status = %e.status(), "analytics request failed");
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Fetch, then compute, then shape the response. One upstream call.
async fn run_analytics(
    state: &AppState,
    ticker: &str,
    api_key: Option<&str>,
) -> Result<AnalyticsResponse, AnalyticsError> {
    let api_key = state.resolve_api_key(api_key);
    let series = state.source.fetch_daily(ticker, api_key).await?;
    let snapshot = analyze(&series, &state.params)?;

    info!(candles = series.len(), "candles analysed");

    Ok(AnalyticsResponse {
        ticker: ticker.to_string(),
        latest_close: snapshot.latest_close,
        indicators: IndicatorValues {
            rsi: snapshot.latest_rsi(),
            vwap: snapshot.latest_vwap(),
            macd: snapshot.latest_macd(),
        },
        recommendation: snapshot.recommendation,
    })
}
