// =============================================================================
// Polygon Aggregates REST Client — daily bars for one ticker
// =============================================================================
//
// SECURITY: The API key is supplied per request by the caller and travels only
// as the `apiKey` query parameter. It is never logged, never stored on the
// client, and reqwest errors are stripped of their URL before they are
// surfaced so the key cannot leak into error bodies.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{CandleSource, DateWindow};
use crate::market_data::{Candle, CandleSeries};

/// Default provider endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Polygon REST client for the v2 aggregates endpoint.
#[derive(Clone)]
pub struct PolygonClient {
    base_url: Url,
    lookback_days: u64,
    client: reqwest::Client,
}

// -----------------------------------------------------------------------------
// Wire types
// -----------------------------------------------------------------------------

/// Successful aggregates payload. Only `results` matters here.
#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
}

/// One bar inside `results`.
#[derive(Debug, Deserialize)]
struct AggregateBar {
    #[serde(default)]
    o: Option<f64>,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
    #[serde(default)]
    t: Option<i64>,
}

impl From<AggregateBar> for Candle {
    fn from(bar: AggregateBar) -> Self {
        Candle::new(bar.t, bar.o, bar.h, bar.l, bar.c, bar.v)
    }
}

/// Error payload. Polygon uses `error` on some failures and `message` on
/// others.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PolygonClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `PolygonClient`.
    ///
    /// # Arguments
    /// * `base_url`      — provider root, e.g. `https://api.polygon.io`.
    /// * `timeout`       — per-request timeout applied to the single attempt.
    /// * `lookback_days` — calendar days covered by the trailing window.
    pub fn new(base_url: &str, timeout: Duration, lookback_days: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid upstream base url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("upstream base url '{base_url}' cannot carry a path");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, lookback_days, "PolygonClient initialised");

        Ok(Self {
            base_url,
            lookback_days,
            client,
        })
    }

    // -------------------------------------------------------------------------
    // Aggregates
    // -------------------------------------------------------------------------

    /// `{base}/v2/aggs/ticker/{ticker}/range/1/day/{from}/{to}` with the
    /// ticker encoded as a single path segment.
    pub fn aggregates_url(&self, ticker: &str, window: &DateWindow) -> Result<Url> {
        let mut url = self.base_url.clone();
        let from = window.from_param();
        let to = window.to_param();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("upstream base url cannot carry a path"))?
            .pop_if_empty()
            .extend(["v2", "aggs", "ticker", ticker, "range", "1", "day", from.as_str(), to.as_str()]);
        Ok(url)
    }

    /// GET daily aggregates for `ticker` over `window`. Single attempt, no
    /// retry.
    ///
    /// A missing or empty `results` array yields an empty series; deciding
    /// what "no data" means is left to the caller.
    #[instrument(skip(self, api_key), name = "polygon::get_daily_aggregates")]
    pub async fn get_daily_aggregates(
        &self,
        ticker: &str,
        api_key: Option<&str>,
        window: DateWindow,
    ) -> Result<CandleSeries> {
        let url = self.aggregates_url(ticker, &window)?;

        let mut request = self.client.get(url);
        if let Some(key) = api_key {
            request = request.query(&[("apiKey", key)]);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("GET aggregates request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| e.without_url())
            .context("failed to read aggregates response")?;

        if !status.is_success() {
            let detail = upstream_error_detail(&body);
            warn!(ticker, status = %status, "aggregates request rejected upstream");
            anyhow::bail!("upstream aggregates request returned {status}{detail}");
        }

        let series = parse_aggregates(&body)?;
        if series.is_empty() {
            debug!(ticker, from = %window.from, to = %window.to, "no aggregates in window");
            return Ok(series);
        }
        debug!(ticker, from = %window.from, to = %window.to, count = series.len(), "aggregates fetched");
        Ok(series)
    }
}

impl CandleSource for PolygonClient {
    fn fetch_daily<'a>(
        &'a self,
        ticker: &'a str,
        api_key: Option<&'a str>,
    ) -> BoxFuture<'a, Result<CandleSeries>> {
        let window = DateWindow::trailing(Utc::now().date_naive(), self.lookback_days);
        self.get_daily_aggregates(ticker, api_key, window).boxed()
    }
}

impl std::fmt::Debug for PolygonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonClient")
            .field("base_url", &self.base_url.as_str())
            .field("lookback_days", &self.lookback_days)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Internal helpers
// -----------------------------------------------------------------------------

/// Decode a successful aggregates body into a series, keeping provider order.
fn parse_aggregates(body: &str) -> Result<CandleSeries> {
    let parsed: AggregatesResponse =
        serde_json::from_str(body).context("failed to parse aggregates response")?;
    Ok(parsed
        .results
        .unwrap_or_default()
        .into_iter()
        .map(Candle::from)
        .collect())
}

/// `": <message>"` from a provider error body, or empty when it has none.
fn upstream_error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.is_empty())
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::json;

    const AGG_ROUTE: &str = "/v2/aggs/ticker/:ticker/range/1/day/:from/:to";

    fn window() -> DateWindow {
        DateWindow::trailing(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(), 15)
    }

    async fn spawn_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> PolygonClient {
        PolygonClient::new(base, Duration::from_secs(5), 15).unwrap()
    }

    #[test]
    fn url_contains_window_and_ticker() {
        let c = client(DEFAULT_BASE_URL);
        let url = c.aggregates_url("AAPL", &window()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/day/2024-03-05/2024-03-20"
        );
    }

    #[test]
    fn url_encodes_ticker_as_one_segment() {
        let c = client("https://api.polygon.io/");
        let url = c.aggregates_url("X:BTC/USD", &window()).unwrap();
        assert!(url.path().contains("/ticker/X:BTC%2FUSD/range/"), "{}", url.path());
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(PolygonClient::new("not a url", Duration::from_secs(1), 15).is_err());
    }

    #[test]
    fn parse_keeps_order_and_fields() {
        let body = r#"{"ticker":"AAPL","resultsCount":2,"results":[
            {"o":10.0,"h":12.0,"l":9.0,"c":11.0,"v":1000,"t":1700000000000,"n":5},
            {"h":13.0,"l":10.5,"c":12.5,"v":1500.5}
        ],"status":"OK"}"#;
        let series = parse_aggregates(body).unwrap();
        assert_eq!(series.len(), 2);
        let first = series.candles()[0];
        assert_eq!(first.open, Some(10.0));
        assert_eq!(first.timestamp, Some(1_700_000_000_000));
        assert_eq!(series.closes(), vec![11.0, 12.5]);
        assert_eq!(series.volumes(), vec![1000.0, 1500.5]);
        assert_eq!(series.candles()[1].open, None);
    }

    #[test]
    fn parse_missing_results_is_empty() {
        let series = parse_aggregates(r#"{"ticker":"ZZZZ","resultsCount":0,"status":"OK"}"#).unwrap();
        assert!(series.is_empty());
        let series = parse_aggregates(r#"{"results":[]}"#).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn parse_malformed_body_fails() {
        assert!(parse_aggregates("<html>").is_err());
        assert!(parse_aggregates(r#"{"results":[{"h":"x"}]}"#).is_err());
    }

    #[test]
    fn error_detail_prefers_error_then_message() {
        assert_eq!(upstream_error_detail(r#"{"error":"bad key"}"#), ": bad key");
        assert_eq!(upstream_error_detail(r#"{"message":"slow down"}"#), ": slow down");
        assert_eq!(upstream_error_detail("not json"), "");
    }

    #[tokio::test]
    async fn fetch_passes_key_and_window() {
        let app = Router::new().route(
            AGG_ROUTE,
            get(
                |Path((ticker, from, to)): Path<(String, String, String)>,
                 Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(ticker, "MSFT");
                    assert_eq!(from, "2024-03-05");
                    assert_eq!(to, "2024-03-20");
                    assert_eq!(q.get("apiKey").map(String::as_str), Some("secret-key"));
                    Json(json!({
                        "results": [
                            {"o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10.0, "t": 1},
                            {"o": 1.5, "h": 2.5, "l": 1.0, "c": 2.0, "v": 20.0, "t": 2}
                        ]
                    }))
                },
            ),
        );
        let base = spawn_upstream(app).await;
        let series = client(&base)
            .get_daily_aggregates("MSFT", Some("secret-key"), window())
            .await
            .unwrap();
        assert_eq!(series.closes(), vec![1.5, 2.0]);
    }

    #[tokio::test]
    async fn fetch_omits_key_when_absent() {
        let app = Router::new().route(
            AGG_ROUTE,
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert!(!q.contains_key("apiKey"));
                Json(json!({ "status": "OK" }))
            }),
        );
        let base = spawn_upstream(app).await;
        let series = client(&base)
            .get_daily_aggregates("MSFT", None, window())
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_carries_upstream_message() {
        let app = Router::new().route(
            AGG_ROUTE,
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "status": "ERROR", "error": "Unknown API Key" })),
                )
            }),
        );
        let base = spawn_upstream(app).await;
        let err = client(&base)
            .get_daily_aggregates("MSFT", Some("secret-key"), window())
            .await
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("Unknown API Key"), "{msg}");
        assert!(!msg.contains("secret-key"), "{msg}");
    }

    #[tokio::test]
    async fn transport_failure_does_not_leak_key() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .get_daily_aggregates("MSFT", Some("secret-key"), window())
            .await
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.starts_with("GET aggregates request failed"), "{msg}");
        assert!(!msg.contains("secret-key"), "{msg}");
    }

    #[test]
    fn debug_output_has_no_secrets() {
        let rendered = format!("{:?}", client(DEFAULT_BASE_URL));
        assert!(rendered.contains("api.polygon.io"));
        assert!(rendered.contains("lookback_days"));
    }
}
