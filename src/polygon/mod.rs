// =============================================================================
// Candle Fetcher — upstream market data
// =============================================================================

pub mod client;
pub mod window;

use anyhow::Result;
use futures_util::future::BoxFuture;

use crate::market_data::CandleSeries;

pub use client::PolygonClient;
pub use window::DateWindow;

/// Anything that can produce the trailing daily candles for a ticker.
///
/// Implementations make at most one outbound call per invocation and keep no
/// state between calls.
pub trait CandleSource: Send + Sync {
    fn fetch_daily<'a>(
        &'a self,
        ticker: &'a str,
        api_key: Option<&'a str>,
    ) -> BoxFuture<'a, Result<CandleSeries>>;
}
