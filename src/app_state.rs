// =============================================================================
// Application State — shared, read-only, one per process
// =============================================================================
//
// Handlers receive `Arc<AppState>`. Nothing in here is mutated after startup,
// so concurrent requests share no mutable state and need no locks.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::analysis::IndicatorParams;
use crate::polygon::{CandleSource, PolygonClient};
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    /// Where candles come from.
    pub source: Arc<dyn CandleSource>,
    pub params: IndicatorParams,
    /// Fallback credential for requests that omit `apiKey`.
    default_api_key: Option<String>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn CandleSource>,
        params: IndicatorParams,
        default_api_key: Option<String>,
    ) -> Self {
        Self {
            source,
            params,
            default_api_key,
        }
    }

    /// Build state backed by the Polygon REST client described by `config`.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let client = PolygonClient::new(
            &config.upstream_base_url,
            Duration::from_secs(config.upstream_timeout_secs),
            config.lookback_days,
        )?;
        Ok(Self::new(
            Arc::new(client),
            config.indicator_params(),
            config.default_api_key.clone(),
        ))
    }

    /// The caller's key when present and non-blank, else the configured one.
    pub fn resolve_api_key<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested
            .filter(|k| !k.trim().is_empty())
            .or(self.default_api_key.as_deref())
    }
}
