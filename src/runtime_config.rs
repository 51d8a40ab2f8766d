// =============================================================================
// Runtime Configuration — service settings with env overrides
// =============================================================================
//
// Loaded once at startup from an optional JSON file, then overridden by
// environment variables (`.env` is honoured via dotenv). All fields carry
// `#[serde(default)]` so a partial file, or no file at all, still yields a
// usable configuration.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::IndicatorParams;
use crate::indicators::macd::MacdParams;
use crate::polygon::client::DEFAULT_BASE_URL;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_lookback_days() -> u64 {
    15
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_overbought() -> f64 {
    70.0
}

fn default_oversold() -> f64 {
    30.0
}

fn default_static_dir() -> String {
    "static".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Listener ------------------------------------------------------------

    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    // --- Upstream provider ---------------------------------------------------

    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,

    /// Timeout for the single upstream attempt.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Calendar days in the trailing candle window.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u64,

    /// Used when a request carries no `apiKey`. Never written back out.
    #[serde(default, skip_serializing)]
    pub default_api_key: Option<String>,

    // --- Indicators ----------------------------------------------------------

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// RSI strictly above this is SELL.
    #[serde(default = "default_overbought")]
    pub overbought: f64,

    /// RSI strictly below this is BUY.
    #[serde(default = "default_oversold")]
    pub oversold: f64,

    // --- Static files --------------------------------------------------------

    #[serde(default = "default_true")]
    pub serve_static: bool,

    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_port(),
            upstream_base_url: default_upstream_base_url(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            lookback_days: default_lookback_days(),
            default_api_key: None,
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            overbought: default_overbought(),
            oversold: default_oversold(),
            serve_static: true,
            static_dir: default_static_dir(),
        }
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("lookback_days", &self.lookback_days)
            .field(
                "default_api_key",
                &self.default_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("rsi_period", &self.rsi_period)
            .field("macd_fast", &self.macd_fast)
            .field("macd_slow", &self.macd_slow)
            .field("macd_signal", &self.macd_signal)
            .field("overbought", &self.overbought)
            .field("oversold", &self.oversold)
            .field("serve_static", &self.serve_static)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(path = %path.display(), port = config.port, "runtime config loaded");

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`. Blank values are ignored.
    ///
    /// | Variable                | Field                   |
    /// |-------------------------|-------------------------|
    /// | `PORT`                  | `port`                  |
    /// | `BIND_HOST`             | `bind_host`             |
    /// | `POLYGON_BASE_URL`      | `upstream_base_url`     |
    /// | `POLYGON_API_KEY`       | `default_api_key`       |
    /// | `UPSTREAM_TIMEOUT_SECS` | `upstream_timeout_secs` |
    /// | `STATIC_DIR`            | `static_dir`            |
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(port) = get("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{port}'"))?;
        }
        if let Some(host) = get("BIND_HOST") {
            self.bind_host = host;
        }
        if let Some(url) = get("POLYGON_BASE_URL") {
            self.upstream_base_url = url;
        }
        if let Some(key) = get("POLYGON_API_KEY") {
            self.default_api_key = Some(key);
        }
        if let Some(secs) = get("UPSTREAM_TIMEOUT_SECS") {
            self.upstream_timeout_secs = secs
                .parse()
                .with_context(|| format!("UPSTREAM_TIMEOUT_SECS must be an integer, got '{secs}'"))?;
        }
        if let Some(dir) = get("STATIC_DIR") {
            self.static_dir = dir;
        }
        Ok(())
    }

    /// Reject settings the indicator pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 || self.macd_fast == 0 || self.macd_slow == 0 || self.macd_signal == 0 {
            anyhow::bail!("indicator periods must be positive");
        }
        if self.macd_fast >= self.macd_slow {
            anyhow::bail!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast,
                self.macd_slow
            );
        }
        if self.oversold >= self.overbought {
            anyhow::bail!(
                "oversold ({}) must be below overbought ({})",
                self.oversold,
                self.overbought
            );
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("upstream_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            rsi_period: self.rsi_period,
            macd: MacdParams {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
            overbought: self.overbought,
            oversold: self.oversold,
        }
    }
}
