// =============================================================================
// Indicator Pipeline — candles in, snapshot out
// =============================================================================
//
// Projects a candle series into closes / highs / lows / volumes, runs RSI,
// cumulative VWAP and MACD over the whole window, and maps the latest RSI to a
// recommendation. Every indicator is kept as a full series aligned with the
// candles; the HTTP layer only reports the last entry of each.
//
// Pure and stateless: no I/O, no shared state, nothing survives the call.
// =============================================================================

use crate::error::AnalyticsError;
use crate::indicators::last_defined;
use crate::indicators::macd::{macd_series, MacdParams, MacdPoint};
use crate::indicators::rsi::rsi_series;
use crate::indicators::vwap::vwap_series;
use crate::market_data::CandleSeries;
use crate::types::Recommendation;

/// Look-back periods and RSI thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd: MacdParams,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd: MacdParams::default(),
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

/// Everything derived from one candle series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub volumes: Vec<f64>,
    pub rsi: Vec<Option<f64>>,
    pub vwap: Vec<Option<f64>>,
    pub macd: Vec<Option<MacdPoint>>,
    pub latest_close: f64,
    pub recommendation: Recommendation,
}

impl IndicatorSnapshot {
    /// Last defined RSI value in the window.
    pub fn latest_rsi(&self) -> Option<f64> {
        last_defined(&self.rsi)
    }

    /// Whole-window VWAP; `None` when the window traded no volume.
    pub fn latest_vwap(&self) -> Option<f64> {
        self.vwap.last().copied().flatten()
    }

    /// Last defined MACD reading in the window.
    pub fn latest_macd(&self) -> Option<MacdPoint> {
        last_defined(&self.macd)
    }
}

/// Run the indicator pipeline over `series`.
///
/// Fails only with [`AnalyticsError::NoData`] on an empty series. Indicators
/// without enough history come back as `None`, never as errors.
pub fn analyze(series: &CandleSeries, params: &IndicatorParams) -> Result<IndicatorSnapshot, AnalyticsError> {
    let latest_close = series.last().ok_or(AnalyticsError::NoData)?.close;

    let closes = series.closes();
    let highs = series.highs();
    let lows = series.lows();
    let volumes = series.volumes();

    let rsi = rsi_series(&closes, params.rsi_period);
    let vwap = vwap_series(&highs, &lows, &closes, &volumes);
    let macd = macd_series(&closes, params.macd);

    let recommendation = Recommendation::from_rsi(last_defined(&rsi), params.overbought, params.oversold);

    Ok(IndicatorSnapshot {
        closes,
        highs,
        lows,
        volumes,
        rsi,
        vwap,
        macd,
        latest_close,
        recommendation,
    })
}
