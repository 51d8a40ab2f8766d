// =============================================================================
// Shared types used across the trade analytics service
// =============================================================================

use serde::Serialize;

/// Three-way trade recommendation derived from the latest RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    /// Map an RSI value onto a recommendation.
    ///
    /// Only strict crossings count: `rsi > overbought` is SELL, `rsi < oversold`
    /// is BUY, and the thresholds themselves are HOLD. An undefined RSI is HOLD.
    pub fn from_rsi(rsi: Option<f64>, overbought: f64, oversold: f64) -> Self {
        match rsi {
            Some(v) if v > overbought => Self::Sell,
            Some(v) if v < oversold => Self::Buy,
            _ => Self::Hold,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}
