// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD line = EMA(fast) - EMA(slow)
//   Signal    = EMA(signal) of the MACD line
//   Histogram = MACD line - Signal
//
// All three averages are exponential and SMA-seeded (see `ema`). The MACD line
// exists from index `slow - 1`; the signal needs a further `signal - 1` MACD
// values before it is seeded.
// =============================================================================

use serde::Serialize;

use super::align;
use super::ema::{calculate_ema, ema_series};

/// One MACD reading. `signal` and `histogram` stay `None` until the signal
/// EMA has enough MACD values to seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    #[serde(rename = "MACD")]
    pub macd: f64,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// Fast / slow / signal look-back periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// MACD laid out index-for-index with `closes`.
pub fn macd_series(closes: &[f64], params: MacdParams) -> Vec<Option<MacdPoint>> {
    let len = closes.len();
    let fast = ema_series(closes, params.fast);
    let slow = ema_series(closes, params.slow);

    let line: Vec<Option<f64>> = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let Some(first) = line.iter().position(Option::is_some) else {
        return vec![None; len];
    };

    // The signal runs over the contiguous stretch of defined MACD values.
    let defined: Vec<f64> = line[first..].iter().map_while(|v| *v).collect();
    let signal = align(
        calculate_ema(&defined, params.signal),
        first + params.signal.saturating_sub(1),
        len,
    );

    line.into_iter()
        .zip(signal)
        .map(|(macd, signal)| {
            macd.map(|macd| MacdPoint {
                macd,
                signal,
                histogram: signal.map(|s| macd - s),
            })
        })
        .collect()
}
