// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators reported by the
// analytics endpoint. Each indicator offers a `*_series` form aligned
// index-for-index with its input, where `None` marks positions the indicator
// is not yet defined for.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod vwap;

/// Lay `values` out over `len` slots starting at `offset`, padding with
/// `None` on both sides.
pub(crate) fn align(values: Vec<f64>, offset: usize, len: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; len];
    for (slot, value) in out.iter_mut().skip(offset).zip(values) {
        *slot = Some(value);
    }
    out
}

/// Last defined entry of an aligned series.
pub(crate) fn last_defined<T: Copy>(series: &[Option<T>]) -> Option<T> {
    series.iter().rev().find_map(|v| *v)
}
