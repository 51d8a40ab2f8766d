// =============================================================================
// Volume-Weighted Average Price (VWAP) — whole-window cumulative
// =============================================================================
//
//   typical_i = (high_i + low_i + close_i) / 3
//   VWAP_t    = Σ_{i<=t} typical_i * volume_i / Σ_{i<=t} volume_i
//
// The accumulation never resets: the final value covers every bar passed in,
// not a session or a rolling window.
// =============================================================================

/// Cumulative VWAP laid out index-for-index with the inputs.
///
/// An entry is `None` while the cumulative volume is still zero or when the
/// ratio is not finite. Inputs are parallel slices; extra trailing elements
/// in a longer slice are ignored.
pub fn vwap_series(highs: &[f64], lows: &[f64], closes: &[f64], volumes: &[f64]) -> Vec<Option<f64>> {
    let mut cum_tpv = 0.0_f64;
    let mut cum_volume = 0.0_f64;

    highs
        .iter()
        .zip(lows)
        .zip(closes)
        .zip(volumes)
        .map(|(((&h, &l), &c), &v)| {
            let typical = (h + l + c) / 3.0;
            cum_tpv += typical * v;
            cum_volume += v;
            vwap_ratio(cum_tpv, cum_volume)
        })
        .collect()
}

fn vwap_ratio(cum_tpv: f64, cum_volume: f64) -> Option<f64> {
    if cum_volume == 0.0 {
        return None;
    }
    let vwap = cum_tpv / cum_volume;
    vwap.is_finite().then_some(vwap)
}
