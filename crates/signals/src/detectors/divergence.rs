use common::DivergenceLabel;

/// Price/oscillator divergence against the extremes of the preceding
/// `lookback` bars (the current bar excluded).
///
/// The first `lookback` bars, and any bar whose window holds a missing value,
/// are `None`.
pub fn divergence(close: &[f64], oscillator: &[f64], lookback: usize) -> Vec<DivergenceLabel> {
    debug_assert_eq!(close.len(), oscillator.len());
    let n = close.len().min(oscillator.len());
    let mut out = vec![DivergenceLabel::None; n];
    if lookback == 0 {
        return out;
    }

    for t in lookback..n {
        let Some((price_min, price_max)) = extremes(&close[t - lookback..t]) else {
            continue;
        };
        let Some((osc_min, osc_max)) = extremes(&oscillator[t - lookback..t]) else {
            continue;
        };

        // New low in price the oscillator does not confirm, and vice versa.
        if close[t] < price_min && oscillator[t] > osc_min {
            out[t] = DivergenceLabel::Bullish;
        } else if close[t] > price_max && oscillator[t] < osc_max {
            out[t] = DivergenceLabel::Bearish;
        }
    }
    out
}

/// Min and max of a fully populated window.
fn extremes(window: &[f64]) -> Option<(f64, f64)> {
    if window.is_empty() || window.iter().any(|v| v.is_nan()) {
        return None;
    }
    Some(window.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    }))
}
