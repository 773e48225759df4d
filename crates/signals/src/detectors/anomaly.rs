use common::AnomalyLabel;

/// Bar-over-bar fractional change of `close`. The first bar, and any bar
/// whose previous close is zero or missing, has no return (`NaN`).
pub fn returns(close: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; close.len()];
    for t in 1..close.len() {
        let r = close[t] / close[t - 1] - 1.0;
        if r.is_finite() {
            out[t] = r;
        }
    }
    out
}

/// Rolling z-score of each return against the trailing `window` returns,
/// current bar included. `None` until `window` returns are available; a zero
/// or undefined standard deviation gives a z-score of 0.
pub fn zscores(returns: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; returns.len()];
    if window < 2 {
        return out;
    }
    for t in (window - 1)..returns.len() {
        let slice = &returns[t + 1 - window..=t];
        if slice.iter().any(|r| r.is_nan()) {
            continue;
        }
        let n = window as f64;
        let mean = slice.iter().sum::<f64>() / n;
        let var = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = var.sqrt();
        let z = (returns[t] - mean) / std;
        out[t] = Some(if z.is_finite() { z } else { 0.0 });
    }
    out
}

/// `Anomaly` when the return's |z| exceeds `threshold`.
pub fn anomaly(close: &[f64], window: usize, threshold: f64) -> Vec<AnomalyLabel> {
    zscores(&returns(close), window)
        .into_iter()
        .map(|z| match z {
            Some(z) if z.abs() > threshold => AnomalyLabel::Anomaly,
            _ => AnomalyLabel::None,
        })
        .collect()
}
