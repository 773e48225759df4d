use common::{CrossLabel, StochasticLabel};

use crate::config::StochasticBands;

/// Compare each bar with its predecessor: `CrossUp` when `a` moves from at or
/// below `b` to strictly above it, `CrossDown` for the mirror move.
/// The first bar has no predecessor and is always `None`.
pub fn crossover(a: &[f64], b: &[f64]) -> Vec<CrossLabel> {
    debug_assert_eq!(a.len(), b.len());
    let mut out = vec![CrossLabel::None; a.len()];
    for t in 1..a.len().min(b.len()) {
        out[t] = classify(a[t - 1], b[t - 1], a[t], b[t]);
    }
    out
}

/// [`crossover`] against a constant level.
pub fn crossover_level(a: &[f64], level: f64) -> Vec<CrossLabel> {
    let mut out = vec![CrossLabel::None; a.len()];
    for t in 1..a.len() {
        out[t] = classify(a[t - 1], level, a[t], level);
    }
    out
}

fn classify(prev_a: f64, prev_b: f64, a: f64, b: f64) -> CrossLabel {
    if a > b && prev_a <= prev_b {
        CrossLabel::CrossUp
    } else if a < b && prev_a >= prev_b {
        CrossLabel::CrossDown
    } else {
        CrossLabel::None
    }
}

/// Stochastic K/D crossover with the extreme zones taking precedence:
/// both lines at or above `overbought` (or at or below `oversold`) replace
/// whatever crossover the bar carries.
pub fn stochastic(k: &[f64], d: &[f64], bands: &StochasticBands) -> Vec<StochasticLabel> {
    crossover(k, d)
        .into_iter()
        .zip(k.iter().zip(d))
        .map(|(cross, (&k, &d))| {
            if k >= bands.overbought && d >= bands.overbought {
                StochasticLabel::Overbought
            } else if k <= bands.oversold && d <= bands.oversold {
                StochasticLabel::Oversold
            } else {
                match cross {
                    CrossLabel::CrossUp => StochasticLabel::CrossUp,
                    CrossLabel::CrossDown => StochasticLabel::CrossDown,
                    CrossLabel::None => StochasticLabel::None,
                }
            }
        })
        .collect()
}
