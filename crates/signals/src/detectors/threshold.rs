//! Band and regime detectors: each bar is classified from its own values,
//! except where a zero-line crossing needs the previous bar.

use common::{
    BandLabel, CciLabel, CrossLabel, MomentumLabel, ProximityLabel, RsiLabel, TrendLabel,
    ZoneLabel,
};

use crate::config::{CciBands, ProximityBands, RsiBands, ZoneBands};
use crate::detectors::crossover::crossover_level;

/// `Bullish` when close is above the slow moving average, `Bearish` otherwise
/// (including when the average is missing).
pub fn trend(close: &[f64], slow_ma: &[f64]) -> Vec<TrendLabel> {
    close
        .iter()
        .zip(slow_ma)
        .map(|(&c, &ma)| if c > ma { TrendLabel::Bullish } else { TrendLabel::Bearish })
        .collect()
}

/// Extremes are inclusive; the near bands exclude the extreme itself.
pub fn rsi(values: &[f64], bands: &RsiBands) -> Vec<RsiLabel> {
    values
        .iter()
        .map(|&v| {
            if v >= bands.overbought {
                RsiLabel::Overbought
            } else if v <= bands.oversold {
                RsiLabel::Oversold
            } else if v >= bands.overbought - bands.near {
                RsiLabel::NearOverbought
            } else if v <= bands.oversold + bands.near {
                RsiLabel::NearOversold
            } else {
                RsiLabel::None
            }
        })
        .collect()
}

/// Zero-line crossings take precedence over the static bands.
pub fn cci(values: &[f64], bands: &CciBands) -> Vec<CciLabel> {
    crossover_level(values, 0.0)
        .into_iter()
        .zip(values)
        .map(|(cross, &v)| match cross {
            CrossLabel::CrossUp => CciLabel::CrossUpZero,
            CrossLabel::CrossDown => CciLabel::CrossDownZero,
            CrossLabel::None if v >= bands.overbought => CciLabel::Overbought,
            CrossLabel::None if v <= bands.oversold => CciLabel::Oversold,
            CrossLabel::None => CciLabel::None,
        })
        .collect()
}

/// Williams %R zones.
pub fn williams(values: &[f64], bands: &ZoneBands) -> Vec<ZoneLabel> {
    values
        .iter()
        .map(|&v| {
            if v >= bands.overbought {
                ZoneLabel::Overbought
            } else if v <= bands.oversold {
                ZoneLabel::Oversold
            } else {
                ZoneLabel::None
            }
        })
        .collect()
}

pub fn momentum(values: &[f64]) -> Vec<MomentumLabel> {
    crossover_level(values, 0.0)
        .into_iter()
        .map(|cross| match cross {
            CrossLabel::CrossUp => MomentumLabel::TurnPositive,
            CrossLabel::CrossDown => MomentumLabel::TurnNegative,
            CrossLabel::None => MomentumLabel::None,
        })
        .collect()
}

/// Close strictly outside the Bollinger bands. The lower break is checked
/// first, so an inverted band pair reports `BreakLower`.
pub fn bollinger(close: &[f64], upper: &[f64], lower: &[f64]) -> Vec<BandLabel> {
    close
        .iter()
        .zip(upper.iter().zip(lower))
        .map(|(&c, (&up, &low))| {
            if c < low {
                BandLabel::BreakLower
            } else if c > up {
                BandLabel::BreakUpper
            } else {
                BandLabel::None
            }
        })
        .collect()
}

/// Close within a fixed fraction of the bands. Support is checked first, so
/// a band narrow enough to satisfy both reports `NearSupport`.
pub fn proximity(
    close: &[f64],
    upper: &[f64],
    lower: &[f64],
    bands: &ProximityBands,
) -> Vec<ProximityLabel> {
    close
        .iter()
        .zip(upper.iter().zip(lower))
        .map(|(&c, (&up, &low))| {
            if c <= low * bands.support {
                ProximityLabel::NearSupport
            } else if c >= up * bands.resistance {
                ProximityLabel::NearResistance
            } else {
                ProximityLabel::None
            }
        })
        .collect()
}
