use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Weight keys. Several detector labels may share one key
/// (e.g. both CCI zero-line crosses weigh as `Cci`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum SignalKind {
    #[serde(rename = "MACD_Div")]
    MacdDiv,
    #[serde(rename = "MA_Cross")]
    MaCross,
    #[serde(rename = "MACD_Cross")]
    MacdCross,
    #[serde(rename = "EMA_Cross")]
    EmaCross,
    #[serde(rename = "RSI_Extreme")]
    RsiExtreme,
    #[serde(rename = "BB_Break")]
    BbBreak,
    #[serde(rename = "KD_Cross")]
    KdCross,
    #[serde(rename = "CCI")]
    Cci,
    #[serde(rename = "WILLR")]
    Willr,
    #[serde(rename = "Volume")]
    Volume,
    #[serde(rename = "MOM")]
    Momentum,
    #[serde(rename = "Trend")]
    Trend,
    #[serde(rename = "RSI_Near")]
    RsiNear,
}

/// Immutable signal-kind → weight map handed to the classifier.
///
/// A kind without an entry weighs zero.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<SignalKind, f64>);

impl Default for WeightTable {
    fn default() -> Self {
        Self::from_entries([
            (SignalKind::MacdDiv, 2.0),
            (SignalKind::MaCross, 1.5),
            (SignalKind::MacdCross, 1.4),
            (SignalKind::EmaCross, 1.3),
            (SignalKind::RsiExtreme, 1.2),
            (SignalKind::BbBreak, 1.0),
            (SignalKind::KdCross, 1.0),
            (SignalKind::Cci, 0.9),
            (SignalKind::Willr, 0.8),
            (SignalKind::Volume, 0.7),
            (SignalKind::Momentum, 0.6),
            (SignalKind::Trend, 0.5),
            (SignalKind::RsiNear, 0.4),
        ])
    }
}

impl WeightTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (SignalKind, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn get(&self, kind: SignalKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every configured weight must be finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (kind, &weight) in &self.0 {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(Error::Config(format!(
                    "weight for {kind:?} must be > 0, got {weight}"
                )));
            }
        }
        Ok(())
    }
}
