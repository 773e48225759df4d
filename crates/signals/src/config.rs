use std::path::Path;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

use crate::weights::WeightTable;

/// Top-level signal parameter file (TOML). Every section is optional.
///
/// Example `config/signals.toml`:
/// ```toml
/// [classifier]
/// min_signals = 3.0
/// conflict = "sell_wins"
///
/// [weights]
/// MACD_Div = 2.0
/// MA_Cross = 1.5
///
/// [rsi]
/// overbought = 70.0
/// oversold = 30.0
/// near = 5.0
///
/// [divergence]
/// lookback = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalFileConfig {
    pub classifier: ClassifierConfig,
    pub weights: WeightTable,
    pub rsi: RsiBands,
    pub cci: CciBands,
    pub williams: ZoneBands,
    pub stochastic: StochasticBands,
    pub proximity: ProximityBands,
    pub divergence: DivergenceConfig,
    pub anomaly: AnomalyConfig,
    pub volume: VolumeConfig,
}

impl SignalFileConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check every parameter the detectors and classifier rely on.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.classifier.validate()?;
        self.rsi.validate()?;
        self.cci.validate()?;
        self.williams.validate()?;
        self.stochastic.validate()?;
        self.proximity.validate()?;
        self.divergence.validate()?;
        self.anomaly.validate()?;
        self.volume.validate()
    }
}

/// How a bar that qualifies for both a buy and a sell class is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Sell classification is applied after buy and replaces it.
    #[default]
    SellWins,
    BuyWins,
    /// The side with the larger composite score wins; ties go to sell.
    HigherScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Composite score needed for a plain buy/sell. One more makes it strong.
    pub min_signals: f64,
    pub conflict: ConflictPolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_signals: 3.0,
            conflict: ConflictPolicy::SellWins,
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<()> {
        if !self.min_signals.is_finite() || self.min_signals <= 0.0 {
            return Err(Error::Config(format!(
                "classifier.min_signals must be > 0, got {}",
                self.min_signals
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RsiBands {
    pub overbought: f64,
    pub oversold: f64,
    /// Width of the "near" band inside each extreme.
    pub near: f64,
}

impl Default for RsiBands {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
            near: 5.0,
        }
    }
}

impl RsiBands {
    fn validate(&self) -> Result<()> {
        check_ordered("rsi", self.oversold, self.overbought)?;
        if !(self.near >= 0.0) || self.oversold + self.near > self.overbought - self.near {
            return Err(Error::Config(format!(
                "rsi.near must be >= 0 and keep the near bands apart, got {}",
                self.near
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CciBands {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for CciBands {
    fn default() -> Self {
        Self {
            overbought: 100.0,
            oversold: -100.0,
        }
    }
}

impl CciBands {
    fn validate(&self) -> Result<()> {
        check_ordered("cci", self.oversold, self.overbought)
    }
}

/// Williams %R zones.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneBands {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for ZoneBands {
    fn default() -> Self {
        Self {
            overbought: -20.0,
            oversold: -80.0,
        }
    }
}

impl ZoneBands {
    fn validate(&self) -> Result<()> {
        check_ordered("williams", self.oversold, self.overbought)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StochasticBands {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for StochasticBands {
    fn default() -> Self {
        Self {
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

impl StochasticBands {
    fn validate(&self) -> Result<()> {
        check_ordered("stochastic", self.oversold, self.overbought)
    }
}

/// Multipliers applied to the Bollinger bands for support/resistance proximity.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProximityBands {
    pub resistance: f64,
    pub support: f64,
}

impl Default for ProximityBands {
    fn default() -> Self {
        Self {
            resistance: 0.98,
            support: 1.02,
        }
    }
}

impl ProximityBands {
    fn validate(&self) -> Result<()> {
        if !(self.resistance > 0.0 && self.support > 0.0)
            || !self.resistance.is_finite()
            || !self.support.is_finite()
        {
            return Err(Error::Config(format!(
                "proximity factors must be > 0, got resistance={} support={}",
                self.resistance, self.support
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DivergenceConfig {
    pub lookback: usize,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self { lookback: 10 }
    }
}

impl DivergenceConfig {
    fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            return Err(Error::Config("divergence.lookback must be >= 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnomalyConfig {
    pub window: usize,
    /// Absolute z-score above which a return is anomalous.
    pub threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: 20,
            threshold: 3.0,
        }
    }
}

impl AnomalyConfig {
    fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(Error::Config(format!(
                "anomaly.window must be >= 2, got {}",
                self.window
            )));
        }
        check_positive("anomaly.threshold", self.threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeConfig {
    pub window: usize,
    /// Multiple of the rolling mean volume that counts as anomalous.
    pub ratio: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            window: 20,
            ratio: 1.5,
        }
    }
}

impl VolumeConfig {
    fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::Config("volume.window must be >= 1".into()));
        }
        check_positive("volume.ratio", self.ratio)
    }
}

fn check_ordered(section: &str, oversold: f64, overbought: f64) -> Result<()> {
    if !(oversold < overbought) {
        return Err(Error::Config(format!(
            "{section}: oversold ({oversold}) must be below overbought ({overbought})"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Config(format!("{name} must be > 0, got {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::SignalKind;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = SignalFileConfig::from_toml("").unwrap();
        assert_eq!(cfg, SignalFileConfig::default());
        assert_eq!(cfg.classifier.min_signals, 3.0);
        assert_eq!(cfg.divergence.lookback, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = include_str!("../../../config/signals.toml");
        let cfg = SignalFileConfig::from_toml(shipped).unwrap();
        assert_eq!(cfg, SignalFileConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = SignalFileConfig::from_toml(
            r#"
            [classifier]
            conflict = "higher_score"

            [rsi]
            overbought = 80.0

            [weights]
            MA_Cross = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.classifier.conflict, ConflictPolicy::HigherScore);
        assert_eq!(cfg.classifier.min_signals, 3.0);
        assert_eq!(cfg.rsi.overbought, 80.0);
        assert_eq!(cfg.rsi.oversold, 30.0);
        assert_eq!(cfg.weights.get(SignalKind::MaCross), 2.5);
        // A weights table replaces the defaults wholesale.
        assert_eq!(cfg.weights.get(SignalKind::MacdDiv), 0.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SignalFileConfig::from_toml("[rsi]\nperiod = 14\n").is_err());
    }

    #[test]
    fn validate_rejects_inverted_bands() {
        let mut cfg = SignalFileConfig::default();
        cfg.cci.overbought = -150.0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_overlapping_rsi_near_bands() {
        let mut cfg = SignalFileConfig::default();
        cfg.rsi.near = 25.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_anomaly_window() {
        let mut cfg = SignalFileConfig::default();
        cfg.anomaly.window = 1;
        assert!(cfg.validate().is_err());
    }
}
