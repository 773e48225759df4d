use common::{
    BandLabel, BarLabels, CciLabel, CompositeScore, CrossLabel, DivergenceLabel, MomentumLabel,
    RsiLabel, StochasticLabel, TradeSignal, TrendLabel, VolumeLabel, ZoneLabel,
};

use crate::config::{ClassifierConfig, ConflictPolicy};
use crate::weights::{SignalKind, WeightTable};

/// A single (detector, expected label) test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    MaCross(CrossLabel),
    MacdCross(CrossLabel),
    EmaCross(CrossLabel),
    Stochastic(StochasticLabel),
    Rsi(RsiLabel),
    Bollinger(BandLabel),
    Divergence(DivergenceLabel),
    Trend(TrendLabel),
    Volume(VolumeLabel),
    Cci(CciLabel),
    Williams(ZoneLabel),
    Momentum(MomentumLabel),
}

impl Condition {
    pub fn matches(&self, labels: &BarLabels) -> bool {
        match *self {
            Condition::MaCross(l) => labels.ma_cross == l,
            Condition::MacdCross(l) => labels.macd_cross == l,
            Condition::EmaCross(l) => labels.ema_cross == l,
            Condition::Stochastic(l) => labels.stochastic == l,
            Condition::Rsi(l) => labels.rsi == l,
            Condition::Bollinger(l) => labels.bollinger == l,
            Condition::Divergence(l) => labels.divergence == l,
            Condition::Trend(l) => labels.trend == l,
            Condition::Volume(l) => labels.volume == l,
            Condition::Cci(l) => labels.cci == l,
            Condition::Williams(l) => labels.williams == l,
            Condition::Momentum(l) => labels.momentum == l,
        }
    }
}

/// Conditions voting for the buy side.
pub const BUY_CONDITIONS: [(Condition, SignalKind); 15] = [
    (Condition::MaCross(CrossLabel::CrossUp), SignalKind::MaCross),
    (Condition::MacdCross(CrossLabel::CrossUp), SignalKind::MacdCross),
    (Condition::EmaCross(CrossLabel::CrossUp), SignalKind::EmaCross),
    (Condition::Stochastic(StochasticLabel::CrossUp), SignalKind::KdCross),
    (Condition::Rsi(RsiLabel::Oversold), SignalKind::RsiExtreme),
    (Condition::Rsi(RsiLabel::NearOversold), SignalKind::RsiNear),
    (Condition::Bollinger(BandLabel::BreakLower), SignalKind::BbBreak),
    (Condition::Divergence(DivergenceLabel::Bullish), SignalKind::MacdDiv),
    (Condition::Trend(TrendLabel::Bullish), SignalKind::Trend),
    (Condition::Volume(VolumeLabel::Anomaly), SignalKind::Volume),
    (Condition::Cci(CciLabel::Oversold), SignalKind::Cci),
    (Condition::Cci(CciLabel::CrossUpZero), SignalKind::Cci),
    (Condition::Williams(ZoneLabel::Oversold), SignalKind::Willr),
    (Condition::Momentum(MomentumLabel::TurnPositive), SignalKind::Momentum),
    (Condition::Stochastic(StochasticLabel::Oversold), SignalKind::KdCross),
];

/// Conditions voting for the sell side. Volume has no sell entry.
pub const SELL_CONDITIONS: [(Condition, SignalKind); 14] = [
    (Condition::MaCross(CrossLabel::CrossDown), SignalKind::MaCross),
    (Condition::MacdCross(CrossLabel::CrossDown), SignalKind::MacdCross),
    (Condition::EmaCross(CrossLabel::CrossDown), SignalKind::EmaCross),
    (Condition::Stochastic(StochasticLabel::CrossDown), SignalKind::KdCross),
    (Condition::Rsi(RsiLabel::Overbought), SignalKind::RsiExtreme),
    (Condition::Rsi(RsiLabel::NearOverbought), SignalKind::RsiNear),
    (Condition::Bollinger(BandLabel::BreakUpper), SignalKind::BbBreak),
    (Condition::Divergence(DivergenceLabel::Bearish), SignalKind::MacdDiv),
    (Condition::Trend(TrendLabel::Bearish), SignalKind::Trend),
    (Condition::Stochastic(StochasticLabel::Overbought), SignalKind::KdCross),
    (Condition::Cci(CciLabel::Overbought), SignalKind::Cci),
    (Condition::Cci(CciLabel::CrossDownZero), SignalKind::Cci),
    (Condition::Williams(ZoneLabel::Overbought), SignalKind::Willr),
    (Condition::Momentum(MomentumLabel::TurnNegative), SignalKind::Momentum),
];

/// Sums matched weights per side and turns the sums into a [`TradeSignal`].
#[derive(Debug, Clone)]
pub struct Classifier {
    weights: WeightTable,
    min_signals: f64,
    conflict: ConflictPolicy,
}

impl Classifier {
    pub fn new(weights: WeightTable, cfg: ClassifierConfig) -> Self {
        Self {
            weights,
            min_signals: cfg.min_signals,
            conflict: cfg.conflict,
        }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn score(&self, labels: &BarLabels) -> CompositeScore {
        CompositeScore {
            buy: self.sum(&BUY_CONDITIONS, labels),
            sell: self.sum(&SELL_CONDITIONS, labels),
        }
    }

    fn sum(&self, conditions: &[(Condition, SignalKind)], labels: &BarLabels) -> f64 {
        conditions
            .iter()
            .filter(|(cond, _)| cond.matches(labels))
            .fold(0.0, |acc, &(_, kind)| acc + self.weights.get(kind))
    }

    /// Classify each side on its own, then resolve a bar that qualifies on
    /// both sides with the configured [`ConflictPolicy`].
    pub fn classify(&self, score: &CompositeScore) -> TradeSignal {
        let buy = self.side(score.buy, TradeSignal::Buy, TradeSignal::StrongBuy);
        let sell = self.side(score.sell, TradeSignal::Sell, TradeSignal::StrongSell);

        match (buy, sell) {
            (None, None) => TradeSignal::None,
            (Some(b), None) => b,
            (None, Some(s)) => s,
            (Some(b), Some(s)) => match self.conflict {
                ConflictPolicy::SellWins => s,
                ConflictPolicy::BuyWins => b,
                ConflictPolicy::HigherScore if score.buy > score.sell => b,
                ConflictPolicy::HigherScore => s,
            },
        }
    }

    fn side(&self, value: f64, plain: TradeSignal, strong: TradeSignal) -> Option<TradeSignal> {
        if value >= self.min_signals + 1.0 {
            Some(strong)
        } else if value >= self.min_signals {
            Some(plain)
        } else {
            None
        }
    }

    /// Score, classification and strength label for one bar.
    pub fn evaluate(&self, labels: &BarLabels) -> (CompositeScore, TradeSignal, String) {
        let score = self.score(labels);
        let signal = self.classify(&score);
        let strength = signal.strength_label(&score);
        (score, signal, strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(conflict: ConflictPolicy) -> Classifier {
        Classifier::new(
            WeightTable::default(),
            ClassifierConfig {
                min_signals: 3.0,
                conflict,
            },
        )
    }

    #[test]
    fn empty_bar_scores_only_trend() {
        let c = classifier(ConflictPolicy::SellWins);
        let score = c.score(&BarLabels::default());
        // Default trend is bearish, which is a sell vote.
        assert_eq!(score, CompositeScore { buy: 0.0, sell: 0.5 });
        assert_eq!(c.classify(&score), TradeSignal::None);
    }

    #[test]
    fn oversold_breakout_with_golden_cross_is_a_buy() {
        let c = classifier(ConflictPolicy::SellWins);
        let labels = BarLabels {
            rsi: RsiLabel::Oversold,
            bollinger: BandLabel::BreakLower,
            macd_cross: CrossLabel::CrossUp,
            ..Default::default()
        };
        let (score, signal, strength) = c.evaluate(&labels);
        assert!((score.buy - 3.6).abs() < 1e-9);
        assert_eq!(signal, TradeSignal::Buy);
        assert_eq!(strength, "Bullish 3.6");
    }

    #[test]
    fn strong_threshold_is_min_plus_one() {
        let c = classifier(ConflictPolicy::SellWins);
        assert_eq!(c.classify(&CompositeScore { buy: 4.0, sell: 0.0 }), TradeSignal::StrongBuy);
        assert_eq!(c.classify(&CompositeScore { buy: 3.99, sell: 0.0 }), TradeSignal::Buy);
        assert_eq!(c.classify(&CompositeScore { buy: 2.99, sell: 0.0 }), TradeSignal::None);
        assert_eq!(c.classify(&CompositeScore { buy: 0.0, sell: 4.5 }), TradeSignal::StrongSell);
        assert_eq!(c.classify(&CompositeScore { buy: 0.0, sell: 3.0 }), TradeSignal::Sell);
    }

    #[test]
    fn conflict_policies() {
        let mixed = CompositeScore { buy: 5.0, sell: 3.2 };
        assert_eq!(classifier(ConflictPolicy::SellWins).classify(&mixed), TradeSignal::Sell);
        assert_eq!(classifier(ConflictPolicy::BuyWins).classify(&mixed), TradeSignal::StrongBuy);
        assert_eq!(
            classifier(ConflictPolicy::HigherScore).classify(&mixed),
            TradeSignal::StrongBuy
        );

        let tie = CompositeScore { buy: 3.5, sell: 3.5 };
        assert_eq!(classifier(ConflictPolicy::HigherScore).classify(&tie), TradeSignal::Sell);
    }

    #[test]
    fn both_sides_accumulate_independently() {
        let c = classifier(ConflictPolicy::SellWins);
        let labels = BarLabels {
            trend: TrendLabel::Bullish,
            volume: VolumeLabel::Anomaly,
            rsi: RsiLabel::Overbought,
            cci: CciLabel::CrossDownZero,
            ..Default::default()
        };
        let score = c.score(&labels);
        assert!((score.buy - 1.2).abs() < 1e-9);
        assert!((score.sell - 2.1).abs() < 1e-9);
    }

    #[test]
    fn stochastic_extremes_weigh_as_kd_cross() {
        let c = classifier(ConflictPolicy::SellWins);
        let labels = BarLabels {
            stochastic: StochasticLabel::Oversold,
            ..Default::default()
        };
        assert_eq!(c.score(&labels).buy, 1.0);
    }

    #[test]
    fn unweighted_kind_contributes_nothing() {
        let c = Classifier::new(
            WeightTable::from_entries([(SignalKind::Trend, 0.5)]),
            ClassifierConfig::default(),
        );
        let labels = BarLabels {
            divergence: DivergenceLabel::Bullish,
            trend: TrendLabel::Bullish,
            ..Default::default()
        };
        assert_eq!(c.score(&labels), CompositeScore { buy: 0.5, sell: 0.0 });
    }

    #[test]
    fn proximity_and_anomaly_never_vote() {
        let c = classifier(ConflictPolicy::SellWins);
        let labels = BarLabels {
            proximity: common::ProximityLabel::NearSupport,
            anomaly: common::AnomalyLabel::Anomaly,
            trend: TrendLabel::Bullish,
            ..Default::default()
        };
        assert_eq!(c.score(&labels), CompositeScore { buy: 0.5, sell: 0.0 });
    }
}
