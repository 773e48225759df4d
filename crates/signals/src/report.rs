use std::fmt;

use chrono::NaiveDateTime;

use common::{SignalRecord, TradeSignal};

/// Mean and maximum composite score over a set of classified bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrengthStats {
    pub mean: f64,
    pub max: f64,
}

impl StrengthStats {
    fn from_scores(scores: impl Iterator<Item = f64>) -> Option<Self> {
        let (count, sum, max) = scores.fold((0usize, 0.0, f64::NEG_INFINITY), |(n, s, m), v| {
            (n + 1, s + v, m.max(v))
        });
        (count > 0).then(|| Self {
            mean: sum / count as f64,
            max,
        })
    }
}

/// One signalled bar shown in the summary tail.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSignal {
    pub timestamp: NaiveDateTime,
    pub signal: TradeSignal,
    pub strength: String,
}

/// Run summary over one symbol's records.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub symbol: String,
    pub total: usize,
    pub signalled: usize,
    /// Count per non-`None` signal, in [`TradeSignal::ALL`] order, zeros omitted.
    pub counts: Vec<(TradeSignal, usize)>,
    pub buy_strength: Option<StrengthStats>,
    pub sell_strength: Option<StrengthStats>,
    /// Up to three most recent signalled bars, oldest first.
    pub latest: Vec<LatestSignal>,
}

impl Summary {
    pub const LATEST: usize = 3;

    pub fn from_records(symbol: impl Into<String>, records: &[SignalRecord]) -> Self {
        let signalled: Vec<&SignalRecord> = records
            .iter()
            .filter(|r| r.trade_signal != TradeSignal::None)
            .collect();

        let counts = TradeSignal::ALL
            .iter()
            .filter(|&&s| s != TradeSignal::None)
            .map(|&s| (s, signalled.iter().filter(|r| r.trade_signal == s).count()))
            .filter(|&(_, n)| n > 0)
            .collect();

        let buy_strength = StrengthStats::from_scores(
            signalled
                .iter()
                .filter(|r| r.trade_signal.is_buy())
                .map(|r| r.score.buy),
        );
        let sell_strength = StrengthStats::from_scores(
            signalled
                .iter()
                .filter(|r| r.trade_signal.is_sell())
                .map(|r| r.score.sell),
        );

        let latest = signalled
            .iter()
            .skip(signalled.len().saturating_sub(Self::LATEST))
            .map(|r| LatestSignal {
                timestamp: r.bar.timestamp,
                signal: r.trade_signal,
                strength: r.strength.clone(),
            })
            .collect();

        Self {
            symbol: symbol.into(),
            total: records.len(),
            signalled: signalled.len(),
            counts,
            buy_strength,
            sell_strength,
            latest,
        }
    }

    /// Share of bars carrying a signal, in percent.
    pub fn signalled_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.signalled as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Trade signal summary: {} ===", self.symbol)?;
        writeln!(f, "Bars: {}", self.total)?;
        writeln!(f, "Signalled: {} ({:.1}%)", self.signalled, self.signalled_pct())?;
        for (signal, count) in &self.counts {
            let pct = *count as f64 / self.total.max(1) as f64 * 100.0;
            writeln!(f, "  {signal}: {count} ({pct:.2}%)")?;
        }
        if let Some(s) = self.buy_strength {
            writeln!(f, "Bullish strength: mean {:.1}, max {:.1}", s.mean, s.max)?;
        }
        if let Some(s) = self.sell_strength {
            writeln!(f, "Bearish strength: mean {:.1}, max {:.1}", s.mean, s.max)?;
        }
        if !self.latest.is_empty() {
            writeln!(f, "Latest signals:")?;
            for l in &self.latest {
                writeln!(
                    f,
                    "  {}: {} ({})",
                    l.timestamp.format("%Y-%m-%d"),
                    l.signal,
                    l.strength
                )?;
            }
        }
        Ok(())
    }
}
