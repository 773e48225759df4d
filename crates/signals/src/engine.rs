use tracing::debug;

use common::{Bar, BarLabels, Error, Result, SignalRecord};

use crate::aggregator::Classifier;
use crate::config::SignalFileConfig;
use crate::detectors;

/// Batch transform from one symbol's bar series to labelled, scored records.
///
/// Holds only immutable configuration, so one engine can be shared across
/// threads and run over many symbols concurrently.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    cfg: SignalFileConfig,
    classifier: Classifier,
}

impl SignalEngine {
    /// Validate `cfg` and build the engine.
    pub fn new(cfg: SignalFileConfig) -> Result<Self> {
        cfg.validate()?;
        let classifier = Classifier::new(cfg.weights.clone(), cfg.classifier);
        Ok(Self { cfg, classifier })
    }

    pub fn config(&self) -> &SignalFileConfig {
        &self.cfg
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Run every detector over the full series.
    ///
    /// `bars` must be one symbol, ascending by timestamp and gap-free.
    /// Ordering is not checked: a shuffled series yields wrong labels.
    pub fn label(&self, bars: &[Bar]) -> Vec<BarLabels> {
        let cfg = &self.cfg;
        let close = column(bars, |b| b.close);
        let bb_upper = column(bars, |b| b.bb_upper);
        let bb_lower = column(bars, |b| b.bb_lower);
        let macd_line = column(bars, |b| b.macd_line);
        let stoch_k = column(bars, |b| b.stoch_k);
        let stoch_d = column(bars, |b| b.stoch_d);

        let ma_cross = detectors::crossover(
            &column(bars, |b| b.fast_ma),
            &column(bars, |b| b.slow_ma),
        );
        let macd_cross = detectors::crossover(&macd_line, &column(bars, |b| b.macd_signal));
        let ema_cross = detectors::crossover(
            &column(bars, |b| b.fast_ema),
            &column(bars, |b| b.slow_ema),
        );
        let stochastic = detectors::stochastic(&stoch_k, &stoch_d, &cfg.stochastic);
        let trend = detectors::trend(&close, &column(bars, |b| b.slow_ma));
        let rsi = detectors::rsi(&column(bars, |b| b.rsi), &cfg.rsi);
        let cci = detectors::cci(&column(bars, |b| b.cci), &cfg.cci);
        let williams = detectors::williams(&column(bars, |b| b.willr), &cfg.williams);
        let momentum = detectors::momentum(&column(bars, |b| b.momentum));
        let bollinger = detectors::bollinger(&close, &bb_upper, &bb_lower);
        let proximity = detectors::proximity(&close, &bb_upper, &bb_lower, &cfg.proximity);
        let divergence = detectors::divergence(&close, &macd_line, cfg.divergence.lookback);
        let anomaly = detectors::anomaly(&close, cfg.anomaly.window, cfg.anomaly.threshold);
        let volume = detectors::volume_anomaly(
            &column(bars, |b| b.volume),
            cfg.volume.window,
            cfg.volume.ratio,
        );

        (0..bars.len())
            .map(|t| BarLabels {
                ma_cross: ma_cross[t],
                macd_cross: macd_cross[t],
                ema_cross: ema_cross[t],
                stochastic: stochastic[t],
                trend: trend[t],
                rsi: rsi[t],
                cci: cci[t],
                williams: williams[t],
                momentum: momentum[t],
                bollinger: bollinger[t],
                proximity: proximity[t],
                divergence: divergence[t],
                anomaly: anomaly[t],
                volume: volume[t],
            })
            .collect()
    }

    /// Label, score and classify every bar of one symbol's series.
    ///
    /// Fails on an empty series, one mixing symbols, or a bar without a
    /// finite close; nothing is returned for a failed batch.
    pub fn run(&self, bars: &[Bar]) -> Result<Vec<SignalRecord>> {
        let first = bars.first().ok_or(Error::EmptySeries)?;
        if let Some(other) = bars.iter().find(|b| b.symbol != first.symbol) {
            return Err(Error::MixedSymbols {
                expected: first.symbol.clone(),
                found: other.symbol.clone(),
            });
        }
        if let Some(bad) = bars.iter().find(|b| !b.close.is_finite()) {
            return Err(Error::InvalidClose {
                symbol: bad.symbol.clone(),
                timestamp: bad.timestamp,
            });
        }

        let records: Vec<SignalRecord> = self
            .label(bars)
            .into_iter()
            .zip(bars)
            .map(|(labels, bar)| {
                let (score, trade_signal, strength) = self.classifier.evaluate(&labels);
                SignalRecord {
                    bar: bar.clone(),
                    labels,
                    score,
                    trade_signal,
                    strength,
                }
            })
            .collect();

        let signalled = records
            .iter()
            .filter(|r| r.trade_signal != common::TradeSignal::None)
            .count();
        debug!(symbol = %first.symbol, bars = records.len(), signalled, "Signal batch complete");

        Ok(records)
    }
}

fn column(bars: &[Bar], field: impl Fn(&Bar) -> f64) -> Vec<f64> {
    bars.iter().map(field).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use common::{CrossLabel, DivergenceLabel, TradeSignal, VolumeLabel};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(i as i64)
    }

    fn series(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let mut bar = Bar::from_close("2317", ts(i), c);
                bar.volume = 1_000.0;
                bar
            })
            .collect()
    }

    fn engine() -> SignalEngine {
        SignalEngine::new(SignalFileConfig::default()).unwrap()
    }

    #[test]
    fn empty_series_is_rejected() {
        assert!(matches!(engine().run(&[]), Err(Error::EmptySeries)));
    }

    #[test]
    fn mixed_symbols_are_rejected() {
        let mut bars = series(&[1.0, 2.0]);
        bars[1].symbol = "AAPL".into();
        assert!(matches!(engine().run(&bars), Err(Error::MixedSymbols { .. })));
    }

    #[test]
    fn nan_close_is_rejected() {
        let mut bars = series(&[1.0, 2.0, 3.0]);
        bars[1].close = f64::NAN;
        match engine().run(&bars) {
            Err(Error::InvalidClose { symbol, timestamp }) => {
                assert_eq!(symbol, "2317");
                assert_eq!(timestamp, ts(1));
            }
            other => panic!("expected InvalidClose, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = SignalFileConfig::default();
        cfg.volume.ratio = 0.0;
        assert!(SignalEngine::new(cfg).is_err());
    }

    #[test]
    fn ma_cross_up_contributes_its_weight() {
        let mut bars = series(&[100.0, 100.0]);
        bars[0].fast_ma = 99.5;
        bars[1].fast_ma = 100.5;
        bars[0].slow_ma = 100.0;
        bars[1].slow_ma = 100.0;

        let records = engine().run(&bars).unwrap();
        assert_eq!(records[0].labels.ma_cross, CrossLabel::None);
        assert_eq!(records[1].labels.ma_cross, CrossLabel::CrossUp);
        assert_eq!(records[1].score.buy, 1.5);
    }

    #[test]
    fn oversold_lower_break_and_macd_cross_classify_as_buy() {
        let mut bars = series(&[100.0, 95.0]);
        bars[0].macd_line = -1.0;
        bars[0].macd_signal = -0.5;
        bars[1].macd_line = 0.2;
        bars[1].macd_signal = 0.0;
        bars[1].rsi = 25.0;
        bars[1].bb_upper = 110.0;
        bars[1].bb_lower = 96.0;

        let records = engine().run(&bars).unwrap();
        let last = &records[1];
        assert!(last.score.buy >= 3.0);
        assert!(matches!(last.trade_signal, TradeSignal::Buy | TradeSignal::StrongBuy));
        assert!(last.strength.starts_with("Bullish "));
    }

    #[test]
    fn volume_spike_fires_once() {
        let mut bars = series(&vec![50.0; 22]);
        bars[20].volume = 2_000.0;
        let records = engine().run(&bars).unwrap();
        let flagged: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.labels.volume == VolumeLabel::Anomaly)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![20]);
    }

    #[test]
    fn rising_prices_never_diverge() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let mut bars = series(&closes);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.macd_line = i as f64 * 0.1;
        }
        let records = engine().run(&bars).unwrap();
        assert!(records.iter().all(|r| r.labels.divergence == DivergenceLabel::None));
    }

    #[test]
    fn rerun_is_identical() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + ((i * 7) % 13) as f64).collect();
        let mut bars = series(&closes);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.rsi = (i * 11 % 100) as f64;
            bar.macd_line = ((i * 3) % 7) as f64 - 3.0;
            bar.macd_signal = 0.0;
        }
        let eng = engine();
        let a = eng.run(&bars).unwrap();
        let b = eng.run(&bars).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.labels, y.labels);
            assert_eq!(x.score, y.score);
            assert_eq!(x.trade_signal, y.trade_signal);
            assert_eq!(x.strength, y.strength);
        }
    }
}
