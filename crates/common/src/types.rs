use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::labels::BarLabels;

/// One timestamped OHLCV observation plus its precomputed indicator columns.
///
/// Indicator cells left empty in the source table are `NaN`. A `NaN` fails
/// every comparison, so detectors simply emit no label for such bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    #[serde(rename = "datetime", deserialize_with = "de_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "open_price")]
    pub open: f64,
    #[serde(rename = "high_price")]
    pub high: f64,
    #[serde(rename = "low_price")]
    pub low: f64,
    #[serde(rename = "close_price")]
    pub close: f64,
    pub volume: f64,

    #[serde(rename = "ma5", deserialize_with = "de_indicator")]
    pub fast_ma: f64,
    #[serde(rename = "ma20", deserialize_with = "de_indicator")]
    pub slow_ma: f64,
    #[serde(rename = "ema12", deserialize_with = "de_indicator")]
    pub fast_ema: f64,
    #[serde(rename = "ema26", deserialize_with = "de_indicator")]
    pub slow_ema: f64,
    /// MACD line (fast EMA minus slow EMA). Also the divergence oscillator.
    #[serde(rename = "dif", deserialize_with = "de_indicator")]
    pub macd_line: f64,
    #[serde(rename = "macd", deserialize_with = "de_indicator")]
    pub macd_signal: f64,
    #[serde(rename = "k_value", deserialize_with = "de_indicator")]
    pub stoch_k: f64,
    #[serde(rename = "d_value", deserialize_with = "de_indicator")]
    pub stoch_d: f64,
    #[serde(rename = "rsi_14", deserialize_with = "de_indicator")]
    pub rsi: f64,
    #[serde(deserialize_with = "de_indicator")]
    pub cci: f64,
    #[serde(deserialize_with = "de_indicator")]
    pub willr: f64,
    #[serde(rename = "mom", deserialize_with = "de_indicator")]
    pub momentum: f64,
    #[serde(deserialize_with = "de_indicator")]
    pub bb_upper: f64,
    #[serde(deserialize_with = "de_indicator")]
    pub bb_lower: f64,
}

impl Bar {
    /// Columns the input table must carry.
    pub const REQUIRED_COLUMNS: [&'static str; 21] = [
        "symbol",
        "datetime",
        "open_price",
        "high_price",
        "low_price",
        "close_price",
        "volume",
        "ma5",
        "ma20",
        "ema12",
        "ema26",
        "dif",
        "macd",
        "k_value",
        "d_value",
        "rsi_14",
        "cci",
        "willr",
        "mom",
        "bb_upper",
        "bb_lower",
    ];

    /// A flat bar at `close` with zero volume and every indicator missing.
    pub fn from_close(symbol: impl Into<String>, timestamp: NaiveDateTime, close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            fast_ma: f64::NAN,
            slow_ma: f64::NAN,
            fast_ema: f64::NAN,
            slow_ema: f64::NAN,
            macd_line: f64::NAN,
            macd_signal: f64::NAN,
            stoch_k: f64::NAN,
            stoch_d: f64::NAN,
            rsi: f64::NAN,
            cci: f64::NAN,
            willr: f64::NAN,
            momentum: f64::NAN,
            bb_upper: f64::NAN,
            bb_lower: f64::NAN,
        }
    }
}

/// Accepted `datetime` layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a bar timestamp. A bare date maps to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised datetime '{raw}'")))
}

fn de_indicator<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(f64::NAN),
        Some(s) if s.eq_ignore_ascii_case("nan") => Ok(f64::NAN),
        Some(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Weighted buy and sell sums for one bar. Both sides are computed
/// independently and may both be non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositeScore {
    pub buy: f64,
    pub sell: f64,
}

/// Final recommendation for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSignal {
    #[default]
    None,
    Buy,
    StrongBuy,
    Sell,
    StrongSell,
}

impl TradeSignal {
    pub const ALL: [TradeSignal; 5] = [
        TradeSignal::None,
        TradeSignal::Buy,
        TradeSignal::StrongBuy,
        TradeSignal::Sell,
        TradeSignal::StrongSell,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TradeSignal::None => "",
            TradeSignal::Buy => "buy",
            TradeSignal::StrongBuy => "strong_buy",
            TradeSignal::Sell => "sell",
            TradeSignal::StrongSell => "strong_sell",
        }
    }

    pub fn is_buy(self) -> bool {
        matches!(self, TradeSignal::Buy | TradeSignal::StrongBuy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, TradeSignal::Sell | TradeSignal::StrongSell)
    }

    /// Direction name plus the winning side's score to one decimal place.
    /// Empty for `None`.
    pub fn strength_label(self, score: &CompositeScore) -> String {
        if self.is_buy() {
            format!("Bullish {:.1}", score.buy)
        } else if self.is_sell() {
            format!("Bearish {:.1}", score.sell)
        } else {
            String::new()
        }
    }
}

impl std::fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSignal::None => write!(f, "none"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One output row: the input bar augmented with every detector label,
/// the composite score and the classification.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub bar: Bar,
    pub labels: BarLabels,
    pub score: CompositeScore,
    pub trade_signal: TradeSignal,
    pub strength: String,
}
