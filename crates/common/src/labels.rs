//! Closed label vocabularies, one per detector.
//!
//! Each enum renders to the text stored in the output table. The "no signal"
//! variant renders as an empty string, except for `TrendLabel`, which always
//! carries a direction.

macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $default:ident => $default_text:literal $(, $variant:ident => $text:literal)* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            #[default]
            $default,
            $($variant,)*
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $name::$default => $default_text,
                    $($name::$variant => $text,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum! {
    /// Two aligned series swapping order between consecutive bars.
    /// Shared by the MA, MACD and EMA crossover detectors.
    CrossLabel { None => "", CrossUp => "cross-up", CrossDown => "cross-down" }
}

label_enum! {
    /// Stochastic K/D: crossover, overridden by the extreme zones.
    StochasticLabel {
        None => "",
        CrossUp => "cross-up",
        CrossDown => "cross-down",
        Overbought => "stochastic-overbought",
        Oversold => "stochastic-oversold",
    }
}

label_enum! {
    /// Close against the slow moving average. Never empty.
    TrendLabel { Bearish => "bearish", Bullish => "bullish" }
}

label_enum! {
    RsiLabel {
        None => "",
        Overbought => "overbought",
        Oversold => "oversold",
        NearOverbought => "near-overbought",
        NearOversold => "near-oversold",
    }
}

label_enum! {
    CciLabel {
        None => "",
        Overbought => "overbought",
        Oversold => "oversold",
        CrossUpZero => "cross-up-zero",
        CrossDownZero => "cross-down-zero",
    }
}

label_enum! {
    /// Williams %R zones.
    ZoneLabel { None => "", Overbought => "overbought", Oversold => "oversold" }
}

label_enum! {
    MomentumLabel { None => "", TurnPositive => "turn-positive", TurnNegative => "turn-negative" }
}

label_enum! {
    /// Close outside the Bollinger bands.
    BandLabel { None => "", BreakUpper => "break-upper", BreakLower => "break-lower" }
}

label_enum! {
    /// Close within a fixed distance of the Bollinger bands.
    ProximityLabel { None => "", NearResistance => "near-resistance", NearSupport => "near-support" }
}

label_enum! {
    DivergenceLabel {
        None => "",
        Bullish => "bullish-divergence",
        Bearish => "bearish-divergence",
    }
}

label_enum! {
    /// Return z-score outside the threshold.
    AnomalyLabel { None => "", Anomaly => "anomaly" }
}

label_enum! {
    VolumeLabel { None => "", Anomaly => "volume-anomaly" }
}

/// Every detector's label for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarLabels {
    pub ma_cross: CrossLabel,
    pub macd_cross: CrossLabel,
    pub ema_cross: CrossLabel,
    pub stochastic: StochasticLabel,
    pub trend: TrendLabel,
    pub rsi: RsiLabel,
    pub cci: CciLabel,
    pub williams: ZoneLabel,
    pub momentum: MomentumLabel,
    pub bollinger: BandLabel,
    pub proximity: ProximityLabel,
    pub divergence: DivergenceLabel,
    pub anomaly: AnomalyLabel,
    pub volume: VolumeLabel,
}

impl BarLabels {
    /// Output column names, in the order returned by [`BarLabels::columns`].
    pub const COLUMN_NAMES: [&'static str; 14] = [
        "MA_Cross",
        "MACD_Cross",
        "EMA_Cross",
        "KD_Signal",
        "Trend",
        "RSI_Signal",
        "CCI_Signal",
        "WILLR_Signal",
        "MOM_Signal",
        "BB_Signal",
        "SR_Signal",
        "MACD_Div",
        "Anomaly",
        "Volume_Anomaly",
    ];

    /// Rendered label text for each output column.
    pub fn columns(&self) -> [&'static str; 14] {
        [
            self.ma_cross.as_str(),
            self.macd_cross.as_str(),
            self.ema_cross.as_str(),
            self.stochastic.as_str(),
            self.trend.as_str(),
            self.rsi.as_str(),
            self.cci.as_str(),
            self.williams.as_str(),
            self.momentum.as_str(),
            self.bollinger.as_str(),
            self.proximity.as_str(),
            self.divergence.as_str(),
            self.anomaly.as_str(),
            self.volume.as_str(),
        ]
    }
}
