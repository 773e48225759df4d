use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, Trim, Writer};
use tracing::debug;

use common::{Bar, BarLabels, Error, Result, SignalRecord};

/// Timestamp layout used for every exported or stored row.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read a bar table and split it into one ascending series per symbol.
///
/// Every column in [`Bar::REQUIRED_COLUMNS`] must be present; extra columns
/// are ignored. A repeated timestamp within one symbol is an error.
pub fn read_bars<R: io::Read>(reader: R) -> Result<BTreeMap<String, Vec<Bar>>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in Bar::REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::MissingColumn(column.to_string()));
        }
    }

    let mut by_symbol: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
    for row in reader.deserialize::<Bar>() {
        let bar = row?;
        by_symbol.entry(bar.symbol.clone()).or_default().push(bar);
    }

    for (symbol, bars) in by_symbol.iter_mut() {
        bars.sort_by_key(|b| b.timestamp);
        if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(Error::DuplicateTimestamp {
                symbol: symbol.clone(),
                timestamp: pair[1].timestamp,
            });
        }
        debug!(symbol = %symbol, bars = bars.len(), "Loaded bar series");
    }

    Ok(by_symbol)
}

pub fn read_bars_from_path(path: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<Bar>>> {
    read_bars(File::open(path)?)
}

/// Header of the exported signal table.
pub fn output_header() -> Vec<&'static str> {
    let mut header: Vec<&'static str> = Bar::REQUIRED_COLUMNS.to_vec();
    header.extend(BarLabels::COLUMN_NAMES);
    header.extend(["Buy_Signals", "Sell_Signals", "TradeSignal", "SignalStrength"]);
    header
}

/// Write records as the input columns followed by every label column,
/// both scores, the classification and the strength label.
pub fn write_records<W: io::Write>(writer: W, records: &[SignalRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(output_header())?;

    for r in records {
        let b = &r.bar;
        let mut row: Vec<String> = vec![
            b.symbol.clone(),
            b.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ];
        row.extend(
            [
                b.open, b.high, b.low, b.close, b.volume, b.fast_ma, b.slow_ma, b.fast_ema,
                b.slow_ema, b.macd_line, b.macd_signal, b.stoch_k, b.stoch_d, b.rsi, b.cci,
                b.willr, b.momentum, b.bb_upper, b.bb_lower,
            ]
            .iter()
            .map(|&v| cell(v)),
        );
        row.extend(r.labels.columns().iter().map(|s| s.to_string()));
        row.push(cell(r.score.buy));
        row.push(cell(r.score.sell));
        row.push(r.trade_signal.as_str().to_string());
        row.push(r.strength.clone());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_records_to_path(path: impl AsRef<Path>, records: &[SignalRecord]) -> Result<()> {
    write_records(File::create(path)?, records)
}

/// Missing values export as empty cells.
fn cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}
