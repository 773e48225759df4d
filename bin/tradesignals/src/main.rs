use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{Bar, Config, SignalRecord};
use signals::{SignalEngine, SignalFileConfig, Summary};
use store::SignalStore;

const DEFAULT_OUTPUT_DIR: &str = "output/";

#[derive(Parser)]
#[command(name = "tradesignals")]
#[command(about = "Label, score and classify technical-indicator bars into trade signals", long_about = None)]
struct Cli {
    /// Symbols to process (comma-separated lists allowed). Defaults to every symbol in the input.
    #[arg(value_delimiter = ',')]
    symbols: Vec<String>,

    /// Additional symbols (comma-separated lists allowed)
    #[arg(short = 's', long = "symbol", value_delimiter = ',')]
    symbol: Vec<String>,

    /// Indicator CSV to read [env: INPUT_CSV]
    #[arg(short, long)]
    input: Option<String>,

    /// Output CSV file or directory; bare `--output` writes to `output/` [env: OUTPUT_CSV]
    #[arg(short, long, num_args = 0..=1, default_missing_value = DEFAULT_OUTPUT_DIR)]
    output: Option<String>,

    /// Signal parameter file [env: SIGNAL_CONFIG_PATH]
    #[arg(short, long)]
    config: Option<String>,

    /// SQLite database to persist signals into [env: DATABASE_URL]
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cli = Cli::parse();
    let env = Config::from_env();

    let input = cli
        .input
        .or(env.input_path)
        .context("no input CSV given (use --input or INPUT_CSV)")?;
    let output = cli.output.or(env.output_path);
    let database_url = cli.database_url.or(env.database_url);
    let config_path = cli.config.unwrap_or(env.signal_config_path);

    let signal_cfg = if Path::new(&config_path).exists() {
        SignalFileConfig::load(&config_path)
            .with_context(|| format!("failed to load signal config '{config_path}'"))?
    } else {
        warn!(path = %config_path, "Signal config not found, using defaults");
        SignalFileConfig::default()
    };
    let engine = Arc::new(SignalEngine::new(signal_cfg)?);
    info!(input = %input, "TradeSignals starting");

    // ── Input ─────────────────────────────────────────────────────────────────
    let mut series = store::read_bars_from_path(&input)
        .with_context(|| format!("failed to read '{input}'"))?;
    let series = select_symbols(&mut series, cli.symbols.into_iter().chain(cli.symbol));
    if series.is_empty() {
        bail!("no bars to process");
    }

    // ── Signal engine, one blocking task per symbol ───────────────────────────
    let mut handles = Vec::with_capacity(series.len());
    for (symbol, bars) in series {
        let engine = engine.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = engine.run(&bars);
            (result, started.elapsed())
        });
        handles.push((symbol, handle));
    }

    let total = handles.len();
    let mut failed = 0;
    let mut results: Vec<(String, Vec<SignalRecord>)> = Vec::new();
    for (symbol, handle) in handles {
        match handle.await {
            Ok((Ok(records), elapsed)) => {
                info!(
                    symbol = %symbol,
                    bars = records.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Signals computed"
                );
                results.push((symbol, records));
            }
            Ok((Err(e), _)) => {
                error!(symbol = %symbol, error = %e, "Signal run failed, skipping");
                failed += 1;
            }
            Err(e) => {
                error!(symbol = %symbol, error = %e, "Signal task panicked, skipping");
                failed += 1;
            }
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────────
    let db = match &database_url {
        Some(url) => Some(
            SignalStore::connect(url)
                .await
                .with_context(|| format!("failed to open database '{url}'"))?,
        ),
        None => None,
    };
    if let Some(out) = output.as_deref().filter(|o| o.ends_with(['/', '\\'])) {
        std::fs::create_dir_all(out)
            .with_context(|| format!("failed to create output directory '{out}'"))?;
    }
    let multi = results.len() > 1;

    for (symbol, records) in &results {
        let mut ok = true;
        if let Some(db) = &db {
            match db.replace_range(records).await {
                Ok(n) => info!(symbol = %symbol, rows = n, "Signals stored"),
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Failed to store signals");
                    ok = false;
                }
            }
        }
        if let Some(out) = &output {
            let path = output_path(Path::new(out), symbol, multi);
            match store::write_records_to_path(&path, records) {
                Ok(()) => info!(symbol = %symbol, path = %path.display(), "Signals written"),
                Err(e) => {
                    error!(
                        symbol = %symbol,
                        path = %path.display(),
                        error = %e,
                        "Failed to write signals"
                    );
                    ok = false;
                }
            }
        }
        if !ok {
            failed += 1;
        }
        info!("\n{}", Summary::from_records(symbol.clone(), records));
    }

    if db.is_none() && output.is_none() {
        warn!("No --output or --database-url given; signals were only summarised");
    }
    info!(symbols = total, failed, "Done");
    run_outcome(total, failed)
}

/// Any failed symbol makes the run fail, after every other symbol was processed.
fn run_outcome(total: usize, failed: usize) -> anyhow::Result<()> {
    if failed > 0 {
        bail!("{failed} of {total} symbols failed");
    }
    Ok(())
}

/// Keep only the requested symbols, or all of them when none are requested.
fn select_symbols(
    series: &mut BTreeMap<String, Vec<Bar>>,
    requested: impl Iterator<Item = String>,
) -> BTreeMap<String, Vec<Bar>> {
    let requested: Vec<String> = requested
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if requested.is_empty() {
        return std::mem::take(series);
    }

    let mut selected = BTreeMap::new();
    for symbol in requested {
        match series.remove(&symbol) {
            Some(bars) => {
                selected.insert(symbol, bars);
            }
            None if selected.contains_key(&symbol) => {}
            None => warn!(symbol = %symbol, "Symbol not found in input"),
        }
    }
    selected
}

/// Symbol reduced to a single file-name component: every run of
/// non-alphanumeric characters becomes one `_`.
fn safe_symbol(symbol: &str) -> String {
    let mut safe = String::with_capacity(symbol.len());
    for c in symbol.chars() {
        if c.is_ascii_alphanumeric() {
            safe.push(c);
        } else if !safe.ends_with('_') {
            safe.push('_');
        }
    }
    safe
}

/// Where to write one symbol's records.
///
/// A directory receives `<symbol>.csv`. A file path is used as-is for a
/// single symbol and gets `_<symbol>` inserted before the extension when
/// several symbols are written.
fn output_path(out: &Path, symbol: &str, multi: bool) -> PathBuf {
    let symbol = safe_symbol(symbol);
    if out.is_dir() {
        return out.join(format!("{symbol}.csv"));
    }
    if !multi {
        return out.to_path_buf();
    }
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match out.extension() {
        Some(ext) => format!("{stem}_{symbol}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{symbol}"),
    };
    out.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_symbol_uses_file_as_is() {
        let p = output_path(Path::new("out/signals.csv"), "2317", false);
        assert_eq!(p, PathBuf::from("out/signals.csv"));
    }

    #[test]
    fn several_symbols_get_suffixed_files() {
        let p = output_path(Path::new("out/signals.csv"), "2317", true);
        assert_eq!(p, PathBuf::from("out/signals_2317.csv"));
        let p = output_path(Path::new("signals"), "2330", true);
        assert_eq!(p, PathBuf::from("signals_2330"));
    }

    #[test]
    fn directory_gets_one_file_per_symbol() {
        let dir = std::env::temp_dir();
        assert_eq!(output_path(&dir, "2317", false), dir.join("2317.csv"));
        assert_eq!(output_path(&dir, "2317", true), dir.join("2317.csv"));
    }

    #[test]
    fn symbols_cannot_escape_the_output_directory() {
        let dir = std::env::temp_dir();
        assert_eq!(output_path(&dir, "BRK/B", true), dir.join("BRK_B.csv"));
        assert_eq!(output_path(&dir, "../evil", true), dir.join("_evil.csv"));
        let p = output_path(Path::new("out/signals.csv"), "BTC/USDT", true);
        assert_eq!(p, PathBuf::from("out/signals_BTC_USDT.csv"));
    }

    #[test]
    fn safe_symbol_collapses_separator_runs() {
        assert_eq!(safe_symbol("2330.TW"), "2330_TW");
        assert_eq!(safe_symbol("a -/b"), "a_b");
        assert_eq!(safe_symbol("2317"), "2317");
    }

    #[test]
    fn bare_output_flag_selects_default_directory() {
        let cli = Cli::try_parse_from(["tradesignals", "-s", "2317", "--output"]).unwrap();
        assert_eq!(cli.output.as_deref(), Some(DEFAULT_OUTPUT_DIR));
        let cli = Cli::try_parse_from(["tradesignals", "--output", "out.csv"]).unwrap();
        assert_eq!(cli.output.as_deref(), Some("out.csv"));
        let cli = Cli::try_parse_from(["tradesignals"]).unwrap();
        assert!(cli.output.is_none());
    }

    #[test]
    fn any_failed_symbol_fails_the_run() {
        assert!(run_outcome(3, 0).is_ok());
        assert!(run_outcome(3, 1).is_err());
        assert!(run_outcome(2, 2).is_err());
    }

    #[test]
    fn selects_requested_symbols_and_skips_unknown() {
        let mut series: BTreeMap<String, Vec<Bar>> = ["2317", "2330", "2454"]
            .into_iter()
            .map(|s| (s.to_string(), Vec::new()))
            .collect();
        let picked = select_symbols(
            &mut series,
            ["2330", " 2317 ", "9999", "2330"].into_iter().map(String::from),
        );
        let keys: Vec<&str> = picked.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2317", "2330"]);
    }

    #[test]
    fn no_request_keeps_everything() {
        let mut series: BTreeMap<String, Vec<Bar>> =
            [("2317".to_string(), Vec::new())].into_iter().collect();
        assert_eq!(select_symbols(&mut series, std::iter::empty()).len(), 1);
    }
}
