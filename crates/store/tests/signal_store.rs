use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::sqlite::SqlitePoolOptions;

use common::{Bar, BarLabels, CompositeScore, CrossLabel, Error, SignalRecord, TradeSignal};
use store::SignalStore;

fn ts(day: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(day)
}

fn record(symbol: &str, day: i64, close: f64, signal: TradeSignal) -> SignalRecord {
    let score = CompositeScore { buy: 3.5, sell: 0.5 };
    SignalRecord {
        bar: Bar::from_close(symbol, ts(day), close),
        labels: BarLabels {
            macd_cross: CrossLabel::CrossUp,
            ..Default::default()
        },
        score,
        trade_signal: signal,
        strength: signal.strength_label(&score),
    }
}

async fn store() -> SignalStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SignalStore::from_pool(pool);
    store.migrate().await.unwrap();
    store
}

#[tokio::test]
async fn inserts_and_loads_in_order() {
    let store = store().await;
    let records = vec![
        record("2317", 1, 101.0, TradeSignal::None),
        record("2317", 0, 100.0, TradeSignal::Buy),
    ];
    assert_eq!(store.replace_range(&records).await.unwrap(), 2);

    let rows = store.load("2317").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].datetime, "2024-03-01 00:00:00");
    assert_eq!(rows[0].trade_signal, "buy");
    assert_eq!(rows[0].signal_strength, "Bullish 3.5");
    assert_eq!(rows[0].macd_cross, "cross-up");
    assert_eq!(rows[0].ma_cross, "");
    assert_eq!(rows[1].trade_signal, "");
    assert_eq!(rows[1].close_price, 101.0);
}

#[tokio::test]
async fn narrower_rerun_only_replaces_its_range() {
    let store = store().await;
    let full: Vec<SignalRecord> = (0..10)
        .map(|d| record("2317", d, 100.0 + d as f64, TradeSignal::None))
        .collect();
    store.replace_range(&full).await.unwrap();

    let partial: Vec<SignalRecord> = (3..6)
        .map(|d| record("2317", d, 200.0, TradeSignal::StrongBuy))
        .collect();
    assert_eq!(store.replace_range(&partial).await.unwrap(), 3);

    let rows = store.load("2317").await.unwrap();
    assert_eq!(rows.len(), 10);
    let closes: Vec<f64> = rows.iter().map(|r| r.close_price).collect();
    assert_eq!(&closes[..3], &[100.0, 101.0, 102.0]);
    assert_eq!(&closes[3..6], &[200.0, 200.0, 200.0]);
    assert_eq!(&closes[6..], &[106.0, 107.0, 108.0, 109.0]);
}

#[tokio::test]
async fn rerun_of_same_range_keeps_one_row_per_bar() {
    let store = store().await;
    let records: Vec<SignalRecord> = (0..5)
        .map(|d| record("2330", d, 50.0, TradeSignal::Buy))
        .collect();
    store.replace_range(&records).await.unwrap();
    store.replace_range(&records).await.unwrap();
    assert_eq!(store.count("2330").await.unwrap(), 5);
}

#[tokio::test]
async fn other_symbols_are_untouched() {
    let store = store().await;
    store
        .replace_range(&[record("2330", 0, 50.0, TradeSignal::None)])
        .await
        .unwrap();
    store
        .replace_range(&[record("2317", 0, 10.0, TradeSignal::Sell)])
        .await
        .unwrap();
    assert_eq!(store.count("2330").await.unwrap(), 1);
    assert_eq!(store.count("2317").await.unwrap(), 1);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let store = store().await;
    assert_eq!(store.replace_range(&[]).await.unwrap(), 0);
    assert_eq!(store.count("2317").await.unwrap(), 0);
}

#[tokio::test]
async fn mixed_symbol_batch_is_rejected() {
    let store = store().await;
    let records = vec![
        record("2317", 0, 10.0, TradeSignal::None),
        record("2330", 1, 50.0, TradeSignal::None),
    ];
    assert!(matches!(
        store.replace_range(&records).await,
        Err(Error::MixedSymbols { .. })
    ));
    assert_eq!(store.count("2317").await.unwrap(), 0);
}

#[tokio::test]
async fn connect_runs_migrations() {
    let store = SignalStore::connect("sqlite::memory:").await.unwrap();
    assert_eq!(store.count("2317").await.unwrap(), 0);
}
