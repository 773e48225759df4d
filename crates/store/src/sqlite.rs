use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use common::{Error, Result, SignalRecord};

use crate::csv::TIMESTAMP_FORMAT;

/// One persisted row of the `trade_signals` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredSignal {
    pub symbol: String,
    pub datetime: String,
    pub close_price: f64,
    pub trade_signal: String,
    pub signal_strength: String,
    pub buy_signals: f64,
    pub sell_signals: f64,
    pub ma_cross: String,
    pub macd_cross: String,
    pub ema_cross: String,
    pub kd_signal: String,
    pub trend: String,
    pub rsi_signal: String,
    pub cci_signal: String,
    pub willr_signal: String,
    pub mom_signal: String,
    pub bb_signal: String,
    pub sr_signal: String,
    pub macd_div: String,
    pub anomaly: String,
    pub volume_anomaly: String,
}

/// SQLite-backed persistence for classified bars.
#[derive(Clone)]
pub struct SignalStore {
    db: SqlitePool,
}

impl SignalStore {
    /// Open (creating if needed) the database at `url` and run migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // Each in-memory connection is its own database.
        let max = if url.contains(":memory:") { 1 } else { 4 };
        let db = SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(options)
            .await?;
        let store = Self::from_pool(db);
        store.migrate().await?;
        info!("Signal store ready");
        Ok(store)
    }

    pub fn from_pool(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.db).await?;
        Ok(())
    }

    /// Replace the stored rows of one symbol over the time range covered by
    /// `records`.
    ///
    /// Rows of that symbol between the earliest and latest record timestamp
    /// (inclusive) are deleted and the new rows inserted, in one
    /// transaction. Rows outside the range and rows of other symbols are
    /// untouched. Returns the number of rows inserted.
    pub async fn replace_range(&self, records: &[SignalRecord]) -> Result<u64> {
        let Some(first) = records.first() else {
            return Ok(0);
        };
        let symbol = &first.bar.symbol;
        if let Some(other) = records.iter().find(|r| &r.bar.symbol != symbol) {
            return Err(Error::MixedSymbols {
                expected: symbol.clone(),
                found: other.bar.symbol.clone(),
            });
        }

        let start = (first.bar.timestamp, first.bar.timestamp);
        let (min, max) = records.iter().fold(start, |(lo, hi), r| {
            (lo.min(r.bar.timestamp), hi.max(r.bar.timestamp))
        });
        let min = min.format(TIMESTAMP_FORMAT).to_string();
        let max = max.format(TIMESTAMP_FORMAT).to_string();

        let mut tx = self.db.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM trade_signals WHERE symbol = ?1 AND datetime BETWEEN ?2 AND ?3",
        )
        .bind(symbol)
        .bind(&min)
        .bind(&max)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mut inserted = 0;
        for r in records {
            let [ma, macd, ema, kd, trend, rsi, cci, willr, mom, bb, sr, div, anomaly, volume] =
                r.labels.columns();
            inserted += sqlx::query(
                r#"
                INSERT INTO trade_signals (
                    symbol, datetime, close_price, trade_signal, signal_strength,
                    buy_signals, sell_signals, ma_cross, macd_cross, ema_cross,
                    kd_signal, trend, rsi_signal, cci_signal, willr_signal,
                    mom_signal, bb_signal, sr_signal, macd_div, anomaly, volume_anomaly
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                        ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
                "#,
            )
            .bind(symbol)
            .bind(r.bar.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .bind(r.bar.close)
            .bind(r.trade_signal.as_str())
            .bind(&r.strength)
            .bind(r.score.buy)
            .bind(r.score.sell)
            .bind(ma)
            .bind(macd)
            .bind(ema)
            .bind(kd)
            .bind(trend)
            .bind(rsi)
            .bind(cci)
            .bind(willr)
            .bind(mom)
            .bind(bb)
            .bind(sr)
            .bind(div)
            .bind(anomaly)
            .bind(volume)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        debug!(
            symbol = %symbol,
            from = %min,
            to = %max,
            deleted,
            inserted,
            "Replaced signal range"
        );
        Ok(inserted)
    }

    /// All stored rows of `symbol`, oldest first.
    pub async fn load(&self, symbol: &str) -> Result<Vec<StoredSignal>> {
        let rows = sqlx::query_as::<_, StoredSignal>(
            r#"
            SELECT symbol, datetime, close_price, trade_signal, signal_strength,
                   buy_signals, sell_signals, ma_cross, macd_cross, ema_cross,
                   kd_signal, trend, rsi_signal, cci_signal, willr_signal,
                   mom_signal, bb_signal, sr_signal, macd_div, anomaly, volume_anomaly
            FROM trade_signals
            WHERE symbol = ?1
            ORDER BY datetime ASC
            "#,
        )
        .bind(symbol)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self, symbol: &str) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trade_signals WHERE symbol = ?1")
            .bind(symbol)
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }
}
