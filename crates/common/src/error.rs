use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    #[error("Empty bar series")]
    EmptySeries,

    #[error("Bar series mixes symbols '{expected}' and '{found}'")]
    MixedSymbols { expected: String, found: String },

    #[error("Duplicate timestamp {timestamp} for symbol '{symbol}'")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: NaiveDateTime,
    },

    #[error("Non-finite close price for symbol '{symbol}' at {timestamp}")]
    InvalidClose {
        symbol: String,
        timestamp: NaiveDateTime,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
