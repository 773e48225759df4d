pub mod aggregator;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod report;
pub mod weights;

pub use aggregator::{Classifier, Condition, BUY_CONDITIONS, SELL_CONDITIONS};
pub use config::{ConflictPolicy, SignalFileConfig};
pub use engine::SignalEngine;
pub use report::Summary;
pub use weights::{SignalKind, WeightTable};
