//! Stateless detectors. Each maps aligned input columns to one label column
//! of the same length; none reads another detector's output.

pub mod anomaly;
pub mod crossover;
pub mod divergence;
pub mod threshold;
pub mod volume;

pub use anomaly::anomaly;
pub use crossover::{crossover, crossover_level, stochastic};
pub use divergence::divergence;
pub use threshold::{bollinger, cci, momentum, proximity, rsi, trend, williams};
pub use volume::volume_anomaly;
