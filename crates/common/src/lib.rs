pub mod config;
pub mod error;
pub mod labels;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use labels::*;
pub use types::*;
