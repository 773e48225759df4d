pub mod csv;
pub mod sqlite;

pub use crate::csv::{read_bars, read_bars_from_path, write_records, write_records_to_path};
pub use crate::sqlite::{SignalStore, StoredSignal};
