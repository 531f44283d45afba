//! Result persistence: storage records, file writers and progress display.

mod csv;
mod json;
pub mod progress;
mod record;
mod sink;

pub use csv::CsvTagWriter;
pub use json::JsonRecordWriter;
pub use record::StorageRecord;
pub use sink::{ResultSink, StdoutSink};
