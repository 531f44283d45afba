//! Result sink trait and the stdout sink.

use crate::config::StorageConfig;
use crate::detection::DetectionResult;
use crate::error::{Error, Result};
use crate::output::StorageRecord;
use std::io::Write;
use std::path::PathBuf;

/// Stores a finished [`DetectionResult`].
pub trait ResultSink: Send + Sync {
    /// Persist one result. Failures are [`Error::Persistence`].
    fn persist(&self, result: &DetectionResult) -> Result<()>;
}

/// Prints each storage record as one line of JSON on stdout.
#[derive(Debug, Clone, Default)]
pub struct StdoutSink {
    storage: StorageConfig,
}

impl StdoutSink {
    /// Create a sink using `storage` for record URLs.
    pub const fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }
}

impl ResultSink for StdoutSink {
    fn persist(&self, result: &DetectionResult) -> Result<()> {
        let record = StorageRecord::from_result(result, &self.storage);
        let persist_err = |source: Box<dyn std::error::Error + Send + Sync>| Error::Persistence {
            path: PathBuf::from("<stdout>"),
            source,
        };

        let line = serde_json::to_string(&record).map_err(|e| persist_err(Box::new(e)))?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}").map_err(|e| persist_err(Box::new(e)))?;
        stdout.flush().map_err(|e| persist_err(Box::new(e)))
    }
}
