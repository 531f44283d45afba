//! Labels file reading.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read class labels from a file.
///
/// # File Format
/// - One label per line, in model output order
/// - Leading and trailing whitespace is trimmed
/// - Blank lines are ignored
pub fn read_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::LabelsFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let read_err = |e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    };
    let reader = BufReader::new(File::open(path).map_err(read_err)?);

    let mut labels = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(read_err)?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            labels.push(trimmed.to_string());
        }
    }

    Ok(labels)
}
