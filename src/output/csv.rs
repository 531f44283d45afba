//! CSV tag table files.

use crate::config::OutputFormat;
use crate::constants::UTF8_BOM;
use crate::detection::DetectionResult;
use crate::error::{Error, Result};
use crate::output::ResultSink;
use crate::pipeline::{output_dir_for, output_dir_for_key, output_path_for};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `{name}.birdtag.tags.csv` with one `label,count,individuals` row
/// per label.
#[derive(Debug, Clone)]
pub struct CsvTagWriter {
    output_dir: Option<PathBuf>,
    bom: bool,
    mirror_keys: bool,
}

impl CsvTagWriter {
    /// Create a writer; `bom` prefixes files with a UTF-8 BOM for Excel.
    pub const fn new(output_dir: Option<PathBuf>, bom: bool) -> Self {
        Self {
            output_dir,
            bom,
            mirror_keys: false,
        }
    }

    /// Recreate each object key's directories under the output directory.
    #[must_use]
    pub fn mirroring_keys(mut self) -> Self {
        self.mirror_keys = true;
        self
    }

    /// Path the table for `source` is written to.
    pub fn path_for(&self, source: &str) -> PathBuf {
        let source = Path::new(source);
        let dir = match &self.output_dir {
            Some(base) if self.mirror_keys => output_dir_for_key(source, base),
            explicit => output_dir_for(source, explicit.as_deref()),
        };
        output_path_for(source, &dir, OutputFormat::Csv)
    }

    fn write_table(
        &self,
        path: &Path,
        result: &DetectionResult,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = BufWriter::new(File::create(path)?);
        if self.bom {
            file.write_all(UTF8_BOM)?;
        }

        let mut writer = ::csv::Writer::from_writer(file);
        writer.write_record(["label", "count", "individuals"])?;
        for (label, count) in result.tag_counts() {
            let count = count.to_string();
            let individuals = result
                .individual_counts()
                .and_then(|m| m.get(label))
                .map(ToString::to_string)
                .unwrap_or_default();
            writer.write_record([label.as_str(), count.as_str(), individuals.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl ResultSink for CsvTagWriter {
    fn persist(&self, result: &DetectionResult) -> Result<()> {
        let path = self.path_for(result.source_path());
        self.write_table(&path, result)
            .map_err(|source| Error::Persistence {
                path: path.clone(),
                source,
            })?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
