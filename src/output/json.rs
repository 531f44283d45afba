//! JSON storage record files.

use crate::config::{OutputFormat, StorageConfig};
use crate::detection::DetectionResult;
use crate::error::{Error, Result};
use crate::output::{ResultSink, StorageRecord};
use crate::pipeline::{output_dir_for, output_dir_for_key, output_path_for};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `{name}.birdtag.json` per analyzed media object.
#[derive(Debug, Clone)]
pub struct JsonRecordWriter {
    output_dir: Option<PathBuf>,
    storage: StorageConfig,
    mirror_keys: bool,
}

impl JsonRecordWriter {
    /// Create a writer; `None` puts files next to the media.
    pub const fn new(output_dir: Option<PathBuf>, storage: StorageConfig) -> Self {
        Self {
            output_dir,
            storage,
            mirror_keys: false,
        }
    }

    /// Recreate each object key's directories under the output directory.
    #[must_use]
    pub fn mirroring_keys(mut self) -> Self {
        self.mirror_keys = true;
        self
    }

    /// Path the record for `source` is written to.
    pub fn path_for(&self, source: &str) -> PathBuf {
        let source = Path::new(source);
        let dir = match &self.output_dir {
            Some(base) if self.mirror_keys => output_dir_for_key(source, base),
            explicit => output_dir_for(source, explicit.as_deref()),
        };
        output_path_for(source, &dir, OutputFormat::Json)
    }
}

impl ResultSink for JsonRecordWriter {
    fn persist(&self, result: &DetectionResult) -> Result<()> {
        let path = self.path_for(result.source_path());
        let record = StorageRecord::from_result(result, &self.storage);

        write_record(&path, &record).map_err(|source| Error::Persistence {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

fn write_record(
    path: &Path,
    record: &StorageRecord,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::detection::DetectionRecord;
    use crate::media::MediaKind;

    #[test]
    fn test_writes_record_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let writer =
            JsonRecordWriter::new(Some(dir.path().to_path_buf()), StorageConfig::default());
        let result = DetectionResult::new(
            MediaKind::Image,
            "uploads/pond.jpg",
            vec![DetectionRecord::new("Heron", 0.77)],
            None,
        );

        writer.persist(&result).unwrap();

        let path = dir.path().join("pond.jpg.birdtag.json");
        let record: StorageRecord =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(record.source_path, "uploads/pond.jpg");
        assert_eq!(record.tags.get("Heron"), Some(&1));
    }

    #[test]
    fn test_same_stem_results_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let writer =
            JsonRecordWriter::new(Some(dir.path().to_path_buf()), StorageConfig::default());
        let image = DetectionResult::new(
            MediaKind::Image,
            "uploads/pond.jpg",
            vec![DetectionRecord::new("Heron", 0.77)],
            None,
        );
        let video = DetectionResult::new(
            MediaKind::Video,
            "uploads/pond.mp4",
            vec![DetectionRecord::new("Duck", 0.6)],
            None,
        );

        writer.persist(&image).unwrap();
        writer.persist(&video).unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
        let stored: StorageRecord = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("pond.jpg.birdtag.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(stored.source_path, "uploads/pond.jpg");
        assert_eq!(stored.file_type, MediaKind::Image);
    }

    #[test]
    fn test_mirrored_keys_keep_directories_apart() {
        let dir = tempfile::tempdir().unwrap();
        let writer =
            JsonRecordWriter::new(Some(dir.path().to_path_buf()), StorageConfig::default())
                .mirroring_keys();

        assert_eq!(
            writer.path_for("site-a/pond.jpg"),
            dir.path().join("site-a/pond.jpg.birdtag.json")
        );
        assert_ne!(writer.path_for("site-a/pond.jpg"), writer.path_for("site-b/pond.jpg"));
    }

    #[test]
    fn test_unwritable_destination_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();
        let writer = JsonRecordWriter::new(Some(blocker), StorageConfig::default());
        let result = DetectionResult::new(MediaKind::Audio, "a.wav", Vec::new(), None);

        assert!(matches!(
            writer.persist(&result),
            Err(Error::Persistence { .. })
        ));
    }
}
