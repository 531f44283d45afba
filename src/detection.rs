//! Canonical detection records and the per-media result.

use crate::aggregate::{TagSummary, aggregate};
use crate::media::MediaKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One detected label with its confidence as a fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Species or class label.
    pub label: String,
    /// Confidence fraction.
    pub confidence: f32,
}

impl DetectionRecord {
    /// Create a record.
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Normalized outcome of running inference on one media object.
///
/// Tag counts and the top detection are derived from the records when the
/// result is built and cannot drift from them.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    media_kind: MediaKind,
    source_path: String,
    timestamp: DateTime<Utc>,
    records: Vec<DetectionRecord>,
    tag_counts: BTreeMap<String, usize>,
    top1: Option<DetectionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    individual_counts: Option<BTreeMap<String, usize>>,
}

impl DetectionResult {
    /// Build a result stamped with the current time.
    pub fn new(
        media_kind: MediaKind,
        source_path: impl Into<String>,
        records: Vec<DetectionRecord>,
        individual_counts: Option<BTreeMap<String, usize>>,
    ) -> Self {
        Self::with_timestamp(
            media_kind,
            source_path,
            records,
            individual_counts,
            Utc::now(),
        )
    }

    /// Build a result with an explicit timestamp.
    pub fn with_timestamp(
        media_kind: MediaKind,
        source_path: impl Into<String>,
        records: Vec<DetectionRecord>,
        individual_counts: Option<BTreeMap<String, usize>>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let TagSummary { tag_counts, top1 } = aggregate(&records);
        Self {
            media_kind,
            source_path: source_path.into(),
            timestamp,
            records,
            tag_counts,
            top1,
            individual_counts,
        }
    }

    /// Kind of the analyzed media.
    pub const fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    /// Identifier of the analyzed media.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// When the result was produced.
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Detections in detector order.
    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    /// Number of records per label.
    pub const fn tag_counts(&self) -> &BTreeMap<String, usize> {
        &self.tag_counts
    }

    /// Highest-confidence record.
    pub const fn top1(&self) -> Option<&DetectionRecord> {
        self.top1.as_ref()
    }

    /// Distinct tracked individuals per label (video only).
    pub const fn individual_counts(&self) -> Option<&BTreeMap<String, usize>> {
        self.individual_counts.as_ref()
    }
}
