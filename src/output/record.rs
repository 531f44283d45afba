//! Storage record derived from a detection result.

use crate::config::StorageConfig;
use crate::constants::storage::{
    THUMBNAIL_PREFIX, THUMBNAIL_SUFFIX, UNKNOWN_CONFIDENCE, UNKNOWN_LABEL,
};
use crate::detection::DetectionResult;
use crate::media::{MediaKind, object_url};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored entry per analyzed media object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    /// Object key or local path of the media.
    pub source_path: String,
    /// When inference ran.
    pub timestamp: DateTime<Utc>,
    /// Media kind.
    pub file_type: MediaKind,
    /// Public URL of the media object.
    pub file_url: String,
    /// Public URL of the media thumbnail.
    pub thumbnail_url: String,
    /// Detections per label.
    pub tags: BTreeMap<String, usize>,
    /// Distinct tracked individuals per label (video only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individuals: Option<BTreeMap<String, usize>>,
    /// Best label (audio only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Confidence of the best label (audio only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl StorageRecord {
    /// Build the record for a result.
    ///
    /// Audio records always carry a top label; `"unknown"` with confidence
    /// `-1` stands in when nothing was detected.
    pub fn from_result(result: &DetectionResult, storage: &StorageConfig) -> Self {
        let source_path = result.source_path().to_string();
        let file_url = object_url(&storage.url_template, &storage.bucket, &source_path);
        let thumbnail_url = object_url(
            &storage.url_template,
            &storage.bucket,
            &thumbnail_key(&source_path),
        );

        let (label, confidence) = if result.media_kind() == MediaKind::Audio {
            let top = result.top1();
            (
                Some(top.map_or_else(|| UNKNOWN_LABEL.to_string(), |r| r.label.clone())),
                Some(top.map_or(UNKNOWN_CONFIDENCE, |r| r.confidence)),
            )
        } else {
            (None, None)
        };

        Self {
            source_path,
            timestamp: result.timestamp(),
            file_type: result.media_kind(),
            file_url,
            thumbnail_url,
            tags: result.tag_counts().clone(),
            individuals: result.individual_counts().cloned(),
            label,
            confidence,
        }
    }
}

/// `thumbnails/{name}_thumb{ext}` for the file name part of `key`.
fn thumbnail_key(key: &str) -> String {
    let file_name = key.rsplit(['/', '\\']).next().unwrap_or(key);
    let (name, ext) = match file_name.rfind('.') {
        Some(i) if i > 0 => file_name.split_at(i),
        _ => (file_name, ""),
    };
    format!("{THUMBNAIL_PREFIX}/{name}{THUMBNAIL_SUFFIX}{ext}")
}
