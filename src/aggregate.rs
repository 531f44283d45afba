//! Tag counting over normalized detections.

use crate::detection::DetectionRecord;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Per-label counts and the single best detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSummary {
    /// Occurrences of each label.
    pub tag_counts: BTreeMap<String, usize>,
    /// Highest-confidence record, if any.
    pub top1: Option<DetectionRecord>,
}

/// Count records by label and pick the highest-confidence record.
///
/// When several records share the highest confidence the first one wins.
pub fn aggregate(records: &[DetectionRecord]) -> TagSummary {
    let mut tag_counts = BTreeMap::new();
    let mut best: Option<&DetectionRecord> = None;

    for record in records {
        *tag_counts.entry(record.label.clone()).or_insert(0) += 1;

        let replace = best.is_none_or(|current| {
            record.confidence.total_cmp(&current.confidence) == Ordering::Greater
        });
        if replace {
            best = Some(record);
        }
    }

    TagSummary {
        tag_counts,
        top1: best.cloned(),
    }
}
