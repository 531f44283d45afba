//! Conversion of raw detector output into [`DetectionRecord`]s.
//!
//! Percent strings such as `"Sparrow 92.00%"` only exist at the image and
//! video adapter boundary. Everything downstream of [`normalize`] works with
//! fractional confidences.

use crate::constants::confidence;
use crate::detection::DetectionRecord;
use crate::error::{Error, Result};
use crate::inference::{RawDetectorOutput, RawScore};
use crate::media::MediaKind;
use tracing::{debug, warn};

/// Normalize raw detector output for a media kind.
///
/// Entries that cannot be turned into a valid record are logged and dropped;
/// the remaining records keep their original order.
pub fn normalize(kind: MediaKind, raw: &RawDetectorOutput) -> Vec<DetectionRecord> {
    match raw {
        RawDetectorOutput::Scored(scores) => {
            if kind != MediaKind::Audio {
                debug!("Normalizing scored output for {kind} media");
            }
            scores.iter().filter_map(normalize_score).collect()
        }
        RawDetectorOutput::Formatted { labels, .. } => {
            if kind == MediaKind::Audio {
                debug!("Normalizing formatted output for audio media");
            }
            labels
                .iter()
                .filter_map(|entry| match parse_formatted(entry) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("{e}");
                        None
                    }
                })
                .collect()
        }
    }
}

fn normalize_score(score: &RawScore) -> Option<DetectionRecord> {
    let (Some(label), Some(value)) = (&score.label, score.confidence) else {
        warn!("Dropping incomplete score entry: {score:?}");
        return None;
    };
    if !is_valid_confidence(value) {
        warn!("Dropping score for '{label}' outside [0, 1]: {value}");
        return None;
    }
    Some(DetectionRecord::new(label.clone(), value))
}

/// Parse a `"<label> <percent>%"` string into a record.
///
/// The label is everything before the last whitespace run; a trailing `%` on
/// the number is optional.
pub fn parse_formatted(entry: &str) -> Result<DetectionRecord> {
    let malformed = |reason: &str| Error::MalformedDetection {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = entry.trim();
    let (label, number) = trimmed
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| malformed("expected '<label> <percent>%'"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(malformed("empty label"));
    }

    let percent: f32 = number
        .strip_suffix('%')
        .unwrap_or(number)
        .parse()
        .map_err(|_| malformed("confidence is not a number"))?;
    let value = percent / 100.0;
    if !is_valid_confidence(value) {
        return Err(malformed("confidence outside 0-100%"));
    }

    Ok(DetectionRecord::new(label, value))
}

/// Format a label and fractional confidence as `"<label> <percent>%"`.
pub fn format_percent(label: &str, confidence: f32, decimals: usize) -> String {
    format!("{label} {:.decimals$}%", confidence * 100.0)
}

fn is_valid_confidence(value: f32) -> bool {
    value.is_finite() && (confidence::MIN..=confidence::MAX).contains(&value)
}
