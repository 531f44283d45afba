//! Detector adapters and the model seams they run on.
//!
//! Each media kind has one [`DetectorAdapter`]. Adapters turn a local media
//! file into a [`RawDetectorOutput`]; model execution itself sits behind the
//! [`AudioModel`] and [`ObjectDetector`] traits so ONNX sessions and test
//! doubles are interchangeable.

mod annotate;
mod audio_adapter;
mod image_adapter;
pub mod labels;
mod onnx;
mod registry;

pub use annotate::{AnnotationTarget, draw_detections};
pub use audio_adapter::AudioAdapter;
pub use image_adapter::ImageAdapter;
pub use onnx::{OnnxAudioModel, YoloDetector, YoloSettings};
pub use registry::ModelRegistry;

use crate::error::Result;
use crate::media::MediaKind;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One score from a classifier, before validation.
///
/// Either field may be missing: the label when the output index has no entry
/// in the labels file, the confidence when the score is not finite.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScore {
    /// Label for the output index.
    pub label: Option<String>,
    /// Score for the output index.
    pub confidence: Option<f32>,
}

/// Unnormalized detector output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDetectorOutput {
    /// Label and fractional confidence pairs.
    Scored(Vec<RawScore>),
    /// `"<label> <percent>%"` strings, plus distinct track counts for video.
    Formatted {
        /// Formatted detection strings in detection order.
        labels: Vec<String>,
        /// Distinct tracked identities per label.
        individuals: Option<BTreeMap<String, usize>>,
    },
}

impl RawDetectorOutput {
    /// Formatted output without individual counts.
    pub const fn formatted(labels: Vec<String>) -> Self {
        Self::Formatted {
            labels,
            individuals: None,
        }
    }

    /// Number of raw entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Scored(scores) => scores.len(),
            Self::Formatted { labels, .. } => labels.len(),
        }
    }

    /// Whether there are no raw entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs inference for one media kind.
pub trait DetectorAdapter: Send + Sync {
    /// Media kind handled by this adapter.
    fn kind(&self) -> MediaKind;

    /// Run detection on a local media file.
    ///
    /// `confidence_threshold` is applied by adapters whose output is
    /// thresholded; the audio adapter uses its own admission floor instead.
    fn detect(&self, path: &Path, confidence_threshold: f32) -> Result<RawDetectorOutput>;
}

/// Axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box from corner coordinates.
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Area, zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &Self) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union > 0.0 { intersection / union } else { 0.0 }
    }
}

/// One object found by a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Box in source frame coordinates.
    pub bbox: BoundingBox,
    /// Class index into the detector labels.
    pub class_id: usize,
    /// Detector score.
    pub confidence: f32,
}

/// A fixed-length audio classifier.
pub trait AudioModel: Send + Sync {
    /// Class labels by output index.
    fn labels(&self) -> &[String];

    /// Sample rate the model expects, in Hz.
    fn sample_rate(&self) -> u32;

    /// Declared input tensor shape.
    fn input_shape(&self) -> &[usize];

    /// Whether [`AudioModel::infer`] returns logits rather than probabilities.
    fn emits_logits(&self) -> bool;

    /// Run the model on one clip and return one score per label.
    fn infer(&self, samples: &[f32]) -> Result<Vec<f32>>;
}

/// A single-frame object detector.
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in a frame.
    fn detect(&self, frame: &RgbImage) -> Result<Vec<RawDetection>>;

    /// Label for a class index.
    fn class_name(&self, class_id: usize) -> Option<&str>;

    /// Label for a class index, falling back to `class_<id>`.
    fn label_for(&self, class_id: usize) -> String {
        self.class_name(class_id)
            .map_or_else(|| format!("class_{class_id}"), str::to_string)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_boxes() {
        let b = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(b.iou(&b), 1.0);
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_box_area() {
        assert_eq!(BoundingBox::new(5.0, 5.0, 1.0, 1.0).area(), 0.0);
    }

    #[test]
    fn test_raw_output_len() {
        let out = RawDetectorOutput::formatted(vec!["a 1%".to_string()]);
        assert_eq!(out.len(), 1);
        assert!(RawDetectorOutput::Scored(Vec::new()).is_empty());
    }
}
