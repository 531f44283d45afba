//! Image adapter: single-frame detection with optional annotated copy.

use crate::constants::confidence::IMAGE_DECIMALS;
use crate::error::{Error, Result};
use crate::inference::{
    AnnotationTarget, DetectorAdapter, ObjectDetector, RawDetection, RawDetectorOutput,
    draw_detections,
};
use crate::media::MediaKind;
use crate::normalize::format_percent;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs an object detector once over a still image.
pub struct ImageAdapter {
    detector: Arc<dyn ObjectDetector>,
    annotate: Option<AnnotationTarget>,
}

impl ImageAdapter {
    /// Create an adapter; `annotate` enables writing a copy with boxes drawn.
    pub fn new(detector: Arc<dyn ObjectDetector>, annotate: Option<AnnotationTarget>) -> Self {
        Self { detector, annotate }
    }
}

impl DetectorAdapter for ImageAdapter {
    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    fn detect(&self, path: &Path, confidence_threshold: f32) -> Result<RawDetectorOutput> {
        let image = image::open(path)
            .map_err(|e| Error::ImageLoad {
                path: path.to_path_buf(),
                source: e,
            })?
            .to_rgb8();

        let survivors: Vec<RawDetection> = self
            .detector
            .detect(&image)?
            .into_iter()
            .filter(|d| d.confidence >= confidence_threshold)
            .collect();
        debug!(
            "{} detection(s) at or above {confidence_threshold} in {}",
            survivors.len(),
            path.display()
        );

        let labels: Vec<String> = survivors
            .iter()
            .map(|d| {
                format_percent(
                    &self.detector.label_for(d.class_id),
                    d.confidence,
                    IMAGE_DECIMALS,
                )
            })
            .collect();

        if let Some(target) = &self.annotate {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or_else(|| "png".to_string(), str::to_ascii_lowercase);
            let out_path = target.path_for(path, &ext);
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut annotated = image;
            draw_detections(
                &mut annotated,
                survivors
                    .iter()
                    .zip(&labels)
                    .map(|(d, caption)| (&d.bbox, d.class_id, caption.as_str())),
            );
            annotated.save(&out_path).map_err(|e| Error::ImageWrite {
                path: out_path.clone(),
                source: e,
            })?;
            info!("Annotated image saved to {}", out_path.display());
        }

        Ok(RawDetectorOutput::formatted(labels))
    }
}
