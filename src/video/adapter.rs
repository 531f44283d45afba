//! Video adapter over the tracking loop.

use crate::constants::output_extensions::ANNOTATED_VIDEO_EXT;
use crate::error::Result;
use crate::inference::{AnnotationTarget, DetectorAdapter, RawDetectorOutput};
use crate::media::MediaKind;
use crate::video::{TrackingOptions, VideoTrackingLoop};
use std::path::Path;
use tracing::warn;

/// Runs the [`VideoTrackingLoop`] for video media.
pub struct VideoAdapter {
    tracking: VideoTrackingLoop,
    annotate: Option<AnnotationTarget>,
    show_progress: bool,
}

impl VideoAdapter {
    /// Create an adapter; `annotate` enables writing an annotated copy.
    pub const fn new(
        tracking: VideoTrackingLoop,
        annotate: Option<AnnotationTarget>,
        show_progress: bool,
    ) -> Self {
        Self {
            tracking,
            annotate,
            show_progress,
        }
    }
}

impl DetectorAdapter for VideoAdapter {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    fn detect(&self, path: &Path, confidence_threshold: f32) -> Result<RawDetectorOutput> {
        let options = TrackingOptions {
            confidence_threshold,
            annotate_to: self
                .annotate
                .as_ref()
                .map(|t| t.path_for(path, ANNOTATED_VIDEO_EXT)),
            show_progress: self.show_progress,
        };

        let outcome = self.tracking.run(path, &options)?;
        if !outcome.completed {
            warn!(
                "{}: partial result after {} frame(s)",
                path.display(),
                outcome.frames_processed
            );
        }

        Ok(RawDetectorOutput::Formatted {
            labels: outcome.labels,
            individuals: Some(outcome.individuals),
        })
    }
}
