//! Frame-by-frame detection and tracking over one video.

use crate::constants::confidence::VIDEO_DECIMALS;
use crate::error::Result;
use crate::inference::{ObjectDetector, draw_detections};
use crate::normalize::format_percent;
use crate::output::progress;
use crate::video::{CaptureSession, Tracker, TrackerFactory, VideoBackend};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-run settings for [`VideoTrackingLoop::run`].
#[derive(Debug, Clone, Default)]
pub struct TrackingOptions {
    /// Tracked detections must score strictly above this.
    pub confidence_threshold: f32,
    /// Write an annotated copy of the video here.
    pub annotate_to: Option<PathBuf>,
    /// Show a per-frame progress bar.
    pub show_progress: bool,
}

/// What one pass over a video produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingOutcome {
    /// One `"<label> <percent>%"` entry per surviving tracked detection.
    pub labels: Vec<String>,
    /// Frames fully processed.
    pub frames_processed: u64,
    /// Whether the stream was read to its end.
    pub completed: bool,
    /// Distinct track identities per label.
    pub individuals: BTreeMap<String, usize>,
}

/// Runs detector and tracker over every frame of a video.
pub struct VideoTrackingLoop {
    backend: Arc<dyn VideoBackend>,
    detector: Arc<dyn ObjectDetector>,
    tracker_factory: Arc<dyn TrackerFactory>,
}

/// Labels and identities accumulated across frames.
#[derive(Default)]
struct Accumulator {
    labels: Vec<String>,
    identities: BTreeMap<String, BTreeSet<u64>>,
}

impl VideoTrackingLoop {
    /// Create a loop over the given collaborators.
    pub fn new(
        backend: Arc<dyn VideoBackend>,
        detector: Arc<dyn ObjectDetector>,
        tracker_factory: Arc<dyn TrackerFactory>,
    ) -> Self {
        Self {
            backend,
            detector,
            tracker_factory,
        }
    }

    /// Process a video until end of stream or the first per-frame error.
    ///
    /// Only opening the source or the annotation writer fails the call.
    /// Errors after that stop the loop and the labels gathered so far are
    /// returned with `completed == false`.
    pub fn run(&self, path: &Path, options: &TrackingOptions) -> Result<TrackingOutcome> {
        let start = Instant::now();
        let mut session =
            CaptureSession::open(self.backend.as_ref(), path, options.annotate_to.as_deref())?;
        let info = session.info();
        let mut tracker = self.tracker_factory.create(info.frame_rate);

        let file_name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
        let frame_progress =
            progress::create_frame_progress(info.frame_count, &file_name, options.show_progress);

        let mut acc = Accumulator::default();
        let mut frames_processed = 0u64;
        let completed = loop {
            match self.process_frame(
                &mut session,
                tracker.as_mut(),
                options.confidence_threshold,
                &mut acc,
            ) {
                Ok(true) => {
                    frames_processed += 1;
                    progress::inc_progress(frame_progress.as_ref());
                }
                Ok(false) => break true,
                Err(e) => {
                    warn!(
                        "Stopped {} at frame {frames_processed}: {e}",
                        path.display()
                    );
                    break false;
                }
            }
        };

        session.release();
        progress::finish_progress(frame_progress, if completed { "Complete" } else { "Stopped" });

        info!(
            "Tracked {} frame(s) of {} in {:.2}s: {} detection(s)",
            frames_processed,
            path.display(),
            start.elapsed().as_secs_f64(),
            acc.labels.len()
        );

        Ok(TrackingOutcome {
            labels: acc.labels,
            frames_processed,
            completed,
            individuals: acc
                .identities
                .into_iter()
                .map(|(label, ids)| (label, ids.len()))
                .collect(),
        })
    }

    /// Handle one frame. Returns `Ok(false)` at end of stream.
    fn process_frame(
        &self,
        session: &mut CaptureSession,
        tracker: &mut dyn Tracker,
        threshold: f32,
        acc: &mut Accumulator,
    ) -> Result<bool> {
        let Some(mut frame) = session.read_frame()? else {
            return Ok(false);
        };

        let detections = self.detector.detect(&frame)?;
        let tracked = tracker.update(&detections);

        let survivors: Vec<_> = tracked
            .into_iter()
            .filter(|t| t.confidence > threshold)
            .collect();
        debug!(
            "{} of {} detection(s) above {threshold}",
            survivors.len(),
            detections.len()
        );

        let first_caption = acc.labels.len();
        for t in &survivors {
            let label = self.detector.label_for(t.class_id);
            acc.labels
                .push(format_percent(&label, t.confidence, VIDEO_DECIMALS));
            acc.identities.entry(label).or_default().insert(t.track_id);
        }

        if session.has_sink() {
            draw_detections(
                &mut frame,
                survivors
                    .iter()
                    .zip(&acc.labels[first_caption..])
                    .map(|(t, caption)| (&t.bbox, t.class_id, caption.as_str())),
            );
            session.write_frame(&frame)?;
        }

        Ok(true)
    }
}
