//! Multi-object tracking across video frames.

use crate::inference::{BoundingBox, RawDetection};

/// A detection bound to a persistent track identity for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDetection {
    /// Identity stable across frames for the same object.
    pub track_id: u64,
    /// Detector class index.
    pub class_id: usize,
    /// Detector score for this frame.
    pub confidence: f32,
    /// Box in frame coordinates.
    pub bbox: BoundingBox,
}

/// Associates per-frame detections with persistent identities.
pub trait Tracker: Send {
    /// Feed one frame of detections and get them back with track IDs.
    fn update(&mut self, detections: &[RawDetection]) -> Vec<TrackedDetection>;
}

/// Creates one fresh tracker per video.
pub trait TrackerFactory: Send + Sync {
    /// Tracker sized for the source frame rate.
    fn create(&self, frame_rate: f64) -> Box<dyn Tracker>;
}

#[derive(Debug, Clone)]
struct Track {
    id: u64,
    class_id: usize,
    bbox: BoundingBox,
    misses: u32,
}

/// Greedy IoU tracker.
///
/// Detections are matched to live tracks of the same class in order of
/// descending IoU. Unmatched detections start new tracks; tracks unmatched
/// for more than `max_misses` consecutive frames are dropped.
#[derive(Debug)]
pub struct IouTracker {
    iou_threshold: f32,
    max_misses: u32,
    tracks: Vec<Track>,
    next_id: u64,
}

impl IouTracker {
    /// Create a tracker.
    pub const fn new(iou_threshold: f32, max_misses: u32) -> Self {
        Self {
            iou_threshold,
            max_misses,
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of live tracks.
    pub fn live_tracks(&self) -> usize {
        self.tracks.len()
    }
}

impl Tracker for IouTracker {
    fn update(&mut self, detections: &[RawDetection]) -> Vec<TrackedDetection> {
        let mut pairs: Vec<(usize, usize, f32)> = Vec::new();
        for (ti, track) in self.tracks.iter().enumerate() {
            for (di, det) in detections.iter().enumerate() {
                if track.class_id != det.class_id {
                    continue;
                }
                let iou = track.bbox.iou(&det.bbox);
                if iou >= self.iou_threshold {
                    pairs.push((ti, di, iou));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut track_matched = vec![false; self.tracks.len()];
        let mut assigned: Vec<Option<usize>> = vec![None; detections.len()];
        for (ti, di, _) in pairs {
            if track_matched[ti] || assigned[di].is_some() {
                continue;
            }
            track_matched[ti] = true;
            assigned[di] = Some(ti);
        }

        let mut output = Vec::with_capacity(detections.len());
        for (di, det) in detections.iter().enumerate() {
            let track_id = if let Some(ti) = assigned[di] {
                let track = &mut self.tracks[ti];
                track.bbox = det.bbox;
                track.misses = 0;
                track.id
            } else {
                let id = self.next_id;
                self.next_id += 1;
                self.tracks.push(Track {
                    id,
                    class_id: det.class_id,
                    bbox: det.bbox,
                    misses: 0,
                });
                id
            };
            output.push(TrackedDetection {
                track_id,
                class_id: det.class_id,
                confidence: det.confidence,
                bbox: det.bbox,
            });
        }

        // New tracks were appended past the end of track_matched.
        let max_misses = self.max_misses;
        let mut index = 0;
        self.tracks.retain_mut(|track| {
            let matched = track_matched.get(index).copied().unwrap_or(true);
            index += 1;
            if !matched {
                track.misses += 1;
            }
            track.misses <= max_misses
        });

        output
    }
}

/// Builds [`IouTracker`]s whose coasting window is given in seconds.
#[derive(Debug, Clone, Copy)]
pub struct IouTrackerFactory {
    iou_threshold: f32,
    track_buffer_secs: f32,
}

impl IouTrackerFactory {
    /// Create a factory.
    pub const fn new(iou_threshold: f32, track_buffer_secs: f32) -> Self {
        Self {
            iou_threshold,
            track_buffer_secs,
        }
    }
}

impl TrackerFactory for IouTrackerFactory {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn create(&self, frame_rate: f64) -> Box<dyn Tracker> {
        let frames = (f64::from(self.track_buffer_secs) * frame_rate).round();
        let max_misses = if frames.is_finite() && frames > 0.0 {
            frames.min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        Box::new(IouTracker::new(self.iou_threshold, max_misses))
    }
}
