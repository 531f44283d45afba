//! Video detection: frame I/O, tracking and the per-frame loop.

mod adapter;
mod backend;
mod ffmpeg;
mod tracker;
mod tracking_loop;

pub use adapter::VideoAdapter;
pub use backend::{CaptureSession, FrameSink, FrameSource, VideoBackend, VideoInfo};
pub use ffmpeg::FfmpegBackend;
pub use tracker::{IouTracker, IouTrackerFactory, TrackedDetection, Tracker, TrackerFactory};
pub use tracking_loop::{TrackingOptions, TrackingOutcome, VideoTrackingLoop};
