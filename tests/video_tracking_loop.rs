//! Video tracking loop behaviour against an in-memory video backend.

#![allow(clippy::unwrap_used, clippy::panic)]

use birdtag::inference::{BoundingBox, ObjectDetector, RawDetection, RawDetectorOutput};
use birdtag::media::MediaKind;
use birdtag::normalize::normalize;
use birdtag::video::{
    FrameSink, FrameSource, IouTrackerFactory, TrackingOptions, VideoBackend, VideoInfo,
    VideoTrackingLoop,
};
use birdtag::{Error, Result};
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const INFO: VideoInfo = VideoInfo {
    width: 32,
    height: 24,
    frame_rate: 10.0,
    frame_count: Some(10),
};

#[derive(Default)]
struct Counters {
    source_released: AtomicUsize,
    sink_released: AtomicUsize,
    frames_written: AtomicUsize,
}

impl Counters {
    fn source_released(&self) -> usize {
        self.source_released.load(Ordering::SeqCst)
    }
    fn sink_released(&self) -> usize {
        self.sink_released.load(Ordering::SeqCst)
    }
    fn frames_written(&self) -> usize {
        self.frames_written.load(Ordering::SeqCst)
    }
}

struct MockSource {
    remaining: usize,
    counters: Arc<Counters>,
}

impl FrameSource for MockSource {
    fn info(&self) -> VideoInfo {
        INFO
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(RgbImage::new(INFO.width, INFO.height)))
    }

    fn release(&mut self) -> Result<()> {
        self.counters.source_released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockSink {
    counters: Arc<Counters>,
}

impl FrameSink for MockSink {
    fn write_frame(&mut self, _frame: &RgbImage) -> Result<()> {
        self.counters.frames_written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.counters.sink_released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockBackend {
    frames: usize,
    fail_source: bool,
    fail_sink: bool,
    counters: Arc<Counters>,
}

impl MockBackend {
    fn new(frames: usize) -> Self {
        Self {
            frames,
            fail_source: false,
            fail_sink: false,
            counters: Arc::new(Counters::default()),
        }
    }
}

impl VideoBackend for MockBackend {
    fn open_source(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        if self.fail_source {
            return Err(Error::SourceOpen {
                path: path.to_path_buf(),
                reason: "unreadable".to_string(),
            });
        }
        Ok(Box::new(MockSource {
            remaining: self.frames,
            counters: Arc::clone(&self.counters),
        }))
    }

    fn open_sink(&self, path: &Path, _info: &VideoInfo) -> Result<Box<dyn FrameSink>> {
        if self.fail_sink {
            return Err(Error::SinkOpen {
                path: path.to_path_buf(),
                reason: "read-only".to_string(),
            });
        }
        Ok(Box::new(MockSink {
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Returns the same detections on every frame; fails or panics on a chosen call.
struct ScriptedDetector {
    detections: Vec<RawDetection>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    panic_on_call: Option<usize>,
}

impl ScriptedDetector {
    fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
            fail_on_call: None,
            panic_on_call: None,
        }
    }
}

impl ObjectDetector for ScriptedDetector {
    fn detect(&self, _frame: &RgbImage) -> Result<Vec<RawDetection>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on_call == Some(call) {
            panic!("detector crashed on call {call}");
        }
        if self.fail_on_call == Some(call) {
            return Err(Error::Inference {
                reason: format!("failure on call {call}"),
            });
        }
        Ok(self.detections.clone())
    }

    fn class_name(&self, class_id: usize) -> Option<&str> {
        ["Sparrow", "Hawk"].get(class_id).copied()
    }
}

fn sparrow(x: f32, confidence: f32) -> RawDetection {
    RawDetection {
        bbox: BoundingBox::new(x, 2.0, x + 6.0, 8.0),
        class_id: 0,
        confidence,
    }
}

fn tracking_loop(backend: MockBackend, detector: ScriptedDetector) -> VideoTrackingLoop {
    VideoTrackingLoop::new(
        Arc::new(backend),
        Arc::new(detector),
        Arc::new(IouTrackerFactory::new(0.3, 1.0)),
    )
}

fn options(threshold: f32) -> TrackingOptions {
    TrackingOptions {
        confidence_threshold: threshold,
        ..TrackingOptions::default()
    }
}

#[test]
fn full_run_collects_one_label_per_frame() {
    let backend = MockBackend::new(5);
    let counters = Arc::clone(&backend.counters);
    let looper = tracking_loop(backend, ScriptedDetector::new(vec![sparrow(4.0, 0.9)]));

    let outcome = looper.run(Path::new("yard.mp4"), &options(0.5)).unwrap();

    assert!(outcome.completed);
    assert_eq!(outcome.frames_processed, 5);
    assert_eq!(outcome.labels, vec!["Sparrow 90.0%".to_string(); 5]);
    assert_eq!(outcome.individuals.get("Sparrow"), Some(&1));
    assert_eq!(counters.source_released(), 1);
    assert_eq!(counters.sink_released(), 0);
}

#[test]
fn detector_failure_on_third_frame_returns_partial_labels() {
    let backend = MockBackend::new(10);
    let counters = Arc::clone(&backend.counters);
    let mut detector = ScriptedDetector::new(vec![sparrow(4.0, 0.8)]);
    detector.fail_on_call = Some(3);
    let looper = tracking_loop(backend, detector);

    let outcome = looper.run(Path::new("yard.mp4"), &options(0.5)).unwrap();

    assert!(!outcome.completed);
    assert_eq!(outcome.frames_processed, 2);
    assert_eq!(outcome.labels.len(), 2);
    assert_eq!(counters.source_released(), 1);
}

#[test]
fn source_open_failure_releases_nothing() {
    let mut backend = MockBackend::new(10);
    backend.fail_source = true;
    let counters = Arc::clone(&backend.counters);
    let looper = tracking_loop(backend, ScriptedDetector::new(Vec::new()));

    let result = looper.run(Path::new("broken.mp4"), &options(0.5));

    assert!(matches!(result, Err(Error::SourceOpen { .. })));
    assert_eq!(counters.source_released(), 0);
    assert_eq!(counters.sink_released(), 0);
}

#[test]
fn sink_open_failure_releases_source() {
    let mut backend = MockBackend::new(10);
    backend.fail_sink = true;
    let counters = Arc::clone(&backend.counters);
    let looper = tracking_loop(backend, ScriptedDetector::new(Vec::new()));
    let opts = TrackingOptions {
        confidence_threshold: 0.5,
        annotate_to: Some("out/yard.birdtag.annotated.avi".into()),
        show_progress: false,
    };

    let result = looper.run(Path::new("yard.mp4"), &opts);

    assert!(matches!(result, Err(Error::SinkOpen { .. })));
    assert_eq!(counters.source_released(), 1);
    assert_eq!(counters.sink_released(), 0);
}

#[test]
fn annotated_frames_written_and_both_handles_released() {
    let backend = MockBackend::new(4);
    let counters = Arc::clone(&backend.counters);
    let looper = tracking_loop(backend, ScriptedDetector::new(vec![sparrow(4.0, 0.9)]));
    let opts = TrackingOptions {
        confidence_threshold: 0.5,
        annotate_to: Some("out/yard.birdtag.annotated.avi".into()),
        show_progress: false,
    };

    looper.run(Path::new("yard.mp4"), &opts).unwrap();

    assert_eq!(counters.frames_written(), 4);
    assert_eq!(counters.source_released(), 1);
    assert_eq!(counters.sink_released(), 1);
}

#[test]
fn panic_inside_loop_still_releases_source_once() {
    let backend = MockBackend::new(10);
    let counters = Arc::clone(&backend.counters);
    let mut detector = ScriptedDetector::new(vec![sparrow(4.0, 0.9)]);
    detector.panic_on_call = Some(2);
    let looper = tracking_loop(backend, detector);

    let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        looper.run(Path::new("yard.mp4"), &options(0.5))
    }));

    assert!(caught.is_err());
    assert_eq!(counters.source_released(), 1);
}

#[test]
fn only_detections_strictly_above_threshold_survive() {
    let confidences = [0.0, 0.25, 0.5, 0.75, 1.0];
    let detections: Vec<_> = confidences
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 * 100.0;
            sparrow(x, c)
        })
        .collect();

    for step in 0..=10u8 {
        let threshold = f32::from(step) / 10.0;
        let looper = tracking_loop(MockBackend::new(1), ScriptedDetector::new(detections.clone()));
        let outcome = looper.run(Path::new("yard.mp4"), &options(threshold)).unwrap();

        let expected = confidences.iter().filter(|&&c| c > threshold).count();
        assert_eq!(outcome.labels.len(), expected, "threshold {threshold}");
    }
}

#[test]
fn distinct_tracks_counted_per_label() {
    let backend = MockBackend::new(3);
    let detector = ScriptedDetector::new(vec![
        sparrow(0.0, 0.9),
        RawDetection {
            bbox: BoundingBox::new(20.0, 2.0, 26.0, 8.0),
            class_id: 0,
            confidence: 0.9,
        },
        RawDetection {
            bbox: BoundingBox::new(10.0, 10.0, 16.0, 16.0),
            class_id: 7,
            confidence: 0.6,
        },
    ]);
    let looper = tracking_loop(backend, detector);

    let outcome = looper.run(Path::new("yard.mp4"), &options(0.5)).unwrap();

    assert_eq!(outcome.labels.len(), 9);
    assert_eq!(outcome.individuals.get("Sparrow"), Some(&2));
    assert_eq!(outcome.individuals.get("class_7"), Some(&1));
    assert!(outcome.labels.contains(&"class_7 60.0%".to_string()));
}

#[test]
fn one_decimal_labels_normalize_back_to_fractions() {
    let detections = vec![sparrow(0.0, 0.5), sparrow(40.0, 0.951), sparrow(80.0, 1.0)];
    let looper = tracking_loop(MockBackend::new(1), ScriptedDetector::new(detections));

    let outcome = looper.run(Path::new("yard.mp4"), &options(0.4)).unwrap();

    let mut labels = outcome.labels.clone();
    labels.sort();
    assert_eq!(labels, vec!["Sparrow 100.0%", "Sparrow 50.0%", "Sparrow 95.1%"]);

    let records = normalize(MediaKind::Video, &RawDetectorOutput::formatted(outcome.labels));
    assert_eq!(records.len(), 3);
    let mut confidences: Vec<f32> = records.iter().map(|r| r.confidence).collect();
    confidences.sort_by(f32::total_cmp);
    for (got, want) in confidences.iter().zip([0.5, 0.951, 1.0]) {
        assert!((got - want).abs() < 1e-6, "{got} vs {want}");
    }
    assert!(records.iter().all(|r| r.label == "Sparrow"));
}
