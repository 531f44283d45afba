//! Classification, fetching, detection and normalization for one media object.

use crate::detection::DetectionResult;
use crate::error::{Error, Result};
use crate::inference::{DetectorAdapter, RawDetectorOutput};
use crate::media::{MediaFetcher, MediaKind, MediaReference};
use crate::normalize::normalize;
use std::time::Instant;
use tracing::{debug, info};

/// Turns a [`MediaReference`] into a [`DetectionResult`].
///
/// Holds one adapter per supported media kind. Persisting the result is the
/// caller's job.
pub struct InferenceOrchestrator {
    fetcher: Box<dyn MediaFetcher>,
    adapters: Vec<Box<dyn DetectorAdapter>>,
    confidence_threshold: f32,
}

impl InferenceOrchestrator {
    /// Orchestrator with no adapters registered yet.
    pub fn new(fetcher: Box<dyn MediaFetcher>, confidence_threshold: f32) -> Self {
        Self {
            fetcher,
            adapters: Vec::new(),
            confidence_threshold,
        }
    }

    /// Register an adapter, replacing any earlier one for the same kind.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Box<dyn DetectorAdapter>) -> Self {
        self.adapters.retain(|a| a.kind() != adapter.kind());
        self.adapters.push(adapter);
        self
    }

    /// Media kinds that have an adapter.
    pub fn supported_kinds(&self) -> Vec<MediaKind> {
        self.adapters.iter().map(|a| a.kind()).collect()
    }

    fn adapter_for(&self, kind: MediaKind) -> Option<&dyn DetectorAdapter> {
        self.adapters
            .iter()
            .find(|a| a.kind() == kind)
            .map(AsRef::as_ref)
    }

    /// Run inference on one media object.
    ///
    /// Unsupported file types are rejected before anything is fetched.
    /// Adapter errors are returned unchanged.
    pub fn run(&self, reference: &MediaReference) -> Result<DetectionResult> {
        let total = Instant::now();

        let kind = reference.kind();
        if !kind.is_supported() {
            return Err(Error::UnsupportedMediaType {
                path: reference.to_string(),
            });
        }
        let adapter = self
            .adapter_for(kind)
            .ok_or(Error::ModelNotConfigured { kind })?;

        let stage = Instant::now();
        let media = self.fetcher.fetch(reference)?;
        debug!(
            "Fetched {reference} in {:.1}ms",
            stage.elapsed().as_secs_f64() * 1000.0
        );

        let stage = Instant::now();
        let raw = adapter.detect(media.path(), self.confidence_threshold)?;
        debug!(
            "Detected {} raw {kind} entr{} in {:.1}ms",
            raw.len(),
            if raw.len() == 1 { "y" } else { "ies" },
            stage.elapsed().as_secs_f64() * 1000.0
        );

        let records = normalize(kind, &raw);
        let individuals = match raw {
            RawDetectorOutput::Formatted { individuals, .. } => individuals,
            RawDetectorOutput::Scored(_) => None,
        };
        let result = DetectionResult::new(kind, reference.key(), records, individuals);

        info!(
            "{reference}: {} detection(s), {} label(s) in {:.2}s",
            result.records().len(),
            result.tag_counts().len(),
            total.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::media::FetchedMedia;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingFetcher(Arc<AtomicUsize>);

    impl MediaFetcher for CountingFetcher {
        fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedMedia::existing(PathBuf::from(reference.key())))
        }
    }

    struct FixedAdapter(MediaKind, RawDetectorOutput);

    impl DetectorAdapter for FixedAdapter {
        fn kind(&self) -> MediaKind {
            self.0
        }
        fn detect(&self, _path: &Path, _threshold: f32) -> Result<RawDetectorOutput> {
            Ok(self.1.clone())
        }
    }

    fn orchestrator(fetches: &Arc<AtomicUsize>) -> InferenceOrchestrator {
        InferenceOrchestrator::new(Box::new(CountingFetcher(Arc::clone(fetches))), 0.5)
    }

    #[test]
    fn test_unknown_type_rejected_before_fetch() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let orch = orchestrator(&fetches);
        let result = orch.run(&MediaReference::new("bucket", "notes.txt"));
        assert!(matches!(result, Err(Error::UnsupportedMediaType { .. })));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_adapter_is_model_not_configured() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let orch = orchestrator(&fetches);
        let result = orch.run(&MediaReference::new("bucket", "song.wav"));
        assert!(matches!(
            result,
            Err(Error::ModelNotConfigured {
                kind: MediaKind::Audio
            })
        ));
    }

    #[test]
    fn test_image_result_built_from_formatted_output() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let orch = orchestrator(&fetches).with_adapter(Box::new(FixedAdapter(
            MediaKind::Image,
            RawDetectorOutput::formatted(vec![
                "Sparrow 92.00%".to_string(),
                "bad entry".to_string(),
                "Hawk 15.5%".to_string(),
            ]),
        )));

        let result = orch.run(&MediaReference::new("bucket", "up/pond.JPG")).unwrap();
        assert_eq!(result.media_kind(), MediaKind::Image);
        assert_eq!(result.source_path(), "up/pond.JPG");
        assert_eq!(result.records().len(), 2);
        assert_eq!(result.tag_counts().get("Sparrow"), Some(&1));
        assert_eq!(result.top1().unwrap().label, "Sparrow");
        assert!(result.individual_counts().is_none());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_video_individuals_carried_through() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let individuals = [("Crow".to_string(), 2)].into_iter().collect();
        let orch = orchestrator(&fetches).with_adapter(Box::new(FixedAdapter(
            MediaKind::Video,
            RawDetectorOutput::Formatted {
                labels: vec!["Crow 80.0%".to_string(), "Crow 70.0%".to_string()],
                individuals: Some(individuals),
            },
        )));

        let result = orch.run(&MediaReference::new("", "clip.mp4")).unwrap();
        assert_eq!(result.tag_counts().get("Crow"), Some(&2));
        assert_eq!(
            result.individual_counts().and_then(|m| m.get("Crow")),
            Some(&2)
        );
    }

    #[test]
    fn test_with_adapter_replaces_same_kind() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let orch = orchestrator(&fetches)
            .with_adapter(Box::new(FixedAdapter(
                MediaKind::Image,
                RawDetectorOutput::formatted(Vec::new()),
            )))
            .with_adapter(Box::new(FixedAdapter(
                MediaKind::Image,
                RawDetectorOutput::formatted(vec!["Owl 60.00%".to_string()]),
            )));
        assert_eq!(orch.supported_kinds(), vec![MediaKind::Image]);
        let result = orch.run(&MediaReference::new("", "a.png")).unwrap();
        assert_eq!(result.records()[0].label, "Owl");
    }
}
