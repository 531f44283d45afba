//! Audio adapter: one clip, one classifier pass, top-N scores.

use crate::audio::{decode_audio_file, fit_to_length, resample, softmax, top_n_indices};
use crate::error::{Error, Result};
use crate::inference::{AudioModel, DetectorAdapter, RawDetectorOutput, RawScore};
use crate::media::MediaKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Classifies the first clip of an audio file.
pub struct AudioAdapter {
    model: Arc<dyn AudioModel>,
    clip_samples: usize,
    top_n: usize,
    admission_floor: f32,
}

impl AudioAdapter {
    /// Create an adapter feeding `clip_samples` samples per inference.
    pub fn new(
        model: Arc<dyn AudioModel>,
        clip_samples: usize,
        top_n: usize,
        admission_floor: f32,
    ) -> Self {
        Self {
            model,
            clip_samples,
            top_n,
            admission_floor,
        }
    }

    /// Classify samples already at the model sample rate.
    pub fn classify_samples(&self, path: &Path, samples: Vec<f32>) -> Result<RawDetectorOutput> {
        let clip = fit_to_length(samples, self.clip_samples);

        let actual = vec![1, clip.len()];
        if self.model.input_shape() != actual.as_slice() {
            return Err(Error::ModelShape {
                path: path.to_path_buf(),
                expected: self.model.input_shape().to_vec(),
                actual,
            });
        }

        let start = Instant::now();
        let raw = self.model.infer(&clip)?;
        debug!(
            "Audio inference on {} took {:.1}ms",
            path.display(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        let scores = if self.model.emits_logits() {
            softmax(&raw)
        } else {
            raw
        };

        let labels = self.model.labels();
        let entries = top_n_indices(&scores, self.top_n)
            .into_iter()
            .filter(|&i| scores[i] > self.admission_floor)
            .map(|i| RawScore {
                label: labels.get(i).cloned(),
                confidence: Some(scores[i]).filter(|s| s.is_finite()),
            })
            .collect();

        Ok(RawDetectorOutput::Scored(entries))
    }
}

impl DetectorAdapter for AudioAdapter {
    fn kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    fn detect(&self, path: &Path, _confidence_threshold: f32) -> Result<RawDetectorOutput> {
        let decoded = decode_audio_file(path)?;
        debug!(
            "Decoded {}: {:.2}s at {} Hz",
            path.display(),
            decoded.duration_secs,
            decoded.sample_rate
        );

        let samples = resample(decoded.samples, decoded.sample_rate, self.model.sample_rate())?;
        self.classify_samples(path, samples)
    }
}
