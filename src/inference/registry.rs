//! Loaded models, built once at start-up and shared by reference.

use crate::config::{AudioModelConfig, Config, DetectorModelConfig};
use crate::constants::detector::PAD_VALUE;
use crate::error::Result;
use crate::inference::labels::read_labels;
use crate::inference::{AudioModel, ObjectDetector, OnnxAudioModel, YoloDetector, YoloSettings};
use std::sync::Arc;
use tracing::info;

/// Immutable set of loaded models, one per role.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    audio: Option<Arc<dyn AudioModel>>,
    detector: Option<Arc<dyn ObjectDetector>>,
}

impl ModelRegistry {
    /// Registry from already-constructed models.
    pub fn new(
        audio: Option<Arc<dyn AudioModel>>,
        detector: Option<Arc<dyn ObjectDetector>>,
    ) -> Self {
        Self { audio, detector }
    }

    /// Load every model named in the config.
    ///
    /// Roles without a config section stay empty; media needing them fail
    /// later with [`crate::Error::ModelNotConfigured`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let threads = config.inference.intra_threads;

        let audio = config
            .models
            .audio
            .as_ref()
            .map(|c| load_audio(c, threads))
            .transpose()?;
        let detector = config
            .models
            .detector
            .as_ref()
            .map(|c| load_detector(c, threads))
            .transpose()?;

        info!(
            "Model registry ready (audio: {}, detector: {})",
            if audio.is_some() { "yes" } else { "no" },
            if detector.is_some() { "yes" } else { "no" }
        );
        Ok(Self { audio, detector })
    }

    /// Audio classifier, if configured.
    pub fn audio(&self) -> Option<Arc<dyn AudioModel>> {
        self.audio.clone()
    }

    /// Object detector, if configured.
    pub fn detector(&self) -> Option<Arc<dyn ObjectDetector>> {
        self.detector.clone()
    }
}

fn load_audio(config: &AudioModelConfig, threads: usize) -> Result<Arc<dyn AudioModel>> {
    let labels = read_labels(&config.labels)?;
    let model = OnnxAudioModel::load(
        &config.path,
        labels,
        config.sample_rate,
        config.input_shape.as_deref(),
        config.clip_samples(),
        config.logits,
        threads,
    )?;
    Ok(Arc::new(model))
}

fn load_detector(config: &DetectorModelConfig, threads: usize) -> Result<Arc<dyn ObjectDetector>> {
    let labels = read_labels(&config.labels)?;
    let settings = YoloSettings {
        input_size: config.input_size,
        score_floor: config.score_floor,
        nms_iou: config.nms_iou,
        pad_value: PAD_VALUE,
    };
    let detector = YoloDetector::load(&config.path, labels, settings, threads)?;
    Ok(Arc::new(detector))
}
