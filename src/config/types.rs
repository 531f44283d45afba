//! Configuration type definitions.

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INTRA_THREADS, audio, detector, storage, tracker,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model locations and model-specific settings.
    pub models: ModelsConfig,

    /// Default analysis settings.
    pub defaults: DefaultsConfig,

    /// Inference runtime settings.
    pub inference: InferenceConfig,

    /// Multi-object tracker settings.
    pub tracker: TrackerConfig,

    /// Video tool locations.
    pub video: VideoConfig,

    /// Storage record settings.
    pub storage: StorageConfig,
}

/// Configured models, one per role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Audio classifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioModelConfig>,

    /// Object detector used for images and video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector: Option<DetectorModelConfig>,
}

/// Audio classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the labels file.
    pub labels: PathBuf,

    /// Sample rate the model expects in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Clip length in seconds.
    #[serde(default = "default_clip_duration")]
    pub clip_duration: f32,

    /// Input shape used where the model leaves dimensions dynamic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<Vec<usize>>,

    /// Number of best scores kept.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Scores must be strictly above this to be reported.
    #[serde(default = "default_admission_floor")]
    pub admission_floor: f32,

    /// Whether the model outputs logits that need a softmax.
    #[serde(default = "default_true")]
    pub logits: bool,
}

impl AudioModelConfig {
    /// Number of samples in one clip.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn clip_samples(&self) -> usize {
        (f64::from(self.sample_rate) * f64::from(self.clip_duration)).round() as usize
    }
}

/// Object detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the class labels file.
    pub labels: PathBuf,

    /// Square input size in pixels.
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Same-class IoU above which boxes are suppressed.
    #[serde(default = "default_nms_iou")]
    pub nms_iou: f32,

    /// Candidates below this score never leave the detector.
    #[serde(default = "default_score_floor")]
    pub score_floor: f32,
}

/// Default analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Confidence threshold for image and video detections.
    pub confidence_threshold: f32,

    /// Output formats.
    pub formats: Vec<OutputFormat>,

    /// Output directory (None = next to the input).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Write annotated copies of images and videos.
    pub annotate: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            formats: vec![OutputFormat::Json],
            output_dir: None,
            annotate: false,
        }
    }
}

/// Inference runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Intra-op threads per ONNX session.
    pub intra_threads: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }
}

/// Multi-object tracker settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum IoU to continue a track.
    pub iou_threshold: f32,

    /// Seconds a track survives without a match.
    pub track_buffer_secs: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: tracker::IOU_THRESHOLD,
            track_buffer_secs: tracker::TRACK_BUFFER_SECS,
        }
    }
}

/// Locations of the video tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,

    /// `ffprobe` executable.
    pub ffprobe: PathBuf,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Object storage settings used for fetching and for storage records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket name.
    pub bucket: String,

    /// Object URL template with `{bucket}` and `{key}` placeholders.
    pub url_template: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: storage::DEFAULT_BUCKET.to_string(),
            url_template: storage::DEFAULT_URL_TEMPLATE.to_string(),
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Storage record as JSON.
    Json,
    /// Tag counts as CSV.
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" | "tags" => Ok(Self::Csv),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

const fn default_sample_rate() -> u32 {
    audio::SAMPLE_RATE
}

const fn default_clip_duration() -> f32 {
    audio::CLIP_DURATION_SECS
}

const fn default_top_n() -> usize {
    audio::TOP_N
}

const fn default_admission_floor() -> f32 {
    audio::ADMISSION_FLOOR
}

const fn default_true() -> bool {
    true
}

const fn default_input_size() -> u32 {
    detector::INPUT_SIZE
}

const fn default_nms_iou() -> f32 {
    detector::NMS_IOU
}

const fn default_score_floor() -> f32 {
    detector::SCORE_FLOOR
}
