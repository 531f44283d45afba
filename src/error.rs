//! Error types for birdtag.

use crate::media::MediaKind;
use std::path::PathBuf;

/// Result type alias for birdtag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for birdtag.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// File name does not map to a supported media kind.
    #[error("unsupported media type: '{path}'")]
    UnsupportedMediaType {
        /// Source identifier that was rejected.
        path: String,
    },

    /// No model is configured for a media kind.
    #[error(
        "no {kind} model configured (add [models.{}] to the config file)",
        .kind.config_section()
    )]
    ModelNotConfigured {
        /// Media kind that needed a model.
        kind: MediaKind,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: PathBuf,
    },

    /// Failed to read a labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to load a model.
    #[error("failed to load model '{path}': {reason}")]
    ModelLoad {
        /// Path to the model file.
        path: PathBuf,
        /// Description of the load failure.
        reason: String,
    },

    /// Preprocessed input does not match the model's declared input shape.
    #[error("model input shape mismatch for '{path}': expected {expected:?}, got {actual:?}")]
    ModelShape {
        /// Source being processed.
        path: PathBuf,
        /// Shape the model declares.
        expected: Vec<usize>,
        /// Shape that was produced.
        actual: Vec<usize>,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Failed to open audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio.
    #[error("failed to decode audio from '{path}'")]
    AudioDecode {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No audio tracks found.
    #[error("no audio tracks found in '{path}'")]
    NoAudioTracks {
        /// Path to the audio file.
        path: PathBuf,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Image could not be decoded.
    #[error("failed to load image '{path}'")]
    ImageLoad {
        /// Path to the image file.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: image::ImageError,
    },

    /// Annotated image could not be written.
    #[error("failed to write annotated image '{path}'")]
    ImageWrite {
        /// Path to the output image.
        path: PathBuf,
        /// Underlying encode error.
        #[source]
        source: image::ImageError,
    },

    /// Video source could not be opened.
    #[error("unable to open video source '{path}': {reason}")]
    SourceOpen {
        /// Path to the video file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Annotated video writer could not be opened.
    #[error("unable to open video writer '{path}': {reason}")]
    SinkOpen {
        /// Path to the output video.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Reading or writing a video frame failed.
    #[error("video frame error: {reason}")]
    Frame {
        /// Description of the failure.
        reason: String,
    },

    /// A detector output entry could not be normalized.
    #[error("malformed detection output '{entry}': {reason}")]
    MalformedDetection {
        /// Offending raw entry.
        entry: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Media could not be fetched.
    #[error("failed to fetch '{url}'")]
    Fetch {
        /// Location that failed.
        url: String,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Media file referenced locally does not exist.
    #[error("media file does not exist: {path}")]
    MediaNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// No supported media files found.
    #[error("no supported media files found in the provided paths")]
    NoValidMediaFiles,

    /// Result sink failed to store a result.
    #[error("failed to persist result to '{path}'")]
    Persistence {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
