//! Application-wide constants.
//!
//! Magic numbers and strings live here so defaults stay consistent between
//! the config layer, the adapters and the CLI.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "birdtag";

/// Default confidence threshold for image and video detections.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Supported file extensions by media kind (lowercase, without dot).
pub mod extensions {
    /// Audio file extensions.
    pub const AUDIO: &[&str] = &["mp3", "wav", "flac"];
    /// Image file extensions.
    pub const IMAGE: &[&str] = &["jpg", "jpeg", "png"];
    /// Video file extensions.
    pub const VIDEO: &[&str] = &["mp4", "mov", "avi"];
}

/// Audio classifier defaults.
pub mod audio {
    /// Model sample rate in Hz.
    pub const SAMPLE_RATE: u32 = 32_000;
    /// Clip length fed to the model in seconds.
    pub const CLIP_DURATION_SECS: f32 = 4.5;
    /// Number of highest scores kept per clip.
    pub const TOP_N: usize = 10;
    /// Scores must be strictly above this to be reported.
    pub const ADMISSION_FLOOR: f32 = 0.01;
}

/// Object detector defaults.
pub mod detector {
    /// Square letterbox input size in pixels.
    pub const INPUT_SIZE: u32 = 640;
    /// IoU above which overlapping boxes of one class are suppressed.
    pub const NMS_IOU: f32 = 0.45;
    /// Candidates scoring below this never leave the detector.
    pub const SCORE_FLOOR: f32 = 0.25;
    /// Letterbox padding value.
    pub const PAD_VALUE: u8 = 114;
}

/// Tracker defaults.
pub mod tracker {
    /// Minimum IoU to continue an existing track.
    pub const IOU_THRESHOLD: f32 = 0.3;
    /// Seconds a track survives without a matching detection.
    pub const TRACK_BUFFER_SECS: f32 = 1.0;
    /// Frame rate assumed when the container does not report one.
    pub const FALLBACK_FRAME_RATE: f64 = 30.0;
}

/// Default intra-op thread count for ONNX sessions.
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// Storage record defaults.
pub mod storage {
    /// Bucket used when none is configured.
    pub const DEFAULT_BUCKET: &str = "birdtag-data-bucket";
    /// Object URL template; `{bucket}` and `{key}` are substituted.
    pub const DEFAULT_URL_TEMPLATE: &str = "https://{bucket}.s3.amazonaws.com/{key}";
    /// Prefix under which thumbnails are stored.
    pub const THUMBNAIL_PREFIX: &str = "thumbnails";
    /// Suffix appended to the thumbnail file stem.
    pub const THUMBNAIL_SUFFIX: &str = "_thumb";
    /// Label reported for audio records without any detection.
    pub const UNKNOWN_LABEL: &str = "unknown";
    /// Confidence reported for audio records without any detection.
    pub const UNKNOWN_CONFIDENCE: f32 = -1.0;
}

/// Output file suffixes appended to the input file name.
pub mod output_extensions {
    /// JSON record extension.
    pub const JSON: &str = ".birdtag.json";
    /// CSV tag table extension.
    pub const CSV: &str = ".birdtag.tags.csv";
    /// Annotated image/video infix, followed by the media extension.
    pub const ANNOTATED: &str = ".birdtag.annotated";
    /// Container used for annotated video.
    pub const ANNOTATED_VIDEO_EXT: &str = "avi";
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places in image detection strings.
    pub const IMAGE_DECIMALS: usize = 2;
    /// Decimal places in video detection strings.
    pub const VIDEO_DECIMALS: usize = 1;
}

/// UTF-8 Byte Order Mark for Excel compatibility in CSV files.
pub const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";
