//! Media classification and retrieval.

mod fetch;

pub use fetch::{FetchedMedia, HttpFetcher, LocalFetcher, MediaFetcher, object_url};

use crate::constants::extensions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of media, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Sound recording.
    Audio,
    /// Still picture.
    Image,
    /// Moving picture.
    Video,
    /// Anything else. Never processed.
    Unknown,
}

impl MediaKind {
    /// Config section that provides the model for this kind.
    pub const fn config_section(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image | Self::Video | Self::Unknown => "detector",
        }
    }

    /// Whether files of this kind can be processed at all.
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a file name by its extension.
///
/// Only the part after the last `.` is considered, compared case-insensitively.
/// Names without an extension are [`MediaKind::Unknown`].
pub fn classify(filename: &str) -> MediaKind {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return MediaKind::Unknown;
    };
    // A separator after the last dot means the dot belonged to a directory.
    if ext.contains(['/', '\\']) {
        return MediaKind::Unknown;
    }

    let ext = ext.to_ascii_lowercase();
    if extensions::AUDIO.contains(&ext.as_str()) {
        MediaKind::Audio
    } else if extensions::IMAGE.contains(&ext.as_str()) {
        MediaKind::Image
    } else if extensions::VIDEO.contains(&ext.as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Unknown
    }
}

/// Classify a path by its extension.
pub fn classify_path(path: &Path) -> MediaKind {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(MediaKind::Unknown, |ext| classify(&format!(".{ext}")))
}

/// Location of one media object.
///
/// `source` is a bucket name for remote media or a base directory for local
/// media. An empty `source` means `key` is a path on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    source: String,
    key: String,
}

impl MediaReference {
    /// Create a reference from a source and a key.
    pub fn new(source: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            key: key.into(),
        }
    }

    /// Reference to a local file by path.
    pub fn local(path: &Path) -> Self {
        Self::new(String::new(), path.to_string_lossy())
    }

    /// Bucket name or base directory.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Object key or path.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// File name part of the key.
    pub fn file_name(&self) -> &str {
        self.key
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.key.as_str())
    }

    /// Media kind of the referenced object.
    pub fn kind(&self) -> MediaKind {
        classify(&self.key)
    }
}

impl std::fmt::Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.source.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}/{}", self.source, self.key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_supported_extensions() {
        for name in ["a.mp3", "a.wav", "a.flac"] {
            assert_eq!(classify(name), MediaKind::Audio, "{name}");
        }
        for name in ["a.jpg", "a.jpeg", "a.png"] {
            assert_eq!(classify(name), MediaKind::Image, "{name}");
        }
        for name in ["a.mp4", "a.mov", "a.avi"] {
            assert_eq!(classify(name), MediaKind::Video, "{name}");
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("PHOTO.JPG"), MediaKind::Image);
        assert_eq!(classify("Clip.MoV"), MediaKind::Video);
        assert_eq!(classify("call.WAV"), MediaKind::Audio);
    }

    #[test]
    fn test_classify_uses_last_extension() {
        assert_eq!(classify("archive.mp4.txt"), MediaKind::Unknown);
        assert_eq!(classify("notes.txt.png"), MediaKind::Image);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("readme.txt"), MediaKind::Unknown);
        assert_eq!(classify("noextension"), MediaKind::Unknown);
        assert_eq!(classify(""), MediaKind::Unknown);
        assert_eq!(classify("dir.mp3/file"), MediaKind::Unknown);
        assert_eq!(classify("image.gif"), MediaKind::Unknown);
    }

    #[test]
    fn test_classify_with_directories() {
        assert_eq!(classify("uploads/2024/robin.flac"), MediaKind::Audio);
        assert_eq!(classify_path(Path::new("/data/birds/heron.PNG")), MediaKind::Image);
        assert_eq!(classify_path(Path::new("/data/birds")), MediaKind::Unknown);
    }

    #[test]
    fn test_media_reference_accessors() {
        let reference = MediaReference::new("bucket", "uploads/heron.mp4");
        assert_eq!(reference.source(), "bucket");
        assert_eq!(reference.file_name(), "heron.mp4");
        assert_eq!(reference.kind(), MediaKind::Video);
        assert_eq!(reference.to_string(), "bucket/uploads/heron.mp4");
    }

    #[test]
    fn test_media_reference_local() {
        let reference = MediaReference::local(Path::new("clips/wren.wav"));
        assert_eq!(reference.source(), "");
        assert_eq!(reference.to_string(), "clips/wren.wav");
    }

    #[test]
    fn test_config_section() {
        assert_eq!(MediaKind::Audio.config_section(), "audio");
        assert_eq!(MediaKind::Video.config_section(), "detector");
        assert!(!MediaKind::Unknown.is_supported());
    }
}
