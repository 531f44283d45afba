//! Input collection and output path layout.

use crate::config::OutputFormat;
use crate::constants::output_extensions;
use crate::error::Result;
use crate::media::classify_path;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Determine the output directory for a file.
pub fn output_dir_for(input: &Path, explicit_output_dir: Option<&Path>) -> PathBuf {
    explicit_output_dir.map_or_else(
        || {
            input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        },
        Path::to_path_buf,
    )
}

/// Output directory for an object key, mirroring the key's directories
/// under `base`.
///
/// Only plain name components are kept, so absolute keys and `..` never
/// escape `base`.
pub fn output_dir_for_key(key: &Path, base: &Path) -> PathBuf {
    let mut dir = base.to_path_buf();
    if let Some(parent) = key.parent() {
        dir.extend(parent.components().filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        }));
    }
    dir
}

/// Get output file path for a given format.
///
/// The media file name is kept whole so `pond.jpg` and `pond.mp4` in one
/// directory get separate outputs.
pub fn output_path_for(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    // Lossy so non-UTF-8 names still produce an output file.
    let stem = input.file_name().map_or_else(
        || std::borrow::Cow::Borrowed("output"),
        |s| s.to_string_lossy(),
    );

    let extension = match format {
        OutputFormat::Json => output_extensions::JSON,
        OutputFormat::Csv => output_extensions::CSV,
    };

    output_dir.join(format!("{stem}{extension}"))
}

/// Collect supported media files from paths (files and directories).
///
/// Unsupported files and missing paths are skipped with a warning.
/// Directory contents are visited in sorted order.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_media_file(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            collect_media_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    Ok(files)
}

fn collect_media_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_media_files_recursive(&path, files)?;
        } else if is_media_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

fn is_media_file(path: &Path) -> bool {
    classify_path(path).is_supported()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_for_with_explicit() {
        let input = Path::new("/data/pond.jpg");
        let output = output_dir_for(input, Some(Path::new("/results")));
        assert_eq!(output, PathBuf::from("/results"));
    }

    #[test]
    fn test_output_dir_for_without_explicit() {
        assert_eq!(
            output_dir_for(Path::new("/data/pond.jpg"), None),
            PathBuf::from("/data")
        );
        assert_eq!(output_dir_for(Path::new("pond.jpg"), None), PathBuf::from("."));
    }

    #[test]
    fn test_output_path_for_formats() {
        let json = output_path_for(Path::new("song.wav"), Path::new("/out"), OutputFormat::Json);
        assert_eq!(json, PathBuf::from("/out/song.wav.birdtag.json"));
        let csv = output_path_for(Path::new("song.wav"), Path::new("/out"), OutputFormat::Csv);
        assert_eq!(csv, PathBuf::from("/out/song.wav.birdtag.tags.csv"));
    }

    #[test]
    fn test_same_stem_media_get_distinct_outputs() {
        let out = Path::new("/out");
        let image = output_path_for(Path::new("uploads/pond.jpg"), out, OutputFormat::Json);
        let video = output_path_for(Path::new("uploads/pond.mp4"), out, OutputFormat::Json);
        assert_ne!(image, video);
        assert_eq!(video, PathBuf::from("/out/pond.mp4.birdtag.json"));
    }

    #[test]
    fn test_output_dir_for_key_mirrors_directories() {
        let base = Path::new("results");
        assert_eq!(
            output_dir_for_key(Path::new("site-a/2024/pond.jpg"), base),
            PathBuf::from("results/site-a/2024")
        );
        assert_eq!(output_dir_for_key(Path::new("pond.jpg"), base), PathBuf::from("results"));
        assert_eq!(
            output_dir_for_key(Path::new("/../etc/pond.jpg"), base),
            PathBuf::from("results/etc")
        );
    }

    #[test]
    fn test_output_path_for_unicode() {
        let path = output_path_for(
            Path::new("ääni_tiedostö.flac"),
            Path::new("/output"),
            OutputFormat::Json,
        );
        assert!(path.to_string_lossy().contains("ääni_tiedostö"));
    }

    #[test]
    fn test_collect_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("day1");
        std::fs::create_dir(&nested).unwrap();
        for name in ["a.wav", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        for name in ["b.JPG", "c.mp4", "d.gif"] {
            std::fs::write(nested.join(name), b"").unwrap();
        }

        let files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.wav", "b.JPG", "c.mp4"]);
    }

    #[test]
    fn test_collect_skips_missing_and_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"").unwrap();
        let files =
            collect_input_files(&[txt, dir.path().join("missing.wav")]).unwrap();
        assert!(files.is_empty());
    }
}
