//! Configuration file loading.

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::Path;

/// Load configuration from a TOML file.
///
/// Returns default config if the file does not exist.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load configuration from the default platform-specific path.
///
/// Returns default config if no config file exists. The loaded config is
/// validated before it is returned.
pub fn load_default_config() -> Result<Config> {
    let config = super::config_file_path()
        .map_or_else(|_| Ok(Config::default()), |path| load_config_file(&path))?;
    super::validate_config(&config)?;
    Ok(config)
}

/// Save configuration to a TOML file.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    std::fs::write(path, contents).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save configuration to the default platform-specific path.
pub fn save_default_config(config: &Config) -> Result<std::path::PathBuf> {
    let path = super::config_file_path()?;
    save_config(config, &path)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let config = load_config_file(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.models.audio.is_none());
        assert!(config.models.detector.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[models.audio]
path = "/models/birdnet.onnx"
labels = "/models/labels.txt"
top_n = 5

[models.detector]
path = "/models/yolo.onnx"
labels = "/models/classes.txt"

[defaults]
confidence_threshold = 0.35
formats = ["json", "csv"]

[storage]
bucket = "field-uploads"
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        let audio = config.models.audio.unwrap();
        assert_eq!(audio.top_n, 5);
        assert_eq!(audio.sample_rate, 32_000);
        assert_eq!(config.models.detector.unwrap().input_size, 640);
        assert_eq!(config.defaults.confidence_threshold, 0.35);
        assert_eq!(
            config.defaults.formats,
            vec![OutputFormat::Json, OutputFormat::Csv]
        );
        assert_eq!(config.storage.bucket, "field-uploads");
        assert_eq!(
            config.storage.url_template,
            "https://{bucket}.s3.amazonaws.com/{key}"
        );
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        assert!(matches!(
            load_config_file(file.path()),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config::default();
        config.defaults.annotate = true;
        config.tracker.track_buffer_secs = 2.0;

        save_config(&config, &path).unwrap();
        let loaded = load_config_file(&path).unwrap();
        assert!(loaded.defaults.annotate);
        assert_eq!(loaded.tracker.track_buffer_secs, 2.0);
    }
}
