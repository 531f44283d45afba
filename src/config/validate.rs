//! Configuration validation.

use crate::config::{AudioModelConfig, Config, DetectorModelConfig};
use crate::constants::confidence;
use crate::error::{Error, Result};

fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}

/// Validate the entire configuration.
///
/// Checks value ranges only; model files are checked by
/// [`validate_model_files`] so config commands work without models present.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    if let Some(audio) = &config.models.audio {
        validate_audio_model(audio)?;
    }
    if let Some(detector) = &config.models.detector {
        validate_detector_model(detector)?;
    }
    validate_tracker(config)?;

    if config.inference.intra_threads == 0 {
        return Err(invalid("inference.intra_threads must be at least 1".to_string()));
    }

    Ok(())
}

fn validate_defaults(config: &Config) -> Result<()> {
    let threshold = config.defaults.confidence_threshold;
    if !(confidence::MIN..=confidence::MAX).contains(&threshold) {
        return Err(invalid(format!(
            "confidence_threshold must be between {} and {}, got {threshold}",
            confidence::MIN,
            confidence::MAX
        )));
    }
    Ok(())
}

fn validate_audio_model(audio: &AudioModelConfig) -> Result<()> {
    if audio.sample_rate == 0 {
        return Err(invalid("models.audio.sample_rate must be positive".to_string()));
    }
    if !(audio.clip_duration.is_finite() && audio.clip_duration > 0.0) {
        return Err(invalid(format!(
            "models.audio.clip_duration must be positive, got {}",
            audio.clip_duration
        )));
    }
    if audio.top_n == 0 {
        return Err(invalid("models.audio.top_n must be at least 1".to_string()));
    }
    if !(confidence::MIN..=confidence::MAX).contains(&audio.admission_floor) {
        return Err(invalid(format!(
            "models.audio.admission_floor must be between 0 and 1, got {}",
            audio.admission_floor
        )));
    }
    if let Some(shape) = &audio.input_shape
        && (shape.is_empty() || shape.contains(&0))
    {
        return Err(invalid(format!(
            "models.audio.input_shape must have positive dimensions, got {shape:?}"
        )));
    }
    Ok(())
}

fn validate_detector_model(detector: &DetectorModelConfig) -> Result<()> {
    if detector.input_size == 0 {
        return Err(invalid("models.detector.input_size must be positive".to_string()));
    }
    if !(detector.nms_iou > 0.0 && detector.nms_iou <= 1.0) {
        return Err(invalid(format!(
            "models.detector.nms_iou must be in (0, 1], got {}",
            detector.nms_iou
        )));
    }
    if !(confidence::MIN..=confidence::MAX).contains(&detector.score_floor) {
        return Err(invalid(format!(
            "models.detector.score_floor must be between 0 and 1, got {}",
            detector.score_floor
        )));
    }
    Ok(())
}

fn validate_tracker(config: &Config) -> Result<()> {
    let tracker = &config.tracker;
    if !(tracker.iou_threshold > 0.0 && tracker.iou_threshold <= 1.0) {
        return Err(invalid(format!(
            "tracker.iou_threshold must be in (0, 1], got {}",
            tracker.iou_threshold
        )));
    }
    if !(tracker.track_buffer_secs.is_finite() && tracker.track_buffer_secs >= 0.0) {
        return Err(invalid(format!(
            "tracker.track_buffer_secs must be non-negative, got {}",
            tracker.track_buffer_secs
        )));
    }
    Ok(())
}

/// Check that every configured model and labels file exists.
///
/// Returns the names of the checked model roles.
pub fn validate_model_files(config: &Config) -> Result<Vec<&'static str>> {
    let mut checked = Vec::new();

    if let Some(audio) = &config.models.audio {
        check_files(&audio.path, &audio.labels)?;
        checked.push("audio");
    }
    if let Some(detector) = &config.models.detector {
        check_files(&detector.path, &detector.labels)?;
        checked.push("detector");
    }

    Ok(checked)
}

fn check_files(model: &std::path::Path, labels: &std::path::Path) -> Result<()> {
    if !model.exists() {
        return Err(Error::ModelFileNotFound {
            path: model.to_path_buf(),
        });
    }
    if !labels.exists() {
        return Err(Error::LabelsFileNotFound {
            path: labels.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn audio_config() -> AudioModelConfig {
        toml::from_str("path = \"/nonexistent/m.onnx\"\nlabels = \"/nonexistent/l.txt\"")
            .unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = Config::default();
        config.defaults.confidence_threshold = 1.5;
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let mut config = Config::default();
        let mut audio = audio_config();
        audio.top_n = 0;
        config.models.audio = Some(audio);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_input_dimension_rejected() {
        let mut config = Config::default();
        let mut audio = audio_config();
        audio.input_shape = Some(vec![1, 0]);
        config.models.audio = Some(audio);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_tracker_iou_bounds() {
        let mut config = Config::default();
        config.tracker.iou_threshold = 0.0;
        assert!(validate_config(&config).is_err());
        config.tracker.iou_threshold = 1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_detector_nms_bounds() {
        let mut config = Config::default();
        config.models.detector = Some(DetectorModelConfig {
            path: PathBuf::from("d.onnx"),
            labels: PathBuf::from("d.txt"),
            input_size: 640,
            nms_iou: 1.2,
            score_floor: 0.25,
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_model_files_reported() {
        let mut config = Config::default();
        config.models.audio = Some(audio_config());
        assert!(matches!(
            validate_model_files(&config),
            Err(Error::ModelFileNotFound { .. })
        ));
    }

    #[test]
    fn test_no_models_nothing_checked() {
        assert!(validate_model_files(&Config::default()).unwrap().is_empty());
    }
}
