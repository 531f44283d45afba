//! Help message display for CLI.

#![allow(clippy::print_stdout)]

use crate::config::Config;

/// Print help message based on configuration state.
pub fn print_smart_help(config: &Config) {
    if has_any_model(config) {
        print_configured_help();
    } else {
        print_first_time_help();
    }
}

/// Whether at least one model role is configured.
pub const fn has_any_model(config: &Config) -> bool {
    config.models.audio.is_some() || config.models.detector.is_some()
}

/// Print setup guide for first-time users.
pub fn print_first_time_help() {
    println!("No models configured. Get started with birdtag:");
    println!();
    println!("1. Initialize configuration:");
    println!("   birdtag config init");
    println!();
    println!("2. Point the config file at your models:");
    println!();
    println!("   [models.audio]        # BirdNET-style classifier for mp3/wav/flac");
    println!("   path = \"/models/birdnet.onnx\"");
    println!("   labels = \"/models/birdnet_labels.txt\"");
    println!();
    println!("   [models.detector]     # YOLOv8-style detector for images and video");
    println!("   path = \"/models/birds.onnx\"");
    println!("   labels = \"/models/birds_classes.txt\"");
    println!();
    println!("3. Check the files are in place:");
    println!("   birdtag models check");
    println!();
    println!("4. Tag media:");
    println!("   birdtag recording.wav pond.jpg feeder.mp4");
    println!();
    println!("Video needs ffmpeg and ffprobe on PATH (or set [video] in the config).");
    println!();
    println!("Run 'birdtag -h' for all options.");
}

/// Print brief usage reminder for configured users.
pub fn print_configured_help() {
    println!("Usage: birdtag [FILES]... [OPTIONS]");
    println!();
    println!("Example: birdtag feeder.mp4 -c 0.6 --annotate -f json,csv");
    println!();
    println!("Run 'birdtag -h' for all options or 'birdtag models list' to see configured models.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorModelConfig;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_has_no_model() {
        assert!(!has_any_model(&Config::default()));
    }

    #[test]
    fn test_detector_only_counts_as_configured() {
        let mut config = Config::default();
        config.models.detector = Some(DetectorModelConfig {
            path: PathBuf::from("/models/birds.onnx"),
            labels: PathBuf::from("/models/classes.txt"),
            input_size: 640,
            nms_iou: 0.45,
            score_floor: 0.25,
        });
        assert!(has_any_model(&config));
    }
}
