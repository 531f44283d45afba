//! birdtag - species tagging for audio, image and video media.
//!
//! Each media object is classified by file type, run through the matching
//! detector adapter, normalized into [`detection::DetectionRecord`]s and
//! summarized as a [`detection::DetectionResult`] that result sinks persist.

#![warn(missing_docs)]

pub mod aggregate;
pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod inference;
pub mod media;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod video;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command};
use config::{Config, OutputFormat, config_file_path, load_default_config, save_default_config};
use inference::{AnnotationTarget, AudioAdapter, ImageAdapter, ModelRegistry};
use media::{HttpFetcher, LocalFetcher, MediaFetcher, MediaReference};
use output::{CsvTagWriter, JsonRecordWriter, ResultSink, StdoutSink};
use pipeline::{InferenceOrchestrator, collect_input_files, process_media};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use video::{FfmpegBackend, IouTrackerFactory, VideoAdapter, VideoTrackingLoop};

pub use error::{Error, Result};

/// Main entry point for the birdtag CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.analyze.verbose, cli.analyze.quiet);

    let config = load_default_config()?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    if cli.inputs.is_empty() {
        cli::help::print_smart_help(&config);
        return Ok(());
    }

    analyze_files(&cli.inputs, &cli.analyze, &config)
}

/// Analyze inputs with the given options.
fn analyze_files(inputs: &[PathBuf], args: &AnalyzeArgs, config: &Config) -> Result<()> {
    use crate::output::progress;
    use std::time::Instant;

    let total_start = Instant::now();

    let references = resolve_references(inputs, args.bucket.as_deref())?;
    if references.is_empty() {
        return Err(Error::NoValidMediaFiles);
    }
    info!("Found {} media file(s) to process", references.len());

    let confidence_threshold = args
        .confidence
        .unwrap_or(config.defaults.confidence_threshold);
    let formats = args
        .format
        .clone()
        .unwrap_or_else(|| config.defaults.formats.clone());
    // Downloads live in temp dirs, so remote outputs default to the working directory.
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.defaults.output_dir.clone())
        .or_else(|| args.bucket.as_ref().map(|_| PathBuf::from(".")));
    let annotate = (args.annotate || config.defaults.annotate).then(|| {
        output_dir
            .clone()
            .map_or_else(AnnotationTarget::beside_media, AnnotationTarget::in_dir)
    });
    let progress_enabled = !args.quiet && !args.no_progress && !args.stdout;

    let fetcher: Box<dyn MediaFetcher> = match &args.bucket {
        Some(_) => Box::new(HttpFetcher::new(config.storage.url_template.clone())?),
        None => Box::new(LocalFetcher),
    };

    let registry = ModelRegistry::from_config(config)?;
    let orchestrator = build_orchestrator(
        config,
        &registry,
        fetcher,
        confidence_threshold,
        annotate.as_ref(),
        progress_enabled && references.len() == 1,
    );

    let sinks = build_sinks(config, args, &formats, output_dir.as_ref());

    let file_progress = progress::create_file_progress(
        references.len(),
        progress_enabled && references.len() > 1,
    );

    let mut processed = 0;
    let mut errors = 0;
    let mut total_detections = 0;

    for reference in &references {
        match process_media(&orchestrator, reference, &sinks) {
            Ok(result) => {
                processed += 1;
                total_detections += result.records().len();
            }
            Err(e) => {
                error!("Failed to process {reference}: {e}");
                errors += 1;
                if args.fail_fast {
                    progress::finish_progress(file_progress, "Failed");
                    return Err(e);
                }
            }
        }
        progress::inc_progress(file_progress.as_ref());
    }

    progress::finish_progress(file_progress, "Complete");

    let total_duration = total_start.elapsed().as_secs_f64();
    info!(
        "Complete: {} processed, {} errors, {} total detections in {:.2}s",
        processed, errors, total_detections, total_duration
    );

    if errors > 0 && !args.fail_fast {
        warn!("{} file(s) had errors", errors);
    }

    Ok(())
}

/// Turn CLI inputs into media references.
fn resolve_references(inputs: &[PathBuf], bucket: Option<&str>) -> Result<Vec<MediaReference>> {
    if let Some(bucket) = bucket {
        return Ok(inputs
            .iter()
            .map(|key| MediaReference::new(bucket, key.to_string_lossy()))
            .collect());
    }

    Ok(collect_input_files(inputs)?
        .into_iter()
        .map(|path| MediaReference::local(&path))
        .collect())
}

/// Register one adapter per media kind that has a model.
fn build_orchestrator(
    config: &Config,
    registry: &ModelRegistry,
    fetcher: Box<dyn MediaFetcher>,
    confidence_threshold: f32,
    annotate: Option<&AnnotationTarget>,
    show_video_progress: bool,
) -> InferenceOrchestrator {
    let mut orchestrator = InferenceOrchestrator::new(fetcher, confidence_threshold);

    if let (Some(model), Some(audio)) = (registry.audio(), &config.models.audio) {
        orchestrator = orchestrator.with_adapter(Box::new(AudioAdapter::new(
            model,
            audio.clip_samples(),
            audio.top_n,
            audio.admission_floor,
        )));
    }

    if let Some(detector) = registry.detector() {
        orchestrator = orchestrator.with_adapter(Box::new(ImageAdapter::new(
            Arc::clone(&detector),
            annotate.cloned(),
        )));

        let tracking = VideoTrackingLoop::new(
            Arc::new(FfmpegBackend::new(
                config.video.ffmpeg.clone(),
                config.video.ffprobe.clone(),
            )),
            detector,
            Arc::new(IouTrackerFactory::new(
                config.tracker.iou_threshold,
                config.tracker.track_buffer_secs,
            )),
        );
        orchestrator = orchestrator.with_adapter(Box::new(VideoAdapter::new(
            tracking,
            annotate.cloned(),
            show_video_progress,
        )));
    }

    orchestrator
}

/// Sinks for the requested outputs; `--stdout` replaces the file writers.
fn build_sinks(
    config: &Config,
    args: &AnalyzeArgs,
    formats: &[OutputFormat],
    output_dir: Option<&PathBuf>,
) -> Vec<Box<dyn ResultSink>> {
    if args.stdout {
        return vec![Box::new(StdoutSink::new(config.storage.clone()))];
    }

    // Object keys from different prefixes may share a file name.
    let mirror_keys = args.bucket.is_some();

    let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
    for format in formats {
        let sink: Box<dyn ResultSink> = match format {
            OutputFormat::Json => {
                let writer = JsonRecordWriter::new(output_dir.cloned(), config.storage.clone());
                Box::new(if mirror_keys { writer.mirroring_keys() } else { writer })
            }
            OutputFormat::Csv => {
                let writer = CsvTagWriter::new(output_dir.cloned(), !args.no_csv_bom);
                Box::new(if mirror_keys { writer.mirroring_keys() } else { writer })
            }
        };
        sinks.push(sink);
    }
    sinks
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is noisy at info; -v lets its warnings through.
    let filter_str = if quiet {
        "warn,ort=off"
    } else {
        match verbose {
            0 => "info,ort=off",
            1 => "debug,ort=warn",
            _ => "trace,ort=info",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    // Logs go to stderr so `--stdout` output stays machine-readable.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action),
        Command::Models { action } => handle_models_command(action, config),
    }
}

fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!("  Add [models.audio] and/or [models.detector] sections, then run");
                println!("  birdtag models check");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn handle_models_command(action: cli::ModelsAction, config: &Config) -> Result<()> {
    use cli::ModelsAction;

    match action {
        ModelsAction::List => {
            if !cli::help::has_any_model(config) {
                println!("No models configured.");
                return Ok(());
            }
            println!("Configured models:");
            if let Some(audio) = &config.models.audio {
                println!(
                    "  audio: {} ({} Hz, {}s clips)",
                    audio.path.display(),
                    audio.sample_rate,
                    audio.clip_duration
                );
            }
            if let Some(detector) = &config.models.detector {
                println!(
                    "  detector: {} ({}px, images and video)",
                    detector.path.display(),
                    detector.input_size
                );
            }
            Ok(())
        }
        ModelsAction::Check => {
            let roles = config::validate_model_files(config)?;
            if roles.is_empty() {
                println!("No models configured.");
            }
            for role in roles {
                let labels_path = match role {
                    "audio" => config.models.audio.as_ref().map(|m| &m.labels),
                    _ => config.models.detector.as_ref().map(|m| &m.labels),
                };
                if let Some(labels_path) = labels_path {
                    let labels = inference::labels::read_labels(labels_path)?;
                    println!("  {role}: OK ({} labels)", labels.len());
                }
            }
            Ok(())
        }
    }
}
