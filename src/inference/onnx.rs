//! ONNX Runtime backed models.

use crate::error::{Error, Result};
use crate::inference::{AudioModel, BoundingBox, ObjectDetector, RawDetection};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Build an optimized session for a model file.
fn build_session(path: &Path, intra_threads: usize) -> Result<Session> {
    if !path.exists() {
        return Err(Error::ModelFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let load_err = |reason: String| Error::ModelLoad {
        path: path.to_path_buf(),
        reason,
    };

    Session::builder()
        .map_err(|e| load_err(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| load_err(e.to_string()))?
        .with_intra_threads(intra_threads)
        .map_err(|e| load_err(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e| load_err(e.to_string()))
}

fn infer_err(e: impl std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}

/// Run a session on one f32 tensor and return the first output flattened.
fn run_single(session: &Mutex<Session>, shape: &[usize], data: Vec<f32>) -> Result<Vec<f32>> {
    let input = Tensor::from_array((shape, data.into_boxed_slice())).map_err(infer_err)?;
    let mut session = session.lock().map_err(|_| Error::Inference {
        reason: "model session lock poisoned".to_string(),
    })?;
    let outputs = session.run(ort::inputs![input]).map_err(infer_err)?;
    let (_, values) = outputs[0].try_extract_tensor::<f32>().map_err(infer_err)?;
    Ok(values.to_vec())
}

/// Audio classifier loaded from an ONNX file.
pub struct OnnxAudioModel {
    session: Mutex<Session>,
    labels: Vec<String>,
    sample_rate: u32,
    input_shape: Vec<usize>,
    logits: bool,
}

impl OnnxAudioModel {
    /// Load a classifier taking one tensor of raw samples.
    ///
    /// The input shape is read from the model. `configured_shape` fills any
    /// dynamic dimensions and must agree with the static ones.
    pub fn load(
        path: &Path,
        labels: Vec<String>,
        sample_rate: u32,
        configured_shape: Option<&[usize]>,
        clip_samples: usize,
        logits: bool,
        intra_threads: usize,
    ) -> Result<Self> {
        let session = build_session(path, intra_threads)?;
        let model_dims: Option<Vec<i64>> = session
            .inputs()
            .first()
            .and_then(|input| input.dtype().tensor_shape())
            .map(|shape| shape.iter().copied().collect());
        let input_shape =
            resolve_input_shape(path, model_dims.as_deref(), configured_shape, clip_samples)?;
        info!(
            "Loaded audio model {} ({} labels, input {:?})",
            path.display(),
            labels.len(),
            input_shape
        );
        Ok(Self {
            session: Mutex::new(session),
            labels,
            sample_rate,
            input_shape,
            logits,
        })
    }
}

impl AudioModel for OnnxAudioModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn emits_logits(&self) -> bool {
        self.logits
    }

    fn infer(&self, samples: &[f32]) -> Result<Vec<f32>> {
        run_single(&self.session, &self.input_shape, samples.to_vec())
    }
}

/// Concrete input shape for an audio model.
///
/// Dimensions the model leaves dynamic (`<= 0`) come from `configured`, or
/// default to `clip_samples` for the last axis and 1 elsewhere.
fn resolve_input_shape(
    path: &Path,
    model: Option<&[i64]>,
    configured: Option<&[usize]>,
    clip_samples: usize,
) -> Result<Vec<usize>> {
    let Some(model) = model else {
        return Ok(configured.map_or_else(|| vec![1, clip_samples], <[usize]>::to_vec));
    };

    if let Some(configured) = configured {
        let agrees = configured.len() == model.len()
            && model
                .iter()
                .zip(configured)
                .all(|(&m, &c)| m <= 0 || usize::try_from(m).is_ok_and(|m| m == c));
        if !agrees {
            return Err(Error::ModelLoad {
                path: path.to_path_buf(),
                reason: format!(
                    "model input shape {model:?} does not match configured input_shape {configured:?}"
                ),
            });
        }
        return Ok(configured.to_vec());
    }

    let last = model.len().saturating_sub(1);
    Ok(model
        .iter()
        .enumerate()
        .map(|(axis, &dim)| match usize::try_from(dim) {
            Ok(dim) if dim > 0 => dim,
            _ if axis == last => clip_samples,
            _ => 1,
        })
        .collect())
}

/// Settings for a YOLO-style detector.
#[derive(Debug, Clone, Copy)]
pub struct YoloSettings {
    /// Square input size in pixels.
    pub input_size: u32,
    /// Candidates below this score are discarded before NMS.
    pub score_floor: f32,
    /// Same-class IoU above which the weaker box is suppressed.
    pub nms_iou: f32,
    /// Letterbox padding value.
    pub pad_value: u8,
}

/// Letterbox geometry for mapping boxes back to the source frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Object detector for YOLOv8-style ONNX exports with `[1, 4 + C, N]` output.
pub struct YoloDetector {
    session: Mutex<Session>,
    labels: Vec<String>,
    settings: YoloSettings,
}

impl YoloDetector {
    /// Load a detector whose classes are given by `labels`.
    pub fn load(
        path: &Path,
        labels: Vec<String>,
        settings: YoloSettings,
        intra_threads: usize,
    ) -> Result<Self> {
        let session = build_session(path, intra_threads)?;
        info!(
            "Loaded detector {} ({} classes, {}px input)",
            path.display(),
            labels.len(),
            settings.input_size
        );
        Ok(Self {
            session: Mutex::new(session),
            labels,
            settings,
        })
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<RawDetection>> {
        let size = self.settings.input_size;
        let (input, letterbox) = letterbox(frame, size, self.settings.pad_value);
        let shape = [1, 3, size as usize, size as usize];
        let output = run_single(&self.session, &shape, input)?;

        let candidates = decode_output(
            &output,
            self.labels.len(),
            self.settings.score_floor,
            letterbox,
        )?;
        let kept = nms(candidates, self.settings.nms_iou);
        debug!("Detector kept {} box(es)", kept.len());
        Ok(kept)
    }

    fn class_name(&self, class_id: usize) -> Option<&str> {
        self.labels.get(class_id).map(String::as_str)
    }
}

/// Resize into a padded square and convert to normalized CHW.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn letterbox(frame: &RgbImage, size: u32, pad_value: u8) -> (Vec<f32>, Letterbox) {
    let (src_w, src_h) = frame.dimensions();
    let scale = (size as f32 / src_w.max(1) as f32).min(size as f32 / src_h.max(1) as f32);
    let scaled_w = ((src_w as f32 * scale) as u32).clamp(1, size);
    let scaled_h = ((src_h as f32 * scale) as u32).clamp(1, size);
    let pad_x = (size - scaled_w) / 2;
    let pad_y = (size - scaled_h) / 2;

    let resized = imageops::resize(frame, scaled_w, scaled_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([pad_value; 3]));
    imageops::overlay(&mut canvas, &resized, i64::from(pad_x), i64::from(pad_y));

    let plane = (size * size) as usize;
    let mut input = vec![0.0f32; 3 * plane];
    for (i, pixel) in canvas.pixels().enumerate() {
        for c in 0..3 {
            input[c * plane + i] = f32::from(pixel[c]) / 255.0;
        }
    }

    (
        input,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    )
}

/// Parse `[1, 4 + C, N]` predictions into boxes in source coordinates.
fn decode_output(
    output: &[f32],
    num_classes: usize,
    score_floor: f32,
    letterbox: Letterbox,
) -> Result<Vec<RawDetection>> {
    let rows = 4 + num_classes;
    if num_classes == 0 || output.len() % rows != 0 {
        return Err(Error::Inference {
            reason: format!(
                "detector output of {} values does not fit {num_classes} classes",
                output.len()
            ),
        });
    }
    let n = output.len() / rows;

    let mut detections = Vec::new();
    for i in 0..n {
        let (class_id, score) = (0..num_classes)
            .map(|c| (c, output[(4 + c) * n + i]))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        if score.is_nan() || score < score_floor {
            continue;
        }

        let (cx, cy, w, h) = (
            output[i],
            output[n + i],
            output[2 * n + i],
            output[3 * n + i],
        );
        let unmap_x = |x: f32| (x - letterbox.pad_x) / letterbox.scale;
        let unmap_y = |y: f32| (y - letterbox.pad_y) / letterbox.scale;
        detections.push(RawDetection {
            bbox: BoundingBox::new(
                unmap_x(cx - w / 2.0),
                unmap_y(cy - h / 2.0),
                unmap_x(cx + w / 2.0),
                unmap_y(cy + h / 2.0),
            ),
            class_id,
            confidence: score,
        });
    }

    Ok(detections)
}

/// Class-aware non-maximum suppression, highest score first.
fn nms(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in detections {
        let suppressed = keep.iter().any(|k| {
            k.class_id == det.class_id && k.bbox.iou(&det.bbox) > iou_threshold
        });
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}
