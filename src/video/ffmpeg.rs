//! Video I/O through `ffprobe` and `ffmpeg` child processes.
//!
//! Frames cross the process boundary as raw `rgb24` over pipes, so any
//! container ffmpeg can read is supported without linking against it.

use crate::constants::tracker::FALLBACK_FRAME_RATE;
use crate::error::{Error, Result};
use crate::video::{FrameSink, FrameSource, VideoBackend, VideoInfo};
use image::RgbImage;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::debug;

/// Backend driving the `ffmpeg` command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    /// Create a backend using the given executables.
    pub const fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }

    /// Read stream properties of the first video stream.
    pub fn inspect(&self, path: &Path) -> Result<VideoInfo> {
        let open_err = |reason: String| Error::SourceOpen {
            path: path.to_path_buf(),
            reason,
        };

        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .output()
            .map_err(|e| open_err(format!("failed to run {}: {e}", self.ffprobe.display())))?;

        if !output.status.success() {
            return Err(open_err(format!("ffprobe exited with {}", output.status)));
        }

        parse_stream_info(&String::from_utf8_lossy(&output.stdout)).map_err(open_err)
    }
}

impl VideoBackend for FfmpegBackend {
    fn open_source(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        if !path.exists() {
            return Err(Error::SourceOpen {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        let info = self.inspect(path)?;

        let mut child = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::SourceOpen {
                path: path.to_path_buf(),
                reason: format!("failed to start {}: {e}", self.ffmpeg.display()),
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::SourceOpen {
                path: path.to_path_buf(),
                reason: "decoder has no output pipe".to_string(),
            });
        };

        debug!("Decoding {} with {}", path.display(), self.ffmpeg.display());
        Ok(Box::new(FfmpegSource {
            child,
            stdout: Some(stdout),
            info,
        }))
    }

    fn open_sink(&self, path: &Path, info: &VideoInfo) -> Result<Box<dyn FrameSink>> {
        let sink_err = |reason: String| Error::SinkOpen {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| sink_err(e.to_string()))?;
        }

        let mut child = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{}x{}", info.width, info.height)])
            .args(["-r", &info.frame_rate.to_string()])
            .args(["-i", "pipe:0", "-c:v", "mpeg4", "-vtag", "xvid"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| sink_err(format!("failed to start {}: {e}", self.ffmpeg.display())))?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(sink_err("encoder has no input pipe".to_string()));
        };

        debug!("Writing annotated video to {}", path.display());
        Ok(Box::new(FfmpegSink {
            child,
            stdin: Some(stdin),
            width: info.width,
            height: info.height,
        }))
    }
}

struct FfmpegSource {
    child: Child,
    stdout: Option<ChildStdout>,
    info: VideoInfo,
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let len = self.info.width as usize * self.info.height as usize * 3;
        let mut buf = vec![0u8; len];
        match stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => {
                return Err(Error::Frame {
                    reason: format!("reading decoded frame: {e}"),
                });
            }
        }

        RgbImage::from_raw(self.info.width, self.info.height, buf)
            .map(Some)
            .ok_or_else(|| Error::Frame {
                reason: "decoded frame has the wrong size".to_string(),
            })
    }

    fn release(&mut self) -> Result<()> {
        self.stdout = None;
        // The decoder may already have exited at end of stream.
        let _ = self.child.kill();
        self.child.wait()?;
        Ok(())
    }
}

struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(Error::Frame {
                reason: format!(
                    "frame is {}x{}, writer expects {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            });
        }
        let stdin = self.stdin.as_mut().ok_or_else(|| Error::Frame {
            reason: "writer already closed".to_string(),
        })?;
        stdin.write_all(frame.as_raw()).map_err(|e| Error::Frame {
            reason: format!("writing frame to encoder: {e}"),
        })
    }

    fn release(&mut self) -> Result<()> {
        // Closing stdin lets the encoder finish the container.
        self.stdin = None;
        let status = self.child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Frame {
                reason: format!("encoder exited with {status}"),
            })
        }
    }
}

/// Parse `ffprobe -print_format json -show_streams` output.
fn parse_stream_info(json: &str) -> std::result::Result<VideoInfo, String> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("unreadable ffprobe output: {e}"))?;

    let stream = value
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .ok_or_else(|| "no video stream".to_string())?;

    let dimension = |key: &str| {
        stream
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
            .ok_or_else(|| format!("missing or invalid {key}"))
    };
    let coded_width = dimension("width")?;
    let coded_height = dimension("height")?;

    // ffmpeg applies rotation metadata when decoding, so quarter turns swap
    // the frame dimensions.
    let (width, height) = if matches!(stream_rotation(stream).rem_euclid(360), 90 | 270) {
        (coded_height, coded_width)
    } else {
        (coded_width, coded_height)
    };

    let frame_rate = stream
        .get("r_frame_rate")
        .and_then(|f| f.as_str())
        .and_then(parse_frame_rate)
        .unwrap_or(FALLBACK_FRAME_RATE);

    let frame_count = stream
        .get("nb_frames")
        .and_then(|n| n.as_str())
        .and_then(|s| s.parse::<u64>().ok());

    Ok(VideoInfo {
        width,
        height,
        frame_rate,
        frame_count,
    })
}

/// Rotation in degrees from display matrix side data or the legacy `rotate` tag.
#[allow(clippy::cast_possible_truncation)]
fn stream_rotation(stream: &serde_json::Value) -> i64 {
    let side_data = stream
        .get("side_data_list")
        .and_then(|s| s.as_array())
        .and_then(|list| {
            list.iter()
                .find_map(|entry| entry.get("rotation").and_then(serde_json::Value::as_f64))
        });
    let tag = || {
        stream
            .get("tags")
            .and_then(|t| t.get("rotate"))
            .and_then(|r| r.as_str())
            .and_then(|r| r.trim().parse::<f64>().ok())
    };

    side_data.or_else(tag).map_or(0, |degrees| degrees.round() as i64)
}

/// Parse `"30000/1001"` or `"25"` into frames per second.
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}
