//! Frame source and sink seams, and the guard that owns them.

use crate::error::Result;
use image::RgbImage;
use std::path::Path;
use tracing::{debug, warn};

/// Stream properties of an opened video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub frame_rate: f64,
    /// Total frames, when the container reports it.
    pub frame_count: Option<u64>,
}

/// Sequential decoded frames from one video.
pub trait FrameSource: Send {
    /// Stream properties.
    fn info(&self) -> VideoInfo;

    /// Next frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Close the stream. Called at most once by [`CaptureSession`].
    fn release(&mut self) -> Result<()>;
}

/// Encoder for annotated frames.
pub trait FrameSink: Send {
    /// Append one frame.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flush and close the output. Called at most once by [`CaptureSession`].
    fn release(&mut self) -> Result<()>;
}

/// Opens frame sources and sinks.
pub trait VideoBackend: Send + Sync {
    /// Open a video for reading.
    fn open_source(&self, path: &Path) -> Result<Box<dyn FrameSource>>;

    /// Open an output video matching `info`.
    fn open_sink(&self, path: &Path, info: &VideoInfo) -> Result<Box<dyn FrameSink>>;
}

/// Scoped owner of the capture and writer handles for one video.
///
/// Handles are released at most once, either through [`CaptureSession::release`]
/// or on drop.
pub struct CaptureSession {
    source: Option<Box<dyn FrameSource>>,
    sink: Option<Box<dyn FrameSink>>,
    info: VideoInfo,
}

impl CaptureSession {
    /// Open the source, then the sink when `annotate_to` is set.
    ///
    /// If the sink fails to open, the source is released before the error
    /// is returned.
    pub fn open(
        backend: &dyn VideoBackend,
        path: &Path,
        annotate_to: Option<&Path>,
    ) -> Result<Self> {
        let source = backend.open_source(path)?;
        let info = source.info();
        let mut session = Self {
            source: Some(source),
            sink: None,
            info,
        };

        if let Some(out) = annotate_to {
            // On error `session` drops here and releases the source.
            session.sink = Some(backend.open_sink(out, &info)?);
        }

        debug!(
            "Opened {} ({}x{} @ {:.2} fps)",
            path.display(),
            info.width,
            info.height,
            info.frame_rate
        );
        Ok(session)
    }

    /// Stream properties of the source.
    pub const fn info(&self) -> VideoInfo {
        self.info
    }

    /// Whether annotated frames are being written.
    pub const fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Next frame, or `None` once the stream has ended or been released.
    pub fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        match self.source.as_mut() {
            Some(source) => source.read_frame(),
            None => Ok(None),
        }
    }

    /// Write a frame to the sink, if one is open.
    pub fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.write_frame(frame),
            None => Ok(()),
        }
    }

    /// Release both handles. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(mut source) = self.source.take()
            && let Err(e) = source.release()
        {
            warn!("Failed to release video source: {e}");
        }
        if let Some(mut sink) = self.sink.take()
            && let Err(e) = sink.release()
        {
            warn!("Failed to release video writer: {e}");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}
