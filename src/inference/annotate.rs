//! Bounding box and caption overlays for annotated image and video output.

use crate::constants::output_extensions;
use crate::inference::BoundingBox;
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

const PALETTE: [[u8; 3]; 8] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 194, 255],
];

const LINE_WIDTH: u32 = 2;
const CAPTION_PAD: u32 = 3;

static CAPTION_FONT: LazyLock<Option<FontRef<'static>>> = LazyLock::new(|| {
    FontRef::try_from_slice(include_bytes!("../../assets/DejaVuSansMono.ttf"))
        .map_err(|e| warn!("Caption font unusable, drawing boxes only: {e}"))
        .ok()
});

/// Where annotated copies of media are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationTarget {
    dir: Option<PathBuf>,
}

impl AnnotationTarget {
    /// Write annotated copies next to the media they were made from.
    pub const fn beside_media() -> Self {
        Self { dir: None }
    }

    /// Write annotated copies into `dir`.
    pub const fn in_dir(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    /// Output path for an annotated copy of `media` with the given extension.
    pub fn path_for(&self, media: &Path, extension: &str) -> PathBuf {
        let stem = media.file_stem().map_or_else(
            || std::borrow::Cow::Borrowed("output"),
            |s| s.to_string_lossy(),
        );
        let dir = self.dir.clone().unwrap_or_else(|| {
            media
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        });
        dir.join(format!("{stem}{}.{extension}", output_extensions::ANNOTATED))
    }
}

/// Draw one rectangle outline per box, coloured by class, with its caption
/// (e.g. `"Sparrow 92.0%"`) on a filled band above it.
///
/// Empty captions draw the outline only.
pub fn draw_detections<'a>(
    frame: &mut RgbImage,
    boxes: impl IntoIterator<Item = (&'a BoundingBox, usize, &'a str)>,
) {
    let boxes: Vec<_> = boxes.into_iter().collect();
    for &(bbox, class_id, _) in &boxes {
        draw_rect(frame, bbox, class_color(class_id));
    }
    // Captions go on top so later boxes never hide them.
    for &(bbox, class_id, caption) in &boxes {
        draw_caption(frame, bbox, class_color(class_id), caption);
    }
}

const fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Caption text height for a frame.
#[allow(clippy::cast_precision_loss)]
fn caption_scale(frame_height: u32) -> PxScale {
    PxScale::from((frame_height as f32 / 40.0).clamp(12.0, 32.0))
}

/// Black on light colours, white on dark ones.
fn caption_text_color(band: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = band.0;
    let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    if luma > 150.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
fn draw_caption(frame: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, caption: &str) {
    if caption.is_empty() || frame.width() == 0 || frame.height() == 0 {
        return;
    }
    let Some(font) = CAPTION_FONT.as_ref() else {
        return;
    };

    let scale = caption_scale(frame.height());
    let (text_w, text_h) = text_size(scale, font, caption);
    let band_w = text_w + 2 * CAPTION_PAD;
    let band_h = text_h + 2 * CAPTION_PAD;

    let max_x = (frame.width() - 1) as f32;
    let max_y = (frame.height() - 1) as f32;
    let x = bbox.x1.clamp(0.0, max_x) as i32;
    let box_top = bbox.y1.clamp(0.0, max_y) as i32;
    // Above the box when it fits, otherwise just inside its top edge.
    let y = if box_top >= band_h as i32 {
        box_top - band_h as i32
    } else {
        box_top
    };

    draw_filled_rect_mut(frame, Rect::at(x, y).of_size(band_w, band_h), color);
    draw_text_mut(
        frame,
        caption_text_color(color),
        x + CAPTION_PAD as i32,
        y + CAPTION_PAD as i32,
        scale,
        font,
        caption,
    );
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn draw_rect(frame: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let clamp_x = |v: f32| v.clamp(0.0, (width - 1) as f32) as u32;
    let clamp_y = |v: f32| v.clamp(0.0, (height - 1) as f32) as u32;

    let (x1, x2) = (clamp_x(bbox.x1), clamp_x(bbox.x2));
    let (y1, y2) = (clamp_y(bbox.y1), clamp_y(bbox.y2));
    if x2 < x1 || y2 < y1 {
        return;
    }

    for t in 0..LINE_WIDTH {
        let top = (y1 + t).min(y2);
        let bottom = y2.saturating_sub(t).max(y1);
        for x in x1..=x2 {
            frame.put_pixel(x, top, color);
            frame.put_pixel(x, bottom, color);
        }
        let left = (x1 + t).min(x2);
        let right = x2.saturating_sub(t).max(x1);
        for y in y1..=y2 {
            frame.put_pixel(left, y, color);
            frame.put_pixel(right, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_beside_media() {
        let target = AnnotationTarget::beside_media();
        let path = target.path_for(Path::new("/data/pond.jpg"), "jpg");
        assert_eq!(path, PathBuf::from("/data/pond.birdtag.annotated.jpg"));
    }

    #[test]
    fn test_path_in_dir() {
        let target = AnnotationTarget::in_dir(PathBuf::from("/out"));
        let path = target.path_for(Path::new("/data/clip.mp4"), "avi");
        assert_eq!(path, PathBuf::from("/out/clip.birdtag.annotated.avi"));
    }

    #[test]
    fn test_draw_marks_outline_only() {
        let mut frame = RgbImage::new(20, 20);
        let bbox = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        draw_detections(&mut frame, [(&bbox, 0, "")]);

        assert_eq!(frame.get_pixel(5, 5), &Rgb(PALETTE[0]));
        assert_eq!(frame.get_pixel(15, 10), &Rgb(PALETTE[0]));
        assert_eq!(frame.get_pixel(10, 10), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_draw_clamps_out_of_frame_boxes() {
        let mut frame = RgbImage::new(10, 10);
        let bbox = BoundingBox::new(-50.0, -50.0, 500.0, 500.0);
        draw_detections(&mut frame, [(&bbox, 9, "")]);
        assert_eq!(frame.get_pixel(0, 0), &Rgb(PALETTE[1]));
        assert_eq!(frame.get_pixel(9, 9), &Rgb(PALETTE[1]));
    }

    #[test]
    fn test_caption_band_drawn_above_box() {
        let mut frame = RgbImage::new(200, 200);
        let bbox = BoundingBox::new(50.0, 100.0, 150.0, 180.0);
        draw_detections(&mut frame, [(&bbox, 0, "Sparrow 92.0%")]);

        let band = Rgb(PALETTE[0]);
        // Bottom-left padding of the band sits just above the box corner.
        assert_eq!(frame.get_pixel(51, 98), &band);

        // Text pixels inside the band differ from the band colour.
        let text_pixels = (60..200u32)
            .flat_map(|x| (70..100u32).map(move |y| (x, y)))
            .filter(|&(x, y)| {
                let p = frame.get_pixel(x, y);
                p != &band && p != &Rgb([0, 0, 0])
            })
            .count();
        assert!(text_pixels > 0);

        // Nothing is drawn left of the box.
        assert_eq!(frame.get_pixel(40, 95), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_caption_moves_inside_box_at_top_edge() {
        let mut frame = RgbImage::new(100, 100);
        let bbox = BoundingBox::new(10.0, 0.0, 90.0, 90.0);
        draw_detections(&mut frame, [(&bbox, 7, "Hawk 50.0%")]);

        // Interior just below the top edge is covered by the band.
        assert_eq!(frame.get_pixel(12, 3), &Rgb(PALETTE[7]));
    }

    #[test]
    fn test_empty_caption_draws_outline_only() {
        let mut frame = RgbImage::new(100, 100);
        let bbox = BoundingBox::new(10.0, 50.0, 90.0, 90.0);
        draw_detections(&mut frame, [(&bbox, 0, "")]);
        assert_eq!(frame.get_pixel(12, 45), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_caption_text_contrast() {
        assert_eq!(caption_text_color(Rgb([255, 56, 56])), Rgb([255, 255, 255]));
        assert_eq!(caption_text_color(Rgb([207, 210, 49])), Rgb([0, 0, 0]));
    }
}
