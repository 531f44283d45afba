//! Progress bars for file batches and video frames.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_CHARS: &str = "█▓▒░ ";

/// Create a progress bar for processing multiple media files.
pub fn create_file_progress(total_files: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_files == 0 {
        return None;
    }

    let pb = ProgressBar::new(total_files as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(BAR_CHARS),
    );
    Some(pb)
}

/// Create a progress bar for the frames of one video.
///
/// Falls back to a spinner with a running count when the frame total is
/// not known.
pub fn create_frame_progress(
    total_frames: Option<u64>,
    file_name: &str,
    enabled: bool,
) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = match total_frames.filter(|&n| n > 0) {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(&format!(
                        "{{spinner:.green}} [{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} frames - {file_name}"
                    ))
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars(BAR_CHARS),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template(&format!(
                        "{{spinner:.green}} [{{elapsed_precise}}] {{pos}} frames - {file_name}"
                    ))
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    };
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Finish a progress bar with a message.
pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}

/// Increment a progress bar.
pub fn inc_progress(pb: Option<&ProgressBar>) {
    if let Some(pb) = pb {
        pb.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_is_none() {
        assert!(create_file_progress(10, false).is_none());
        assert!(create_frame_progress(Some(10), "clip.mp4", false).is_none());
    }

    #[test]
    fn test_empty_batch_has_no_bar() {
        assert!(create_file_progress(0, true).is_none());
    }

    #[test]
    fn test_frame_progress_without_total() {
        let pb = create_frame_progress(None, "clip.mp4", true);
        assert!(pb.is_some());
        inc_progress(pb.as_ref());
        finish_progress(pb, "done");
    }
}
