//! Audio resampling using rubato.

use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio to `to_rate`.
///
/// Returns the input unchanged if already at the target rate. The final
/// partial chunk is zero-padded and its output trimmed to the proportional
/// length.
pub fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        1,
        1,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let frames_in = resampler.input_frames_next();
    let expected_len = scaled_len(samples.len(), from_rate, to_rate);
    let mut output = Vec::with_capacity(expected_len + CHUNK_SIZE);
    let mut padded = Vec::new();

    for chunk in samples.chunks(frames_in) {
        let input = if chunk.len() == frames_in {
            chunk
        } else {
            padded.clear();
            padded.extend_from_slice(chunk);
            padded.resize(frames_in, 0.0);
            padded.as_slice()
        };
        process_chunk(&mut resampler, input, &mut output)?;
    }

    output.truncate(expected_len);
    Ok(output)
}

fn process_chunk(resampler: &mut Fft<f32>, input: &[f32], output: &mut Vec<f32>) -> Result<()> {
    let adapter = SequentialSlice::new(input, 1, input.len()).map_err(|e| Error::Resample {
        reason: format!("failed to create input adapter: {e}"),
    })?;
    let resampled = resampler
        .process(&adapter, 0, None)
        .map_err(|e| Error::Resample {
            reason: e.to_string(),
        })?;
    output.extend_from_slice(&resampled.take_data());
    Ok(())
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scaled_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    ((input_len as f64) * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize
}
