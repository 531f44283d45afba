//! Audio processing pipeline.

mod decode;
mod preprocess;
mod resample;

pub use decode::{DecodedAudio, decode_audio_file};
pub use preprocess::{fit_to_length, softmax, top_n_indices};
pub use resample::resample;
