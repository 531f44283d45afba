//! Processing pipeline components.

mod coordinator;
mod orchestrator;
mod processor;

pub use coordinator::{collect_input_files, output_dir_for, output_dir_for_key, output_path_for};
pub use orchestrator::InferenceOrchestrator;
pub use processor::process_media;
