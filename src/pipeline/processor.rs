//! Single media processing: inference followed by persistence.

use crate::detection::DetectionResult;
use crate::error::Result;
use crate::media::MediaReference;
use crate::output::ResultSink;
use crate::pipeline::InferenceOrchestrator;
use tracing::info;

/// Run inference on one media object and hand the result to every sink.
///
/// The first sink failure is returned; sinks after it are not called.
pub fn process_media(
    orchestrator: &InferenceOrchestrator,
    reference: &MediaReference,
    sinks: &[Box<dyn ResultSink>],
) -> Result<DetectionResult> {
    info!("Processing: {reference}");
    let result = orchestrator.run(reference)?;

    for sink in sinks {
        sink.persist(&result)?;
    }

    Ok(result)
}
