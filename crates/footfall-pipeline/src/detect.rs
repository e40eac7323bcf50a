//! Detection capability — the pretrained face/person model boundary.

use footfall_core::{BoundingBox, Frame};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Pretrained detector run once per processed frame.
///
/// Returns zero or more regions, each with a bounding box and optionally
/// landmark points. The session never issues overlapping `detect` calls
/// against one instance; a stalled call stalls the counting pipeline.
#[allow(async_fn_in_trait)]
pub trait FaceDetector {
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectError>;
}
