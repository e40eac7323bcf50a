//! Frame acquisition capability.

use footfall_core::Frame;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("camera busy")]
    Busy,
    #[error("capture failed: {0}")]
    Failed(String),
}

/// Source of decoded frames, pulled one at a time by the session loop.
///
/// `Ok(None)` means the stream ended (host view torn down). Any error is
/// terminal to the session: a camera that fails once is reported once and
/// never retried.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}
