//! The per-frame counting loop.

use crate::capture::{CaptureError, FrameSource};
use crate::config::Config;
use crate::detect::{DetectError, FaceDetector};
use footfall_core::{
    BoundingBox, DedupEngine, DescriptorExtractor, Frame, FrontalGate, MetricError, Outcome,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("detector error: {0}")]
    Detect(#[from] DetectError),
    #[error("descriptor error: {0}")]
    Descriptor(#[from] MetricError),
}

/// What the renderer should do with one detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionStatus {
    /// Counted this frame.
    New,
    /// Matched a previously counted entity.
    Duplicate,
    /// Qualifying but still awaiting stability confirmation.
    Tracking,
    /// Failed the front-facing gate or had no usable region.
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub region: BoundingBox,
    pub status: DetectionStatus,
}

/// Per-frame output for the rendering layer: overlay data plus the running
/// counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    pub sequence: u32,
    pub detections: Vec<DetectionReport>,
    pub unique_count: u64,
    pub duplicate_count: u64,
}

/// Owns the per-session state and drives capture, detection, gating,
/// extraction and classification for one frame at a time.
pub struct CounterSession<S, D> {
    source: S,
    detector: D,
    gate: Option<FrontalGate>,
    extractor: DescriptorExtractor,
    engine: DedupEngine,
    unique_count: u64,
    duplicate_count: u64,
}

impl<S: FrameSource, D: FaceDetector> CounterSession<S, D> {
    pub fn new(config: &Config, source: S, detector: D) -> Self {
        Self {
            source,
            detector,
            gate: config.gate.clone().map(FrontalGate::new),
            extractor: DescriptorExtractor::new(config.descriptor.clone()),
            engine: DedupEngine::new(config.dedup()),
            unique_count: 0,
            duplicate_count: 0,
        }
    }

    /// Drive the loop until the source is exhausted or the report receiver
    /// is dropped. Capture and detector failures are terminal; there are no
    /// retries.
    pub async fn run(mut self, reports: mpsc::Sender<FrameReport>) -> Result<(), SessionError> {
        loop {
            let Some(frame) = self.source.next_frame().await? else {
                tracing::info!(unique = self.unique_count, "frame stream ended");
                return Ok(());
            };

            let report = self.process_frame(&frame).await?;

            if reports.send(report).await.is_err() {
                tracing::info!("report receiver dropped, stopping session");
                return Ok(());
            }
        }
    }

    /// Run detection on one frame and fold every region through the engine.
    ///
    /// Awaiting the detector here is what paces the loop: the next frame is
    /// not requested until this one settles.
    pub async fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport, SessionError> {
        let detections = self.detector.detect(frame).await?;

        if detections.is_empty() {
            // The explicit no-detections event is the only tracker reset;
            // gate rejections below do not count.
            self.engine.frame_cleared();
        }

        let mut reported = Vec::with_capacity(detections.len());
        for region in detections {
            let status = self.observe_region(frame, &region)?;
            match status {
                DetectionStatus::New => self.unique_count += 1,
                DetectionStatus::Duplicate => self.duplicate_count += 1,
                _ => {}
            }
            reported.push(DetectionReport { region, status });
        }

        Ok(FrameReport {
            sequence: frame.sequence,
            detections: reported,
            unique_count: self.unique_count,
            duplicate_count: self.duplicate_count,
        })
    }

    fn observe_region(
        &mut self,
        frame: &Frame,
        region: &BoundingBox,
    ) -> Result<DetectionStatus, SessionError> {
        if let Some(gate) = &self.gate {
            if !gate.is_frontal(region) {
                return Ok(DetectionStatus::Rejected);
            }
        }

        let descriptor = match self.extractor.extract(frame, region) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                tracing::debug!(error = %err, "skipping detection with no usable region");
                return Ok(DetectionStatus::Rejected);
            }
        };

        Ok(match self.engine.observe(descriptor)? {
            Outcome::New | Outcome::Confirmed => DetectionStatus::New,
            Outcome::Duplicate => DetectionStatus::Duplicate,
            Outcome::Tracking { .. } => DetectionStatus::Tracking,
        })
    }

    /// Running confirmed-unique count.
    pub fn unique_count(&self) -> u64 {
        self.unique_count
    }

    /// Running duplicate-sighting count.
    pub fn duplicate_count(&self) -> u64 {
        self.duplicate_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_report_serializes_kebab_case() {
        let report = FrameReport {
            sequence: 7,
            detections: vec![DetectionReport {
                region: BoundingBox {
                    x: 1.0,
                    y: 2.0,
                    width: 3.0,
                    height: 4.0,
                    confidence: 0.9,
                    landmarks: None,
                },
                status: DetectionStatus::Duplicate,
            }],
            unique_count: 1,
            duplicate_count: 1,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["detections"][0]["status"], "duplicate");
        assert_eq!(json["unique_count"], 1);
    }
}
