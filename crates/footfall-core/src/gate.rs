//! Front-facing plausibility gate.
//!
//! A detection must look roughly frontal before it is worth a descriptor:
//! the two eye landmarks must sit a plausible distance apart and close to
//! level. Detections without usable landmarks are rejected, not errors.

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};

/// Bounds for the front-facing gate, in frame pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum horizontal eye separation.
    pub min_separation: f32,
    /// Maximum horizontal eye separation.
    pub max_separation: f32,
    /// Maximum vertical drift between the two eye points.
    pub max_vertical_drift: f32,
    /// Optional bound on how far the nose tip may sit from the eye midline.
    /// Requires a third landmark when enabled.
    pub max_nose_drift: Option<f32>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_separation: 15.0,
            max_separation: 200.0,
            max_vertical_drift: 20.0,
            max_nose_drift: None,
        }
    }
}

/// Applies [`GateConfig`] to detections.
pub struct FrontalGate {
    config: GateConfig,
}

impl FrontalGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Whether the detection passes the gate and qualifies for dedup.
    pub fn is_frontal(&self, detection: &BoundingBox) -> bool {
        let Some(landmarks) = &detection.landmarks else {
            return false;
        };
        let (Some(&(rx, ry)), Some(&(lx, ly))) = (landmarks.first(), landmarks.get(1)) else {
            return false;
        };

        let dx = (lx - rx).abs();
        let dy = (ly - ry).abs();

        if dx < self.config.min_separation || dx > self.config.max_separation {
            return false;
        }
        if dy >= self.config.max_vertical_drift {
            return false;
        }

        if let Some(max_nose) = self.config.max_nose_drift {
            let Some(&(_, ny)) = landmarks.get(2) else {
                return false;
            };
            let eye_mid_y = (ry + ly) / 2.0;
            if (ny - eye_mid_y).abs() > max_nose {
                return false;
            }
        }

        true
    }
}
