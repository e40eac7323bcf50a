//! Descriptor extraction from detections.
//!
//! Turns a detected region into the fixed-length vector the dedup engine
//! compares. Geometric modes read the box or landmarks directly; the pixel
//! mode crops the region out of the frame, resizes it to a small square with
//! bilinear interpolation, normalizes to [0, 1], and mean-centres the result.

use crate::descriptor::Descriptor;
use crate::types::{BoundingBox, Frame};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("detection region is empty after clamping to {width}x{height} frame")]
    EmptyRegion { width: u32, height: u32 },
}

/// How to distil a detection into a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorMode {
    /// Length-2 geometric descriptor: the box centre.
    BoxCenter,
    /// The first `points` landmark coordinates, flattened to length
    /// `2 * points`. Missing landmarks are zero-filled.
    Landmarks { points: usize },
    /// Crop the box, bilinear-resize to `side`x`side`, scale to [0, 1],
    /// flatten, subtract the patch mean, truncate or zero-pad to `length`.
    PixelPatch { side: usize, length: usize },
    /// Raw box geometry `[x, y, w, h]`, paired with the box-overlap metric.
    BoxGeometry,
}

impl Default for DescriptorMode {
    fn default() -> Self {
        DescriptorMode::PixelPatch {
            side: 128,
            length: 100,
        }
    }
}

/// Applies a [`DescriptorMode`] to detections.
pub struct DescriptorExtractor {
    mode: DescriptorMode,
}

impl DescriptorExtractor {
    pub fn new(mode: DescriptorMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &DescriptorMode {
        &self.mode
    }

    /// Build a descriptor for one detection.
    ///
    /// Only the pixel mode can fail: the box must still have positive extent
    /// after clamping to the frame. Geometric modes degrade to zero-filled
    /// values instead of erroring.
    pub fn extract(
        &self,
        frame: &Frame,
        detection: &BoundingBox,
    ) -> Result<Descriptor, ExtractError> {
        match &self.mode {
            DescriptorMode::BoxCenter => {
                let (cx, cy) = detection.center();
                Ok(Descriptor::new(vec![cx, cy]))
            }
            DescriptorMode::Landmarks { points } => {
                Ok(landmark_descriptor(detection, *points))
            }
            DescriptorMode::PixelPatch { side, length } => {
                pixel_descriptor(frame, detection, *side, *length)
            }
            DescriptorMode::BoxGeometry => Ok(Descriptor::new(vec![
                detection.x,
                detection.y,
                detection.width,
                detection.height,
            ])),
        }
    }
}

fn landmark_descriptor(detection: &BoundingBox, points: usize) -> Descriptor {
    let mut values = Vec::with_capacity(points * 2);
    let landmarks = detection.landmarks.as_deref().unwrap_or(&[]);
    for i in 0..points {
        let (x, y) = landmarks.get(i).copied().unwrap_or((0.0, 0.0));
        values.push(x);
        values.push(y);
    }
    Descriptor::new(values)
}

fn pixel_descriptor(
    frame: &Frame,
    detection: &BoundingBox,
    side: usize,
    length: usize,
) -> Result<Descriptor, ExtractError> {
    // Clamp the box to the frame; the region must keep positive extent.
    let x0 = detection.x.floor().max(0.0) as i64;
    let y0 = detection.y.floor().max(0.0) as i64;
    let x1 = ((detection.x + detection.width).ceil() as i64).min(frame.width as i64);
    let y1 = ((detection.y + detection.height).ceil() as i64).min(frame.height as i64);

    if x1 <= x0 || y1 <= y0 || side == 0 {
        return Err(ExtractError::EmptyRegion {
            width: frame.width,
            height: frame.height,
        });
    }

    let region_w = (x1 - x0) as f32;
    let region_h = (y1 - y0) as f32;
    let scale_x = region_w / side as f32;
    let scale_y = region_h / side as f32;

    // Bilinear sample, with sample points clamped inside the crop.
    let sample = |x: i64, y: i64| -> f32 {
        frame.pixel_clamped(x.clamp(x0, x1 - 1), y.clamp(y0, y1 - 1)) as f32
    };

    let mut values = Vec::with_capacity(side * side);
    for oy in 0..side {
        let src_y = src_coord(oy, scale_y, y0);
        let yi = src_y.floor() as i64;
        let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

        for ox in 0..side {
            let src_x = src_coord(ox, scale_x, x0);
            let xi = src_x.floor() as i64;
            let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

            let tl = sample(xi, yi);
            let tr = sample(xi + 1, yi);
            let bl = sample(xi, yi + 1);
            let br = sample(xi + 1, yi + 1);

            let val = tl * (1.0 - fx) * (1.0 - fy)
                + tr * fx * (1.0 - fy)
                + bl * (1.0 - fx) * fy
                + br * fx * fy;

            values.push(val / 255.0);
        }
    }

    // Mean-centre, then force the configured length.
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    for v in values.iter_mut() {
        *v -= mean;
    }
    values.resize(length, 0.0);

    Ok(Descriptor::new(values))
}

fn src_coord(out_idx: usize, scale: f32, origin: i64) -> f32 {
    origin as f32 + (out_idx as f32 + 0.5) * scale - 0.5
}
