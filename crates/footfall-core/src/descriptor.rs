//! Descriptor vectors and the distance metrics that compare them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricError {
    #[error("invalid descriptor: length mismatch ({left} vs {right})")]
    InvalidDescriptor { left: usize, right: usize },
    #[error("invalid descriptor: box-overlap metric needs 4 values, got {len}")]
    NotABox { len: usize },
}

/// Fixed-length numeric summary of one detected entity in one frame.
///
/// Immutable once built; only ever compared through [`Metric::distance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    values: Vec<f32>,
}

impl Descriptor {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl From<Vec<f32>> for Descriptor {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Distance strategy for comparing two descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// `sqrt(sum((a - b)^2))`; suited to small geometric descriptors.
    Euclidean,
    /// `1 - dot(a, b) / (|a| * |b|)`; suited to flattened pixel descriptors.
    /// A zero-norm operand yields distance 1.0 rather than NaN.
    Cosine,
    /// `1 - IoU` over `[x, y, w, h]` box descriptors.
    BoxOverlap,
}

impl Metric {
    /// Distance between two descriptors of equal length.
    ///
    /// Mismatched lengths are a precondition violation and fail fast; a
    /// partial distance is never computed.
    pub fn distance(&self, a: &Descriptor, b: &Descriptor) -> Result<f32, MetricError> {
        if a.len() != b.len() {
            return Err(MetricError::InvalidDescriptor {
                left: a.len(),
                right: b.len(),
            });
        }

        match self {
            Metric::Euclidean => Ok(euclidean(a.values(), b.values())),
            Metric::Cosine => Ok(cosine(a.values(), b.values())),
            Metric::BoxOverlap => {
                if a.len() != 4 {
                    return Err(MetricError::NotABox { len: a.len() });
                }
                Ok(1.0 - box_iou(a.values(), b.values()))
            }
        }
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    let similarity = if denom > 0.0 { dot / denom } else { 0.0 };
    1.0 - similarity
}

/// Intersection-over-Union of two `[x, y, w, h]` boxes.
fn box_iou(a: &[f32], b: &[f32]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = (a[0] + a[2]).min(b[0] + b[2]);
    let y2 = (a[1] + a[3]).min(b[1] + b[3]);

    let inter_w = (x2 - x1).max(0.0);
    let inter_h = (y2 - y1).max(0.0);
    let inter_area = inter_w * inter_h;

    let union_area = a[2] * a[3] + b[2] * b[3] - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}
