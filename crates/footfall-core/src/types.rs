use serde::{Deserialize, Serialize};

/// A decoded grayscale video frame handed in by the capture layer.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl Frame {
    /// Pixel at (x, y), clamped to the frame bounds.
    pub fn pixel_clamped(&self, x: i64, y: i64) -> u8 {
        if self.data.is_empty() || self.width == 0 || self.height == 0 {
            return 0;
        }
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.data
            .get(y * self.width as usize + x)
            .copied()
            .unwrap_or(0)
    }
}

/// Bounding box for one detected face or person, with optional landmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Landmark points in frame coordinates. The first two approximate the
    /// eye positions and the third the nose tip when present; box-only
    /// detectors emit none.
    pub landmarks: Option<Vec<(f32, f32)>>,
}

impl BoundingBox {
    /// Centre of the box.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
