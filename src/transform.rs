use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;

/// A position on the background image, in pixels from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<PixelPoint> for (f64, f64) {
    fn from(p: PixelPoint) -> Self {
        (p.x, p.y)
    }
}

/// Affine map from Noita world coordinates onto the pixel grid of the map image.
///
/// `pixel = world / scale + offset`, applied per axis. The defaults line the
/// world up with the 8417x5000 community map render.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinateTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self {
            scale: 3.7,
            offset_x: 3910.0,
            offset_y: 480.0,
        }
    }
}

impl CoordinateTransform {
    pub fn world_to_pixel(&self, x: f64, y: f64) -> PixelPoint {
        PixelPoint {
            x: x / self.scale + self.offset_x,
            y: y / self.scale + self.offset_y,
        }
    }

    pub fn apply(&self, record: &SessionRecord) -> PixelPoint {
        self.world_to_pixel(record.x, record.y)
    }
}
