//! Rectangle type shared by span bounding boxes and link annotations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in page coordinate space.
///
/// Stored normalized: `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle from two corner points, normalizing the corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Check whether the rectangle has zero area.
    pub fn is_empty(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug float formatting keeps the trailing `.0` on whole values,
        // so `Rect(10.0, 20.0, 110.0, 40.0)` rather than `Rect(10, 20, ...)`.
        write!(
            f,
            "Rect({:?}, {:?}, {:?}, {:?})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}
