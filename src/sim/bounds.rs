//! Simulation bounds
//!
//! The viewport rectangle every component works against. Origin is the
//! top-left corner, y grows downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Viewport dimensions passed explicitly to each component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for SimBounds {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl SimBounds {
    /// Degenerate sizes are clamped to one unit so the center stays defined
    pub fn new(width: f32, height: f32) -> Self {
        let fix = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
        Self {
            width: fix(width),
            height: fix(height),
        }
    }

    pub fn from_size(size: Vec2) -> Self {
        Self::new(size.x, size.y)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Half of the larger side; the spawn ring is built on top of this
    #[inline]
    pub fn half_extent(&self) -> f32 {
        self.width.max(self.height) * 0.5
    }

    /// Inside the visible rectangle (edges inclusive)
    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    /// Outside the rectangle grown by `margin` on every side
    #[inline]
    pub fn is_beyond(&self, pos: Vec2, margin: f32) -> bool {
        pos.x < -margin
            || pos.x > self.width + margin
            || pos.y < -margin
            || pos.y > self.height + margin
    }
}
