//! Avatar/particle proximity test
//!
//! A cheap axis-aligned rejection runs before the squared-distance test.
//! Anything the box rejects is also outside the circle, so the result is the
//! same as always running the precise test.

use glam::Vec2;

use crate::consts::COLLISION_RADIUS;

/// Hit test against the avatar with a fixed radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionProbe {
    pub radius: f32,
}

impl Default for CollisionProbe {
    fn default() -> Self {
        Self::new(COLLISION_RADIUS)
    }
}

impl CollisionProbe {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.abs(),
        }
    }

    /// Whether a single position hits the avatar
    #[inline]
    pub fn hits(&self, avatar: Vec2, pos: Vec2) -> bool {
        let dx = pos.x - avatar.x;
        let dy = pos.y - avatar.y;
        if dx.abs() > self.radius || dy.abs() > self.radius {
            return false;
        }
        dx * dx + dy * dy <= self.radius * self.radius
    }

    /// True on the first candidate within range
    pub fn check(&self, avatar: Vec2, candidates: impl IntoIterator<Item = Vec2>) -> bool {
        candidates.into_iter().any(|pos| self.hits(avatar, pos))
    }
}
