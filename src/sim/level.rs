//! Timer-driven level counter
//!
//! Levels start at 1 and advance every `level_duration` seconds forever.
//! Which wave mechanics fire on a level-up is decided by the simulation
//! owner; this type only keeps time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelProgression {
    current_level: u32,
    elapsed: f32,
    level_duration: f32,
}

impl LevelProgression {
    pub fn new(level_duration: f32) -> Self {
        Self {
            current_level: 1,
            elapsed: 0.0,
            level_duration: level_duration.max(f32::EPSILON),
        }
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    /// Seconds since the last level-up
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn level_duration(&self) -> f32 {
        self.level_duration
    }

    /// Fraction of the current level that has passed (0..1)
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.level_duration).clamp(0.0, 1.0)
    }

    /// Advance the timer. Returns the new level if one was reached.
    pub fn update(&mut self, dt: f32) -> Option<u32> {
        self.elapsed += dt;
        if self.elapsed >= self.level_duration {
            Some(self.level_up())
        } else {
            None
        }
    }

    /// Skip straight to the next level, resetting the timer
    pub fn level_up(&mut self) -> u32 {
        self.current_level = self.current_level.saturating_add(1);
        self.elapsed = 0.0;
        self.current_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_level_one() {
        let level = LevelProgression::new(10.0);
        assert_eq!(level.current_level(), 1);
        assert_eq!(level.progress(), 0.0);
    }

    #[test]
    fn levels_up_when_duration_elapses() {
        let mut level = LevelProgression::new(1.0);
        for _ in 0..3 {
            assert_eq!(level.update(0.3), None);
        }
        assert_eq!(level.update(0.3), Some(2));
        assert_eq!(level.elapsed(), 0.0);
        assert_eq!(level.current_level(), 2);
    }

    #[test]
    fn manual_level_up_resets_timer() {
        let mut level = LevelProgression::new(5.0);
        level.update(4.0);
        assert_eq!(level.level_up(), 2);
        assert_eq!(level.update(4.0), None);
        assert_eq!(level.update(1.0), Some(3));
    }

    #[test]
    fn runs_indefinitely() {
        let mut level = LevelProgression::new(1.0);
        let mut ups = 0;
        for _ in 0..1000 {
            if level.update(0.5).is_some() {
                ups += 1;
            }
        }
        assert_eq!(ups, 500);
        assert_eq!(level.current_level(), 501);
    }
}
