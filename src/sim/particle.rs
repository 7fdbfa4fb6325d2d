//! Particle data and the ambient particle arena
//!
//! Particles live in a dense array. Retired slots go onto a FIFO free list
//! and are handed out again before the array grows, so a steady-state round
//! never allocates. The presentation layer correlates by [`ParticleId`].

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::FADE_IN_TIME;
use crate::heading_of;

/// Stable index of a particle slot in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

impl ParticleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single swarm particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Nominal speed (always > 0 once spawned)
    pub speed: f32,
    /// Pursuit turn rate (rad/s)
    pub turn_rate: f32,
    pub active: bool,
    /// Not yet inside the viewport; exempt from retirement
    pub freshly_spawned: bool,
    /// Steers toward the avatar every tick
    pub chases_target: bool,
    /// Initial velocity was aimed at the avatar
    pub spawned_toward_target: bool,
    /// Seconds since (re)spawn
    pub age: f32,
    /// Launch ordinal within a wave activation (unused by the arena)
    pub serial: u32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            speed: 1.0,
            turn_rate: 0.0,
            active: false,
            freshly_spawned: false,
            chases_target: false,
            spawned_toward_target: false,
            age: 0.0,
            serial: 0,
        }
    }
}

impl Particle {
    /// A live, freshly spawned particle moving in a straight line
    pub fn launched(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            speed: vel.length().max(f32::EPSILON),
            active: true,
            freshly_spawned: true,
            ..Self::default()
        }
    }

    /// Clear state so a recycled slot behaves like a new allocation
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Heading for the renderer
    #[inline]
    pub fn rotation(&self) -> f32 {
        heading_of(self.vel)
    }

    /// Fade-in opacity for the renderer
    #[inline]
    pub fn opacity(&self) -> f32 {
        (self.age / FADE_IN_TIME).clamp(0.0, 1.0)
    }

    /// Whether the particle is currently moving toward `point`
    #[inline]
    pub fn is_closing_on(&self, point: Vec2) -> bool {
        self.vel.dot(point - self.pos) > 0.0
    }

    /// Track age and drop the fresh flag once the particle is on screen, or
    /// once its grace period has run out and it is no longer inbound
    pub fn age_by(&mut self, dt: f32, on_screen: bool, inbound: bool, grace: f32) {
        self.age += dt;
        if self.freshly_spawned && (on_screen || (self.age >= grace && !inbound)) {
            self.freshly_spawned = false;
        }
    }
}

/// Read-only particle data handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleView {
    /// Arena slot for ambient particles, launch ordinal for wave particles
    pub id: u32,
    pub position: Vec2,
    pub rotation: f32,
    pub opacity: f32,
}

impl ParticleView {
    pub fn of(id: u32, particle: &Particle) -> Self {
        Self {
            id,
            position: particle.pos,
            rotation: particle.rotation(),
            opacity: particle.opacity(),
        }
    }
}

/// Dense particle storage with an active set and a retirement pool
#[derive(Debug, Clone, Default)]
pub struct ParticleArena {
    slots: Vec<Particle>,
    active: Vec<ParticleId>,
    pool: VecDeque<ParticleId>,
}

impl ParticleArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            active: Vec::with_capacity(capacity),
            pool: VecDeque::with_capacity(capacity),
        }
    }

    /// Take a pooled slot if one exists, otherwise allocate. The returned
    /// particle is reset, marked active and added to the active set.
    pub fn acquire(&mut self) -> ParticleId {
        let id = match self.pool.pop_front() {
            Some(id) => {
                self.slots[id.index()].reset();
                id
            }
            None => {
                let id = ParticleId(self.slots.len() as u32);
                self.slots.push(Particle::default());
                id
            }
        };
        self.slots[id.index()].active = true;
        self.active.push(id);
        id
    }

    /// Retire the particle at `active_index` of the active set. The last
    /// active particle takes its place.
    pub fn retire_at(&mut self, active_index: usize) -> ParticleId {
        let id = self.active.swap_remove(active_index);
        let particle = &mut self.slots[id.index()];
        particle.active = false;
        particle.freshly_spawned = false;
        self.pool.push_back(id);
        id
    }

    /// Retire every active particle
    pub fn retire_all(&mut self) {
        while !self.active.is_empty() {
            self.retire_at(self.active.len() - 1);
        }
    }

    #[inline]
    pub fn get(&self, id: ParticleId) -> &Particle {
        &self.slots[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ParticleId) -> &mut Particle {
        &mut self.slots[id.index()]
    }

    /// Id of the n-th member of the active set
    #[inline]
    pub fn active_id(&self, active_index: usize) -> ParticleId {
        self.active[active_index]
    }

    pub fn active_ids(&self) -> &[ParticleId] {
        &self.active
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.active.iter().map(|&id| (id, &self.slots[id.index()]))
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// Slots ever allocated (active + pooled)
    #[inline]
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_prefers_pool() {
        let mut arena = ParticleArena::new();
        let a = arena.acquire();
        let b = arena.acquire();
        assert_eq!(arena.allocated(), 2);

        arena.get_mut(a).freshly_spawned = true;
        arena.get_mut(a).pos = Vec2::new(5.0, 5.0);
        let idx = arena.active_ids().iter().position(|&id| id == a).unwrap();
        arena.retire_at(idx);
        assert_eq!(arena.active_count(), 1);
        assert_eq!(arena.pooled_count(), 1);
        assert!(!arena.get(a).active);

        let c = arena.acquire();
        assert_eq!(c, a, "pooled slot reused");
        assert_eq!(arena.allocated(), 2);
        assert!(arena.get(c).active);
        assert!(!arena.get(c).freshly_spawned);
        assert_eq!(arena.get(c).pos, Vec2::ZERO);
        assert!(arena.active_ids().contains(&b));
    }

    #[test]
    fn allocation_equals_active_plus_pooled() {
        let mut arena = ParticleArena::new();
        for _ in 0..10 {
            arena.acquire();
        }
        for _ in 0..4 {
            arena.retire_at(0);
        }
        for _ in 0..6 {
            arena.acquire();
        }
        assert_eq!(arena.allocated(), arena.active_count() + arena.pooled_count());
        assert_eq!(arena.allocated(), 12);
        assert!(arena.iter_active().all(|(_, p)| p.active));

        arena.retire_all();
        assert_eq!(arena.active_count(), 0);
        assert_eq!(arena.pooled_count(), 12);
    }

    #[test]
    fn fresh_flag_clears_on_screen_or_after_grace() {
        let mut p = Particle::launched(Vec2::ZERO, Vec2::X);
        p.age_by(0.1, false, false, 1.0);
        assert!(p.freshly_spawned);
        p.age_by(0.1, true, false, 1.0);
        assert!(!p.freshly_spawned);

        let mut q = Particle::launched(Vec2::ZERO, Vec2::X);
        q.age_by(1.5, false, false, 1.0);
        assert!(!q.freshly_spawned);
        assert_eq!(q.opacity(), 1.0);
    }

    #[test]
    fn inbound_particles_keep_fresh_flag_past_grace() {
        let mut p = Particle::launched(Vec2::new(-100.0, 0.0), Vec2::X);
        assert!(p.is_closing_on(Vec2::ZERO));
        p.age_by(5.0, false, true, 1.0);
        assert!(p.freshly_spawned);

        p.vel = -Vec2::X;
        assert!(!p.is_closing_on(Vec2::ZERO));
        p.age_by(0.1, false, false, 1.0);
        assert!(!p.freshly_spawned);
    }
}
