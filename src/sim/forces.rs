//! Timed force fields
//!
//! Attractors pull particles toward a fixed point, repulsors push them away
//! from the avatar. Force law for a field of strength `s` at distance `d`:
//!
//! ```text
//! |a| = G * s / d^p            (force G*m*s/d^p divided by mass m)
//! a   = normalize(field - particle) * |a|
//! ```
//!
//! Positive strength attracts, negative strength repels. Contributions are
//! summed, so the order fields are stored in does not matter.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{EventSink, SimEvent};
use crate::consts::{FIELD_FADE_TIME, FORCE_EPSILON_SQ};
use crate::settings::FieldSettings;

/// Handle returned when a field is activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Pulls toward a fixed point
    Attractor,
    /// Pushes away from the avatar
    Repulsor,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Attractor => "attractor",
            FieldKind::Repulsor => "repulsor",
        }
    }
}

/// An active force field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceField {
    pub id: FieldId,
    pub kind: FieldKind,
    /// Signed strength (> 0 attractor, < 0 repulsor)
    pub strength: f32,
    /// Fixed for attractors, re-read from the avatar each tick for repulsors
    pub position: Vec2,
    /// Seconds left; the field is removed once this reaches zero
    pub remaining: f32,
    /// Distance exponent of the force law
    pub falloff: f32,
}

impl ForceField {
    /// Force on a particle of `mass` at `pos`, or `None` when the particle
    /// sits on the field's singularity
    pub fn force_on(&self, pos: Vec2, gravity: f32, mass: f32) -> Option<Vec2> {
        let offset = self.position - pos;
        let dist_sq = offset.length_squared();
        if dist_sq < FORCE_EPSILON_SQ {
            return None;
        }
        let dist = dist_sq.sqrt();
        let magnitude = gravity * mass * self.strength / dist.powf(self.falloff);
        Some(offset / dist * magnitude)
    }

    /// Fades out over the field's last second
    pub fn opacity(&self) -> f32 {
        (self.remaining / FIELD_FADE_TIME).clamp(0.0, 1.0)
    }
}

/// Read-only field data for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldView {
    pub id: FieldId,
    pub kind: FieldKind,
    pub position: Vec2,
    pub remaining: f32,
    pub opacity: f32,
}

/// Owns every live force field and composes their accelerations
#[derive(Debug, Clone)]
pub struct ForceFieldRegistry {
    fields: Vec<ForceField>,
    gravity: f32,
    particle_mass: f32,
    next_id: u32,
}

impl Default for ForceFieldRegistry {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl ForceFieldRegistry {
    pub fn new(gravity: f32, particle_mass: f32) -> Self {
        Self {
            fields: Vec::new(),
            gravity,
            particle_mass,
            next_id: 1,
        }
    }

    /// Add a field. The strength's sign is taken from `kind`; zero strength
    /// or a non-positive duration is rejected as a no-op.
    pub fn activate(
        &mut self,
        kind: FieldKind,
        position: Vec2,
        params: &FieldSettings,
        events: &mut impl EventSink,
    ) -> Option<FieldId> {
        let strength = match kind {
            FieldKind::Attractor => params.strength.abs(),
            FieldKind::Repulsor => -params.strength.abs(),
        };
        if strength == 0.0 || !strength.is_finite() || !(params.duration > 0.0) {
            log::debug!("Ignoring {} with strength {} duration {}", kind.as_str(), params.strength, params.duration);
            return None;
        }

        let id = FieldId(self.next_id);
        self.next_id += 1;
        self.fields.push(ForceField {
            id,
            kind,
            strength,
            position,
            remaining: params.duration,
            falloff: params.falloff,
        });
        log::info!("{} {} active at ({:.0}, {:.0}) for {:.1}s", kind.as_str(), id.0, position.x, position.y, params.duration);
        events.emit(SimEvent::FieldActivated {
            kind,
            position,
            duration: params.duration,
        });
        Some(id)
    }

    /// Remove a field early. Unknown or already-expired ids are a no-op.
    pub fn stop(&mut self, id: FieldId, events: &mut impl EventSink) -> bool {
        match self.fields.iter().position(|f| f.id == id) {
            Some(idx) => {
                let field = self.fields.remove(idx);
                events.emit(SimEvent::FieldExpired { kind: field.kind });
                true
            }
            None => {
                log::debug!("Field {} is not active, nothing to stop", id.0);
                false
            }
        }
    }

    /// Remove every field without notifications (round teardown)
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Age fields, drop the expired ones and move repulsors onto the avatar
    pub fn update(&mut self, dt: f32, avatar: Vec2, events: &mut impl EventSink) {
        self.fields.retain_mut(|field| {
            field.remaining -= dt;
            if field.remaining <= 0.0 {
                log::debug!("{} {} expired", field.kind.as_str(), field.id.0);
                events.emit(SimEvent::FieldExpired { kind: field.kind });
                return false;
            }
            if field.kind == FieldKind::Repulsor {
                field.position = avatar;
            }
            true
        });
    }

    /// Sum of all field accelerations at `pos`
    pub fn acceleration_at(&self, pos: Vec2) -> Vec2 {
        let mut total = Vec2::ZERO;
        for field in &self.fields {
            if let Some(force) = field.force_on(pos, self.gravity, self.particle_mass) {
                total += force / self.particle_mass;
            }
        }
        total
    }

    /// Add every field's `acceleration * dt` to `vel`
    pub fn apply_all_forces(&self, pos: Vec2, vel: &mut Vec2, dt: f32) {
        if self.fields.is_empty() {
            return;
        }
        *vel += self.acceleration_at(pos) * dt;
    }

    pub fn fields(&self) -> &[ForceField] {
        &self.fields
    }

    pub fn views(&self) -> impl Iterator<Item = FieldView> + '_ {
        self.fields.iter().map(|f| FieldView {
            id: f.id,
            kind: f.kind,
            position: f.position,
            remaining: f.remaining,
            opacity: f.opacity(),
        })
    }

    pub fn is_active(&self, id: FieldId) -> bool {
        self.fields.iter().any(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
