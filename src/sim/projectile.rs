//! Projectile and beam behaviors
//!
//! Spawned combat objects with bounded lifetime. Behavior variants form a
//! closed sum type (`Motion`) dispatched by a single update function:
//! straight, bouncing, orbiting, and lobbed shots. Beams are zero-collision
//! visual lines whose damage was applied instantly at fire time.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::damage::DamageContext;
use super::status::StatusEffect;
use super::zone::ZoneSpec;

/// Status applied to an enemy on projectile hit. Burn tick damage is
/// pre-scaled with might at spawn (ticks use the raw-damage path).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum HitEffect {
    Burn { tick_damage: f32, duration: f32 },
    Slow { amount: f32, duration: f32 },
    Stun { duration: f32 },
}

impl HitEffect {
    pub fn to_status(self) -> StatusEffect {
        match self {
            Self::Burn {
                tick_damage,
                duration,
            } => StatusEffect::burn(tick_damage, duration),
            Self::Slow { amount, duration } => StatusEffect::slow(amount, duration),
            Self::Stun { duration } => StatusEffect::stun(duration),
        }
    }
}

/// Per-variant movement state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Motion {
    /// Straight flight by velocity. The hit set remembers pierced enemies
    /// so the pierce budget is spent on distinct targets, not on the same
    /// enemy across overlapping frames.
    Linear { hit: Vec<u32> },
    /// Re-aims at a new target on each hit, preserving speed. The hit set
    /// prevents striking the same enemy twice before bouncing.
    Bouncing {
        hit: Vec<u32>,
        bounces_left: i32,
        /// Search radius for the next bounce target
        range: f32,
    },
    /// Circles the owning player (weak follow - reads the player position
    /// each frame, owns nothing)
    Orbiting {
        angle: f32,
        orbit_radius: f32,
        angular_vel: f32,
        /// Per-enemy re-hit cooldowns (id, seconds remaining)
        recent: Vec<(u32, f32)>,
    },
    /// Interpolates toward a target point over a fixed flight time with a
    /// parabolic height offset. Collision is suppressed in flight; lands
    /// into a zone.
    Lobbed {
        from: Vec2,
        target: Vec2,
        flight_time: f32,
        elapsed: f32,
        arc_height: f32,
        land: ZoneSpec,
    },
}

/// A transient combat projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub vel: Vec2,
    pub damage: f32,
    /// Remaining enemies this shot may pass through; dies below zero
    pub pierce: i32,
    pub duration: f32,
    pub can_collide: bool,
    /// Knockback impulse applied to hit enemies
    pub knockback: f32,
    pub ctx: DamageContext,
    pub motion: Motion,
    pub on_hit: Option<HitEffect>,
    dead: bool,
}

impl Projectile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        pos: Vec2,
        radius: f32,
        vel: Vec2,
        damage: f32,
        pierce: i32,
        duration: f32,
        knockback: f32,
        ctx: DamageContext,
        motion: Motion,
    ) -> Self {
        let can_collide = !matches!(motion, Motion::Lobbed { .. });
        Self {
            id,
            pos,
            radius,
            vel,
            damage,
            pierce,
            duration,
            can_collide,
            knockback,
            ctx,
            motion,
            on_hit: None,
            dead: false,
        }
    }

    pub fn with_hit_effect(mut self, effect: HitEffect) -> Self {
        self.on_hit = Some(effect);
        self
    }

    /// Dead exactly when elapsed time has consumed the duration, or when
    /// pierce/bounces ran out on a hit.
    pub fn is_dead(&self) -> bool {
        self.dead || self.duration <= 0.0
    }

    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Advance one frame. Returns a zone to spawn if a lobbed shot landed
    /// this frame.
    pub fn update(&mut self, dt: f32, player_pos: Vec2) -> Option<(Vec2, ZoneSpec)> {
        self.duration -= dt;
        match &mut self.motion {
            Motion::Linear { .. } | Motion::Bouncing { .. } => {
                self.pos += self.vel * dt;
                None
            }
            Motion::Orbiting {
                angle,
                orbit_radius,
                angular_vel,
                recent,
            } => {
                *angle += *angular_vel * dt;
                self.pos = player_pos + Vec2::new(angle.cos(), angle.sin()) * *orbit_radius;
                for entry in recent.iter_mut() {
                    entry.1 -= dt;
                }
                recent.retain(|(_, t)| *t > 0.0);
                None
            }
            Motion::Lobbed {
                from,
                target,
                flight_time,
                elapsed,
                land,
                ..
            } => {
                *elapsed += dt;
                let t = (*elapsed / *flight_time).min(1.0);
                self.pos = from.lerp(*target, t);
                if t >= 1.0 {
                    self.dead = true;
                    Some((*target, land.clone()))
                } else {
                    None
                }
            }
        }
    }

    /// Parabolic height offset for rendering a lobbed shot (zero otherwise)
    pub fn arc_offset(&self) -> f32 {
        match &self.motion {
            Motion::Lobbed {
                flight_time,
                elapsed,
                arc_height,
                ..
            } => {
                let t = (elapsed / flight_time).clamp(0.0, 1.0);
                4.0 * arc_height * t * (1.0 - t)
            }
            _ => 0.0,
        }
    }

    /// Whether this shot may strike the given enemy. Linear and bouncing
    /// shots refuse enemies already in their hit set; orbiting shots
    /// respect the per-enemy re-hit cooldown.
    pub fn can_hit(&self, enemy_id: u32) -> bool {
        if !self.can_collide || self.is_dead() {
            return false;
        }
        match &self.motion {
            Motion::Linear { hit } | Motion::Bouncing { hit, .. } => !hit.contains(&enemy_id),
            Motion::Orbiting { recent, .. } => !recent.iter().any(|(id, _)| *id == enemy_id),
            Motion::Lobbed { .. } => true,
        }
    }

    /// Record a hit against the given enemy.
    pub fn mark_hit(&mut self, enemy_id: u32) {
        match &mut self.motion {
            Motion::Linear { hit } | Motion::Bouncing { hit, .. } => hit.push(enemy_id),
            Motion::Orbiting { recent, .. } => recent.push((enemy_id, 0.5)),
            Motion::Lobbed { .. } => {}
        }
    }
}

/// A zero-collision damage line with a short lifetime, kept only so the
/// renderer can draw it. Damage was dealt instantly when the weapon fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    pub id: u32,
    pub start: Vec2,
    pub end: Vec2,
    pub width: f32,
    pub duration: f32,
}

impl Beam {
    pub fn is_dead(&self) -> bool {
        self.duration <= 0.0
    }

    pub fn update(&mut self, dt: f32) {
        self.duration -= dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(duration: f32) -> Projectile {
        Projectile::new(
            1,
            Vec2::ZERO,
            5.0,
            Vec2::new(100.0, 0.0),
            10.0,
            0,
            duration,
            0.0,
            DamageContext::NEUTRAL,
            Motion::Linear { hit: Vec::new() },
        )
    }

    #[test]
    fn test_dies_exactly_at_duration() {
        let mut p = linear(1.0);
        for _ in 0..59 {
            p.update(1.0 / 60.0, Vec2::ZERO);
            assert!(!p.is_dead(), "died before duration elapsed");
        }
        p.update(1.0 / 60.0 + 1e-4, Vec2::ZERO);
        assert!(p.is_dead());
    }

    #[test]
    fn test_linear_remembers_pierced_enemies() {
        let mut p = linear(5.0);
        assert!(p.can_hit(3));
        p.mark_hit(3);
        // Still overlapping the same enemy next frame: no re-hit
        assert!(!p.can_hit(3));
        assert!(p.can_hit(4));
    }

    #[test]
    fn test_bouncing_hit_set() {
        let mut p = Projectile::new(
            1,
            Vec2::ZERO,
            5.0,
            Vec2::new(100.0, 0.0),
            10.0,
            0,
            5.0,
            0.0,
            DamageContext::NEUTRAL,
            Motion::Bouncing {
                hit: Vec::new(),
                bounces_left: 3,
                range: 200.0,
            },
        );
        assert!(p.can_hit(7));
        p.mark_hit(7);
        assert!(!p.can_hit(7));
        // A different enemy is still a valid target
        assert!(p.can_hit(8));
    }

    #[test]
    fn test_lobbed_suppresses_collision_then_lands() {
        let spec = ZoneSpec {
            radius: 50.0,
            duration: 3.0,
            interval: 0.5,
            tick_damage: 4.0,
            slow: None,
            stun: None,
        };
        let mut p = Projectile::new(
            1,
            Vec2::ZERO,
            5.0,
            Vec2::ZERO,
            0.0,
            0,
            10.0,
            0.0,
            DamageContext::NEUTRAL,
            Motion::Lobbed {
                from: Vec2::ZERO,
                target: Vec2::new(100.0, 0.0),
                flight_time: 0.5,
                elapsed: 0.0,
                arc_height: 40.0,
                land: spec,
            },
        );
        assert!(!p.can_collide);
        assert!(p.update(0.25, Vec2::ZERO).is_none());
        assert!(p.arc_offset() > 0.0);
        let landed = p.update(0.3, Vec2::ZERO);
        let (at, _) = landed.expect("should land");
        assert_eq!(at, Vec2::new(100.0, 0.0));
        assert!(p.is_dead());
    }

    #[test]
    fn test_orbiting_follows_player_and_forgets_hits() {
        let mut p = Projectile::new(
            1,
            Vec2::ZERO,
            5.0,
            Vec2::ZERO,
            8.0,
            i32::MAX,
            3.0,
            0.0,
            DamageContext::NEUTRAL,
            Motion::Orbiting {
                angle: 0.0,
                orbit_radius: 60.0,
                angular_vel: 3.0,
                recent: Vec::new(),
            },
        );
        p.mark_hit(4);
        assert!(!p.can_hit(4));
        // Owner moved; orbit recenters on the new position
        let owner = Vec2::new(500.0, 500.0);
        p.update(0.6, owner);
        assert!((p.pos.distance(owner) - 60.0).abs() < 1e-3);
        // Re-hit cooldown expired
        assert!(p.can_hit(4));
    }
}
