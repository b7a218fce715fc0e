//! Weapon state machines
//!
//! Every weapon shares the same skeleton: a cooldown driven by
//! `dt * speed_boost * time_speed`, targeting through the spatial grid,
//! upgrade-in-place with a persistent damage scale, and a one-time
//! irreversible evolution at the level threshold. Kinds diverge only in
//! targeting rule and what they spawn.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{EVOLVE_LEVEL, UPGRADE_DAMAGE_SCALE};
use crate::content::{WeaponDef, weapon_def};
use crate::direction_to;

use super::damage::{DamageContext, resolve_damage};
use super::projectile::{Beam, HitEffect, Motion, Projectile};
use super::state::{GameState, Stats, enemy_index};
use super::zone::{Zone, ZoneSpec};

/// Closed set of weapon kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Straight shot at the closest enemy
    Bolt,
    /// Instant damage line to the closest enemy
    Ray,
    /// Melee arc striking the closest few enemies
    Slash,
    /// Bouncing disc
    Disc,
    /// Chain lightning (fast bouncing shot re-aiming between enemies)
    Chain,
    /// Orbiting projectiles around the player
    Orbit,
    /// Lobbed flask spawning a burn zone on landing
    Lob,
    /// Delayed psychic blast (staged zone with stun)
    Nova,
}

/// How the weapon's re-fire is gated. Most weapons use the timer; the
/// evolved chain additionally blocks on its active chain object's lifetime
/// (an explicit wait state, not a sentinel cooldown value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownGate {
    Timer,
    /// Blocked until the projectile with this id dies
    WaitingOn(u32),
}

/// One weapon instance owned by the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub kind: WeaponKind,
    /// Starts at 1; bumped by `upgrade`
    pub level: u32,
    /// Monotonic: set once at the evolution threshold, never reset
    pub evolved: bool,
    pub cooldown: f32,
    /// Persistent damage multiplier grown by upgrades/evolution
    pub damage_scale: f32,
    pub gate: CooldownGate,
    /// Delay timers for pre-queued duplicate shots (evolved disc)
    pub queued_shots: Vec<f32>,
}

impl Weapon {
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            level: 1,
            evolved: false,
            cooldown: 0.0,
            damage_scale: 1.0,
            gate: CooldownGate::Timer,
            queued_shots: Vec::new(),
        }
    }

    /// Increment level and damage scaling; trigger evolution exactly once
    /// at the threshold. Returns true if the weapon evolved on this call.
    pub fn upgrade(&mut self) -> bool {
        self.level += 1;
        self.damage_scale *= UPGRADE_DAMAGE_SCALE;
        if self.level >= EVOLVE_LEVEL && !self.evolved {
            self.evolved = true;
            // One-time evolution stat boost; kind-specific behavior changes
            // branch on the flag at fire time
            self.damage_scale *= match self.kind {
                WeaponKind::Ray => 2.0,
                _ => 1.5,
            };
            true
        } else {
            false
        }
    }

    fn def(&self) -> &'static WeaponDef {
        weapon_def(self.kind)
    }

    fn scaled_cooldown(&self, stats: &Stats) -> f32 {
        let evo_mult = match (self.kind, self.evolved) {
            // Evolved chain trades its gate for a slightly longer timer
            (WeaponKind::Chain, true) => 1.25,
            // Evolved ray fires faster
            (WeaponKind::Ray, true) => 0.8,
            _ => 1.0,
        };
        self.def().base_cooldown * stats.cooldown * evo_mult
    }

    fn context(stats: &Stats) -> DamageContext {
        DamageContext {
            might: stats.might,
            crit_chance: stats.crit_chance,
            crit_damage: stats.crit_damage,
        }
    }

    /// Per-frame update: resolve the gate, run queued duplicate shots,
    /// count down and attempt to fire. Called with the weapon detached
    /// from the player so `state` can be borrowed freely.
    pub fn update(&mut self, dt: f32, state: &mut GameState) {
        // Pre-queued duplicates fire on their own staggered timers,
        // independent of the main cooldown
        if !self.queued_shots.is_empty() {
            for t in self.queued_shots.iter_mut() {
                *t -= dt;
            }
            let due = self.queued_shots.iter().filter(|t| **t <= 0.0).count();
            self.queued_shots.retain(|t| *t > 0.0);
            for _ in 0..due {
                self.fire_disc(state, false);
            }
        }

        if let CooldownGate::WaitingOn(id) = self.gate {
            let chain_alive = state.projectiles.iter().any(|p| p.id == id && !p.is_dead());
            if chain_alive {
                return;
            }
            // Chain fully resolved; resume the normal timer
            self.gate = CooldownGate::Timer;
            self.cooldown = self.scaled_cooldown(&state.player.stats);
        }

        let speed = state.player.weapon_speed_boost() * state.player.stats.time_speed;
        self.cooldown -= dt * speed;
        if self.cooldown > 0.0 {
            return;
        }

        if self.fire(state) {
            self.cooldown = self.scaled_cooldown(&state.player.stats);
        } else {
            // No valid target this frame; retry shortly
            self.cooldown = 0.1;
        }
    }

    /// Attempt to fire. Returns false when no valid target/trigger exists.
    fn fire(&mut self, state: &mut GameState) -> bool {
        match self.kind {
            WeaponKind::Bolt => self.fire_bolt(state),
            WeaponKind::Ray => self.fire_ray(state),
            WeaponKind::Slash => self.fire_slash(state),
            WeaponKind::Disc => self.fire_disc(state, true),
            WeaponKind::Chain => self.fire_chain(state),
            WeaponKind::Orbit => self.fire_orbit(state),
            WeaponKind::Lob => self.fire_lob(state),
            WeaponKind::Nova => self.fire_nova(state),
        }
    }

    fn fire_bolt(&mut self, state: &mut GameState) -> bool {
        let def = self.def();
        let from = state.player.pos;
        let Some(idx) = closest_enemy(state, from, def.range) else {
            return false;
        };
        let target = state.enemies[idx].pos;
        let stats = &state.player.stats;
        let ctx = Self::context(stats);
        let damage = def.base_damage * self.damage_scale;
        let speed = def.speed * stats.projectile_speed;
        let duration = def.duration * stats.duration;
        let radius = def.area * stats.area;
        let pierce = def.pierce + if self.evolved { 2 } else { 0 };
        let count = def.count + (self.level - 1) / 2;
        let knockback = def.knockback;

        let base_dir = direction_to(from, target);
        for i in 0..count {
            // Fan extra bolts around the aim line
            let spread = (i as f32 - (count - 1) as f32 / 2.0) * 0.12;
            let dir = Vec2::from_angle(spread).rotate(base_dir);
            let id = state.next_entity_id();
            state.projectiles.push(Projectile::new(
                id,
                from,
                radius,
                dir * speed,
                damage,
                pierce,
                duration,
                knockback,
                ctx,
                Motion::Linear { hit: Vec::new() },
            ));
        }
        true
    }

    fn fire_ray(&mut self, state: &mut GameState) -> bool {
        let def = self.def();
        let from = state.player.pos;
        let Some(idx) = closest_enemy(state, from, def.range) else {
            return false;
        };
        let stats = &state.player.stats;
        let ctx = Self::context(stats);
        let damage = def.base_damage * self.damage_scale;
        let width = def.area * stats.area * if self.evolved { 2.0 } else { 1.0 };
        let burst_radius = if self.evolved { 70.0 * stats.area } else { 0.0 };

        // Extend the beam through the target out to full range
        let target = state.enemies[idx].pos;
        let end = from + direction_to(from, target) * def.range;

        // Instant damage to everything the line (and evolved burst) touches
        let candidates = state.grid.get_nearby(from.midpoint(end), def.range);
        for enemy_id in candidates {
            let Some(i) = enemy_index(&state.enemies, enemy_id) else {
                continue;
            };
            if state.enemies[i].is_dead() {
                continue;
            }
            let pos = state.enemies[i].pos;
            let hit_radius = state.enemies[i].radius;
            let on_line =
                crate::point_segment_distance(pos, from, end) <= width / 2.0 + hit_radius;
            let in_burst = self.evolved && pos.distance(target) <= burst_radius + hit_radius;
            if on_line || in_burst {
                resolve_damage(
                    damage,
                    Some(&ctx),
                    &mut state.enemies[i],
                    pos,
                    &mut state.rng,
                    &mut state.events,
                );
            }
        }

        let id = state.next_entity_id();
        state.beams.push(Beam {
            id,
            start: from,
            end,
            width,
            duration: def.duration,
        });
        true
    }

    fn fire_slash(&mut self, state: &mut GameState) -> bool {
        let def = self.def();
        let from = state.player.pos;
        let range = def.range * state.player.stats.area;
        let mut candidates: Vec<usize> = state
            .grid
            .get_within_radius(from, range)
            .into_iter()
            .filter_map(|id| enemy_index(&state.enemies, id))
            .filter(|&i| !state.enemies[i].is_dead())
            .collect();
        if candidates.is_empty() {
            return false;
        }
        candidates.sort_by(|&a, &b| {
            let da = state.enemies[a].pos.distance_squared(from);
            let db = state.enemies[b].pos.distance_squared(from);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

        let stats = state.player.stats.clone();
        let ctx = Self::context(&stats);
        let damage = def.base_damage * self.damage_scale;
        let base_count = (def.count + self.level - 1) as usize;
        // Evolution doubles the strike count without removing hit targets
        // from the pool, so the same enemy can be struck more than once.
        // The base weapon strikes distinct targets only.
        let strikes = if self.evolved {
            base_count * 2
        } else {
            base_count.min(candidates.len())
        };
        let knockback = def.knockback;

        for s in 0..strikes {
            let i = candidates[s % candidates.len()];
            let pos = state.enemies[i].pos;
            let dir = direction_to(from, pos);
            state.enemies[i].knockback += dir * knockback;
            resolve_damage(
                damage,
                Some(&ctx),
                &mut state.enemies[i],
                pos,
                &mut state.rng,
                &mut state.events,
            );

            if self.evolved {
                // Lingering slow trail instead of the one-shot slash visual
                let spec = ZoneSpec {
                    radius: 40.0 * stats.area,
                    duration: 1.5 * stats.duration,
                    interval: 0.5 * stats.tick_rate,
                    tick_damage: damage * 0.2 * stats.might,
                    slow: Some(0.4),
                    stun: None,
                };
                let id = state.next_entity_id();
                state.zones.push(Zone::steady(id, pos, spec));
            } else {
                let id = state.next_entity_id();
                state.beams.push(Beam {
                    id,
                    start: from,
                    end: pos,
                    width: 14.0,
                    duration: def.duration,
                });
            }
        }
        true
    }

    fn fire_disc(&mut self, state: &mut GameState, primary: bool) -> bool {
        let def = self.def();
        let from = state.player.pos;
        let Some(idx) = closest_enemy(state, from, def.range) else {
            return false;
        };
        let target = state.enemies[idx].pos;
        let stats = state.player.stats.clone();
        let ctx = Self::context(&stats);
        let speed = def.speed * stats.projectile_speed;
        let id = state.next_entity_id();
        state.projectiles.push(Projectile::new(
            id,
            from,
            def.area * stats.area,
            direction_to(from, target) * speed,
            def.base_damage * self.damage_scale,
            def.pierce,
            def.duration * stats.duration,
            def.knockback,
            ctx,
            Motion::Bouncing {
                hit: Vec::new(),
                bounces_left: 1 + self.level as i32,
                range: 250.0,
            },
        ));

        // Evolved discs pre-queue staggered duplicates after the primary
        if primary && self.evolved {
            self.queued_shots.push(0.15);
            self.queued_shots.push(0.3);
        }
        true
    }

    fn fire_chain(&mut self, state: &mut GameState) -> bool {
        let def = self.def();
        let from = state.player.pos;
        let Some(idx) = closest_enemy(state, from, def.range) else {
            return false;
        };
        let target = state.enemies[idx].pos;
        let stats = state.player.stats.clone();
        let ctx = Self::context(&stats);
        let bounces = if self.evolved {
            // Quasi-infinite chain; the gate below stops re-firing until
            // the whole chain resolves
            999
        } else {
            3 + self.level as i32
        };
        let id = state.next_entity_id();
        state.projectiles.push(Projectile::new(
            id,
            from,
            def.area * stats.area,
            direction_to(from, target) * def.speed * stats.projectile_speed,
            def.base_damage * self.damage_scale,
            0,
            def.duration * stats.duration,
            def.knockback,
            ctx,
            Motion::Bouncing {
                hit: Vec::new(),
                bounces_left: bounces,
                range: 220.0,
            },
        ));
        if self.evolved {
            self.gate = CooldownGate::WaitingOn(id);
        }
        true
    }

    fn fire_orbit(&mut self, state: &mut GameState) -> bool {
        // Unconditional: needs no target
        let def = self.def();
        let stats = state.player.stats.clone();
        let ctx = Self::context(&stats);
        let count = def.count + self.level / 2 + if self.evolved { 2 } else { 0 };
        let orbit_radius = 70.0 * stats.area;
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let id = state.next_entity_id();
            let mut p = Projectile::new(
                id,
                state.player.pos + Vec2::from_angle(angle) * orbit_radius,
                def.area * stats.area,
                Vec2::ZERO,
                def.base_damage * self.damage_scale,
                def.pierce,
                def.duration * stats.duration,
                def.knockback,
                ctx,
                Motion::Orbiting {
                    angle,
                    orbit_radius,
                    angular_vel: def.speed * stats.projectile_speed,
                    recent: Vec::new(),
                },
            );
            if self.evolved {
                p = p.with_hit_effect(HitEffect::Burn {
                    tick_damage: def.base_damage * 0.25 * stats.might,
                    duration: 2.0,
                });
            }
            state.projectiles.push(p);
        }
        true
    }

    fn fire_lob(&mut self, state: &mut GameState) -> bool {
        let def = self.def();
        let from = state.player.pos;
        let Some(idx) = random_enemy(state, from, def.range) else {
            return false;
        };
        let target = state.enemies[idx].pos;
        let stats = &state.player.stats;
        let ctx = Self::context(stats);
        let spec = ZoneSpec {
            radius: def.area * stats.area * if self.evolved { 1.5 } else { 1.0 },
            duration: def.duration * stats.duration,
            interval: 0.5 * stats.tick_rate,
            // Zone ticks pre-scale with might and use the raw path
            tick_damage: def.base_damage * self.damage_scale * stats.might,
            slow: self.evolved.then_some(0.3),
            stun: None,
        };
        let id = state.next_entity_id();
        state.projectiles.push(Projectile::new(
            id,
            from,
            6.0,
            Vec2::ZERO,
            0.0,
            0,
            10.0,
            0.0,
            ctx,
            Motion::Lobbed {
                from,
                target,
                flight_time: 0.6,
                elapsed: 0.0,
                arc_height: 50.0,
                land: spec,
            },
        ));
        true
    }

    fn fire_nova(&mut self, state: &mut GameState) -> bool {
        let def = self.def();
        let from = state.player.pos;
        let Some(idx) = random_enemy(state, from, def.range) else {
            return false;
        };
        let target = state.enemies[idx].pos;
        let stats = &state.player.stats;
        let spec = ZoneSpec {
            radius: def.area * stats.area * if self.evolved { 1.4 } else { 1.0 },
            duration: 0.0,
            interval: 1.0,
            tick_damage: def.base_damage * self.damage_scale * stats.might,
            slow: None,
            stun: Some(if self.evolved { 1.5 } else { 0.8 }),
        };
        let id = state.next_entity_id();
        state.zones.push(Zone::staged(id, target, spec));
        true
    }
}

/// Index of the closest live enemy within `range` of `from`, via the grid.
pub fn closest_enemy(state: &GameState, from: Vec2, range: f32) -> Option<usize> {
    state
        .grid
        .get_within_radius(from, range)
        .into_iter()
        .filter_map(|id| enemy_index(&state.enemies, id))
        .filter(|&i| !state.enemies[i].is_dead())
        .min_by(|&a, &b| {
            let da = state.enemies[a].pos.distance_squared(from);
            let db = state.enemies[b].pos.distance_squared(from);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Index of a uniformly random live enemy within `range` of `from`.
pub fn random_enemy(state: &mut GameState, from: Vec2, range: f32) -> Option<usize> {
    let candidates: Vec<usize> = state
        .grid
        .get_within_radius(from, range)
        .into_iter()
        .filter_map(|id| enemy_index(&state.enemies, id))
        .filter(|&i| !state.enemies[i].is_dead())
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let pick = state.rng.random_range(0..candidates.len());
    Some(candidates[pick])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Enemy, GamePhase};

    fn state_with_enemy_at(pos: Vec2) -> GameState {
        let mut state = GameState::new(42);
        state.start_run(0);
        state.phase = GamePhase::Running;
        let id = state.next_entity_id();
        let mut e = Enemy::test_dummy();
        e.id = id;
        e.pos = pos;
        e.hp = 1000.0;
        e.max_hp = 1000.0;
        state.enemies.push(e);
        state.grid.clear();
        state.grid.insert(id, pos, 10.0);
        state
    }

    #[test]
    fn test_upgrade_threshold_and_monotonic_evolution() {
        let mut w = Weapon::new(WeaponKind::Bolt);
        for _ in 0..4 {
            assert!(!w.upgrade());
        }
        assert_eq!(w.level, 5);
        assert!(!w.evolved);

        // Fifth upgrade reaches level 6 and evolves exactly once
        assert!(w.upgrade());
        assert_eq!(w.level, 6);
        assert!(w.evolved);

        // Past the threshold: still evolved, never re-triggers
        assert!(!w.upgrade());
        assert_eq!(w.level, 7);
        assert!(w.evolved);
    }

    #[test]
    fn test_upgrade_grows_damage_scale() {
        let mut w = Weapon::new(WeaponKind::Bolt);
        let before = w.damage_scale;
        w.upgrade();
        assert!(w.damage_scale > before);
    }

    #[test]
    fn test_bolt_fires_at_closest_enemy() {
        let mut state = state_with_enemy_at(Vec2::new(100.0, 0.0));
        let mut w = Weapon::new(WeaponKind::Bolt);
        assert!(w.fire(&mut state));
        assert_eq!(state.projectiles.len(), 1);
        let p = &state.projectiles[0];
        // Aimed along +x
        assert!(p.vel.x > 0.0 && p.vel.y.abs() < 1.0);
    }

    #[test]
    fn test_fire_fails_without_target_and_retries() {
        let mut state = GameState::new(7);
        state.start_run(0);
        let mut w = Weapon::new(WeaponKind::Bolt);
        w.cooldown = 0.0;
        w.update(0.016, &mut state);
        assert!(state.projectiles.is_empty());
        // Short retry delay, not a full cooldown
        assert!(w.cooldown <= 0.1 + 1e-6);
    }

    #[test]
    fn test_ray_deals_instant_damage_and_leaves_beam() {
        let mut state = state_with_enemy_at(Vec2::new(120.0, 0.0));
        let mut w = Weapon::new(WeaponKind::Ray);
        let hp_before = state.enemies[0].hp;
        assert!(w.fire(&mut state));
        assert!(state.enemies[0].hp < hp_before);
        assert_eq!(state.beams.len(), 1);
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, crate::GameEvent::DamageDealt { .. })));
    }

    #[test]
    fn test_evolved_chain_blocks_until_chain_resolves() {
        let mut state = state_with_enemy_at(Vec2::new(100.0, 0.0));
        let mut w = Weapon::new(WeaponKind::Chain);
        for _ in 0..5 {
            w.upgrade();
        }
        assert!(w.evolved);

        assert!(w.fire(&mut state));
        let chain_id = state.projectiles[0].id;
        assert_eq!(w.gate, CooldownGate::WaitingOn(chain_id));

        // Even at zero cooldown, the gate blocks re-firing
        w.cooldown = 0.0;
        w.update(0.016, &mut state);
        assert_eq!(state.projectiles.len(), 1);

        // Chain dies; next update releases the gate and restores the timer
        state.projectiles.clear();
        w.update(0.016, &mut state);
        assert_eq!(w.gate, CooldownGate::Timer);
        assert!(w.cooldown > 0.0);
    }

    #[test]
    fn test_evolved_disc_queues_staggered_duplicates() {
        let mut state = state_with_enemy_at(Vec2::new(100.0, 0.0));
        let mut w = Weapon::new(WeaponKind::Disc);
        for _ in 0..5 {
            w.upgrade();
        }
        assert!(w.fire(&mut state));
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(w.queued_shots.len(), 2);

        // First duplicate fires once its stagger timer lapses
        w.cooldown = 10.0;
        w.update(0.2, &mut state);
        assert_eq!(state.projectiles.len(), 2);
        assert_eq!(w.queued_shots.len(), 1);
        w.update(0.2, &mut state);
        assert_eq!(state.projectiles.len(), 3);
        assert!(w.queued_shots.is_empty());
    }

    #[test]
    fn test_base_slash_strikes_distinct_targets_only() {
        let mut state = state_with_enemy_at(Vec2::new(50.0, 0.0));
        let mut w = Weapon::new(WeaponKind::Slash);
        assert!(w.fire(&mut state));
        // One enemy in range: exactly one strike, even though the volley
        // size is larger
        let damage_events = state
            .events
            .iter()
            .filter(|e| matches!(e, crate::GameEvent::DamageDealt { .. }))
            .count();
        assert_eq!(damage_events, 1);
    }

    #[test]
    fn test_evolved_slash_allows_repeat_targets() {
        let mut state = state_with_enemy_at(Vec2::new(50.0, 0.0));
        let mut w = Weapon::new(WeaponKind::Slash);
        for _ in 0..5 {
            w.upgrade();
        }
        let hp_before = state.enemies[0].hp;
        assert!(w.fire(&mut state));
        // A single enemy absorbed every strike in the doubled volley
        let damage_events = state
            .events
            .iter()
            .filter(|e| matches!(e, crate::GameEvent::DamageDealt { .. }))
            .count();
        assert!(damage_events >= 2);
        assert!(state.enemies[0].hp < hp_before);
        // Lingering slow zones replace the slash visuals
        assert!(!state.zones.is_empty());
        assert!(state.beams.is_empty());
    }

    #[test]
    fn test_orbit_fires_unconditionally() {
        let mut state = GameState::new(9);
        state.start_run(0);
        let mut w = Weapon::new(WeaponKind::Orbit);
        assert!(w.fire(&mut state));
        assert!(!state.projectiles.is_empty());
    }
}
