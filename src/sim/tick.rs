//! Per-frame simulation pipeline
//!
//! One `tick` call advances the world by `dt`. The step order below is a
//! design contract, not an implementation detail: collisions run before
//! enemy movement so a slow or stun applied this frame suppresses this
//! frame's movement, and dead enemies convert to crystal drops only in the
//! sweep step after contact damage has been dealt.
//!
//! 1. Spawn director
//! 2. Player movement, regen, timers
//! 3. Weapon updates (may spawn projectiles/zones/beams)
//! 4. Reset per-frame separation accumulators
//! 5. Projectile/zone/beam lifetime + movement; remove expired
//! 6. Broad-phase collision and hit resolution
//! 7. Enemy movement (status effects bind first)
//! 8. Enemy-vs-player contact damage
//! 9. Sweep dead enemies into crystal drops; despawn strays
//! 10. Crystal magnetism and collection
//! 11. Terminal check

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    CRYSTAL_LIFETIME, DESPAWN_RADIUS, MAX_FRAME_DT, POWER_BOOST_DURATION, POWER_BOOST_MULT,
};
use crate::{circles_overlap, direction_to};

use super::damage::{raw_damage, resolve_damage};
use super::projectile::Motion;
use super::spawn;
use super::state::{CrystalKind, GameEvent, GamePhase, GameState, enemy_index};
use super::status::StatusEffect;
use super::zone::{Zone, ZonePulse};

/// Player intent for one frame
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Desired movement direction; normalized before use
    pub move_dir: Vec2,
}

/// Advance the simulation by one frame. `dt` is clamped to avoid
/// catastrophic integration error after a stalled frame.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != GamePhase::Running {
        return;
    }
    let dt = dt.min(MAX_FRAME_DT);
    state.elapsed += dt;

    spawn::update_spawning(state, dt);
    update_player(state, input, dt);
    rebuild_grid(state);

    // Weapons are detached while they update so they can freely spawn
    // into (and read) the rest of the state
    let mut weapons = std::mem::take(&mut state.player.weapons);
    for weapon in weapons.iter_mut() {
        weapon.update(dt, state);
    }
    state.player.weapons = weapons;

    for enemy in state.enemies.iter_mut() {
        enemy.separation = Vec2::ZERO;
    }

    let pulses = update_objects(state, dt);
    resolve_projectile_hits(state);
    resolve_zone_pulses(state, &pulses);
    state.zones.retain(|z| !z.is_dead());

    move_enemies(state, dt);
    player_contact(state, dt);
    sweep_enemies(state);
    update_crystals(state, dt);

    if state.player.is_dead() {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::PlayerDied);
        log::info!(
            "run over at {:.1}s, level {}",
            state.elapsed,
            state.player.level
        );
    }
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let player = &mut state.player;
    player.invuln_timer = (player.invuln_timer - dt).max(0.0);
    player.boost_timer = (player.boost_timer - dt).max(0.0);
    if player.stats.regen > 0.0 {
        player.hp = (player.hp + player.stats.regen * dt).min(player.max_hp);
    }
    let dir = input.move_dir.normalize_or_zero();
    player.pos += dir * player.stats.move_speed * dt;
}

/// Full grid rebuild from live enemies, once per frame
fn rebuild_grid(state: &mut GameState) {
    let GameState {
        ref mut grid,
        ref enemies,
        ..
    } = *state;
    grid.clear();
    for enemy in enemies {
        if !enemy.is_dead() {
            grid.insert(enemy.id, enemy.pos, enemy.radius);
        }
    }
}

/// Step 5: lifetimes and movement for spawned objects. Returns zone pulses
/// indexed parallel to `state.zones` for the collision step.
fn update_objects(state: &mut GameState, dt: f32) -> Vec<ZonePulse> {
    let player_pos = state.player.pos;

    let mut landings = Vec::new();
    for p in state.projectiles.iter_mut() {
        if let Some(landing) = p.update(dt, player_pos) {
            landings.push(landing);
        }
    }
    state.projectiles.retain(|p| !p.is_dead());

    let mut pulses: Vec<ZonePulse> = Vec::with_capacity(state.zones.len());
    for zone in state.zones.iter_mut() {
        pulses.push(zone.update(dt));
    }

    for beam in state.beams.iter_mut() {
        beam.update(dt);
    }
    state.beams.retain(|b| !b.is_dead());

    // Lobbed shots that landed this frame become zones; they start ticking
    // next frame, so their pulse slot is empty
    for (pos, spec) in landings {
        let id = state.next_entity_id();
        state.zones.push(Zone::steady(id, pos, spec));
        pulses.push(ZonePulse::None);
    }
    pulses
}

/// Step 6a: projectile-vs-enemy hits through the grid
fn resolve_projectile_hits(state: &mut GameState) {
    for pi in 0..state.projectiles.len() {
        let candidates = {
            let p = &state.projectiles[pi];
            if !p.can_collide || p.is_dead() {
                continue;
            }
            state.grid.get_within_radius(p.pos, p.radius)
        };
        for id in candidates {
            if state.projectiles[pi].is_dead() {
                break;
            }
            if !state.projectiles[pi].can_hit(id) {
                continue;
            }
            let Some(ei) = enemy_index(&state.enemies, id) else {
                // Removed since the grid was built; skip
                continue;
            };
            if state.enemies[ei].is_dead() {
                continue;
            }
            hit_enemy(state, pi, ei);
        }
    }
}

fn hit_enemy(state: &mut GameState, pi: usize, ei: usize) {
    let damage = state.projectiles[pi].damage;
    let ctx = state.projectiles[pi].ctx;
    let knockback = state.projectiles[pi].knockback;
    let effect = state.projectiles[pi].on_hit;
    let ppos = state.projectiles[pi].pos;
    let eid = state.enemies[ei].id;
    let epos = state.enemies[ei].pos;

    {
        let enemy = &mut state.enemies[ei];
        enemy.knockback += direction_to(ppos, epos) * knockback;
        if let Some(fx) = effect {
            enemy.afflict(fx.to_status());
        }
        resolve_damage(
            damage,
            Some(&ctx),
            enemy,
            epos,
            &mut state.rng,
            &mut state.events,
        );
    }
    state.projectiles[pi].mark_hit(eid);

    let is_bouncing = matches!(state.projectiles[pi].motion, Motion::Bouncing { .. });
    if is_bouncing {
        let (bounces_left, range) = match &mut state.projectiles[pi].motion {
            Motion::Bouncing {
                bounces_left,
                range,
                ..
            } => {
                *bounces_left -= 1;
                (*bounces_left, *range)
            }
            _ => unreachable!(),
        };
        if bounces_left < 0 {
            state.projectiles[pi].kill();
            return;
        }
        // Re-aim at the nearest valid enemy; no target means the chain ends
        let next = state
            .grid
            .get_within_radius(epos, range)
            .into_iter()
            .filter(|&nid| nid != eid && state.projectiles[pi].can_hit(nid))
            .filter_map(|nid| enemy_index(&state.enemies, nid))
            .filter(|&i| !state.enemies[i].is_dead())
            .min_by(|&a, &b| {
                let da = state.enemies[a].pos.distance_squared(epos);
                let db = state.enemies[b].pos.distance_squared(epos);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
        match next {
            Some(ti) => {
                let dir = direction_to(epos, state.enemies[ti].pos);
                let speed = state.projectiles[pi].vel.length();
                state.projectiles[pi].pos = epos;
                state.projectiles[pi].vel = dir * speed;
            }
            None => state.projectiles[pi].kill(),
        }
    } else if !matches!(state.projectiles[pi].motion, Motion::Orbiting { .. }) {
        let p = &mut state.projectiles[pi];
        p.pierce -= 1;
        if p.pierce < 0 {
            p.kill();
        }
    }
}

/// Step 6b: zone ticks/blasts against overlapping enemies. Zone tick
/// damage was pre-scaled at fire time and goes through the raw path.
fn resolve_zone_pulses(state: &mut GameState, pulses: &[ZonePulse]) {
    for (zi, pulse) in pulses.iter().enumerate() {
        let ticks = match pulse {
            ZonePulse::None => continue,
            ZonePulse::Tick(n) => *n,
            ZonePulse::Blast => 1,
        };
        let (zpos, zradius, tick_damage, slow, stun, interval) = {
            let z = &state.zones[zi];
            (z.pos, z.radius, z.tick_damage, z.slow, z.stun, z.interval)
        };
        for id in state.grid.get_within_radius(zpos, zradius) {
            let Some(ei) = enemy_index(&state.enemies, id) else {
                continue;
            };
            if state.enemies[ei].is_dead() {
                continue;
            }
            let epos = state.enemies[ei].pos;
            raw_damage(
                tick_damage * ticks as f32,
                &mut state.enemies[ei],
                epos,
                &mut state.events,
            );
            if let Some(amount) = slow {
                // Slightly outlasts the interval so coverage is continuous
                state.enemies[ei].afflict(StatusEffect::slow(amount, interval + 0.1));
            }
            if let Some(duration) = stun {
                state.enemies[ei].afflict(StatusEffect::stun(duration));
            }
        }
    }
}

/// Step 7: status effects bind, then chase + separation + knockback
fn move_enemies(state: &mut GameState, dt: f32) {
    let GameState {
        ref mut enemies,
        ref mut events,
        ref grid,
        ref player,
        ..
    } = *state;

    for enemy in enemies.iter_mut() {
        if !enemy.is_dead() {
            enemy.update_effects(dt, events);
        }
    }

    // Pairwise separation through the grid, accumulated before integration
    for i in 0..enemies.len() {
        if enemies[i].is_dead() {
            continue;
        }
        let (pos, radius, id) = (enemies[i].pos, enemies[i].radius, enemies[i].id);
        let mut acc = Vec2::ZERO;
        for nid in grid.get_nearby(pos, radius) {
            if nid == id {
                continue;
            }
            let Some(j) = enemy_index(enemies, nid) else {
                continue;
            };
            let other = &enemies[j];
            if other.is_dead() {
                continue;
            }
            let d = pos.distance(other.pos);
            let min_d = radius + other.radius;
            if d < min_d && d > 1e-3 {
                acc += (pos - other.pos) / d * (min_d - d) * 4.0;
            }
        }
        enemies[i].separation = acc;
    }

    for enemy in enemies.iter_mut() {
        if enemy.is_dead() {
            continue;
        }
        let chase = direction_to(enemy.pos, player.pos) * enemy.speed * enemy.speed_multiplier;
        enemy.pos += (chase + enemy.separation + enemy.knockback) * dt;
        enemy.knockback *= (1.0 - 5.0 * dt).max(0.0);
    }
}

/// Step 8: continuous contact damage while overlapping, armor-reduced
fn player_contact(state: &mut GameState, dt: f32) {
    let GameState {
        ref enemies,
        ref mut player,
        ..
    } = *state;
    if player.invuln_timer > 0.0 {
        return;
    }
    let mut total = 0.0;
    for enemy in enemies {
        if enemy.is_dead() {
            continue;
        }
        if circles_overlap(enemy.pos, enemy.radius, player.pos, player.radius) {
            total += (enemy.damage - player.stats.armor).max(0.0) * dt;
        }
    }
    if total > 0.0 {
        player.hp -= total;
    }
}

/// Step 9: dead enemies become crystal drops; strays despawn silently
fn sweep_enemies(state: &mut GameState) {
    let player_pos = state.player.pos;
    let mut drops: Vec<(Vec2, u32)> = Vec::new();
    {
        let GameState {
            ref mut enemies,
            ref mut events,
            ..
        } = *state;
        enemies.retain(|e| {
            if e.is_dead() {
                events.push(GameEvent::EnemyKilled {
                    pos: e.pos,
                    xp: e.xp_value,
                });
                drops.push((e.pos, e.xp_value));
                return false;
            }
            e.pos.distance(player_pos) <= DESPAWN_RADIUS
        });
    }
    for (pos, xp) in drops {
        spawn::drop_crystal(state, pos, xp);
    }
}

/// Step 10: magnet pull (faster as the crystal closes in) and collection
fn update_crystals(state: &mut GameState, dt: f32) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;
    let magnet = state.player.stats.magnet;

    let mut xp_gain = 0u32;
    let mut power = false;
    {
        let GameState {
            ref mut crystals,
            ref mut events,
            ..
        } = *state;
        crystals.retain_mut(|c| {
            c.age += dt;
            if c.age >= CRYSTAL_LIFETIME {
                return false;
            }
            let d = c.pos.distance(player_pos);
            if d <= magnet && d > 1e-3 {
                let pull = 80.0 + 320.0 * (1.0 - d / magnet);
                c.pos += (player_pos - c.pos) / d * pull * dt;
            }
            if circles_overlap(c.pos, c.radius(), player_pos, player_radius) {
                events.push(GameEvent::CrystalCollected {
                    kind: c.kind,
                    value: c.value,
                });
                if c.kind == CrystalKind::Power {
                    power = true;
                } else {
                    xp_gain += c.value;
                }
                return false;
            }
            true
        });
    }

    if power {
        state.player.boost_mult = POWER_BOOST_MULT;
        state.player.boost_timer = POWER_BOOST_DURATION;
    }
    if xp_gain > 0 {
        let scaled = (xp_gain as f32 * state.player.stats.growth).round() as u32;
        state.grant_xp(scaled);
    }
}
