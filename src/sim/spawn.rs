//! Enemy spawn director and crystal drops
//!
//! Spawning runs on a countdown that shortens as the run progresses, with
//! wave sizes growing over time. Enemies appear on a ring just outside the
//! view around the player. Difficulty scales asymmetrically: HP scaling is
//! capped, contact damage scaling is not, so late-game enemies threaten the
//! player without becoming damage sponges.

use glam::Vec2;
use rand::Rng;

use crate::consts::{
    ELITE_CHANCE, ENEMY_CAP, ENEMY_HP_SCALE_CAP, POWER_CRYSTAL_CHANCE, SPAWN_RADIUS,
};
use crate::content::{EnemyArchetype, unlocked_archetypes};

use super::state::{CrystalKind, Enemy, GameState, XpCrystal};
use super::status::StatusEffect;

/// Seconds between spawn waves at the given run time
fn spawn_interval(elapsed: f32) -> f32 {
    // 2s at the start, tightening to a 0.3s floor over ~8.5 minutes
    (2.0 - elapsed / 300.0).max(0.3)
}

/// Enemies per wave at the given run time
fn wave_size(elapsed: f32) -> u32 {
    1 + (elapsed / 90.0) as u32
}

/// Time-based HP multiplier, capped so enemies never become unkillable
pub fn hp_scale(elapsed: f32) -> f32 {
    (1.0 + elapsed / 240.0).min(ENEMY_HP_SCALE_CAP)
}

/// Time-based contact damage multiplier. Deliberately uncapped.
pub fn damage_scale(elapsed: f32) -> f32 {
    1.0 + elapsed / 300.0
}

/// Advance the spawn countdown and emit waves. Respects the global enemy
/// cap: full waves are skipped while the field is saturated.
pub fn update_spawning(state: &mut GameState, dt: f32) {
    state.spawn_timer -= dt;
    if state.spawn_timer > 0.0 {
        return;
    }
    state.spawn_timer = spawn_interval(state.elapsed);

    for _ in 0..wave_size(state.elapsed) {
        if state.enemies.len() >= ENEMY_CAP {
            return;
        }
        let angle = state.rng.random::<f32>() * std::f32::consts::TAU;
        let pos = state.player.pos + Vec2::from_angle(angle) * SPAWN_RADIUS;
        spawn_enemy(state, pos);
    }
}

/// Spawn one enemy at `pos`: random unlocked archetype, time-scaled stats,
/// rare elite promotion.
pub fn spawn_enemy(state: &mut GameState, pos: Vec2) {
    let pool = unlocked_archetypes(state.elapsed);
    let archetype = &pool[state.rng.random_range(0..pool.len())];
    let elite = state.rng.random::<f32>() < ELITE_CHANCE;
    let enemy = build_enemy(
        state.next_entity_id(),
        pos,
        archetype,
        state.elapsed,
        elite,
    );
    if elite {
        log::debug!("elite {} spawned at {:.0},{:.0}", enemy.glyph, pos.x, pos.y);
    }
    state.enemies.push(enemy);
}

fn build_enemy(id: u32, pos: Vec2, archetype: &EnemyArchetype, elapsed: f32, elite: bool) -> Enemy {
    let mut hp = archetype.base_hp * hp_scale(elapsed);
    let mut damage = archetype.damage * damage_scale(elapsed);
    let mut radius = archetype.radius;
    let mut xp = archetype.xp;
    if elite {
        hp *= 5.0;
        damage *= 1.5;
        radius *= 1.5;
        xp *= 4;
    }
    Enemy {
        id,
        pos,
        radius,
        hp,
        max_hp: hp,
        base_hp: archetype.base_hp,
        speed: archetype.speed,
        damage,
        xp_value: xp,
        elite,
        glyph: archetype.glyph,
        knockback: Vec2::ZERO,
        separation: Vec2::ZERO,
        speed_multiplier: 1.0,
        effects: Vec::<StatusEffect>::new(),
    }
}

/// Drop a crystal where an enemy died. Usually an xp tier derived from the
/// enemy's value; rarely the power variant that boosts weapon speed
/// instead of granting xp.
pub fn drop_crystal(state: &mut GameState, pos: Vec2, xp_value: u32) {
    let kind = if state.rng.random::<f32>() < POWER_CRYSTAL_CHANCE {
        CrystalKind::Power
    } else {
        CrystalKind::tier_for(xp_value)
    };
    let id = state.next_entity_id();
    state.crystals.push(XpCrystal {
        id,
        pos,
        value: xp_value,
        kind,
        age: 0.0,
    });
}
