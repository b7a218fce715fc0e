//! Damage resolution
//!
//! The single chokepoint through which enemy hp is reduced. Everything that
//! hurts an enemy goes through `resolve_damage` or `raw_damage`; direct hp
//! mutation anywhere else is a design violation.
//!
//! Instead of walking a source->weapon->player ownership chain at hit time,
//! every combat object captures a `DamageContext` (might + crit stats) from
//! the acting player at spawn time and hands it back here.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Enemy, GameEvent};

/// Player offensive stats frozen at spawn time of a combat object
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageContext {
    pub might: f32,
    pub crit_chance: f32,
    pub crit_damage: f32,
}

impl DamageContext {
    /// Context that applies base damage verbatim (no might, no crits).
    /// Used when no acting player can be resolved.
    pub const NEUTRAL: Self = Self {
        might: 1.0,
        crit_chance: 0.0,
        crit_damage: 1.0,
    };
}

/// Result of one damage application
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub final_damage: f32,
    pub is_crit: bool,
    pub killed: bool,
}

/// Apply damage with crit/might modifiers and emit a damage event.
///
/// `ctx == None` means the source had no resolvable acting player: base
/// damage applies verbatim with no crit, regardless of ambient stats.
pub fn resolve_damage(
    base_damage: f32,
    ctx: Option<&DamageContext>,
    target: &mut Enemy,
    pos: Vec2,
    rng: &mut Pcg32,
    events: &mut Vec<GameEvent>,
) -> DamageOutcome {
    let (final_damage, is_crit) = match ctx {
        Some(ctx) => {
            let is_crit = rng.random::<f32>() < ctx.crit_chance;
            let mult = if is_crit { ctx.crit_damage } else { 1.0 };
            (base_damage * ctx.might * mult, is_crit)
        }
        None => (base_damage, false),
    };

    let killed = apply(final_damage, target);
    events.push(GameEvent::DamageDealt {
        pos,
        amount: final_damage,
        crit: is_crit,
    });
    DamageOutcome {
        final_damage,
        is_crit,
        killed,
    }
}

/// Apply pre-scaled damage, bypassing modifier resolution entirely.
///
/// DoT ticks and zone ticks pre-scale their damage at spawn time; routing
/// them through `resolve_damage` would double-apply might/crit.
pub fn raw_damage(
    amount: f32,
    target: &mut Enemy,
    pos: Vec2,
    events: &mut Vec<GameEvent>,
) -> DamageOutcome {
    let killed = apply(amount, target);
    events.push(GameEvent::DamageDealt {
        pos,
        amount,
        crit: false,
    });
    DamageOutcome {
        final_damage: amount,
        is_crit: false,
        killed,
    }
}

/// Decrement hp, flagging a kill only on the transition to dead. The hp
/// value may go negative on the killing blow; `duration/hp <= 0` is
/// uniformly treated as dead downstream.
fn apply(amount: f32, target: &mut Enemy) -> bool {
    let was_alive = !target.is_dead();
    target.hp -= amount;
    was_alive && target.is_dead()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn enemy(hp: f32) -> Enemy {
        let mut e = Enemy::test_dummy();
        e.hp = hp;
        e.max_hp = hp;
        e
    }

    #[test]
    fn test_guaranteed_crit_formula_is_exact() {
        let ctx = DamageContext {
            might: 1.5,
            crit_chance: 1.0,
            crit_damage: 2.0,
        };
        let mut target = enemy(1000.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();

        let out = resolve_damage(10.0, Some(&ctx), &mut target, Vec2::ZERO, &mut rng, &mut events);
        assert_eq!(out.final_damage, 10.0 * 1.5 * 2.0);
        assert!(out.is_crit);
        assert!(!out.killed);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_unresolvable_source_falls_back_to_base() {
        let mut target = enemy(1000.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();

        let out = resolve_damage(10.0, None, &mut target, Vec2::ZERO, &mut rng, &mut events);
        assert_eq!(out.final_damage, 10.0);
        assert!(!out.is_crit);
    }

    #[test]
    fn test_overkill_leaves_negative_hp_and_flags_death() {
        let mut target = enemy(20.0);
        let mut events = Vec::new();

        let out = raw_damage(25.0, &mut target, Vec2::ZERO, &mut events);
        assert!(out.killed);
        assert_eq!(target.hp, -5.0);
        assert!(target.is_dead());

        // A second hit on a corpse is not a kill
        let out = raw_damage(5.0, &mut target, Vec2::ZERO, &mut events);
        assert!(!out.killed);
    }

    #[test]
    fn test_zero_crit_chance_never_crits() {
        let ctx = DamageContext {
            might: 2.0,
            crit_chance: 0.0,
            crit_damage: 10.0,
        };
        let mut target = enemy(1000.0);
        let mut rng = Pcg32::seed_from_u64(99);
        let mut events = Vec::new();
        for _ in 0..100 {
            let out =
                resolve_damage(1.0, Some(&ctx), &mut target, Vec2::ZERO, &mut rng, &mut events);
            assert!(!out.is_crit);
            assert_eq!(out.final_damage, 2.0);
        }
    }
}
