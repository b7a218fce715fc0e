//! Timed status effects attached to enemies
//!
//! An enemy owns an ordered list of effects. Each frame the enemy resets
//! its frame-local `speed_multiplier` to 1, applies every effect in list
//! order, then sweeps the list in reverse index order removing anything
//! whose duration has run out (cleanup hook first).

use serde::{Deserialize, Serialize};

use crate::consts::{BURN_TICK_INTERVAL, SLOW_FLOOR};

/// One timed modifier. `duration` is strictly decreasing; `<= 0` is dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StatusKind {
    /// Damage over time. Pre-scaled at application; ticks go through the
    /// raw-damage path. The sub-tick accumulator keeps fractional overflow
    /// so no time is lost across uneven frames.
    Burn { tick_damage: f32, timer: f32 },
    /// Multiplies movement speed by `1 - amount`. Simultaneous slows
    /// combine by taking the strongest, not multiplicatively.
    Slow { amount: f32 },
    /// Movement fully suppressed for the duration.
    Stun,
}

impl StatusEffect {
    pub fn burn(tick_damage: f32, duration: f32) -> Self {
        Self {
            kind: StatusKind::Burn {
                tick_damage,
                timer: 0.0,
            },
            duration,
        }
    }

    /// `amount` is clamped so the resulting multiplier never drops below
    /// the global slow floor, for any input including values > 0.9.
    pub fn slow(amount: f32, duration: f32) -> Self {
        Self {
            kind: StatusKind::Slow {
                amount: amount.clamp(0.0, 1.0 - SLOW_FLOOR),
            },
            duration,
        }
    }

    pub fn stun(duration: f32) -> Self {
        Self {
            kind: StatusKind::Stun,
            duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.duration <= 0.0
    }

    /// Advance the effect by `dt`, returning burn damage due this frame
    /// (zero or more whole ticks) and folding the slow/stun into the
    /// enemy's frame-local multiplier.
    pub fn update(&mut self, dt: f32, speed_multiplier: &mut f32) -> f32 {
        self.duration -= dt;
        match &mut self.kind {
            StatusKind::Burn { tick_damage, timer } => {
                *timer += dt;
                let mut due = 0.0;
                while *timer >= BURN_TICK_INTERVAL {
                    *timer -= BURN_TICK_INTERVAL;
                    due += *tick_damage;
                }
                due
            }
            StatusKind::Slow { amount } => {
                *speed_multiplier = speed_multiplier.min(1.0 - *amount);
                0.0
            }
            StatusKind::Stun => {
                *speed_multiplier = 0.0;
                0.0
            }
        }
    }

    /// Cleanup hook, invoked before the effect is removed from its enemy.
    pub fn on_remove(&self) {
        log::trace!("status effect expired: {:?}", self.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strongest_slow_wins_not_stacked() {
        let mut a = StatusEffect::slow(0.5, 2.0);
        let mut b = StatusEffect::slow(0.8, 2.0);
        let mut mult = 1.0;
        a.update(0.016, &mut mult);
        b.update(0.016, &mut mult);
        // 0.2, not 0.5 * 0.2 = 0.1
        assert!((mult - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_stun_zeroes_multiplier() {
        let mut stun = StatusEffect::stun(1.0);
        let mut mult = 1.0;
        stun.update(0.016, &mut mult);
        assert_eq!(mult, 0.0);
    }

    #[test]
    fn test_burn_keeps_fractional_overflow() {
        let mut burn = StatusEffect::burn(5.0, 10.0);
        // 0.3 + 0.3 = 0.6 crosses the 0.5s interval once, remainder 0.1
        assert_eq!(burn.update(0.3, &mut 1.0), 0.0);
        assert_eq!(burn.update(0.3, &mut 1.0), 5.0);
        // 0.1 + 0.4 = 0.5 crosses again: the remainder was preserved
        assert_eq!(burn.update(0.4, &mut 1.0), 5.0);
    }

    #[test]
    fn test_burn_multiple_ticks_in_one_large_dt() {
        let mut burn = StatusEffect::burn(5.0, 10.0);
        // A clamped-but-large frame still pays out every whole tick
        assert_eq!(burn.update(1.6, &mut 1.0), 15.0);
    }

    #[test]
    fn test_duration_decreases_and_expires() {
        let mut slow = StatusEffect::slow(0.5, 0.05);
        assert!(!slow.is_expired());
        slow.update(0.06, &mut 1.0);
        assert!(slow.is_expired());
    }

    proptest! {
        /// No slow amount, however large, may push the multiplier below
        /// the 10% floor.
        #[test]
        fn prop_slow_floor_holds(amount in 0.0f32..10.0) {
            let mut slow = StatusEffect::slow(amount, 1.0);
            let mut mult = 1.0;
            slow.update(0.016, &mut mult);
            prop_assert!(mult >= SLOW_FLOOR - 1e-6);
        }
    }
}
