//! Stationary damage areas
//!
//! Steady zones apply pre-scaled damage to everything overlapping them on a
//! tick interval, with optional slow/stun side effects. Staged zones run an
//! explicit warning -> charge -> blast -> fade machine and deal their
//! damage exactly once, on the frame the blast stage is first entered.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Parameters for a zone to be spawned later (lobbed landings, slash
/// evolution trails). Tick damage is pre-scaled with might at fire time;
/// zone ticks go through the raw-damage path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub radius: f32,
    pub duration: f32,
    pub interval: f32,
    pub tick_damage: f32,
    pub slow: Option<f32>,
    /// Stun duration applied on tick/blast
    pub stun: Option<f32>,
}

/// Stage machine for delayed-blast zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Warning,
    Charge,
    Blast,
    Fade,
}

const WARNING_TIME: f32 = 0.8;
const CHARGE_TIME: f32 = 0.4;
const BLAST_TIME: f32 = 0.2;
const FADE_TIME: f32 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ZoneForm {
    /// Ticks on an interval for its whole duration
    Steady,
    /// Multi-stage; damage applied exactly once on blast entry, guarded by
    /// `triggered` so repeated frames in Blast do not re-deal
    Staged {
        stage: Stage,
        stage_timer: f32,
        triggered: bool,
    },
}

/// What a zone wants done this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonePulse {
    None,
    /// Apply tick damage/effects `0` or more whole times
    Tick(u32),
    /// One-shot blast damage + stun
    Blast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub duration: f32,
    pub interval: f32,
    pub tick_damage: f32,
    pub slow: Option<f32>,
    pub stun: Option<f32>,
    pub form: ZoneForm,
    timer: f32,
    dead: bool,
}

impl Zone {
    pub fn steady(id: u32, pos: Vec2, spec: ZoneSpec) -> Self {
        Self {
            id,
            pos,
            radius: spec.radius,
            duration: spec.duration,
            interval: spec.interval.max(1e-3),
            tick_damage: spec.tick_damage,
            slow: spec.slow,
            stun: spec.stun,
            form: ZoneForm::Steady,
            timer: 0.0,
            dead: false,
        }
    }

    pub fn staged(id: u32, pos: Vec2, spec: ZoneSpec) -> Self {
        Self {
            id,
            pos,
            radius: spec.radius,
            duration: WARNING_TIME + CHARGE_TIME + BLAST_TIME + FADE_TIME,
            interval: spec.interval.max(1e-3),
            tick_damage: spec.tick_damage,
            slow: spec.slow,
            stun: spec.stun,
            form: ZoneForm::Staged {
                stage: Stage::Warning,
                stage_timer: 0.0,
                triggered: false,
            },
            timer: 0.0,
            dead: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead || matches!(self.form, ZoneForm::Steady if self.duration <= 0.0)
    }

    /// Current stage for rendering (None for steady zones)
    pub fn stage(&self) -> Option<Stage> {
        match self.form {
            ZoneForm::Staged { stage, .. } => Some(stage),
            ZoneForm::Steady => None,
        }
    }

    /// Advance timers/stages and report what to apply this frame.
    pub fn update(&mut self, dt: f32) -> ZonePulse {
        self.duration -= dt;
        match &mut self.form {
            ZoneForm::Steady => {
                self.timer += dt;
                let mut ticks = 0;
                while self.timer >= self.interval {
                    self.timer -= self.interval;
                    ticks += 1;
                }
                if ticks > 0 {
                    ZonePulse::Tick(ticks)
                } else {
                    ZonePulse::None
                }
            }
            ZoneForm::Staged {
                stage,
                stage_timer,
                triggered,
            } => {
                *stage_timer += dt;
                match stage {
                    Stage::Warning if *stage_timer >= WARNING_TIME => {
                        *stage = Stage::Charge;
                        *stage_timer = 0.0;
                        ZonePulse::None
                    }
                    Stage::Charge if *stage_timer >= CHARGE_TIME => {
                        *stage = Stage::Blast;
                        *stage_timer = 0.0;
                        if !*triggered {
                            *triggered = true;
                            ZonePulse::Blast
                        } else {
                            ZonePulse::None
                        }
                    }
                    Stage::Blast if *stage_timer >= BLAST_TIME => {
                        *stage = Stage::Fade;
                        *stage_timer = 0.0;
                        ZonePulse::None
                    }
                    Stage::Fade if *stage_timer >= FADE_TIME => {
                        self.dead = true;
                        ZonePulse::None
                    }
                    _ => ZonePulse::None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ZoneSpec {
        ZoneSpec {
            radius: 60.0,
            duration: 2.0,
            interval: 0.5,
            tick_damage: 4.0,
            slow: Some(0.4),
            stun: None,
        }
    }

    #[test]
    fn test_steady_ticks_on_interval() {
        let mut zone = Zone::steady(1, Vec2::ZERO, spec());
        assert_eq!(zone.update(0.3), ZonePulse::None);
        assert_eq!(zone.update(0.3), ZonePulse::Tick(1));
        // Large frame pays out multiple whole ticks
        assert_eq!(zone.update(1.1), ZonePulse::Tick(2));
    }

    #[test]
    fn test_steady_dies_at_duration() {
        let mut zone = Zone::steady(1, Vec2::ZERO, spec());
        zone.update(1.9);
        assert!(!zone.is_dead());
        zone.update(0.2);
        assert!(zone.is_dead());
    }

    #[test]
    fn test_staged_blasts_exactly_once() {
        let mut zone = Zone::staged(1, Vec2::ZERO, spec());
        let mut blasts = 0;
        let mut frames = 0;
        while !zone.is_dead() && frames < 1000 {
            if zone.update(1.0 / 60.0) == ZonePulse::Blast {
                blasts += 1;
            }
            frames += 1;
        }
        assert_eq!(blasts, 1);
        assert!(zone.is_dead());
    }

    #[test]
    fn test_staged_duration_counts_down() {
        let mut zone = Zone::staged(1, Vec2::ZERO, spec());
        let total = zone.duration;
        zone.update(0.5);
        assert!((zone.duration - (total - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_staged_stage_order() {
        let mut zone = Zone::staged(1, Vec2::ZERO, spec());
        assert_eq!(zone.stage(), Some(Stage::Warning));
        zone.update(0.85);
        assert_eq!(zone.stage(), Some(Stage::Charge));
        zone.update(0.45);
        assert_eq!(zone.stage(), Some(Stage::Blast));
        zone.update(0.25);
        assert_eq!(zone.stage(), Some(Stage::Fade));
    }
}
