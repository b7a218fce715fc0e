//! Emberhorde - combat simulation core for a top-down survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spatial grid, weapons, damage, frame loop)
//! - `content`: Static definition tables (weapons, classes, enemy archetypes)
//!
//! Rendering, UI, and input devices are external collaborators: they drive
//! the sim through `sim::tick` and the command methods on `sim::GameState`,
//! and read back positions, health, and the per-frame event stream.

pub mod content;
pub mod sim;

pub use sim::{GameEvent, GameState, TickInput, tick};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Upper bound on a single frame's dt - protects integration after a
    /// stalled frame (tab backgrounding, debugger pause)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Spatial hash cell size in world units
    pub const GRID_CELL_SIZE: f32 = 100.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 12.0;
    /// Invulnerability window granted on level-up (seconds)
    pub const LEVEL_UP_INVULN: f32 = 0.5;

    /// Weapon level at which evolution triggers (once, irreversibly)
    pub const EVOLVE_LEVEL: u32 = 6;
    /// Persistent damage scale gained per weapon upgrade
    pub const UPGRADE_DAMAGE_SCALE: f32 = 1.2;

    /// Slows can never drive an enemy below this speed multiplier
    pub const SLOW_FLOOR: f32 = 0.1;
    /// Burn status sub-tick interval (seconds)
    pub const BURN_TICK_INTERVAL: f32 = 0.5;

    /// Enemy population cap enforced by the spawn director
    pub const ENEMY_CAP: usize = 300;
    /// Enemy HP difficulty scaling is clamped here; contact damage scaling
    /// is deliberately uncapped (see DESIGN.md)
    pub const ENEMY_HP_SCALE_CAP: f32 = 3.0;
    /// Distance from the player at which new enemies appear
    pub const SPAWN_RADIUS: f32 = 600.0;
    /// Enemies beyond this distance from the player are culled silently
    pub const DESPAWN_RADIUS: f32 = 1200.0;
    /// Chance per spawn of an elite variant
    pub const ELITE_CHANCE: f32 = 0.02;

    /// XP crystal lifetime before despawn (seconds)
    pub const CRYSTAL_LIFETIME: f32 = 30.0;
    /// Independent chance that any drop becomes a power crystal
    pub const POWER_CRYSTAL_CHANCE: f32 = 0.01;
    /// Weapon-speed boost granted by a power crystal
    pub const POWER_BOOST_MULT: f32 = 2.0;
    pub const POWER_BOOST_DURATION: f32 = 5.0;
}

/// Exact circle-vs-circle overlap test
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let r = a_radius + b_radius;
    a.distance_squared(b) <= r * r
}

/// Unit vector from `from` toward `to` (zero if coincident)
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Distance from point `p` to the segment `a`..`b`
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-6 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
