//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, owned by the game state
//! - Stable iteration order (insertion order, monotonic entity ids)
//! - No rendering or platform dependencies

pub mod damage;
pub mod grid;
pub mod projectile;
pub mod spawn;
pub mod state;
pub mod status;
pub mod tick;
pub mod weapons;
pub mod zone;

pub use damage::{DamageContext, DamageOutcome, raw_damage, resolve_damage};
pub use grid::SpatialGrid;
pub use projectile::{Beam, Motion, Projectile};
pub use state::{
    CrystalKind, Enemy, GameEvent, GamePhase, GameState, Player, Stats, XpCrystal,
};
pub use status::{StatusEffect, StatusKind};
pub use tick::{TickInput, tick};
pub use weapons::{CooldownGate, Weapon, WeaponKind};
pub use zone::{Stage, Zone, ZoneForm};
