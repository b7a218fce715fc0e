//! Game state and core simulation types
//!
//! Everything the frame loop mutates lives here, owned by `GameState`:
//! entity collections, the seeded RNG, the spatial grid, and the outbound
//! event queue. No module-level singletons - independent simulations can
//! coexist (and do, in tests).

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::content;

use super::damage::raw_damage;
use super::grid::SpatialGrid;
use super::projectile::{Beam, Projectile};
use super::status::StatusEffect;
use super::weapons::{Weapon, WeaponKind};
use super::zone::Zone;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No run in progress
    Menu,
    /// Active gameplay
    Running,
    /// Player died; terminal state transition, not an error
    GameOver,
}

/// Outbound per-frame events for the rendering/UI layer. Drained by the
/// caller after each tick; replaces ad hoc onDamage/onSpawn callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Floating damage number feed
    DamageDealt { pos: Vec2, amount: f32, crit: bool },
    EnemyKilled { pos: Vec2, xp: u32 },
    LevelUp { level: u32 },
    WeaponEvolved { weapon: WeaponKind },
    CrystalCollected { kind: CrystalKind, value: u32 },
    PlayerDied,
}

/// Mutable player stat block. Multiplicative stats default to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub might: f32,
    pub area: f32,
    pub cooldown: f32,
    pub projectile_speed: f32,
    pub duration: f32,
    pub move_speed: f32,
    pub magnet: f32,
    pub armor: f32,
    pub regen: f32,
    pub crit_chance: f32,
    pub crit_damage: f32,
    /// Multiplier on zone/DoT tick intervals (< 1 ticks faster)
    pub tick_rate: f32,
    /// XP gain multiplier
    pub growth: f32,
    /// Global time-speed multiplier applied to weapon cooldowns
    pub time_speed: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            might: 1.0,
            area: 1.0,
            cooldown: 1.0,
            projectile_speed: 1.0,
            duration: 1.0,
            move_speed: 140.0,
            magnet: 70.0,
            armor: 0.0,
            regen: 0.0,
            crit_chance: 0.05,
            crit_damage: 1.5,
            tick_rate: 1.0,
            growth: 1.0,
            time_speed: 1.0,
        }
    }
}

/// The player character. Created once per run; replaced on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub xp: u32,
    pub level: u32,
    pub stats: Stats,
    /// Owned weapons; insertion order is UI display order
    pub weapons: Vec<Weapon>,
    /// Contact damage is skipped while this runs
    pub invuln_timer: f32,
    /// Temporary global weapon-speed boost (power crystal)
    pub boost_mult: f32,
    pub boost_timer: f32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            pos: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            hp: 100.0,
            max_hp: 100.0,
            xp: 0,
            level: 1,
            stats: Stats::default(),
            weapons: Vec::new(),
            invuln_timer: 0.0,
            boost_mult: 1.0,
            boost_timer: 0.0,
        }
    }

    /// Effective cooldown speed: 1 while no boost is active
    pub fn weapon_speed_boost(&self) -> f32 {
        if self.boost_timer > 0.0 { self.boost_mult } else { 1.0 }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// XP required to advance from `level` to the next. Nonlinear.
pub fn xp_to_next(level: u32) -> u32 {
    10 + 5 * level * level
}

/// Resolve an enemy id (as stored in the grid) back to its index. Enemies
/// are appended with monotonically increasing ids and removed with
/// `retain`, so the vec stays sorted by id and binary search applies.
pub fn enemy_index(enemies: &[Enemy], id: u32) -> Option<usize> {
    enemies.binary_search_by_key(&id, |e| e.id).ok()
}

/// A horde enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub base_hp: f32,
    pub speed: f32,
    /// Contact damage per second while overlapping the player
    pub damage: f32,
    pub xp_value: u32,
    pub elite: bool,
    pub glyph: char,
    /// Decaying knockback velocity from weapon hits
    pub knockback: Vec2,
    /// Per-frame separation force accumulator, reset each frame
    #[serde(skip)]
    pub separation: Vec2,
    /// Frame-local movement multiplier, reset to 1 before effects apply
    #[serde(skip, default = "one")]
    pub speed_multiplier: f32,
    pub effects: Vec<StatusEffect>,
}

fn one() -> f32 {
    1.0
}

impl Enemy {
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Add a status effect to the ordered list
    pub fn afflict(&mut self, effect: StatusEffect) {
        self.effects.push(effect);
    }

    /// Reset the frame-local multiplier, apply all effects in list order,
    /// then sweep expired effects in reverse index order (cleanup hook
    /// before removal). Burn damage accumulated across effects goes out
    /// through the raw-damage path in one application.
    pub fn update_effects(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.speed_multiplier = 1.0;
        let mut effects = std::mem::take(&mut self.effects);
        let mut burn_due = 0.0;
        for effect in effects.iter_mut() {
            burn_due += effect.update(dt, &mut self.speed_multiplier);
        }
        for i in (0..effects.len()).rev() {
            if effects[i].is_expired() {
                effects[i].on_remove();
                effects.remove(i);
            }
        }
        self.effects = effects;
        if burn_due > 0.0 && !self.is_dead() {
            let pos = self.pos;
            raw_damage(burn_due, self, pos, events);
        }
    }

    #[cfg(test)]
    pub fn test_dummy() -> Self {
        Self {
            id: 0,
            pos: Vec2::ZERO,
            radius: 10.0,
            hp: 10.0,
            max_hp: 10.0,
            base_hp: 10.0,
            speed: 60.0,
            damage: 5.0,
            xp_value: 1,
            elite: false,
            glyph: '🦇',
            knockback: Vec2::ZERO,
            separation: Vec2::ZERO,
            speed_multiplier: 1.0,
            effects: Vec::new(),
        }
    }
}

/// XP crystal tiers, derived from the dropping enemy's xp value, plus the
/// rare power variant that grants a weapon-speed boost instead of xp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrystalKind {
    Blue,
    Green,
    Red,
    Purple,
    Power,
}

impl CrystalKind {
    /// Tier thresholds: blue < 5 <= green < 20 <= red < 50 <= purple
    pub fn tier_for(xp_value: u32) -> Self {
        match xp_value {
            0..5 => Self::Blue,
            5..20 => Self::Green,
            20..50 => Self::Red,
            _ => Self::Purple,
        }
    }
}

/// A dropped XP crystal. Magnet-attracted to the player; despawns after a
/// fixed lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpCrystal {
    pub id: u32,
    pub pos: Vec2,
    pub value: u32,
    pub kind: CrystalKind,
    pub age: f32,
}

impl XpCrystal {
    pub fn radius(&self) -> f32 {
        6.0
    }
}

/// Complete simulation state for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Elapsed run time in seconds
    pub elapsed: f32,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub zones: Vec<Zone>,
    pub beams: Vec<Beam>,
    pub crystals: Vec<XpCrystal>,
    /// Broad-phase index over enemies, rebuilt every frame
    #[serde(skip)]
    pub grid: SpatialGrid,
    /// Outbound event queue, drained by the caller after each tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Countdown to the next spawn wave
    pub spawn_timer: f32,
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            elapsed: 0.0,
            player: Player::new(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            zones: Vec::new(),
            beams: Vec::new(),
            crystals: Vec::new(),
            grid: SpatialGrid::default(),
            events: Vec::new(),
            spawn_timer: 0.0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Hand the accumulated events to the UI layer
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Command: begin a run with the selected class. Unknown class index
    /// is a no-op.
    pub fn start_run(&mut self, class_index: usize) {
        let Some(class) = content::class_def(class_index) else {
            log::warn!("start_run: unknown class index {class_index}");
            return;
        };

        self.elapsed = 0.0;
        self.enemies.clear();
        self.projectiles.clear();
        self.zones.clear();
        self.beams.clear();
        self.crystals.clear();
        self.events.clear();
        self.spawn_timer = 0.0;

        let mut player = Player::new();
        player.stats.might += class.might_bonus;
        player.stats.armor += class.armor_bonus;
        player.stats.move_speed += class.move_speed_bonus;
        player.max_hp += class.max_hp_bonus;
        player.hp = player.max_hp;
        player.weapons.push(Weapon::new(class.weapon));
        self.player = player;
        self.phase = GamePhase::Running;
        log::info!("run started: class {} (seed {})", class.name, self.seed);
    }

    /// Command: add a weapon by id, or upgrade it if already owned.
    /// Evolution triggers automatically at the level threshold. Unknown
    /// ids are a no-op.
    pub fn add_or_upgrade_weapon(&mut self, id: &str) {
        let Some(kind) = content::weapon_by_id(id) else {
            log::warn!("add_or_upgrade_weapon: unknown weapon id {id:?}");
            return;
        };
        if let Some(weapon) = self.player.weapons.iter_mut().find(|w| w.kind == kind) {
            if weapon.upgrade() {
                log::info!("{:?} evolved at level {}", kind, weapon.level);
                self.events.push(GameEvent::WeaponEvolved { weapon: kind });
            }
        } else {
            self.player.weapons.push(Weapon::new(kind));
        }
    }

    /// Command: apply a stat-boosting pickup keyed by stat name. Max-HP
    /// also heals by the same delta. Unknown keys are a no-op.
    pub fn apply_powerup(&mut self, stat: &str, delta: f32) {
        let s = &mut self.player.stats;
        match stat {
            "might" => s.might += delta,
            "area" => s.area += delta,
            "cooldown" => s.cooldown = (s.cooldown + delta).max(0.1),
            "projectile_speed" => s.projectile_speed += delta,
            "duration" => s.duration += delta,
            "move_speed" => s.move_speed += delta,
            "magnet" => s.magnet += delta,
            "armor" => s.armor += delta,
            "regen" => s.regen += delta,
            "crit_chance" => s.crit_chance = (s.crit_chance + delta).clamp(0.0, 1.0),
            "crit_damage" => s.crit_damage += delta,
            "tick_rate" => s.tick_rate = (s.tick_rate + delta).max(0.1),
            "growth" => s.growth += delta,
            "time_speed" => s.time_speed += delta,
            "max_hp" => {
                self.player.max_hp += delta;
                self.player.hp = (self.player.hp + delta).min(self.player.max_hp);
            }
            _ => log::warn!("apply_powerup: unknown stat {stat:?}"),
        }
    }

    /// Grant xp (already growth-scaled by the caller), resolving any
    /// level-ups. Level-up grants a brief invulnerability window.
    pub fn grant_xp(&mut self, amount: u32) {
        self.player.xp += amount;
        while self.player.xp >= xp_to_next(self.player.level) {
            self.player.xp -= xp_to_next(self.player.level);
            self.player.level += 1;
            self.player.invuln_timer = self.player.invuln_timer.max(LEVEL_UP_INVULN);
            log::info!("level up -> {}", self.player.level);
            self.events.push(GameEvent::LevelUp {
                level: self.player.level,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crystal_tiers() {
        assert_eq!(CrystalKind::tier_for(0), CrystalKind::Blue);
        assert_eq!(CrystalKind::tier_for(4), CrystalKind::Blue);
        assert_eq!(CrystalKind::tier_for(5), CrystalKind::Green);
        assert_eq!(CrystalKind::tier_for(19), CrystalKind::Green);
        assert_eq!(CrystalKind::tier_for(20), CrystalKind::Red);
        assert_eq!(CrystalKind::tier_for(49), CrystalKind::Red);
        assert_eq!(CrystalKind::tier_for(50), CrystalKind::Purple);
        assert_eq!(CrystalKind::tier_for(9000), CrystalKind::Purple);
    }

    #[test]
    fn test_xp_curve_is_nonlinear() {
        assert!(xp_to_next(2) - xp_to_next(1) < xp_to_next(10) - xp_to_next(9));
    }

    #[test]
    fn test_grant_xp_levels_up_and_grants_invuln() {
        let mut state = GameState::new(1);
        state.start_run(0);
        state.grant_xp(xp_to_next(1) + 3);
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.xp, 3);
        assert!(state.player.invuln_timer > 0.0);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::LevelUp { level: 2 })));
    }

    #[test]
    fn test_unknown_content_ids_are_noops() {
        let mut state = GameState::new(1);
        state.start_run(0);
        let weapons_before = state.player.weapons.len();
        state.add_or_upgrade_weapon("no-such-weapon");
        assert_eq!(state.player.weapons.len(), weapons_before);

        let might = state.player.stats.might;
        state.apply_powerup("no-such-stat", 5.0);
        assert_eq!(state.player.stats.might, might);

        state.start_run(999);
        // Unknown class leaves the run untouched
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_max_hp_powerup_also_heals() {
        let mut state = GameState::new(1);
        state.start_run(1);
        state.player.hp = 40.0;
        let max_before = state.player.max_hp;
        state.apply_powerup("max_hp", 25.0);
        assert_eq!(state.player.max_hp, max_before + 25.0);
        assert_eq!(state.player.hp, 65.0);
    }

    #[test]
    fn test_effect_sweep_removes_expired_in_reverse() {
        let mut enemy = Enemy::test_dummy();
        enemy.afflict(StatusEffect::slow(0.3, 0.01));
        enemy.afflict(StatusEffect::stun(5.0));
        enemy.afflict(StatusEffect::slow(0.6, 0.01));
        let mut events = Vec::new();
        enemy.update_effects(0.05, &mut events);
        // Both short slows swept, stun retained, order preserved
        assert_eq!(enemy.effects.len(), 1);
        assert_eq!(enemy.speed_multiplier, 0.0);
    }
}
