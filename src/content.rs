//! Static definition tables
//!
//! Weapon, class, enemy-archetype, and powerup definitions consumed by the
//! sim through id lookup. Lookups return `Option`: missing content is a
//! no-op for an in-progress run, never a crash.

use crate::sim::weapons::WeaponKind;

/// Base tunables for one weapon kind (before level/evolution scaling)
#[derive(Debug, Clone, Copy)]
pub struct WeaponDef {
    pub kind: WeaponKind,
    pub name: &'static str,
    pub base_damage: f32,
    pub base_cooldown: f32,
    /// Targeting range in world units
    pub range: f32,
    /// Area of effect / projectile radius
    pub area: f32,
    /// Projectile speed (unused for instant weapons)
    pub speed: f32,
    /// Lifetime of spawned objects
    pub duration: f32,
    /// Objects spawned per volley
    pub count: u32,
    /// Enemies a projectile may pass through before dying
    pub pierce: i32,
    /// Knockback impulse applied on hit
    pub knockback: f32,
}

const WEAPON_DEFS: &[WeaponDef] = &[
    WeaponDef {
        kind: WeaponKind::Bolt,
        name: "Ember Bolt",
        base_damage: 10.0,
        base_cooldown: 1.0,
        range: 350.0,
        area: 6.0,
        speed: 420.0,
        duration: 2.0,
        count: 1,
        pierce: 0,
        knockback: 60.0,
    },
    WeaponDef {
        kind: WeaponKind::Ray,
        name: "Prism Ray",
        base_damage: 14.0,
        base_cooldown: 1.6,
        range: 420.0,
        area: 10.0,
        speed: 0.0,
        duration: 0.15,
        count: 1,
        pierce: 0,
        knockback: 0.0,
    },
    WeaponDef {
        kind: WeaponKind::Slash,
        name: "Crescent Slash",
        base_damage: 16.0,
        base_cooldown: 1.2,
        range: 120.0,
        area: 90.0,
        speed: 0.0,
        duration: 0.2,
        count: 3,
        pierce: 0,
        knockback: 120.0,
    },
    WeaponDef {
        kind: WeaponKind::Disc,
        name: "Saw Disc",
        base_damage: 12.0,
        base_cooldown: 1.8,
        range: 320.0,
        area: 9.0,
        speed: 360.0,
        duration: 4.0,
        count: 1,
        pierce: 0,
        knockback: 40.0,
    },
    WeaponDef {
        kind: WeaponKind::Chain,
        name: "Arc Lash",
        base_damage: 9.0,
        base_cooldown: 2.2,
        range: 380.0,
        area: 7.0,
        speed: 560.0,
        duration: 3.0,
        count: 1,
        pierce: 0,
        knockback: 20.0,
    },
    WeaponDef {
        kind: WeaponKind::Orbit,
        name: "Cinder Wheel",
        base_damage: 8.0,
        base_cooldown: 4.0,
        range: 0.0,
        area: 10.0,
        speed: 3.0,
        duration: 3.0,
        count: 2,
        pierce: i32::MAX,
        knockback: 30.0,
    },
    WeaponDef {
        kind: WeaponKind::Lob,
        name: "Pitch Flask",
        base_damage: 4.0,
        base_cooldown: 2.6,
        range: 300.0,
        area: 70.0,
        speed: 0.0,
        duration: 3.0,
        count: 1,
        pierce: 0,
        knockback: 0.0,
    },
    WeaponDef {
        kind: WeaponKind::Nova,
        name: "Mind Spike",
        base_damage: 24.0,
        base_cooldown: 3.2,
        range: 360.0,
        area: 80.0,
        speed: 0.0,
        duration: 0.0,
        count: 1,
        pierce: 0,
        knockback: 0.0,
    },
];

/// Look up a weapon definition by kind
pub fn weapon_def(kind: WeaponKind) -> &'static WeaponDef {
    // The table is exhaustive over WeaponKind; the scan is tiny.
    WEAPON_DEFS
        .iter()
        .find(|d| d.kind == kind)
        .expect("weapon table covers every kind")
}

/// Look up a weapon kind by its UI-facing id string
pub fn weapon_by_id(id: &str) -> Option<WeaponKind> {
    match id {
        "bolt" => Some(WeaponKind::Bolt),
        "ray" => Some(WeaponKind::Ray),
        "slash" => Some(WeaponKind::Slash),
        "disc" => Some(WeaponKind::Disc),
        "chain" => Some(WeaponKind::Chain),
        "orbit" => Some(WeaponKind::Orbit),
        "lob" => Some(WeaponKind::Lob),
        "nova" => Some(WeaponKind::Nova),
        _ => None,
    }
}

/// A selectable starting class: initial weapon plus stat bonuses
#[derive(Debug, Clone, Copy)]
pub struct ClassDef {
    pub name: &'static str,
    pub weapon: WeaponKind,
    pub might_bonus: f32,
    pub armor_bonus: f32,
    pub move_speed_bonus: f32,
    pub max_hp_bonus: f32,
}

pub const CLASSES: &[ClassDef] = &[
    ClassDef {
        name: "Knight",
        weapon: WeaponKind::Slash,
        might_bonus: 0.0,
        armor_bonus: 2.0,
        move_speed_bonus: 0.0,
        max_hp_bonus: 20.0,
    },
    ClassDef {
        name: "Arcanist",
        weapon: WeaponKind::Bolt,
        might_bonus: 0.15,
        armor_bonus: 0.0,
        move_speed_bonus: 0.0,
        max_hp_bonus: 0.0,
    },
    ClassDef {
        name: "Ranger",
        weapon: WeaponKind::Disc,
        might_bonus: 0.0,
        armor_bonus: 0.0,
        move_speed_bonus: 30.0,
        max_hp_bonus: 0.0,
    },
    ClassDef {
        name: "Stormcaller",
        weapon: WeaponKind::Chain,
        might_bonus: 0.1,
        armor_bonus: 0.0,
        move_speed_bonus: 10.0,
        max_hp_bonus: -10.0,
    },
];

pub fn class_def(index: usize) -> Option<&'static ClassDef> {
    CLASSES.get(index)
}

/// Base stats for one enemy type, unlocked by elapsed run time
#[derive(Debug, Clone, Copy)]
pub struct EnemyArchetype {
    pub glyph: char,
    pub base_hp: f32,
    pub speed: f32,
    /// Contact damage per second while overlapping the player
    pub damage: f32,
    pub xp: u32,
    pub radius: f32,
    /// Run time (seconds) at which this archetype starts spawning
    pub unlock_time: f32,
}

pub const ARCHETYPES: &[EnemyArchetype] = &[
    EnemyArchetype {
        glyph: '🦇',
        base_hp: 8.0,
        speed: 70.0,
        damage: 6.0,
        xp: 1,
        radius: 10.0,
        unlock_time: 0.0,
    },
    EnemyArchetype {
        glyph: '🧟',
        base_hp: 20.0,
        speed: 50.0,
        damage: 10.0,
        xp: 3,
        radius: 13.0,
        unlock_time: 60.0,
    },
    EnemyArchetype {
        glyph: '🐺',
        base_hp: 35.0,
        speed: 95.0,
        damage: 12.0,
        xp: 8,
        radius: 12.0,
        unlock_time: 150.0,
    },
    EnemyArchetype {
        glyph: '👹',
        base_hp: 90.0,
        speed: 45.0,
        damage: 20.0,
        xp: 25,
        radius: 18.0,
        unlock_time: 300.0,
    },
    EnemyArchetype {
        glyph: '🐲',
        base_hp: 220.0,
        speed: 60.0,
        damage: 30.0,
        xp: 60,
        radius: 22.0,
        unlock_time: 480.0,
    },
];

/// Archetypes available at the given elapsed run time
pub fn unlocked_archetypes(elapsed: f32) -> &'static [EnemyArchetype] {
    let n = ARCHETYPES
        .iter()
        .take_while(|a| a.unlock_time <= elapsed)
        .count();
    &ARCHETYPES[..n.max(1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_table_exhaustive() {
        for kind in [
            WeaponKind::Bolt,
            WeaponKind::Ray,
            WeaponKind::Slash,
            WeaponKind::Disc,
            WeaponKind::Chain,
            WeaponKind::Orbit,
            WeaponKind::Lob,
            WeaponKind::Nova,
        ] {
            assert_eq!(weapon_def(kind).kind, kind);
        }
    }

    #[test]
    fn test_weapon_by_id_unknown_is_none() {
        assert!(weapon_by_id("whip").is_none());
        assert_eq!(weapon_by_id("disc"), Some(WeaponKind::Disc));
    }

    #[test]
    fn test_archetype_unlocks() {
        assert_eq!(unlocked_archetypes(0.0).len(), 1);
        assert_eq!(unlocked_archetypes(70.0).len(), 2);
        assert_eq!(unlocked_archetypes(9999.0).len(), ARCHETYPES.len());
    }
}
