//! Built-in combat spells.
//!
//! Hosts usually load spell data from files; these definitions cover the
//! spells the effect framework was built around and back the tests.

use super::effects::EffectConfig;
use super::{EffectEntry, SpellDefinition, SpellId, SpellRange, SpellSchool};
use crate::battle::ObstacleKind;
use crate::bonus::{Bonus, BonusDuration, BonusKind};
use crate::unit::{HealLevel, HealPower};

/// Animation of an exploding land mine.
const LAND_MINE_ANIMATION: u32 = 82;

const ALL_SCHOOLS: [SpellSchool; 4] = [
    SpellSchool::Air,
    SpellSchool::Fire,
    SpellSchool::Water,
    SpellSchool::Earth,
];

fn timed(bonuses: Vec<Bonus>, cumulative: bool) -> EffectConfig {
    EffectConfig::Timed {
        bonuses,
        cumulative,
    }
}

/// Adds a different effect to every level.
fn per_level(spell: SpellDefinition, make: impl Fn(u8) -> EffectEntry) -> SpellDefinition {
    (0..4).fold(spell, |spell, level| {
        let entry = make(level);
        spell.with_level(level, |info| info.effects.push(entry))
    })
}

/// Mass version at expert level.
fn mass_at_expert(spell: SpellDefinition) -> SpellDefinition {
    spell.with_level(3, |level| {
        level.range = SpellRange::All;
        level.smart = true;
    })
}

// ============================================================================
// Damage
// ============================================================================

fn damage_spells() -> Vec<SpellDefinition> {
    vec![
        SpellDefinition::new(SpellId::MAGIC_ARROW, "Magic Arrow")
            .negative()
            .with_schools(&ALL_SCHOOLS)
            .with_power(10)
            .with_level_values([10, 10, 20, 30], [5, 5, 4, 4])
            .with_effect(EffectConfig::Damage { animation: None }),
        SpellDefinition::new(SpellId::LIGHTNING_BOLT, "Lightning Bolt")
            .negative()
            .with_schools(&[SpellSchool::Air])
            .with_circle(2)
            .with_power(25)
            .with_level_values([10, 10, 20, 50], [10, 10, 8, 8])
            .with_effect(EffectConfig::Damage { animation: None }),
        SpellDefinition::new(SpellId::CHAIN_LIGHTNING, "Chain Lightning")
            .negative()
            .with_schools(&[SpellSchool::Air])
            .with_circle(4)
            .with_power(40)
            .with_level_values([25, 25, 50, 100], [24, 24, 20, 20])
            .with_effect(EffectConfig::ChainDamage),
    ]
}

// ============================================================================
// Healing and raising
// ============================================================================

fn healing_spells() -> Vec<SpellDefinition> {
    let cure = SpellDefinition::new(SpellId::CURE, "Cure")
        .positive()
        .with_schools(&[SpellSchool::Water])
        .with_power(5)
        .with_level_values([10, 10, 20, 30], [6, 6, 5, 5])
        .with_effect(EffectConfig::Cure);

    let resurrection = per_level(
        SpellDefinition::new(SpellId::RESURRECTION, "Resurrection")
            .positive()
            .with_schools(&[SpellSchool::Earth])
            .with_circle(4)
            .with_power(50)
            .with_level_values([40, 40, 80, 160], [20, 20, 16, 16]),
        |level| {
            // Raised creatures fade after the battle below advanced level.
            let heal_power = if level < 2 {
                HealPower::OneBattle
            } else {
                HealPower::Permanent
            };
            EffectEntry::new(EffectConfig::Heal {
                heal_level: HealLevel::Resurrect,
                heal_power,
                min_full_units: 1,
            })
        },
    );

    let animate_dead = SpellDefinition::new(SpellId::ANIMATE_DEAD, "Animate Dead")
        .positive()
        .with_schools(&[SpellSchool::Earth])
        .with_circle(3)
        .with_power(50)
        .with_level_values([30, 30, 60, 160], [15, 15, 12, 12])
        .with_effect(EffectConfig::Heal {
            heal_level: HealLevel::Resurrect,
            heal_power: HealPower::Permanent,
            min_full_units: 1,
        });

    let sacrifice = SpellDefinition::new(SpellId::SACRIFICE, "Sacrifice")
        .positive()
        .with_schools(&[SpellSchool::Fire])
        .with_circle(5)
        .with_power(3)
        .with_level_values([3, 3, 6, 10], [25, 25, 20, 20])
        .with_effect(EffectConfig::Sacrifice);

    vec![mass_at_expert(cure), resurrection, animate_dead, sacrifice]
}

// ============================================================================
// Dispelling and protection
// ============================================================================

fn protection_spells() -> Vec<SpellDefinition> {
    let dispel = per_level(
        SpellDefinition::new(SpellId::DISPEL, "Dispel")
            .positive()
            .with_schools(&[SpellSchool::Water])
            .with_level_values([0, 0, 0, 0], [5, 5, 4, 4])
            .with_level(3, |level| level.range = SpellRange::All),
        |level| {
            let expert = level >= 3;
            EffectEntry::new(EffectConfig::Dispel {
                positive: expert,
                negative: true,
                neutral: true,
                remove_spell_obstacles: expert,
            })
        },
    );

    let anti_magic = per_level(
        SpellDefinition::new(SpellId::ANTI_MAGIC, "Anti-Magic")
            .positive()
            .with_schools(&[SpellSchool::Earth])
            .with_circle(3)
            .with_level_values([0, 0, 0, 0], [15, 15, 12, 12]),
        |level| {
            let immunity = match level {
                0 | 1 => 3,
                2 => 4,
                _ => 5,
            };
            EffectEntry::new(EffectConfig::Antimagic {
                bonuses: vec![Bonus::new(BonusKind::LevelSpellImmunity, immunity)],
            })
        },
    );

    let magic_mirror = per_level(
        SpellDefinition::new(SpellId::MAGIC_MIRROR, "Magic Mirror")
            .positive()
            .with_schools(&[SpellSchool::Air])
            .with_circle(4)
            .with_level_values([20, 20, 30, 40], [25, 25, 20, 20]),
        |level| {
            let chance = [20, 20, 30, 40][usize::from(level)];
            EffectEntry::new(timed(vec![Bonus::new(BonusKind::MagicMirror, chance)], false))
        },
    );

    vec![dispel, anti_magic, magic_mirror]
}

// ============================================================================
// Timed buffs and curses
// ============================================================================

fn timed_spells() -> Vec<SpellDefinition> {
    let haste = per_level(
        SpellDefinition::new(SpellId::HASTE, "Haste")
            .positive()
            .with_schools(&[SpellSchool::Air])
            .with_counters(&[SpellId::SLOW])
            .with_level_values([3, 3, 5, 5], [6, 6, 5, 5]),
        |level| {
            let speed = if level < 2 { 3 } else { 5 };
            EffectEntry::new(timed(vec![Bonus::new(BonusKind::StacksSpeed, speed)], false))
        },
    );

    let slow = SpellDefinition::new(SpellId::SLOW, "Slow")
        .negative()
        .with_schools(&[SpellSchool::Earth])
        .with_counters(&[SpellId::HASTE])
        .with_level_values([0, 0, 0, 0], [6, 6, 5, 5])
        .with_effect(timed(vec![Bonus::new(BonusKind::StacksSpeed, -2)], false));

    let disrupting_ray = per_level(
        SpellDefinition::new(SpellId::DISRUPTING_RAY, "Disrupting Ray")
            .negative()
            .with_schools(&[SpellSchool::Air])
            .with_circle(2)
            .with_level_values([0, 0, 0, 0], [10, 10, 8, 8]),
        |level| {
            let defence = [-3, -3, -4, -5][usize::from(level)];
            let ray = Bonus::new(BonusKind::PrimarySkill, defence)
                .with_subtype(1)
                .with_duration(BonusDuration::OneBattle);
            EffectEntry::new(timed(vec![ray], true))
        },
    );

    // Bless and curse pin the damage roll; the mass version may find nobody.
    let bless = SpellDefinition::new(SpellId::BLESS, "Bless")
        .positive()
        .with_schools(&[SpellSchool::Water])
        .with_counters(&[SpellId::CURSE])
        .with_level_values([0, 0, 0, 0], [5, 5, 4, 4])
        .with_effect(timed(vec![Bonus::new(BonusKind::CreatureDamage, 0).with_subtype(2)], false));
    let curse = SpellDefinition::new(SpellId::CURSE, "Curse")
        .negative()
        .with_schools(&[SpellSchool::Fire])
        .with_counters(&[SpellId::BLESS])
        .with_level_values([0, 0, 0, 0], [6, 6, 5, 5])
        .with_effect(timed(vec![Bonus::new(BonusKind::CreatureDamage, 0).with_subtype(1)], false));

    vec![
        mass_at_expert(haste),
        mass_at_expert(slow),
        disrupting_ray,
        mass_at_expert(bless),
        mass_at_expert(curse),
    ]
}

// ============================================================================
// Obstacles and siege
// ============================================================================

fn battlefield_spells() -> Vec<SpellDefinition> {
    let clear = |spell: SpellDefinition| {
        (0..4).fold(spell, |spell, level| {
            spell.with_level(level, |info| info.clear_affected = true)
        })
    };

    let quicksand = SpellDefinition::new(SpellId::QUICKSAND, "Quicksand")
        .with_schools(&[SpellSchool::Earth])
        .with_circle(2)
        .with_level_values([0, 0, 0, 0], [8, 8, 6, 6])
        .with_effect(EffectConfig::PatchObstacle {
            kind: ObstacleKind::Quicksand,
            hidden: true,
        });

    let land_mine = SpellDefinition::new(SpellId::LAND_MINE, "Land Mine")
        .negative()
        .with_schools(&[SpellSchool::Fire])
        .with_circle(3)
        .with_power(10)
        .with_level_values([25, 25, 50, 100], [18, 18, 15, 15])
        .with_effect(EffectConfig::PatchObstacle {
            kind: ObstacleKind::LandMine,
            hidden: true,
        })
        .with_indirect_effect(EffectConfig::Damage {
            animation: Some(LAND_MINE_ANIMATION),
        });

    let fire_wall = SpellDefinition::new(SpellId::FIRE_WALL, "Fire Wall")
        .negative()
        .with_schools(&[SpellSchool::Fire])
        .with_circle(2)
        .with_power(10)
        .with_level_values([10, 10, 20, 50], [8, 8, 6, 6])
        .with_effect(EffectConfig::Wall {
            kind: ObstacleKind::FireWall,
            turns: 2,
        })
        .with_indirect_effect(EffectConfig::Damage { animation: None });

    let force_field = SpellDefinition::new(SpellId::FORCE_FIELD, "Force Field")
        .with_schools(&[SpellSchool::Earth])
        .with_circle(3)
        .with_level_values([0, 0, 0, 0], [12, 12, 9, 9])
        .with_effect(EffectConfig::Wall {
            kind: ObstacleKind::ForceField,
            turns: 2,
        });

    let remove_obstacle = SpellDefinition::new(SpellId::REMOVE_OBSTACLE, "Remove Obstacle")
        .with_schools(&[SpellSchool::Water])
        .with_circle(2)
        .with_level_values([0, 0, 0, 0], [7, 7, 5, 5])
        .with_effect(EffectConfig::RemoveObstacle);

    let earthquake = SpellDefinition::new(SpellId::EARTHQUAKE, "Earthquake")
        .with_schools(&[SpellSchool::Earth])
        .with_circle(3)
        .with_level_values([0, 0, 0, 0], [20, 20, 17, 17])
        .with_effect(EffectConfig::Earthquake);

    vec![
        quicksand,
        land_mine,
        clear(fire_wall),
        clear(force_field),
        remove_obstacle,
        earthquake,
    ]
}

/// Every built-in spell definition.
pub fn builtin_spells() -> Vec<SpellDefinition> {
    let mut spells = damage_spells();
    spells.extend(healing_spells());
    spells.extend(protection_spells());
    spells.extend(timed_spells());
    spells.extend(battlefield_spells());
    spells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let spells = builtin_spells();
        let mut ids: Vec<SpellId> = spells.iter().map(|spell| spell.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), spells.len());
    }

    #[test]
    fn resurrection_fades_below_advanced() {
        let spells = builtin_spells();
        let resurrection = spells
            .iter()
            .find(|spell| spell.id == SpellId::RESURRECTION)
            .unwrap();
        let power_at = |level: u8| match &resurrection.level(level).effects[0].config {
            EffectConfig::Heal { heal_power, .. } => *heal_power,
            other => panic!("unexpected effect {other:?}"),
        };
        assert_eq!(power_at(1), HealPower::OneBattle);
        assert_eq!(power_at(2), HealPower::Permanent);
    }

    #[test]
    fn only_expert_dispel_clears_obstacles() {
        let spells = builtin_spells();
        let dispel = spells.iter().find(|spell| spell.id == SpellId::DISPEL).unwrap();
        let clears = |level: u8| {
            matches!(
                dispel.level(level).effects[0].config,
                EffectConfig::Dispel {
                    remove_spell_obstacles: true,
                    ..
                }
            )
        };
        assert!(!clears(2));
        assert!(clears(3));
        assert_eq!(dispel.level(0).effects.len(), 1);
    }
}
