//! Who casts a spell and how strong it comes out.

use super::SpellDefinition;
use crate::battle::{BattleQuery, Obstacle};
use crate::bonus::{BonusBearer, BonusKind};
use crate::config::BattleConfig;
use crate::unit::{BattleSide, PlayerColor, Stack, Unit, UnitState};

/// How a spell came to be cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CastMode {
    /// A hero casting from the spell book.
    Hero,
    /// Reflected by a magic mirror.
    MagicMirror,
    /// A creature using its spell ability as its action.
    CreatureActive,
    /// A creature casting on its own at the start of a round.
    Enchanter,
    /// The spell replaces an attack.
    SpellLikeAttack,
    AfterAttack,
    BeforeAttack,
    /// An obstacle created by a spell was triggered.
    Passive,
}

impl CastMode {
    /// The cast is an action chosen by its caster rather than a side effect.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Hero | Self::CreatureActive | Self::Enchanter | Self::Passive)
    }
}

/// The source of a cast.
pub trait Caster {
    fn caster_owner(&self) -> PlayerColor;

    fn caster_side(&self) -> BattleSide;

    /// Unit doing the casting, for creature casters.
    fn caster_unit(&self) -> Option<&dyn Unit> {
        None
    }

    /// School mastery used for `spell`, 0 (none) to 3 (expert).
    fn school_level(&self, spell: &SpellDefinition) -> u8;

    /// Multiplier of the spell's base power.
    fn effect_power(&self, spell: &SpellDefinition) -> i32;

    /// Duration of timed effects in rounds.
    fn enchant_power(&self, spell: &SpellDefinition, config: &BattleConfig) -> i32;

    /// Fixed effect value replacing the spell formula; 0 uses the formula.
    fn effect_value(&self, _spell: &SpellDefinition) -> i64 {
        0
    }

    /// What one cast costs: casts for creatures, mana otherwise.
    fn spell_cost(&self, spell: &SpellDefinition, level: u8) -> i32 {
        if self.caster_unit().is_some() {
            1
        } else {
            spell.level(level).cost
        }
    }

    /// Final amount applied to `target` from the base amount.
    fn spell_bonus(&self, _spell: &SpellDefinition, base: i64, _target: &dyn Unit) -> i64 {
        base
    }
}

// ============================================================================
// Creature casters
// ============================================================================

fn creature_school_level(unit: &dyn Unit, spell: &SpellDefinition) -> u8 {
    let level = unit
        .value_of_subtype(BonusKind::Spellcaster, spell.id.0)
        .clamp(0, i32::from(BattleConfig::MAX_SCHOOL_LEVEL));
    u8::try_from(level).unwrap_or(0)
}

fn creature_effect_power(unit: &dyn Unit) -> i32 {
    unit.value_of_type(BonusKind::CreatureSpellPower) * unit.count() / 100
}

fn creature_enchant_power(unit: &dyn Unit, config: &BattleConfig) -> i32 {
    let power = unit.value_of_type(BonusKind::CreatureEnchantPower);
    if power <= 0 {
        config.default_enchant_power
    } else {
        power
    }
}

fn creature_effect_value(unit: &dyn Unit, spell: &SpellDefinition) -> i64 {
    i64::from(unit.value_of_subtype(BonusKind::SpecificSpellPower, spell.id.0))
        * i64::from(unit.count())
}

impl Caster for UnitState {
    fn caster_owner(&self) -> PlayerColor {
        self.unit_owner()
    }

    fn caster_side(&self) -> BattleSide {
        self.unit_side()
    }

    fn caster_unit(&self) -> Option<&dyn Unit> {
        Some(self)
    }

    fn school_level(&self, spell: &SpellDefinition) -> u8 {
        creature_school_level(self, spell)
    }

    fn effect_power(&self, _spell: &SpellDefinition) -> i32 {
        creature_effect_power(self)
    }

    fn enchant_power(&self, _spell: &SpellDefinition, config: &BattleConfig) -> i32 {
        creature_enchant_power(self, config)
    }

    fn effect_value(&self, spell: &SpellDefinition) -> i64 {
        creature_effect_value(self, spell)
    }
}

impl Caster for Stack {
    fn caster_owner(&self) -> PlayerColor {
        self.unit_owner()
    }

    fn caster_side(&self) -> BattleSide {
        self.unit_side()
    }

    fn caster_unit(&self) -> Option<&dyn Unit> {
        Some(self)
    }

    fn school_level(&self, spell: &SpellDefinition) -> u8 {
        creature_school_level(self, spell)
    }

    fn effect_power(&self, _spell: &SpellDefinition) -> i32 {
        creature_effect_power(self)
    }

    fn enchant_power(&self, _spell: &SpellDefinition, config: &BattleConfig) -> i32 {
        creature_enchant_power(self, config)
    }

    fn effect_value(&self, spell: &SpellDefinition) -> i64 {
        creature_effect_value(self, spell)
    }
}

// ============================================================================
// Other casters
// ============================================================================

/// A hero casting from the spell book. Skills are resolved by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeroCaster {
    pub owner: PlayerColor,
    pub side: BattleSide,
    pub school_level: u8,
    pub spell_power: i32,
}

impl Caster for HeroCaster {
    fn caster_owner(&self) -> PlayerColor {
        self.owner
    }

    fn caster_side(&self) -> BattleSide {
        self.side
    }

    fn school_level(&self, _spell: &SpellDefinition) -> u8 {
        self.school_level.min(BattleConfig::MAX_SCHOOL_LEVEL)
    }

    fn effect_power(&self, _spell: &SpellDefinition) -> i32 {
        self.spell_power
    }

    fn enchant_power(&self, _spell: &SpellDefinition, _config: &BattleConfig) -> i32 {
        self.spell_power
    }
}

/// Casts the spell stored in a triggered obstacle with the strength it was
/// placed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstacleCaster {
    pub owner: PlayerColor,
    pub side: BattleSide,
    pub spell_level: u8,
    pub caster_power: i32,
}

impl ObstacleCaster {
    /// `None` for obstacles that were not placed by a side.
    pub fn new(obstacle: &Obstacle, battle: &dyn BattleQuery) -> Option<Self> {
        let side = obstacle.caster_side?;
        Some(Self {
            owner: battle.side_player(side),
            side,
            spell_level: obstacle.spell_level,
            caster_power: obstacle.caster_power,
        })
    }
}

impl Caster for ObstacleCaster {
    fn caster_owner(&self) -> PlayerColor {
        self.owner
    }

    fn caster_side(&self) -> BattleSide {
        self.side
    }

    fn school_level(&self, _spell: &SpellDefinition) -> u8 {
        self.spell_level.min(BattleConfig::MAX_SCHOOL_LEVEL)
    }

    fn effect_power(&self, _spell: &SpellDefinition) -> i32 {
        self.caster_power
    }

    fn enchant_power(&self, _spell: &SpellDefinition, _config: &BattleConfig) -> i32 {
        self.caster_power
    }
}

/// A unit sending a reflected spell back with the original caster's strength.
pub struct MirroredCaster<'a> {
    pub reflector: &'a dyn Unit,
    pub original: &'a dyn Caster,
}

impl Caster for MirroredCaster<'_> {
    fn caster_owner(&self) -> PlayerColor {
        self.reflector.unit_owner()
    }

    fn caster_side(&self) -> BattleSide {
        self.reflector.unit_side()
    }

    fn school_level(&self, spell: &SpellDefinition) -> u8 {
        self.original.school_level(spell)
    }

    fn effect_power(&self, spell: &SpellDefinition) -> i32 {
        self.original.effect_power(spell)
    }

    fn enchant_power(&self, spell: &SpellDefinition, config: &BattleConfig) -> i32 {
        self.original.enchant_power(spell, config)
    }

    fn effect_value(&self, spell: &SpellDefinition) -> i64 {
        self.original.effect_value(spell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BattleHex;
    use crate::bonus::{Bonus, BonusList};
    use crate::spells::SpellId;
    use crate::unit::{CreatureId, SlotId, UnitId, UnitInfo};

    fn create_test_caster(count: i32, bonuses: &[Bonus]) -> UnitState {
        let info = UnitInfo {
            id: UnitId(3),
            side: BattleSide::Attacker,
            owner: PlayerColor(0),
            slot: SlotId(2),
            creature: CreatureId(13),
            creature_level: 7,
            double_wide: false,
            base_amount: count,
            max_health: 250,
        };
        let list: BonusList = bonuses.iter().cloned().collect();
        UnitState::new(info, list).at(BattleHex(40))
    }

    fn resurrection() -> SpellDefinition {
        SpellDefinition::new(SpellId::RESURRECTION, "Resurrection")
    }

    #[test]
    fn creature_strength_scales_with_count() {
        let caster = create_test_caster(
            4,
            &[
                Bonus::new(BonusKind::Spellcaster, 5).with_subtype(SpellId::RESURRECTION.0),
                Bonus::new(BonusKind::CreatureSpellPower, 150),
                Bonus::new(BonusKind::SpecificSpellPower, 100)
                    .with_subtype(SpellId::RESURRECTION.0),
            ],
        );
        let spell = resurrection();
        assert_eq!(caster.school_level(&spell), 3);
        assert_eq!(caster.effect_power(&spell), 6);
        assert_eq!(caster.effect_value(&spell), 400);
        assert!(caster.caster_unit().is_some());
    }

    #[test]
    fn enchant_power_falls_back_to_config() {
        let config = BattleConfig::default();
        let spell = resurrection();
        let plain = create_test_caster(1, &[]);
        assert_eq!(plain.enchant_power(&spell, &config), 3);
        assert_eq!(plain.school_level(&spell), 0);

        let enchanter = create_test_caster(1, &[Bonus::new(BonusKind::CreatureEnchantPower, 5)]);
        assert_eq!(enchanter.enchant_power(&spell, &config), 5);
    }

    #[test]
    fn mirrored_caster_keeps_original_strength() {
        let hero = HeroCaster {
            owner: PlayerColor(0),
            side: BattleSide::Attacker,
            school_level: 7,
            spell_power: 9,
        };
        let base = create_test_caster(1, &[]);
        let reflector = UnitState::new(
            UnitInfo {
                side: BattleSide::Defender,
                owner: PlayerColor(1),
                ..base.info().clone()
            },
            BonusList::new(),
        );
        let mirrored = MirroredCaster {
            reflector: &reflector,
            original: &hero,
        };
        let spell = resurrection();
        assert_eq!(mirrored.caster_owner(), PlayerColor(1));
        assert_eq!(mirrored.caster_side(), BattleSide::Defender);
        assert_eq!(mirrored.school_level(&spell), 3);
        assert_eq!(mirrored.effect_power(&spell), 9);
    }

    #[test]
    fn only_chosen_actions_are_active() {
        assert!(CastMode::Hero.is_active());
        assert!(!CastMode::MagicMirror.is_active());
        assert!(!CastMode::AfterAttack.is_active());
    }
}
