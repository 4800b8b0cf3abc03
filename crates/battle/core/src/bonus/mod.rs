//! Bonuses carried by units.
//!
//! Aggregating bonuses from creatures, heroes, artifacts and terrain is the job
//! of the host. Units receive the resolved list and every combat rule reads it
//! through [`BonusBearer`] queries.

mod bearer;

pub use bearer::{BonusBearer, BonusList};

use crate::spells::SpellId;

/// Subtype value meaning "no subtype".
pub const NO_SUBTYPE: i32 = -1;

/// Kinds of bonuses the combat rules understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BonusKind {
    /// Ammunition for ranged attacks.
    Shots,
    /// Spell casts of a creature caster.
    Casts,
    /// Can shoot.
    Shooter,
    /// Extra retaliations per round.
    AdditionalRetaliation,
    UnlimitedRetaliations,
    NoRetaliation,
    /// Initiative.
    StacksSpeed,
    /// Skips its turns while active.
    NotActive,
    SiegeWeapon,
    /// Shoots even when an enemy stands adjacent.
    FreeShooting,
    /// Set by the host on creatures native to the battlefield terrain.
    NativeTerrain,
    /// Controlled by the opposite side.
    Hypnotized,
    /// Percentage chance of rebirth; subtype 1 guarantees at least one unit.
    Rebirth,
    /// Forced to attack the nearest creature.
    AttacksNearestCreature,
    /// Immunity to the spell in the subtype; additional info 1 marks it absolute.
    SpellImmunity,
    /// Immunity to spells up to the value's spell level.
    LevelSpellImmunity,
    NegativeEffectsImmunity,
    MagicResistance,
    /// Resistance granted to adjacent allies.
    SpellResistanceAura,
    /// Percentage chance of reflecting a negative spell.
    MagicMirror,
    /// School mastery of a creature caster for the spell in the subtype.
    Spellcaster,
    CreatureSpellPower,
    CreatureEnchantPower,
    SpecificSpellPower,
    Enchanter,
    /// Percentage reduction of spell damage; subtype is a school, -1 for all.
    SpellDamageReduction,
    /// Percentage extra damage taken from the spell in the subtype.
    MoreDamageFromSpell,
    /// Subtype 1 min, 2 max, 0 both.
    CreatureDamage,
    /// Subtype 0 attack, 1 defence.
    PrimarySkill,
    StackHealth,
    Flying,
    /// Extra damage percentage per hex travelled before a melee attack.
    Jousting,
}

/// Where a bonus comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BonusSource {
    Creature,
    Hero,
    Artifact,
    Terrain,
    SpellEffect(SpellId),
    Other,
}

impl BonusSource {
    pub fn spell(self) -> Option<SpellId> {
        match self {
            Self::SpellEffect(spell) => Some(spell),
            _ => None,
        }
    }
}

/// How long a bonus lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BonusDuration {
    Permanent,
    OneBattle,
    /// Expires after the given number of rounds.
    Turns(u16),
}

/// A resolved bonus on a unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bonus {
    pub kind: BonusKind,
    pub subtype: i32,
    pub value: i32,
    pub source: BonusSource,
    pub duration: BonusDuration,
    pub additional_info: i32,
}

impl Bonus {
    pub fn new(kind: BonusKind, value: i32) -> Self {
        Self {
            kind,
            subtype: NO_SUBTYPE,
            value,
            source: BonusSource::Creature,
            duration: BonusDuration::Permanent,
            additional_info: 0,
        }
    }

    #[must_use]
    pub fn with_subtype(mut self, subtype: i32) -> Self {
        self.subtype = subtype;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: BonusSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: BonusDuration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_additional_info(mut self, info: i32) -> Self {
        self.additional_info = info;
        self
    }

    /// Whether the bonus is still in effect `turn` rounds from now.
    pub fn active_at(&self, turn: i32) -> bool {
        match self.duration {
            BonusDuration::Turns(remaining) => i32::from(remaining) > turn,
            _ => true,
        }
    }

    pub fn from_spell(&self) -> Option<SpellId> {
        self.source.spell()
    }
}
