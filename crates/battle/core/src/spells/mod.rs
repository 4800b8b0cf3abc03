//! Spell effect framework.
//!
//! A cast runs through the [`Mechanics`] façade:
//!
//! 1. **Applicability**: [`Mechanics::can_be_cast`] and
//!    [`Mechanics::can_be_cast_at`] ask every configured effect whether it has
//!    something to do.
//! 2. **Targeting**: the aim point is widened to the level's range, then each
//!    effect transforms and filters it into its own target.
//! 3. **Resistance**: every unit touched by the cast rolls magic resistance
//!    (negative spells) and magic mirror (negative single-target spells).
//! 4. **Apply**: effects write through an [`ApplyContext`], either replicated
//!    to every observer or straight into a detached battle.
//!
//! Spell and effect data live in a [`SpellCatalog`] passed explicitly to every
//! cast.

mod backend;
mod builtin;
mod caster;
mod catalog;
mod definition;
pub mod effects;
mod mechanics;
mod problem;
mod target;

pub use backend::{ApplyBackend, ApplyContext, ApplyStrategy};
pub use builtin::builtin_spells;
pub use caster::{CastMode, Caster, HeroCaster, MirroredCaster, ObstacleCaster};
pub use catalog::{CatalogEntry, CompiledEffect, SpellCatalog};
pub use definition::{EffectEntry, SpellDefinition, SpellLevel, SpellRange};
pub use effects::{Effect, EffectConfig, EffectRegistry};
pub use mechanics::{CastOutcome, CastPlan, Mechanics, trigger_obstacle};
pub use problem::{CastError, EffectConfigError, Problem, ProblemKind};
pub use target::{Destination, Target};

use std::fmt;

/// Spell identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SpellId(pub i32);

impl SpellId {
    pub const QUICKSAND: SpellId = SpellId(10);
    pub const LAND_MINE: SpellId = SpellId(11);
    pub const FORCE_FIELD: SpellId = SpellId(12);
    pub const FIRE_WALL: SpellId = SpellId(13);
    pub const EARTHQUAKE: SpellId = SpellId(14);
    pub const MAGIC_ARROW: SpellId = SpellId(15);
    pub const LIGHTNING_BOLT: SpellId = SpellId(17);
    pub const CHAIN_LIGHTNING: SpellId = SpellId(19);
    pub const ANTI_MAGIC: SpellId = SpellId(34);
    pub const DISPEL: SpellId = SpellId(35);
    pub const MAGIC_MIRROR: SpellId = SpellId(36);
    pub const CURE: SpellId = SpellId(37);
    pub const RESURRECTION: SpellId = SpellId(38);
    pub const ANIMATE_DEAD: SpellId = SpellId(39);
    pub const SACRIFICE: SpellId = SpellId(40);
    pub const BLESS: SpellId = SpellId(41);
    pub const CURSE: SpellId = SpellId(42);
    pub const HASTE: SpellId = SpellId(53);
    pub const SLOW: SpellId = SpellId(54);
    pub const DISRUPTING_RAY: SpellId = SpellId(62);
    pub const REMOVE_OBSTACLE: SpellId = SpellId(64);
    pub const CLONE: SpellId = SpellId(65);
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spell#{}", self.0)
    }
}

/// Magic school.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SpellSchool {
    Air,
    Fire,
    Water,
    Earth,
}

impl SpellSchool {
    /// Bonus subtype naming this school.
    pub fn index(self) -> i32 {
        match self {
            Self::Air => 0,
            Self::Fire => 1,
            Self::Water => 2,
            Self::Earth => 3,
        }
    }
}

/// Whether a spell helps, harms, or neither.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Positiveness {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Positiveness {
    /// Owner filter: allies for positive spells, enemies for negative ones.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::Positive => Some(true),
            Self::Negative => Some(false),
            Self::Neutral => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positiveness_maps_to_owner_filter() {
        assert_eq!(Positiveness::Positive.as_option(), Some(true));
        assert_eq!(Positiveness::Negative.as_option(), Some(false));
        assert_eq!(Positiveness::Neutral.as_option(), None);
    }

    #[test]
    fn school_indices_are_distinct() {
        use strum::IntoEnumIterator;
        let indices: Vec<i32> = SpellSchool::iter().map(SpellSchool::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(SpellId::CURE.to_string(), "spell#37");
    }
}
