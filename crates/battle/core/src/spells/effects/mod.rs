//! Data-configured spell effects.
//!
//! Every effect is a stateless policy built once from its [`EffectConfig`]
//! and shared by all casts of the spell. Effects are looked up by name in an
//! [`EffectRegistry`], so spell data can refer to them as `core:heal`,
//! `core:dispel` and so on.

mod damage;
mod dispel;
mod earthquake;
mod heal;
mod obstacle;
mod sacrifice;
mod timed;

pub use damage::{ChainDamage, Damage};
pub use dispel::{Cure, Dispel};
pub use earthquake::Earthquake;
pub use heal::Heal;
pub use obstacle::{PatchObstacle, RemoveObstacle, Wall, wall_footprint};
pub use sacrifice::Sacrifice;
pub use timed::{Antimagic, Timed};

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use super::{ApplyContext, Destination, EffectConfigError, Mechanics, Problem, Target};
use crate::battle::{BattleHex, BattleQuery, ObstacleKind};
use crate::bonus::Bonus;
use crate::unit::{HealLevel, HealPower, Unit, UnitId};

// ============================================================================
// Configuration
// ============================================================================

/// Parameters of one effect, tagged by its registered name.
#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum EffectConfig {
    #[strum(serialize = "core:heal")]
    #[cfg_attr(feature = "serde", serde(rename = "core:heal", rename_all = "camelCase"))]
    Heal {
        #[cfg_attr(feature = "serde", serde(default))]
        heal_level: HealLevel,
        #[cfg_attr(feature = "serde", serde(default))]
        heal_power: HealPower,
        /// Whole creatures the heal must be able to raise.
        #[cfg_attr(feature = "serde", serde(default))]
        min_full_units: i32,
    },

    #[strum(serialize = "core:dispel")]
    #[cfg_attr(feature = "serde", serde(rename = "core:dispel", rename_all = "camelCase"))]
    Dispel {
        #[cfg_attr(feature = "serde", serde(default))]
        positive: bool,
        #[cfg_attr(feature = "serde", serde(default))]
        negative: bool,
        #[cfg_attr(feature = "serde", serde(default))]
        neutral: bool,
        /// Also clears fire walls, force fields and land mines.
        #[cfg_attr(feature = "serde", serde(default))]
        remove_spell_obstacles: bool,
    },

    #[strum(serialize = "core:damage")]
    #[cfg_attr(feature = "serde", serde(rename = "core:damage"))]
    Damage {
        /// Animation played on every damaged unit.
        #[cfg_attr(feature = "serde", serde(default))]
        animation: Option<u32>,
    },

    #[strum(serialize = "core:chainDamage")]
    #[cfg_attr(feature = "serde", serde(rename = "core:chainDamage"))]
    ChainDamage,

    #[strum(serialize = "core:patchObstacle")]
    #[cfg_attr(feature = "serde", serde(rename = "core:patchObstacle"))]
    PatchObstacle {
        kind: ObstacleKind,
        /// The enemy side cannot see the patches.
        #[cfg_attr(feature = "serde", serde(default))]
        hidden: bool,
    },

    #[strum(serialize = "core:wall")]
    #[cfg_attr(feature = "serde", serde(rename = "core:wall"))]
    Wall {
        kind: ObstacleKind,
        /// Rounds the wall lasts.
        turns: i32,
    },

    #[strum(serialize = "core:removeObstacle")]
    #[cfg_attr(feature = "serde", serde(rename = "core:removeObstacle"))]
    RemoveObstacle,

    #[strum(serialize = "core:catapult")]
    #[cfg_attr(feature = "serde", serde(rename = "core:catapult"))]
    Earthquake,

    #[strum(serialize = "core:sacrifice")]
    #[cfg_attr(feature = "serde", serde(rename = "core:sacrifice"))]
    Sacrifice,

    #[strum(serialize = "core:cure")]
    #[cfg_attr(feature = "serde", serde(rename = "core:cure"))]
    Cure,

    #[strum(serialize = "core:antimagic")]
    #[cfg_attr(feature = "serde", serde(rename = "core:antimagic"))]
    Antimagic {
        /// Bonuses granted after the other effects are stripped.
        #[cfg_attr(feature = "serde", serde(default))]
        bonuses: Vec<Bonus>,
    },

    #[strum(serialize = "core:timed")]
    #[cfg_attr(feature = "serde", serde(rename = "core:timed"))]
    Timed {
        bonuses: Vec<Bonus>,
        /// Stacks with earlier casts instead of replacing them.
        #[cfg_attr(feature = "serde", serde(default))]
        cumulative: bool,
    },
}

impl EffectConfig {
    /// Registered name of the effect this config builds.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

// ============================================================================
// Effect trait
// ============================================================================

/// A spell effect.
///
/// Checks take the battle read-only and must not change anything; only
/// [`Effect::apply`] writes, through its [`ApplyContext`].
pub trait Effect: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Whether the effect has anything to do in this battle at all.
    fn applicable(&self, _m: &Mechanics<'_>, _battle: &dyn BattleQuery) -> Result<(), Problem> {
        Ok(())
    }

    /// Whether the effect has anything to do for `aim`, given the target its
    /// own transform produced.
    fn applicable_at(
        &self,
        m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        _aim: &Target,
        target: &Target,
    ) -> Result<(), Problem> {
        if target.is_empty() {
            return Err(Problem::no_target(m.spell_id(), "nothing in range"));
        }
        Ok(())
    }

    /// Turns the level-scaled spell target into this effect's target.
    fn transform_target(
        &self,
        _m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        _aim: &Target,
        spell_target: &Target,
    ) -> Target {
        spell_target.clone()
    }

    /// Keeps the destinations this effect can act on.
    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target;

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target);
}

// ============================================================================
// Shared targeting
// ============================================================================

/// Refuses casts that are a side effect of attacking or reflecting.
pub(crate) fn require_active_mode(m: &Mechanics<'_>) -> Result<(), Problem> {
    if m.mode().is_active() {
        Ok(())
    } else {
        warn!(spell = %m.spell_id(), mode = %m.mode(), "invalid spell cast attempt");
        Err(Problem::invalid(m.spell_id(), "cast mode not supported"))
    }
}

/// Location effects accept bare, valid hexes.
pub(crate) fn filter_locations(target: &Target) -> Target {
    target.iter().copied().filter(Destination::is_location).collect()
}

/// Units covering the hexes of `spell_target`, each once, in target order.
///
/// `accept` decides which units an effect can act on. In smart casts only
/// units matching the spell's polarity are picked.
pub(crate) fn units_in_target(
    m: &Mechanics<'_>,
    battle: &dyn BattleQuery,
    spell_target: &Target,
    accept: &dyn Fn(&dyn Unit) -> bool,
) -> Target {
    let smart = m.level_info().smart;
    let mut seen: Vec<UnitId> = Vec::new();
    let mut result = Target::new();
    for destination in spell_target {
        if !destination.hex.is_valid() {
            continue;
        }
        let hex = destination.hex;
        for unit in battle.units_if(&|unit| unit.covers(hex)) {
            if seen.contains(&unit.unit_id()) || !accept(unit) {
                continue;
            }
            if smart && !m.owner_matches(battle, unit) {
                continue;
            }
            seen.push(unit.unit_id());
            result.push(Destination::on_unit(unit.unit_id(), unit.position()));
        }
    }
    result
}

/// Keeps destinations naming a unit that `accept` still takes.
pub(crate) fn filter_units(
    battle: &dyn BattleQuery,
    target: &Target,
    accept: &dyn Fn(&dyn Unit) -> bool,
) -> Target {
    target
        .iter()
        .copied()
        .filter(|destination| {
            destination
                .unit
                .and_then(|id| battle.unit(id))
                .is_some_and(|unit| accept(unit))
        })
        .collect()
}

/// Fails with "no appropriate target" unless some unit on the field could be
/// affected by a cast of this spell.
pub(crate) fn require_any_unit(
    m: &Mechanics<'_>,
    battle: &dyn BattleQuery,
    accept: &dyn Fn(&dyn Unit) -> bool,
) -> Result<(), Problem> {
    let found = !battle
        .units_if(&|unit| m.owner_matches(battle, unit) && accept(unit))
        .is_empty();
    if found {
        Ok(())
    } else {
        Err(Problem::no_target(m.spell_id(), "no unit can be affected"))
    }
}

/// Units named by `target`, skipping ids no longer in the battle.
pub(crate) fn target_units<'b>(battle: &'b dyn BattleQuery, target: &Target) -> Vec<&'b dyn Unit> {
    target
        .iter()
        .filter_map(|destination| destination.unit.and_then(|id| battle.unit(id)))
        .collect()
}

/// First valid hex of a target.
pub(crate) fn first_hex(target: &Target) -> Option<BattleHex> {
    target
        .iter()
        .map(|destination| destination.hex)
        .find(|hex| hex.is_valid())
}

// ============================================================================
// Registry
// ============================================================================

type EffectFactory = fn(&EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError>;

/// Effect constructors by registered name.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    factories: BTreeMap<&'static str, EffectFactory>,
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl EffectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in effect.
    pub fn core() -> Self {
        let mut registry = Self::new();
        registry.register("core:heal", heal::build);
        registry.register("core:dispel", dispel::build_dispel);
        registry.register("core:cure", dispel::build_cure);
        registry.register("core:damage", damage::build_damage);
        registry.register("core:chainDamage", damage::build_chain);
        registry.register("core:patchObstacle", obstacle::build_patch);
        registry.register("core:wall", obstacle::build_wall);
        registry.register("core:removeObstacle", obstacle::build_remove);
        registry.register("core:catapult", earthquake::build);
        registry.register("core:sacrifice", sacrifice::build);
        registry.register("core:antimagic", timed::build_antimagic);
        registry.register("core:timed", timed::build_timed);
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &'static str, factory: EffectFactory) {
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn create(&self, config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
        let name = config.name();
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| EffectConfigError::UnknownEffect(name.to_owned()))?;
        factory(config)
    }
}

/// Error for a factory handed the config of another effect.
pub(crate) fn mismatched(effect: &'static str) -> EffectConfigError {
    EffectConfigError::InvalidParameter {
        effect,
        reason: "config describes another effect",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_builds_every_config() {
        let registry = EffectRegistry::core();
        let configs = [
            EffectConfig::Heal {
                heal_level: HealLevel::Resurrect,
                heal_power: HealPower::Permanent,
                min_full_units: 1,
            },
            EffectConfig::Dispel {
                positive: true,
                negative: true,
                neutral: true,
                remove_spell_obstacles: false,
            },
            EffectConfig::Damage { animation: None },
            EffectConfig::ChainDamage,
            EffectConfig::PatchObstacle {
                kind: ObstacleKind::Quicksand,
                hidden: true,
            },
            EffectConfig::Wall {
                kind: ObstacleKind::FireWall,
                turns: 2,
            },
            EffectConfig::RemoveObstacle,
            EffectConfig::Earthquake,
            EffectConfig::Sacrifice,
            EffectConfig::Cure,
            EffectConfig::Antimagic { bonuses: Vec::new() },
            EffectConfig::Timed {
                bonuses: Vec::new(),
                cumulative: false,
            },
        ];
        for config in &configs {
            let effect = registry.create(config).unwrap();
            assert_eq!(effect.name(), config.name());
        }
        assert_eq!(registry.names().count(), configs.len());
    }

    #[test]
    fn empty_registry_rejects_unknown_names() {
        let error = EffectRegistry::new()
            .create(&EffectConfig::Cure)
            .unwrap_err();
        assert_eq!(error, EffectConfigError::UnknownEffect("core:cure".into()));
    }

    #[test]
    fn invalid_obstacle_kinds_are_rejected() {
        let registry = EffectRegistry::core();
        let error = registry
            .create(&EffectConfig::Wall {
                kind: ObstacleKind::Moat,
                turns: 2,
            })
            .unwrap_err();
        assert!(matches!(error, EffectConfigError::InvalidParameter { effect: "core:wall", .. }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn configs_read_from_json() {
        let heal: EffectConfig = serde_json::from_str(
            r#"{ "type": "core:heal", "healLevel": "resurrect", "healPower": "oneBattle", "minFullUnits": 1 }"#,
        )
        .unwrap();
        assert_eq!(
            heal,
            EffectConfig::Heal {
                heal_level: HealLevel::Resurrect,
                heal_power: HealPower::OneBattle,
                min_full_units: 1,
            }
        );

        let dispel: EffectConfig =
            serde_json::from_str(r#"{ "type": "core:dispel", "negative": true }"#).unwrap();
        assert_eq!(
            dispel,
            EffectConfig::Dispel {
                positive: false,
                negative: true,
                neutral: false,
                remove_spell_obstacles: false,
            }
        );

        let patch: EffectConfig = serde_json::from_str(
            r#"{ "type": "core:patchObstacle", "kind": "land_mine", "hidden": true }"#,
        )
        .unwrap();
        assert_eq!(patch.name(), "core:patchObstacle");

        assert!(serde_json::from_str::<EffectConfig>(r#"{ "type": "core:summon" }"#).is_err());
    }
}
