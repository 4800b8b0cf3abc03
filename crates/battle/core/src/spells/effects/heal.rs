use super::{Effect, EffectConfig, filter_units, mismatched, require_any_unit, target_units, units_in_target};
use crate::battle::{BattleQuery, BattleRecord};
use crate::spells::{ApplyContext, EffectConfigError, Mechanics, Problem, Target};
use crate::unit::{HealLevel, HealPower, Unit, UnitChange};

/// Restores health, raising dead creatures when the level allows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Heal {
    pub level: HealLevel,
    pub power: HealPower,
    pub min_full_units: i32,
}

pub(super) fn build(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Heal {
            heal_level,
            heal_power,
            min_full_units,
        } => Ok(Box::new(Heal {
            level: *heal_level,
            power: *heal_power,
            min_full_units: *min_full_units,
        })),
        _ => Err(mismatched("core:heal")),
    }
}

impl Heal {
    fn is_valid_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, unit: &dyn Unit) -> bool {
        let only_alive = self.level == HealLevel::Heal;
        if !unit.is_valid_target(!only_alive) {
            return false;
        }
        if unit.total_health() - unit.available_health() == 0 {
            return false;
        }
        if m.effect_value() < i64::from(self.min_full_units) * i64::from(unit.max_health()) {
            return false;
        }
        !(unit.is_dead() && corpse_covered(battle, unit))
    }

    fn accepts(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, unit: &dyn Unit) -> bool {
        self.is_valid_target(m, battle, unit) && m.is_receptive(unit)
    }
}

/// Another unit stands on the corpse of `unit`, so it cannot rise.
pub(super) fn corpse_covered(battle: &dyn BattleQuery, unit: &dyn Unit) -> bool {
    let id = unit.unit_id();
    unit.hexes().iter().any(|hex| {
        !battle
            .units_if(&|other| {
                other.unit_id() != id && other.is_valid_target(true) && other.covers(*hex)
            })
            .is_empty()
    })
}

/// Heals every unit of `target` by `amount`.
///
/// Each change reports the amount granted to the unit as its health delta,
/// even when the unit had less health missing.
pub(super) fn heal_units(
    m: &Mechanics<'_>,
    battle: &dyn BattleQuery,
    target: &Target,
    amount: i64,
    level: HealLevel,
    power: HealPower,
) -> Vec<UnitChange> {
    let mut changes = Vec::new();
    for unit in target_units(battle, target) {
        let gained = m.caster().spell_bonus(m.spell(), amount, unit);
        if gained <= 0 {
            continue;
        }
        let mut state = unit.acquire();
        state.heal(gained, level, power);
        changes.push(state.to_change(gained));
    }
    changes
}

impl Effect for Heal {
    fn name(&self) -> &'static str {
        "core:heal"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_any_unit(m, battle, &|unit| self.accepts(m, battle, unit))
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        _aim: &Target,
        spell_target: &Target,
    ) -> Target {
        let mut target = units_in_target(m, battle, spell_target, &|unit| {
            unit.alive() && self.accepts(m, battle, unit)
        });
        if target.is_empty() && self.level != HealLevel::Heal {
            // Nobody alive in range: raise the dead instead.
            target = units_in_target(m, battle, spell_target, &|unit| {
                unit.is_dead() && self.accepts(m, battle, unit)
            });
        }
        target
    }

    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_units(battle, target, &|unit| self.accepts(m, battle, unit))
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        let changes = heal_units(m, ctx.battle(), target, m.effect_value(), self.level, self.power);
        if !changes.is_empty() {
            ctx.submit(BattleRecord::UnitsChanged(changes));
        }
    }
}
