use super::heal::{corpse_covered, heal_units};
use super::{Effect, EffectConfig, mismatched, require_active_mode};
use crate::battle::{BattleQuery, BattleRecord};
use crate::spells::{ApplyContext, Destination, EffectConfigError, Mechanics, Problem, Target};
use crate::unit::{HealLevel, HealPower, Unit};

/// Destroys one living allied stack to raise a dead one.
///
/// The aim holds two destinations: the corpse to raise, then the victim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sacrifice;

pub(super) fn build(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Sacrifice => Ok(Box::new(Sacrifice)),
        _ => Err(mismatched("core:sacrifice")),
    }
}

impl Sacrifice {
    fn own_receptive(m: &Mechanics<'_>, unit: &dyn Unit) -> bool {
        unit.unit_owner() == m.caster().caster_owner() && m.is_receptive(unit)
    }

    fn is_corpse(m: &Mechanics<'_>, battle: &dyn BattleQuery, unit: &dyn Unit) -> bool {
        unit.is_dead()
            && unit.is_valid_target(true)
            && Self::own_receptive(m, unit)
            && !corpse_covered(battle, unit)
    }

    fn is_victim(m: &Mechanics<'_>, unit: &dyn Unit) -> bool {
        unit.is_valid_target(false) && Self::own_receptive(m, unit)
    }

    fn corpse_at(m: &Mechanics<'_>, battle: &dyn BattleQuery, destination: &Destination) -> Option<Destination> {
        let hex = destination.hex;
        battle
            .units_if(&|unit| unit.covers(hex) && Self::is_corpse(m, battle, unit))
            .first()
            .map(|unit| Destination::on_unit(unit.unit_id(), unit.position()))
    }

    fn victim_at(m: &Mechanics<'_>, battle: &dyn BattleQuery, destination: &Destination) -> Option<Destination> {
        let unit = match destination.unit {
            Some(id) => battle.unit(id),
            None => battle.unit_at(destination.hex, true),
        }?;
        Self::is_victim(m, unit).then(|| Destination::on_unit(unit.unit_id(), unit.position()))
    }
}

impl Effect for Sacrifice {
    fn name(&self) -> &'static str {
        "core:sacrifice"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_active_mode(m)?;
        let owner = m.caster().caster_owner();
        let candidates = battle.units_if(&|unit| unit.unit_owner() == owner && m.is_receptive(unit));
        let has_victim = candidates.iter().any(|unit| unit.alive());
        let has_corpse = candidates.iter().any(|unit| unit.is_dead());
        if has_victim && has_corpse {
            Ok(())
        } else {
            Err(Problem::no_target(m.spell_id(), "needs a living and a dead allied stack"))
        }
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        aim: &Target,
        _spell_target: &Target,
    ) -> Target {
        let Some(corpse) = aim.first().and_then(|first| Self::corpse_at(m, battle, first)) else {
            return Target::new();
        };
        let mut target = vec![corpse];
        if let Some(victim) = aim.get(1).and_then(|second| Self::victim_at(m, battle, second)) {
            target.push(victim);
        }
        target
    }

    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target {
        let corpse = target
            .first()
            .and_then(|destination| destination.unit)
            .and_then(|id| battle.unit(id))
            .filter(|unit| Self::is_corpse(m, battle, *unit));
        let Some(corpse) = corpse else {
            return Target::new();
        };
        let mut kept = vec![Destination::on_unit(corpse.unit_id(), corpse.position())];
        if let Some(victim) = target.get(1).and_then(|second| Self::victim_at(m, battle, second)) {
            kept.push(victim);
        }
        kept
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        let victim = target
            .get(1)
            .and_then(|destination| destination.unit)
            .and_then(|id| ctx.battle().unit(id))
            .map(|unit| (unit.unit_id(), unit.max_health(), unit.count()));
        let Some((victim, max_health, count)) = victim else {
            ctx.complain("no stack to sacrifice");
            return;
        };

        let amount = (i64::from(m.effect_power())
            + i64::from(max_health)
            + i64::from(m.level_info().power))
            * i64::from(count);
        let corpse: Target = target.iter().take(1).copied().collect();
        let changes = heal_units(
            m,
            ctx.battle(),
            &corpse,
            amount,
            HealLevel::Resurrect,
            HealPower::Permanent,
        );
        if !changes.is_empty() {
            ctx.submit(BattleRecord::UnitsChanged(changes));
        }
        ctx.submit(BattleRecord::UnitsRemoved(vec![victim]));
    }
}
