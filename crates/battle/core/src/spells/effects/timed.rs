use super::{Effect, EffectConfig, filter_units, mismatched, require_any_unit, target_units, units_in_target};
use crate::battle::{BattleQuery, BattleRecord};
use crate::bonus::{Bonus, BonusBearer, BonusDuration, BonusSource};
use crate::spells::{ApplyContext, EffectConfigError, Mechanics, Problem, SpellId, Target};
use crate::unit::Unit;

fn accepts(m: &Mechanics<'_>, unit: &dyn Unit) -> bool {
    unit.is_valid_target(false) && m.is_receptive(unit)
}

/// Configured bonuses stamped with the casting spell and its duration.
/// Bonuses lasting the whole battle keep that duration.
fn stamp(m: &Mechanics<'_>, battle: &dyn BattleQuery, bonuses: &[Bonus]) -> Vec<Bonus> {
    let rounds = u16::try_from(m.effect_duration(battle).max(0)).unwrap_or(u16::MAX);
    bonuses
        .iter()
        .map(|bonus| {
            let duration = match bonus.duration {
                BonusDuration::OneBattle => BonusDuration::OneBattle,
                _ => BonusDuration::Turns(rounds),
            };
            bonus
                .clone()
                .with_source(BonusSource::SpellEffect(m.spell_id()))
                .with_duration(duration)
        })
        .collect()
}

/// Removes what `remove` picks from each target unit, then grants `granted`.
fn replace_bonuses(
    ctx: &mut ApplyContext<'_>,
    target: &Target,
    granted: &[Bonus],
    remove: &dyn Fn(&Bonus) -> bool,
) {
    let mut records = Vec::new();
    for unit in target_units(ctx.battle(), target) {
        let removed = unit.bonuses_matching(remove);
        if !removed.is_empty() {
            records.push(BattleRecord::BonusesRemoved {
                unit: unit.unit_id(),
                bonuses: removed,
            });
        }
        if !granted.is_empty() {
            records.push(BattleRecord::BonusesAdded {
                unit: unit.unit_id(),
                bonuses: granted.to_vec(),
            });
        }
    }
    for record in records {
        ctx.submit(record);
    }
}

fn from_spell(bonus: &Bonus, spell: SpellId) -> bool {
    bonus.from_spell() == Some(spell)
}

// ============================================================================
// Timed
// ============================================================================

/// Grants bonuses for a number of rounds set by the caster's enchant power.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timed {
    pub bonuses: Vec<Bonus>,
    pub cumulative: bool,
}

pub(super) fn build_timed(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Timed { bonuses, cumulative } => Ok(Box::new(Timed {
            bonuses: bonuses.clone(),
            cumulative: *cumulative,
        })),
        _ => Err(mismatched("core:timed")),
    }
}

impl Effect for Timed {
    fn name(&self) -> &'static str {
        "core:timed"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_any_unit(m, battle, &|unit| accepts(m, unit))
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        _aim: &Target,
        spell_target: &Target,
    ) -> Target {
        units_in_target(m, battle, spell_target, &|unit| accepts(m, unit))
    }

    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_units(battle, target, &|unit| accepts(m, unit))
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        let granted = stamp(m, ctx.battle(), &self.bonuses);
        let spell = m.spell_id();
        let cumulative = self.cumulative;
        // A fresh cast replaces the previous one unless effects stack.
        replace_bonuses(ctx, target, &granted, &|bonus| !cumulative && from_spell(bonus, spell));
    }
}

// ============================================================================
// Antimagic
// ============================================================================

/// Strips every non-positive spell effect, then protects against further
/// spells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Antimagic {
    pub bonuses: Vec<Bonus>,
}

pub(super) fn build_antimagic(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Antimagic { bonuses } => Ok(Box::new(Antimagic {
            bonuses: bonuses.clone(),
        })),
        _ => Err(mismatched("core:antimagic")),
    }
}

impl Antimagic {
    fn removes(m: &Mechanics<'_>, bonus: &Bonus) -> bool {
        let Some(source) = bonus.from_spell() else {
            return false;
        };
        if source == m.spell_id() {
            // Our own earlier cast is replaced below.
            return true;
        }
        m.catalog()
            .definition(source)
            .is_some_and(|spell| !spell.is_positive())
    }
}

impl Effect for Antimagic {
    fn name(&self) -> &'static str {
        "core:antimagic"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_any_unit(m, battle, &|unit| accepts(m, unit))
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        _aim: &Target,
        spell_target: &Target,
    ) -> Target {
        units_in_target(m, battle, spell_target, &|unit| accepts(m, unit))
    }

    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_units(battle, target, &|unit| accepts(m, unit))
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        let granted = stamp(m, ctx.battle(), &self.bonuses);
        replace_bonuses(ctx, target, &granted, &|bonus| Self::removes(m, bonus));
    }
}
