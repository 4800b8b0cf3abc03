use tracing::debug;

use super::{Effect, EffectConfig, filter_units, first_hex, mismatched, require_any_unit, target_units, units_in_target};
use crate::battle::{BattleHex, BattleQuery, BattleRecord};
use crate::combat::{AttackOutcome, adjust_spell_damage, resolve_attack};
use crate::config::BattleConfig;
use crate::spells::{ApplyContext, Destination, EffectConfigError, Mechanics, Problem, Target};
use crate::unit::{Unit, UnitId};

fn accepts(m: &Mechanics<'_>, unit: &dyn Unit) -> bool {
    unit.is_valid_target(false) && m.is_receptive(unit)
}

/// Damages each unit of `target`, the amount for the unit at index `i`
/// computed by `scale(i, adjusted)`.
fn damage_units(
    m: &Mechanics<'_>,
    ctx: &mut ApplyContext<'_>,
    target: &Target,
    animation: Option<u32>,
    scale: &dyn Fn(usize, i64) -> i64,
) {
    let outcomes: Vec<AttackOutcome> = {
        let (battle, rng) = ctx.parts();
        target_units(battle, target)
            .into_iter()
            .enumerate()
            .map(|(index, unit)| {
                let adjusted = adjust_spell_damage(m.spell(), unit, m.effect_value());
                let amount = m.caster().spell_bonus(m.spell(), scale(index, adjusted), unit);
                let mut outcome = resolve_attack(&unit.acquire(), amount, rng).with_spell(m.spell_id());
                if let Some(animation) = animation {
                    outcome = outcome.with_effect(animation);
                }
                if index > 0 {
                    outcome = outcome.secondary();
                }
                debug!(
                    spell = %m.spell_id(),
                    target = %outcome.target,
                    damage = outcome.damage_amount,
                    killed = outcome.killed_amount,
                    "spell damage"
                );
                outcome
            })
            .collect()
    };
    if !outcomes.is_empty() {
        ctx.submit(BattleRecord::UnitsAttacked(outcomes));
    }
}

// ============================================================================
// Damage
// ============================================================================

/// Deals the spell's effect value to every unit in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Damage {
    pub animation: Option<u32>,
}

pub(super) fn build_damage(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Damage { animation } => Ok(Box::new(Damage {
            animation: *animation,
        })),
        _ => Err(mismatched("core:damage")),
    }
}

impl Effect for Damage {
    fn name(&self) -> &'static str {
        "core:damage"
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
        damage_units(m, ctx, target, self.animation, &|_, amount| amount);
    }
}

// ============================================================================
// Chain damage
// ============================================================================

/// Lightning that jumps from the aimed unit to the nearest remaining one,
/// halving at every hop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainDamage;

pub(super) fn build_chain(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::ChainDamage => Ok(Box::new(ChainDamage)),
        _ => Err(mismatched("core:chainDamage")),
    }
}

impl ChainDamage {
    /// Units hit in order, starting at the unit on `aim`.
    ///
    /// Immune units still pass the lightning on; they are dropped by the
    /// filter afterwards.
    fn chain(m: &Mechanics<'_>, battle: &dyn BattleQuery, aim: &Target) -> Target {
        let mut chain = Target::new();
        let Some(aim_hex) = first_hex(aim) else {
            return chain;
        };
        let Some(mut current) = battle
            .unit_at(aim_hex, true)
            .filter(|unit| unit.is_valid_target(false))
        else {
            return chain;
        };

        let limit = BattleConfig::per_level(&battle.config().chain_lightning_targets, m.level());
        let mut hit: Vec<UnitId> = Vec::new();
        // Each jump starts from the hex struck last, which may be a back hex.
        let mut struck = aim_hex;
        loop {
            hit.push(current.unit_id());
            chain.push(Destination::on_unit(current.unit_id(), current.position()));
            if chain.len() >= limit {
                break;
            }

            let candidates: Vec<BattleHex> = battle
                .units_if(&|unit| unit.is_valid_target(false) && !hit.contains(&unit.unit_id()))
                .into_iter()
                .flat_map(|unit| unit.hexes())
                .collect();
            let Some(hex) = BattleHex::closest_tile(current.unit_side(), struck, &candidates) else {
                break;
            };
            match battle.unit_at(hex, true) {
                Some(unit) => {
                    current = unit;
                    struck = hex;
                }
                None => break,
            }
        }
        chain
    }
}

impl Effect for ChainDamage {
    fn name(&self) -> &'static str {
        "core:chainDamage"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_any_unit(m, battle, &|unit| accepts(m, unit))
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        aim: &Target,
        _spell_target: &Target,
    ) -> Target {
        Self::chain(m, battle, aim)
    }

    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_units(battle, target, &|unit| accepts(m, unit))
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        damage_units(m, ctx, target, None, &|index, amount| {
            u32::try_from(index).ok().and_then(|shift| amount.checked_shr(shift)).unwrap_or(0)
        });
    }
}
