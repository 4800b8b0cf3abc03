use tracing::debug;

use super::{Effect, EffectConfig, filter_locations, mismatched, require_active_mode};
use crate::battle::{BattleQuery, BattleRecord, WallHit, WallPart, WallState};
use crate::rng::shuffle;
use crate::spells::{ApplyContext, EffectConfigError, Mechanics, Problem, Target};
use crate::unit::{BattleSide, UnitId};

/// Shakes random wall parts of a besieged town, one hit each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Earthquake;

pub(super) fn build(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Earthquake => Ok(Box::new(Earthquake)),
        _ => Err(mismatched("core:catapult")),
    }
}

impl Earthquake {
    fn targets(m: &Mechanics<'_>, battle: &dyn BattleQuery) -> usize {
        let base = usize::from(battle.config().earthquake_base_targets);
        base + usize::from(m.level().saturating_sub(1))
    }
}

impl Effect for Earthquake {
    fn name(&self) -> &'static str {
        "core:catapult"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_active_mode(m)?;
        let Some(siege) = battle.siege().filter(|siege| siege.has_fort()) else {
            return Err(Problem::no_target(m.spell_id(), "no town walls"));
        };
        if m.level_info().smart && m.caster().caster_side() != BattleSide::Attacker {
            return Err(Problem::no_target(m.spell_id(), "only the besieger can aim the earthquake"));
        }
        if siege.attackable_parts().is_empty() {
            return Err(Problem::no_target(m.spell_id(), "every wall part is down"));
        }
        Ok(())
    }

    fn applicable_at(
        &self,
        _m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        _aim: &Target,
        _target: &Target,
    ) -> Result<(), Problem> {
        Ok(())
    }

    fn transform_target(
        &self,
        _m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        _aim: &Target,
        _spell_target: &Target,
    ) -> Target {
        Target::new()
    }

    fn filter_target(&self, _m: &Mechanics<'_>, _battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_locations(target)
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, _target: &Target) {
        if ctx.battle().siege().is_none_or(|siege| !siege.has_fort()) {
            ctx.complain("earthquake outside a siege");
            return;
        }
        let (hits, removed) = {
            let (battle, rng) = ctx.parts();
            let Some(siege) = battle.siege() else {
                return;
            };
            let mut parts = siege.attackable_parts();
            shuffle(&mut parts, rng);
            parts.truncate(Self::targets(m, battle));

            let mut hits = Vec::with_capacity(parts.len());
            let mut removed: Vec<UnitId> = Vec::new();
            for part in parts {
                let state_after = siege.wall_state(part).after_damage(1);
                hits.push(WallHit {
                    part,
                    damage: 1,
                    state_after,
                });
                // A fallen tower takes its turret with it.
                if state_after == WallState::Destroyed {
                    removed.extend(turret_on(battle, part));
                }
            }
            (hits, removed)
        };

        debug!(spell = %m.spell_id(), parts = hits.len(), turrets = removed.len(), "earthquake");
        if !removed.is_empty() {
            ctx.submit(BattleRecord::UnitsRemoved(removed));
        }
        if !hits.is_empty() {
            ctx.submit(BattleRecord::WallsAttacked(hits));
        }
    }
}

fn turret_on(battle: &dyn BattleQuery, part: WallPart) -> Option<UnitId> {
    let position = part.turret_position()?;
    battle
        .units_if(&|unit| !unit.is_ghost() && unit.position() == position)
        .first()
        .map(|unit| unit.unit_id())
}
