use super::heal::heal_units;
use super::{Effect, EffectConfig, filter_units, mismatched, require_any_unit, target_units, units_in_target};
use crate::battle::{BattleQuery, BattleRecord, ObstacleKind};
use crate::bonus::{Bonus, BonusBearer, BonusKind};
use crate::spells::{
    ApplyContext, EffectConfigError, Mechanics, Problem, SpellDefinition, SpellId, Target,
};
use crate::unit::{HealLevel, HealPower, Unit};

/// Spell that produced `bonus`, if it is a known spell effect.
fn source_spell<'m>(m: &'m Mechanics<'_>, bonus: &Bonus) -> Option<&'m SpellDefinition> {
    bonus.from_spell().and_then(|id| m.catalog().definition(id))
}

/// Spell effects any dispel may touch.
///
/// Disrupting ray and the clone marker are never removed, nor are effects
/// inherited from adventure spells.
fn is_dispellable(m: &Mechanics<'_>, bonus: &Bonus) -> bool {
    let Some(source) = source_spell(m, bonus) else {
        return false;
    };
    if source.id == SpellId::DISRUPTING_RAY || source.id == SpellId::CLONE {
        return false;
    }
    !source.adventure
}

/// Removes the bonuses `select` picks from every unit of `target`.
fn strip_bonuses(ctx: &mut ApplyContext<'_>, target: &Target, select: &dyn Fn(&Bonus) -> bool) {
    let removals: Vec<BattleRecord> = target_units(ctx.battle(), target)
        .into_iter()
        .filter_map(|unit| {
            let bonuses = unit.bonuses_matching(select);
            (!bonuses.is_empty()).then(|| BattleRecord::BonusesRemoved {
                unit: unit.unit_id(),
                bonuses,
            })
        })
        .collect();
    for record in removals {
        ctx.submit(record);
    }
}

// ============================================================================
// Dispel
// ============================================================================

/// Removes spell effects of the configured polarities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispel {
    pub positive: bool,
    pub negative: bool,
    pub neutral: bool,
    pub remove_spell_obstacles: bool,
}

pub(super) fn build_dispel(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Dispel {
            positive,
            negative,
            neutral,
            remove_spell_obstacles,
        } => Ok(Box::new(Dispel {
            positive: *positive,
            negative: *negative,
            neutral: *neutral,
            remove_spell_obstacles: *remove_spell_obstacles,
        })),
        _ => Err(mismatched("core:dispel")),
    }
}

impl Dispel {
    /// Whether this dispel removes `bonus`. A spell never removes its own
    /// effects.
    pub fn removes(&self, m: &Mechanics<'_>, bonus: &Bonus) -> bool {
        if !is_dispellable(m, bonus) {
            return false;
        }
        let Some(source) = source_spell(m, bonus) else {
            return false;
        };
        if source.id == m.spell_id() {
            return false;
        }
        (self.positive && source.is_positive())
            || (self.negative && source.is_negative())
            || (self.neutral && source.is_neutral())
    }

    /// Dispel ignores every immunity except absolute immunity to itself.
    fn accepts(&self, m: &Mechanics<'_>, unit: &dyn Unit) -> bool {
        unit.is_valid_target(false)
            && !m.is_absolutely_immune(unit)
            && unit.has_bonus(&|bonus| self.removes(m, bonus))
    }

    fn spell_obstacles(battle: &dyn BattleQuery) -> Vec<u32> {
        battle
            .obstacles()
            .iter()
            .filter(|obstacle| {
                matches!(
                    obstacle.kind,
                    ObstacleKind::FireWall | ObstacleKind::ForceField | ObstacleKind::LandMine
                )
            })
            .map(|obstacle| obstacle.id)
            .collect()
    }
}

impl Effect for Dispel {
    fn name(&self) -> &'static str {
        "core:dispel"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        if self.remove_spell_obstacles && !Self::spell_obstacles(battle).is_empty() {
            return Ok(());
        }
        require_any_unit(m, battle, &|unit| self.accepts(m, unit))
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        _aim: &Target,
        spell_target: &Target,
    ) -> Target {
        units_in_target(m, battle, spell_target, &|unit| self.accepts(m, unit))
    }

    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_units(battle, target, &|unit| self.accepts(m, unit))
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        strip_bonuses(ctx, target, &|bonus| self.removes(m, bonus));

        if self.remove_spell_obstacles {
            let obstacles = Self::spell_obstacles(ctx.battle());
            if !obstacles.is_empty() {
                ctx.submit(BattleRecord::ObstaclesRemoved(obstacles));
            }
        }
    }
}

// ============================================================================
// Cure
// ============================================================================

/// Heals the front creature and removes every negative spell effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cure;

pub(super) fn build_cure(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Cure => Ok(Box::new(Cure)),
        _ => Err(mismatched("core:cure")),
    }
}

impl Cure {
    fn removes(m: &Mechanics<'_>, bonus: &Bonus) -> bool {
        source_spell(m, bonus).is_some_and(SpellDefinition::is_negative)
    }

    fn accepts(m: &Mechanics<'_>, unit: &dyn Unit) -> bool {
        if !unit.is_valid_target(false) || unit.has_bonus_of_type(BonusKind::SiegeWeapon) {
            return false;
        }
        let injured = unit.first_hp_left() < unit.max_health();
        let debuffed = unit.has_bonus(&|bonus| Self::removes(m, bonus));
        (injured || debuffed) && m.is_receptive(unit)
    }
}

impl Effect for Cure {
    fn name(&self) -> &'static str {
        "core:cure"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_any_unit(m, battle, &|unit| Self::accepts(m, unit))
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        _aim: &Target,
        spell_target: &Target,
    ) -> Target {
        units_in_target(m, battle, spell_target, &|unit| Self::accepts(m, unit))
    }

    fn filter_target(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_units(battle, target, &|unit| Self::accepts(m, unit))
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        let changes = heal_units(
            m,
            ctx.battle(),
            target,
            m.effect_value(),
            HealLevel::Heal,
            HealPower::Permanent,
        );
        if !changes.is_empty() {
            ctx.submit(BattleRecord::UnitsChanged(changes));
        }
        strip_bonuses(ctx, target, &|bonus| Self::removes(m, bonus));
    }
}
