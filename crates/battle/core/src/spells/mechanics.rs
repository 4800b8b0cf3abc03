//! The cast pipeline.

use tracing::{debug, error, warn};

use super::{
    ApplyContext, ApplyStrategy, CastError, CastMode, Caster, CatalogEntry, CompiledEffect,
    Destination, MirroredCaster, ObstacleCaster, Problem, ProblemKind, SpellCatalog,
    SpellDefinition, SpellId, SpellLevel, SpellRange, Target,
};
use crate::battle::{BattleHex, BattleQuery, BattleRecord, Obstacle, ObstacleKind};
use crate::bonus::{Bonus, BonusBearer, BonusKind};
use crate::config::BattleConfig;
use crate::rng::{RandomSource, pick};
use crate::unit::{Unit, UnitId};

/// What a cast did to the units it touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CastOutcome {
    /// Units the effects were applied to.
    pub affected: Vec<UnitId>,
    /// Units whose magic resistance stopped the spell.
    pub resisted: Vec<UnitId>,
    /// Units whose magic mirror sent the spell back.
    pub reflected: Vec<UnitId>,
    /// Casts produced by the reflections.
    pub redirected: Vec<CastOutcome>,
}

/// A checked cast, ready to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastPlan {
    pub spell: SpellId,
    pub level: u8,
    /// One target per active effect, in effect order.
    pub targets: Vec<Target>,
    pub outcome: CastOutcome,
}

/// One spell cast by one caster in one mode.
///
/// The façade every effect talks to: it knows the spell data, the caster's
/// strength and the immunity rules. It holds no battle; every check takes the
/// battle read-only and only [`Mechanics::commit`] writes.
pub struct Mechanics<'a> {
    catalog: &'a SpellCatalog,
    entry: &'a CatalogEntry,
    caster: &'a dyn Caster,
    mode: CastMode,
    level: u8,
    effect_power: i32,
}

impl<'a> Mechanics<'a> {
    pub fn new(
        catalog: &'a SpellCatalog,
        spell: SpellId,
        caster: &'a dyn Caster,
        mode: CastMode,
    ) -> Result<Self, CastError> {
        let entry = catalog.get(spell).ok_or(CastError::UnknownSpell(spell))?;
        let level = caster
            .school_level(&entry.definition)
            .min(BattleConfig::MAX_SCHOOL_LEVEL);
        let effect_power = caster.effect_power(&entry.definition);
        Ok(Self {
            catalog,
            entry,
            caster,
            mode,
            level,
            effect_power,
        })
    }

    // ===== accessors =====

    pub fn catalog(&self) -> &'a SpellCatalog {
        self.catalog
    }

    pub fn spell(&self) -> &'a SpellDefinition {
        &self.entry.definition
    }

    pub fn spell_id(&self) -> SpellId {
        self.entry.definition.id
    }

    pub fn caster(&self) -> &'a dyn Caster {
        self.caster
    }

    pub fn mode(&self) -> CastMode {
        self.mode
    }

    /// School level the spell is cast at.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn level_info(&self) -> &'a SpellLevel {
        self.entry.definition.level(self.level)
    }

    pub fn effect_power(&self) -> i32 {
        self.effect_power
    }

    /// Base amount for heals and damage before per-target adjustments.
    pub fn effect_value(&self) -> i64 {
        let fixed = self.caster.effect_value(self.spell());
        if fixed != 0 {
            return fixed;
        }
        i64::from(self.spell().power) * i64::from(self.effect_power)
            + i64::from(self.level_info().power)
    }

    /// Rounds timed effects last.
    pub fn effect_duration(&self, battle: &dyn BattleQuery) -> i32 {
        self.caster.enchant_power(self.spell(), battle.config())
    }

    /// Effects that run in this mode: the ones fired by obstacles in passive
    /// casts, the others otherwise.
    pub fn active_effects(&self) -> impl Iterator<Item = &'a CompiledEffect> + 'a {
        let passive = self.mode == CastMode::Passive;
        self.entry
            .effects(self.level)
            .iter()
            .filter(move |effect| effect.indirect == passive)
    }

    // ===== immunity =====

    /// Immune to this spell whatever the effect.
    pub fn is_absolutely_immune(&self, unit: &dyn Unit) -> bool {
        let id = self.spell_id().0;
        unit.has_bonus(&|bonus| {
            bonus.kind == BonusKind::SpellImmunity && bonus.subtype == id && bonus.additional_info == 1
        })
    }

    /// Whether the spell can affect `unit` at all.
    pub fn is_receptive(&self, unit: &dyn Unit) -> bool {
        if self.is_absolutely_immune(unit) {
            return false;
        }
        if unit.has_bonus_of_subtype(BonusKind::SpellImmunity, self.spell_id().0) {
            return false;
        }
        let circle = i32::from(self.spell().circle);
        if circle > 0 && unit.value_of_type(BonusKind::LevelSpellImmunity) >= circle {
            return false;
        }
        !(self.spell().is_negative() && unit.has_bonus_of_type(BonusKind::NegativeEffectsImmunity))
    }

    /// Allies for positive spells, enemies for negative ones, anyone else for
    /// neutral spells.
    pub fn owner_matches(&self, battle: &dyn BattleQuery, unit: &dyn Unit) -> bool {
        battle.match_player(
            self.caster.caster_owner(),
            unit,
            self.spell().positiveness.as_option(),
        )
    }

    /// Bonus granted by a spell this one counters.
    pub fn is_countered(&self, bonus: &Bonus) -> bool {
        bonus
            .from_spell()
            .is_some_and(|spell| self.spell().counters.contains(&spell))
    }

    // ===== targeting =====

    /// Hexes covered by the level's range around `center`.
    pub fn range_in_hexes(&self, center: BattleHex) -> Vec<BattleHex> {
        if !center.is_valid() {
            return Vec::new();
        }
        let field = (0..BattleConfig::FIELD_SIZE as i16).map(BattleHex);
        match self.level_info().range {
            SpellRange::Single => vec![center],
            SpellRange::Radius(radius) => field
                .filter(|hex| BattleHex::distance(center, *hex) <= i32::from(radius))
                .collect(),
            SpellRange::All => field.collect(),
        }
    }

    /// The aim widened to the level's range. The aimed destination comes
    /// first.
    pub fn spell_target(&self, aim: &Target) -> Target {
        let Some(first) = aim.first().copied() else {
            error!(spell = %self.spell_id(), "cast without an aim");
            return Target::new();
        };
        let mut target = vec![first];
        target.extend(
            self.range_in_hexes(first.hex)
                .into_iter()
                .filter(|hex| *hex != first.hex)
                .map(Destination::at),
        );
        target
    }

    // ===== applicability =====

    /// Required effects must all apply and at least one effect must apply.
    fn combine(
        &self,
        results: impl Iterator<Item = (bool, Result<(), Problem>)>,
    ) -> Result<(), Problem> {
        let mut any = false;
        let mut first_problem = None;
        let mut seen = false;
        for (optional, result) in results {
            seen = true;
            match result {
                Ok(()) => any = true,
                Err(problem) if !optional => return Err(problem),
                Err(problem) => {
                    first_problem.get_or_insert(problem);
                }
            }
        }
        if !seen {
            return Err(Problem::invalid(self.spell_id(), "no effects at this level"));
        }
        if any {
            Ok(())
        } else {
            Err(first_problem
                .unwrap_or_else(|| Problem::no_target(self.spell_id(), "nothing to do")))
        }
    }

    /// Whether the spell can be cast at all in this battle.
    pub fn can_be_cast(&self, battle: &dyn BattleQuery) -> Result<(), Problem> {
        if self.mode == CastMode::CreatureActive
            && self.caster.caster_unit().is_some_and(|unit| !unit.can_cast())
        {
            return Err(Problem::new(
                ProblemKind::CasterCannotCast,
                self.spell_id(),
                "no casts left",
            ));
        }
        self.combine(
            self.active_effects()
                .map(|compiled| (compiled.optional, compiled.effect.applicable(self, battle))),
        )
    }

    /// Whether the spell can be aimed at `hex`.
    pub fn can_be_cast_at(&self, battle: &dyn BattleQuery, hex: BattleHex) -> Result<(), Problem> {
        self.effect_targets(battle, &vec![Destination::at(hex)])
            .map(|_| ())
    }

    /// Runs every check and computes the target of each active effect.
    fn effect_targets(&self, battle: &dyn BattleQuery, aim: &Target) -> Result<Vec<Target>, Problem> {
        self.can_be_cast(battle)?;
        let spell_target = self.spell_target(aim);

        let mut targets = Vec::new();
        let mut checks = Vec::new();
        for compiled in self.active_effects() {
            let effect = &compiled.effect;
            let transformed = effect.transform_target(self, battle, aim, &spell_target);
            let target = effect.filter_target(self, battle, &transformed);
            checks.push((compiled.optional, effect.applicable_at(self, battle, aim, &target)));
            targets.push(target);
        }
        self.combine(checks.into_iter())?;
        Ok(targets)
    }

    // ===== cast =====

    /// Checks the cast and decides who resists and who reflects.
    ///
    /// Resistance and mirror rolls belong to the authoritative side, so they
    /// are only made for replicated casts.
    pub fn prepare(
        &self,
        battle: &dyn BattleQuery,
        aim: &Target,
        strategy: ApplyStrategy,
        rng: &mut dyn RandomSource,
    ) -> Result<CastPlan, CastError> {
        let mut targets = self.effect_targets(battle, aim).inspect_err(|problem| {
            debug!(spell = %self.spell_id(), mode = %self.mode, %problem, "cast refused");
        })?;

        let mut touched: Vec<UnitId> = Vec::new();
        for destination in targets.iter().flatten() {
            if let Some(id) = destination.unit {
                if !touched.contains(&id) {
                    touched.push(id);
                }
            }
        }

        let mut outcome = CastOutcome::default();
        for id in touched {
            let Some(unit) = battle.unit(id) else {
                continue;
            };
            if strategy == ApplyStrategy::Replicated {
                if self.spell().is_negative() {
                    let chance = i64::from(battle.magic_resistance(unit));
                    if rng.roll_percent() < chance {
                        debug!(spell = %self.spell_id(), unit = %id, chance, "resisted");
                        outcome.resisted.push(id);
                        continue;
                    }
                }
                if self.can_be_reflected() {
                    let chance = i64::from(unit.value_of_type(BonusKind::MagicMirror));
                    if chance > 0 && rng.roll_percent() < chance {
                        debug!(spell = %self.spell_id(), unit = %id, chance, "reflected");
                        outcome.reflected.push(id);
                        continue;
                    }
                }
            }
            outcome.affected.push(id);
        }

        let dropped: Vec<UnitId> = outcome
            .resisted
            .iter()
            .chain(&outcome.reflected)
            .copied()
            .collect();
        if !dropped.is_empty() {
            for target in &mut targets {
                target.retain(|destination| destination.unit.is_none_or(|id| !dropped.contains(&id)));
            }
        }

        Ok(CastPlan {
            spell: self.spell_id(),
            level: self.level,
            targets,
            outcome,
        })
    }

    /// Negative single-target spells cast by choice can bounce off a mirror.
    fn can_be_reflected(&self) -> bool {
        !matches!(self.mode, CastMode::MagicMirror | CastMode::Passive)
            && self.spell().is_negative()
            && self.level_info().range == SpellRange::Single
            && self.spell().circle > 0
    }

    /// Pays for the cast, strips countered spells and applies every effect.
    pub fn commit(&self, plan: &CastPlan, ctx: &mut ApplyContext<'_>) {
        self.spend(ctx);

        let countered: Vec<BattleRecord> = plan
            .outcome
            .affected
            .iter()
            .filter_map(|id| ctx.battle().unit(*id))
            .filter_map(|unit| {
                let bonuses = unit.bonuses_matching(&|bonus| self.is_countered(bonus));
                (!bonuses.is_empty()).then(|| BattleRecord::BonusesRemoved {
                    unit: unit.unit_id(),
                    bonuses,
                })
            })
            .collect();
        for record in countered {
            ctx.submit(record);
        }

        for (compiled, target) in self.active_effects().zip(&plan.targets) {
            compiled.effect.apply(self, ctx, target);
        }
    }

    fn spend(&self, ctx: &mut ApplyContext<'_>) {
        let cost = self.caster.spell_cost(self.spell(), self.level);
        match self.mode {
            CastMode::CreatureActive | CastMode::Enchanter => {
                if cost != 1 {
                    warn!(spell = %self.spell_id(), cost, "unexpected creature spell cost");
                }
                let change = self
                    .caster
                    .caster_unit()
                    .and_then(|caster| ctx.battle().unit(caster.unit_id()))
                    .map(|live| {
                        let mut state = live.acquire();
                        state.use_casts(1);
                        state.to_change(0)
                    });
                if let Some(change) = change {
                    ctx.submit(BattleRecord::UnitsChanged(vec![change]));
                }
            }
            CastMode::Hero => ctx.submit(BattleRecord::ManaSpent {
                player: self.caster.caster_owner(),
                amount: cost,
            }),
            _ => {}
        }
    }

    /// Casts at `aim`, then sends every reflected copy back at a random unit
    /// of the caster's side.
    pub fn cast(&self, ctx: &mut ApplyContext<'_>, aim: &Target) -> Result<CastOutcome, CastError> {
        let strategy = ctx.strategy();
        let plan = {
            let (battle, rng) = ctx.parts();
            self.prepare(battle, aim, strategy, rng)?
        };
        debug!(
            spell = %plan.spell,
            level = plan.level,
            affected = plan.outcome.affected.len(),
            %strategy,
            "cast"
        );
        self.commit(&plan, ctx);

        let mut outcome = plan.outcome;
        for reflector in outcome.reflected.clone() {
            let Some(reflector) = ctx.battle().unit(reflector).map(|unit| unit.acquire()) else {
                continue;
            };
            let destination = {
                let (battle, rng) = ctx.parts();
                self.mirror_destination(battle, rng)
            };
            let Some(destination) = destination else {
                debug!(spell = %self.spell_id(), "nothing to reflect onto");
                continue;
            };
            let mirrored = MirroredCaster {
                reflector: &reflector,
                original: self.caster,
            };
            let mechanics = Mechanics::new(self.catalog, self.spell_id(), &mirrored, CastMode::MagicMirror)?;
            match mechanics.cast(ctx, &vec![destination]) {
                Ok(redirected) => outcome.redirected.push(redirected),
                Err(error) => debug!(spell = %self.spell_id(), %error, "reflection fizzled"),
            }
        }
        Ok(outcome)
    }

    /// Random living unit of the original caster's side, the new aim of a
    /// reflected spell.
    pub fn mirror_destination(
        &self,
        battle: &dyn BattleQuery,
        rng: &mut dyn RandomSource,
    ) -> Option<Destination> {
        let owner = self.caster.caster_owner();
        let candidates = battle.units_if(&|unit| unit.unit_owner() == owner && unit.is_valid_target(false));
        pick(&candidates, rng).map(|unit| Destination::on_unit(unit.unit_id(), unit.position()))
    }
}

/// Fires the spell stored in `obstacle` at the unit that walked into it.
///
/// Land mines are spent by the trigger whether or not the spell takes
/// hold.
pub fn trigger_obstacle(
    catalog: &SpellCatalog,
    obstacle: &Obstacle,
    victim: UnitId,
    ctx: &mut ApplyContext<'_>,
) -> Result<CastOutcome, CastError> {
    let Some(spell) = obstacle.spell else {
        warn!(obstacle = obstacle.id, "triggered obstacle carries no spell");
        return Ok(CastOutcome::default());
    };
    let Some(caster) = ObstacleCaster::new(obstacle, ctx.battle()) else {
        warn!(obstacle = obstacle.id, "triggered obstacle has no caster side");
        return Ok(CastOutcome::default());
    };
    let Some(position) = ctx.battle().unit(victim).map(|unit| unit.position()) else {
        warn!(obstacle = obstacle.id, unit = %victim, "obstacle triggered by an unknown unit");
        return Ok(CastOutcome::default());
    };

    let mechanics = Mechanics::new(catalog, spell, &caster, CastMode::Passive)?;
    let result = mechanics.cast(ctx, &vec![Destination::on_unit(victim, position)]);
    if obstacle.kind == ObstacleKind::LandMine {
        ctx.submit(BattleRecord::ObstaclesRemoved(vec![obstacle.id]));
    }
    result
}
