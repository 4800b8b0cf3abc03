//! Damage application and attack outcomes.
//!
//! [`resolve_attack`] never touches the target: it damages a detached copy,
//! runs the death and rebirth rules on it, and returns an [`AttackOutcome`]
//! carrying the resulting state for the replication boundary to commit.

mod rebirth;
mod spell_damage;

pub use rebirth::{RebirthRoll, rebirth_count};
pub use spell_damage::adjust_spell_damage;

use bitflags::bitflags;

use crate::bonus::{BonusBearer, BonusKind};
use crate::rng::RandomSource;
use crate::spells::SpellId;
use crate::unit::{HealLevel, HealPower, Unit, UnitChange, UnitId, UnitState};

bitflags! {
    /// What happened to the target of an attack.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AttackFlags: u8 {
        const KILLED       = 1 << 0;
        /// Secondary target of a multi-target attack.
        const SECONDARY    = 1 << 1;
        const REBIRTH      = 1 << 2;
        const CLONE_KILLED = 1 << 3;
        /// Damage came from a spell.
        const SPELL_EFFECT = 1 << 4;
        /// An extra animation is attached (see [`AttackOutcome::effect`]).
        const EFFECT       = 1 << 5;
    }
}

/// Result of damaging one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackOutcome {
    pub target: UnitId,
    pub attacker: Option<UnitId>,
    pub damage_amount: i64,
    pub killed_amount: i32,
    pub flags: AttackFlags,
    pub spell: Option<SpellId>,
    /// Animation to play on the target.
    pub effect: Option<u32>,
    pub change: UnitChange,
}

impl AttackOutcome {
    pub fn killed(&self) -> bool {
        self.flags.contains(AttackFlags::KILLED)
    }

    pub fn clone_killed(&self) -> bool {
        self.flags.contains(AttackFlags::CLONE_KILLED)
    }

    pub fn reborn(&self) -> bool {
        self.flags.contains(AttackFlags::REBIRTH)
    }

    #[must_use]
    pub fn with_attacker(mut self, attacker: UnitId) -> Self {
        self.attacker = Some(attacker);
        self
    }

    #[must_use]
    pub fn with_spell(mut self, spell: SpellId) -> Self {
        self.spell = Some(spell);
        self.flags |= AttackFlags::SPELL_EFFECT;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: u32) -> Self {
        self.effect = Some(effect);
        self.flags |= AttackFlags::EFFECT;
        self
    }

    #[must_use]
    pub fn secondary(mut self) -> Self {
        self.flags |= AttackFlags::SECONDARY;
        self
    }
}

/// Computes what `damage` does to `target` without mutating it.
///
/// The returned outcome's change holds the post-attack state and a health
/// delta of minus the damage actually taken.
pub fn resolve_attack(target: &UnitState, damage: i64, rng: &mut dyn RandomSource) -> AttackOutcome {
    let mut after = target.acquire();
    let taken = after.damage(damage);
    let killed_amount = target.count() - after.count();
    let mut flags = AttackFlags::empty();

    if !after.alive() && after.is_clone() {
        flags |= AttackFlags::CLONE_KILLED;
    } else if !after.alive() {
        flags |= AttackFlags::KILLED;
        if try_rebirth(&mut after, rng) {
            flags |= AttackFlags::REBIRTH;
        }
    }

    AttackOutcome {
        target: target.unit_id(),
        attacker: None,
        damage_amount: taken,
        killed_amount,
        flags,
        spell: None,
        effect: None,
        change: after.to_change(-taken),
    }
}

/// Brings part of a destroyed stack back, returns whether anything rose.
fn try_rebirth(unit: &mut UnitState, rng: &mut dyn RandomSource) -> bool {
    let percentage = unit.value_of_type(BonusKind::Rebirth);
    if percentage <= 0 || !unit.can_cast() {
        return false;
    }

    let roll = RebirthRoll {
        base_amount: unit.base_amount(),
        percentage,
        guaranteed: unit.has_bonus_of_subtype(BonusKind::Rebirth, 1),
    };
    let count = rebirth_count(roll, rng);
    if count <= 0 {
        return false;
    }

    unit.use_casts(1);
    unit.heal(
        i64::from(unit.max_health()) * i64::from(count),
        HealLevel::Resurrect,
        HealPower::Permanent,
    );
    unit.replenish_retaliations();
    tracing::debug!(unit = %unit.unit_id(), count, "rebirth");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BattleHex;
    use crate::bonus::{Bonus, BonusList};
    use crate::rng::ScriptedRandom;
    use crate::unit::{BattleSide, CreatureId, PlayerColor, SlotId, UnitInfo};

    fn create_test_unit(base_amount: i32, bonuses: &[Bonus]) -> UnitState {
        let info = UnitInfo {
            id: UnitId(5),
            side: BattleSide::Defender,
            owner: PlayerColor(1),
            slot: SlotId(0),
            creature: CreatureId(131),
            creature_level: 7,
            double_wide: true,
            base_amount,
            max_health: 200,
        };
        let list: BonusList = bonuses.iter().cloned().collect();
        UnitState::new(info, list).at(BattleHex(100))
    }

    fn phoenix(base_amount: i32) -> UnitState {
        create_test_unit(
            base_amount,
            &[
                Bonus::new(BonusKind::Rebirth, 20),
                Bonus::new(BonusKind::Casts, 1),
            ],
        )
    }

    #[test]
    fn non_lethal_attack_reports_killed_amount() {
        let unit = create_test_unit(10, &[]);
        let outcome = resolve_attack(&unit, 450, &mut ScriptedRandom::constant(0));
        assert_eq!(outcome.damage_amount, 450);
        assert_eq!(outcome.killed_amount, 2);
        assert!(outcome.flags.is_empty());
        assert_eq!(outcome.change.health_delta, -450);
        assert_eq!(outcome.change.unit, UnitId(5));
        // Target untouched.
        assert_eq!(unit.count(), 10);
    }

    #[test]
    fn lethal_attack_is_clamped_and_killed() {
        let unit = create_test_unit(2, &[]);
        let outcome = resolve_attack(&unit, 10_000, &mut ScriptedRandom::constant(0));
        assert_eq!(outcome.damage_amount, 400);
        assert_eq!(outcome.killed_amount, 2);
        assert!(outcome.killed());
        assert!(!outcome.reborn());
    }

    #[test]
    fn killing_a_clone_sets_clone_flag_only() {
        let mut unit = create_test_unit(3, &[Bonus::new(BonusKind::Rebirth, 100)]);
        unit.cloned = true;
        let outcome = resolve_attack(&unit, 1, &mut ScriptedRandom::constant(0));
        assert!(outcome.clone_killed());
        assert!(!outcome.killed());
        assert!(outcome.change.state.ghost_pending);
    }

    #[test]
    fn rebirth_with_high_rolls_keeps_floor_count() {
        let unit = phoenix(10);
        let outcome = resolve_attack(&unit, 10_000, &mut ScriptedRandom::constant(99));
        assert!(outcome.killed());
        assert!(outcome.reborn());

        let mut reborn = unit.acquire();
        reborn.apply_change(&outcome.change);
        assert_eq!(reborn.count(), 2);
        assert_eq!(reborn.casts_available(), 0);
    }

    #[test]
    fn rebirth_with_zero_rolls_adds_full_remainder() {
        let unit = phoenix(7);
        let outcome = resolve_attack(&unit, 10_000, &mut ScriptedRandom::constant(0));
        let mut reborn = unit.acquire();
        reborn.apply_change(&outcome.change);
        // floor(7 * 0.2) = 1, plus two remainder slots that all succeed.
        assert_eq!(reborn.count(), 3);
    }

    #[test]
    fn rebirth_needs_a_cast() {
        let mut unit = phoenix(10);
        unit.use_casts(1);
        let outcome = resolve_attack(&unit, 10_000, &mut ScriptedRandom::constant(0));
        assert!(outcome.killed());
        assert!(!outcome.reborn());
    }

    #[test]
    fn rebirth_replenishes_retaliations() {
        let mut unit = phoenix(10);
        unit.use_retaliations(1);
        let outcome = resolve_attack(&unit, 10_000, &mut ScriptedRandom::constant(0));
        let mut reborn = unit.acquire();
        reborn.apply_change(&outcome.change);
        assert!(reborn.able_to_retaliate());
    }

    #[test]
    fn guaranteed_rebirth_raises_at_least_one() {
        let unit = create_test_unit(
            2,
            &[
                Bonus::new(BonusKind::Rebirth, 20).with_subtype(1),
                Bonus::new(BonusKind::Casts, 1),
            ],
        );
        let outcome = resolve_attack(&unit, 10_000, &mut ScriptedRandom::constant(99));
        assert!(outcome.reborn());
        let mut reborn = unit.acquire();
        reborn.apply_change(&outcome.change);
        assert_eq!(reborn.count(), 1);
    }

    #[test]
    fn outcome_builders_set_flags() {
        let unit = create_test_unit(2, &[]);
        let outcome = resolve_attack(&unit, 1, &mut ScriptedRandom::constant(0))
            .with_attacker(UnitId(1))
            .with_spell(SpellId::LIGHTNING_BOLT)
            .with_effect(3)
            .secondary();
        assert!(outcome.flags.contains(AttackFlags::SPELL_EFFECT | AttackFlags::EFFECT));
        assert!(outcome.flags.contains(AttackFlags::SECONDARY));
        assert_eq!(outcome.attacker, Some(UnitId(1)));
    }
}
