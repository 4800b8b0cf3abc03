//! Attack candidates of one unit for the current turn.
//!
//! [`PotentialTargets`] enumerates every way an attacker can hit an enemy
//! this turn and ranks them by [`AttackPossibility::attack_value`]:
//!
//! - **Compulsion**: a unit bound to attack the nearest creature gets a
//!   single melee possibility against that creature, whoever owns it. Every
//!   other valid unit is reported unreachable, all of them when no creature
//!   can be reached this turn.
//! - **Shooting**: an enemy the attacker can shoot yields one ranged
//!   possibility and no melee ones.
//! - **Melee**: otherwise each reachable hex from which the enemy can be hit
//!   yields one possibility charged with its movement distance.
//!
//! Enemies with no possibility at all are kept in
//! [`PotentialTargets::unreachable_enemies`] so callers can plan a move
//! towards them.
//!
//! # Determinism
//!
//! Defenders are visited in id order and hexes in index order. Among equal
//! values the first candidate wins, so the same battle always yields the
//! same choice.

use battle_core::{
    BattleHex, BattleQuery, BonusBearer, BonusKind, Unit, UnitId, is_melee_attack_possible,
};

use crate::error::TacticsError;
use crate::estimator::{AttackInfo, DamageEstimator};
use crate::possibility::AttackPossibility;

/// Ranked attack options of one attacker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PotentialTargets {
    attacker: UnitId,
    possible_attacks: Vec<AttackPossibility>,
    unreachable_enemies: Vec<UnitId>,
}

impl PotentialTargets {
    /// Collects the attack options of `attacker` in `battle`.
    ///
    /// When the battle knows the attacker, its own copy is used, so a
    /// hypothetical battle with a moved or damaged attacker is respected.
    pub fn new(
        attacker: &dyn Unit,
        battle: &dyn BattleQuery,
        estimator: &dyn DamageEstimator,
    ) -> Self {
        let attacker = battle.unit(attacker.unit_id()).unwrap_or(attacker);
        let id = attacker.unit_id();
        let origin = attacker.position();

        let distances = battle.distances(attacker, origin);
        let reachable = battle.available_hexes(attacker, origin);
        let compelled = attacker.has_bonus_of_type(BonusKind::AttacksNearestCreature);
        let forced = if compelled {
            battle.nearest_stack(attacker)
        } else {
            None
        };

        let mut targets = Self {
            attacker: id,
            possible_attacks: Vec::new(),
            unreachable_enemies: Vec::new(),
        };

        let candidates =
            battle.units_if(&|unit| unit.is_valid_target(false) && unit.unit_id() != id);
        for defender in candidates {
            if !compelled && !battle.match_owner(attacker, defender, Some(false)) {
                continue;
            }

            let found = match forced {
                Some((target, hex)) if defender.unit_id() == target => {
                    let attack = AttackInfo::new(attacker, defender, false)
                        .with_charged_fields(distances.get(hex));
                    vec![AttackPossibility::evaluate(&attack, hex, estimator)]
                }
                _ if compelled => Vec::new(),
                None if battle.can_shoot(attacker, defender.position()) => {
                    let attack = AttackInfo::new(attacker, defender, true);
                    vec![AttackPossibility::evaluate(
                        &attack,
                        BattleHex::INVALID,
                        estimator,
                    )]
                }
                _ => reachable
                    .iter()
                    .filter(|hex| {
                        is_melee_attack_possible(attacker, defender, **hex, defender.position())
                    })
                    .map(|hex| {
                        let attack = AttackInfo::new(attacker, defender, false)
                            .with_charged_fields(distances.get(*hex));
                        AttackPossibility::evaluate(&attack, *hex, estimator)
                    })
                    .collect(),
            };

            if found.is_empty() {
                targets.unreachable_enemies.push(defender.unit_id());
            } else {
                targets.possible_attacks.extend(found);
            }
        }

        tracing::debug!(
            attacker = %id,
            possible = targets.possible_attacks.len(),
            unreachable = targets.unreachable_enemies.len(),
            compelled,
            forced = forced.is_some(),
            "collected attack candidates"
        );
        targets
    }

    pub fn attacker(&self) -> UnitId {
        self.attacker
    }

    pub fn possible_attacks(&self) -> &[AttackPossibility] {
        &self.possible_attacks
    }

    pub fn unreachable_enemies(&self) -> &[UnitId] {
        &self.unreachable_enemies
    }

    pub fn is_empty(&self) -> bool {
        self.possible_attacks.is_empty()
    }

    /// The first candidate with the highest attack value.
    ///
    /// # Errors
    ///
    /// [`TacticsError::NoCandidates`] when there is no possible attack.
    pub fn best_action(&self) -> Result<&AttackPossibility, TacticsError> {
        let mut best: Option<&AttackPossibility> = None;
        for candidate in &self.possible_attacks {
            if best.is_none_or(|current| candidate.attack_value() > current.attack_value()) {
                best = Some(candidate);
            }
        }
        let best = best.ok_or_else(|| TacticsError::no_candidates(self.attacker))?;

        tracing::debug!(
            attacker = %self.attacker,
            defender = %best.defender,
            dest = %best.dest,
            value = best.attack_value(),
            "selected attack"
        );
        Ok(best)
    }

    /// Value of the best candidate, 0 when there is none.
    pub fn best_action_value(&self) -> i64 {
        self.possible_attacks
            .iter()
            .map(AttackPossibility::attack_value)
            .max()
            .unwrap_or(0)
    }
}
