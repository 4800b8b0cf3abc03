//! Read and write boundaries of the battle.
//!
//! Combat rules never own the battlefield. They read it through
//! [`BattleQuery`] and, when applying spell effects directly, write through
//! [`BattleStateMut`]. Pathfinding is the one geometric service a host must
//! provide ([`BattleQuery::distances`]); everything else derives from the unit
//! and obstacle lists.

use super::{BattleHex, HexDistances, Obstacle, ObstacleKind, SiegeState, WallPart, WallState};
use crate::bonus::{Bonus, BonusBearer, BonusKind};
use crate::config::BattleConfig;
use crate::unit::{BattleSide, PlayerColor, Unit, UnitChange, UnitId, is_melee_attack_possible};

/// Pure reads over the current battle.
pub trait BattleQuery {
    fn config(&self) -> &BattleConfig;

    /// Every unit satisfying `pred`, ordered by id.
    fn units_if(&self, pred: &dyn Fn(&dyn Unit) -> bool) -> Vec<&dyn Unit>;

    fn unit(&self, id: UnitId) -> Option<&dyn Unit>;

    fn obstacles(&self) -> &[Obstacle];

    /// Town walls, `None` outside of sieges.
    fn siege(&self) -> Option<&SiegeState>;

    fn side_player(&self, side: BattleSide) -> PlayerColor;

    /// Movement distance from `from` to every hex for `unit`.
    fn distances(&self, unit: &dyn Unit, from: BattleHex) -> HexDistances;

    // ===== units =====

    fn player_side(&self, player: PlayerColor) -> Option<BattleSide> {
        [BattleSide::Attacker, BattleSide::Defender]
            .into_iter()
            .find(|side| self.side_player(*side) == player)
    }

    /// Unit covering `hex`. Dead units are considered unless `only_alive`.
    fn unit_at(&self, hex: BattleHex, only_alive: bool) -> Option<&dyn Unit> {
        self.units_if(&|unit| {
            unit.covers(hex) && (unit.alive() || (!only_alive && unit.is_dead()))
        })
        .into_iter()
        .next()
    }

    /// Owner after hypnosis: a hypnotized unit fights for the other side.
    fn effective_owner(&self, unit: &dyn Unit) -> PlayerColor {
        if unit.has_bonus_of_type(BonusKind::Hypnotized) {
            self.side_player(unit.unit_side().other())
        } else {
            unit.unit_owner()
        }
    }

    /// Whether `unit` is friend (`Some(true)`) or foe (`Some(false)`) of
    /// `player`. `None` matches anyone.
    fn match_player(&self, player: PlayerColor, unit: &dyn Unit, positive: Option<bool>) -> bool {
        positive.is_none_or(|positive| (self.effective_owner(unit) == player) == positive)
    }

    /// `Some(true)` matches allies, `Some(false)` enemies, `None` anyone.
    fn match_owner(&self, attacker: &dyn Unit, defender: &dyn Unit, positive: Option<bool>) -> bool {
        self.match_player(self.effective_owner(attacker), defender, positive)
    }

    fn adjacent_units(&self, unit: &dyn Unit) -> Vec<&dyn Unit> {
        let around = unit.surrounding_hexes(None);
        let id = unit.unit_id();
        self.units_if(&|other| {
            other.unit_id() != id
                && other.alive()
                && other.hexes().iter().any(|hex| around.contains(hex))
        })
    }

    /// Own resistance plus the best resistance aura of adjacent allies, capped at 100.
    fn magic_resistance(&self, unit: &dyn Unit) -> i32 {
        let own = unit.own_magic_resistance();
        let aura = self
            .adjacent_units(unit)
            .into_iter()
            .filter(|other| other.unit_owner() == unit.unit_owner())
            .filter_map(|other| {
                other.max_value_of(&|b| b.kind == BonusKind::SpellResistanceAura)
            })
            .max()
            .unwrap_or(0);
        (own + aura).clamp(0, 100)
    }

    fn has_native_stack(&self, side: BattleSide) -> bool {
        !self
            .units_if(&|unit| {
                unit.alive()
                    && unit.unit_side() == side
                    && unit.has_bonus_of_type(BonusKind::NativeTerrain)
            })
            .is_empty()
    }

    // ===== movement =====

    /// Hexes `unit` can move to this turn from `from`, its own hex included.
    fn available_hexes(&self, unit: &dyn Unit, from: BattleHex) -> Vec<BattleHex> {
        let distances = self.distances(unit, from);
        let range = u32::try_from(unit.initiative(0).max(0)).unwrap_or(0);
        (0..BattleConfig::FIELD_SIZE as i16)
            .map(BattleHex)
            .filter(|hex| hex.is_available() && distances.get(*hex) <= range)
            .collect()
    }

    /// Nearest unit `unit` could hit in melee this turn, regardless of owner,
    /// and the hex to attack it from.
    fn nearest_stack(&self, unit: &dyn Unit) -> Option<(UnitId, BattleHex)> {
        let distances = self.distances(unit, unit.position());
        let hexes = self.available_hexes(unit, unit.position());
        let id = unit.unit_id();
        let mut best: Option<(u32, UnitId, BattleHex)> = None;
        for other in self.units_if(&|other| other.is_valid_target(false) && other.unit_id() != id) {
            for hex in &hexes {
                if !is_melee_attack_possible(unit, other, *hex, other.position()) {
                    continue;
                }
                let distance = distances.get(*hex);
                if best.is_none_or(|(d, _, _)| distance < d) {
                    best = Some((distance, other.unit_id(), *hex));
                }
            }
        }
        best.map(|(_, target, hex)| (target, hex))
    }

    /// An enemy stands next to the unit.
    fn is_unit_blocked(&self, unit: &dyn Unit) -> bool {
        if unit.has_bonus_of_type(BonusKind::SiegeWeapon) {
            return false;
        }
        self.adjacent_units(unit)
            .into_iter()
            .any(|other| self.match_owner(unit, other, Some(false)))
    }

    /// Whether `attacker` may shoot at whatever stands on `target`.
    fn can_shoot(&self, attacker: &dyn Unit, target: BattleHex) -> bool {
        let Some(defender) = self.unit_at(target, true) else {
            return false;
        };
        if attacker.is_catapult() {
            return false;
        }
        attacker.can_shoot()
            && self.match_owner(attacker, defender, Some(false))
            && defender.alive()
            && (!self.is_unit_blocked(attacker) || attacker.has_bonus_of_type(BonusKind::FreeShooting))
    }

    // ===== obstacles and walls =====

    fn obstacles_at(&self, hex: BattleHex) -> Vec<&Obstacle> {
        self.obstacles()
            .iter()
            .filter(|obstacle| obstacle.covers(hex))
            .collect()
    }

    fn next_obstacle_id(&self) -> u32 {
        self.obstacles()
            .iter()
            .map(|obstacle| obstacle.id + 1)
            .fold(1, u32::max)
    }

    fn wall_state(&self, part: WallPart) -> WallState {
        self.siege()
            .map(|siege| siege.wall_state(part))
            .unwrap_or(WallState::None)
    }

    /// Hex can receive a new spell obstacle.
    ///
    /// It must be on the field, hold no unit and no obstacle other than the
    /// moat. During a siege, side tower hexes and standing wall parts are
    /// excluded.
    fn is_obstacle_hex_free(&self, hex: BattleHex) -> bool {
        if !hex.is_available() || self.unit_at(hex, false).is_some() {
            return false;
        }
        if self
            .obstacles_at(hex)
            .iter()
            .any(|obstacle| obstacle.kind != ObstacleKind::Moat)
        {
            return false;
        }
        if let Some(siege) = self.siege().filter(|siege| siege.has_fort()) {
            if let Some(part) = WallPart::at(hex) {
                if matches!(part, WallPart::BottomTower | WallPart::UpperTower) {
                    return false;
                }
                if siege.blocking_part_at(hex).is_some() {
                    return false;
                }
            }
        }
        true
    }
}

/// Direct writes used by the non-replicated apply backend.
pub trait BattleStateMut: BattleQuery {
    fn as_query(&self) -> &dyn BattleQuery;

    fn update_unit(&mut self, change: &UnitChange);
    fn add_unit_bonuses(&mut self, unit: UnitId, bonuses: &[Bonus]);
    fn remove_unit_bonuses(&mut self, unit: UnitId, bonuses: &[Bonus]);
    fn add_obstacle(&mut self, obstacle: Obstacle);
    fn remove_obstacle(&mut self, id: u32);
    fn remove_unit(&mut self, id: UnitId);
    fn set_wall_state(&mut self, part: WallPart, state: WallState);
    fn spend_mana(&mut self, player: PlayerColor, amount: i32);

    /// Applies one record.
    fn apply_record(&mut self, record: &super::BattleRecord) {
        use super::BattleRecord;
        match record {
            BattleRecord::UnitsChanged(changes) => {
                for change in changes {
                    self.update_unit(change);
                }
            }
            BattleRecord::UnitsAttacked(outcomes) => {
                for outcome in outcomes {
                    self.update_unit(&outcome.change);
                }
            }
            BattleRecord::BonusesAdded { unit, bonuses } => self.add_unit_bonuses(*unit, bonuses),
            BattleRecord::BonusesRemoved { unit, bonuses } => {
                self.remove_unit_bonuses(*unit, bonuses)
            }
            BattleRecord::ObstaclesPlaced(obstacles) => {
                for obstacle in obstacles {
                    self.add_obstacle(obstacle.clone());
                }
            }
            BattleRecord::ObstaclesRemoved(ids) => {
                for id in ids {
                    self.remove_obstacle(*id);
                }
            }
            BattleRecord::UnitsRemoved(ids) => {
                for id in ids {
                    self.remove_unit(*id);
                }
            }
            BattleRecord::WallsAttacked(hits) => {
                for hit in hits {
                    self.set_wall_state(hit.part, hit.state_after);
                }
            }
            BattleRecord::ManaSpent { player, amount } => self.spend_mana(*player, *amount),
        }
    }
}
