//! In-memory battle.
//!
//! [`BattleState`] is the reference implementation of both battle boundaries.
//! Hosts with their own battle representation implement [`BattleQuery`] and
//! [`BattleStateMut`] instead; tests, replays and AI lookahead use this one.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, warn};

use super::{
    BattleHex, BattleQuery, BattleStateMut, HexDistances, Obstacle, SiegeState, WallPart,
    WallState,
};
use crate::bonus::{Bonus, BonusBearer, BonusKind};
use crate::config::BattleConfig;
use crate::unit::{BattleSide, PlayerColor, Stack, Unit, UnitChange, UnitId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleState {
    config: BattleConfig,
    players: [PlayerColor; 2],
    units: BTreeMap<UnitId, Stack>,
    obstacles: Vec<Obstacle>,
    siege: Option<SiegeState>,
    round: i32,
    mana_spent: BTreeMap<PlayerColor, i32>,
}

impl BattleState {
    pub fn new(config: BattleConfig, attacker: PlayerColor, defender: PlayerColor) -> Self {
        Self {
            config,
            players: [attacker, defender],
            units: BTreeMap::new(),
            obstacles: Vec::new(),
            siege: None,
            round: 0,
            mana_spent: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_siege(mut self, siege: SiegeState) -> Self {
        self.siege = Some(siege);
        self
    }

    /// Adds a participant, replacing any unit with the same id.
    pub fn add_stack(&mut self, stack: Stack) {
        self.units.insert(stack.unit_id(), stack);
    }

    pub fn stack(&self, id: UnitId) -> Option<&Stack> {
        self.units.get(&id)
    }

    pub fn stack_mut(&mut self, id: UnitId) -> Option<&mut Stack> {
        self.units.get_mut(&id)
    }

    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.units.values()
    }

    pub fn round(&self) -> i32 {
        self.round
    }

    pub fn mana_spent(&self, player: PlayerColor) -> i32 {
        self.mana_spent.get(&player).copied().unwrap_or(0)
    }

    /// Starts the next round: unit flags and retaliations reset, timed
    /// bonuses and spell obstacles age.
    pub fn next_round(&mut self) {
        self.round += 1;
        for stack in self.units.values_mut() {
            stack.state_mut().next_round();
        }
        let before = self.obstacles.len();
        self.obstacles.retain_mut(Obstacle::tick_round);
        debug!(
            round = self.round,
            expired = before - self.obstacles.len(),
            "round started"
        );
    }

    /// Turns pending ghosts into ghosts once the action's records are committed.
    pub fn commit_ghosts(&mut self) -> Vec<UnitId> {
        let mut committed = Vec::new();
        for stack in self.units.values_mut() {
            let state = stack.state_mut();
            if state.ghost_pending {
                state.ghost_pending = false;
                state.ghost = true;
                committed.push(state.unit_id());
            }
        }
        committed
    }

    fn tile_blocked(&self, hex: BattleHex, mover: UnitId) -> bool {
        self.units
            .values()
            .any(|stack| stack.alive() && stack.unit_id() != mover && stack.covers(hex))
            || self
                .obstacles
                .iter()
                .any(|obstacle| obstacle.kind.blocks_tiles() && obstacle.covers(hex))
            || self
                .siege
                .as_ref()
                .is_some_and(|siege| siege.blocking_part_at(hex).is_some())
    }

    fn can_stand(&self, unit: &dyn Unit, hex: BattleHex) -> bool {
        unit.hexes_at(hex)
            .iter()
            .all(|covered| covered.is_available() && !self.tile_blocked(*covered, unit.unit_id()))
    }

    /// Entering `hex` ends the move, as far as `unit` knows.
    fn stops_at(&self, unit: &dyn Unit, hex: BattleHex) -> bool {
        self.obstacles.iter().any(|obstacle| {
            obstacle.kind.stops_movement()
                && obstacle.covers(hex)
                && obstacle.visible_to(unit.unit_side())
        })
    }
}

impl BattleQuery for BattleState {
    fn config(&self) -> &BattleConfig {
        &self.config
    }

    fn units_if(&self, pred: &dyn Fn(&dyn Unit) -> bool) -> Vec<&dyn Unit> {
        self.units
            .values()
            .map(|stack| stack as &dyn Unit)
            .filter(|unit| pred(*unit))
            .collect()
    }

    fn unit(&self, id: UnitId) -> Option<&dyn Unit> {
        self.units.get(&id).map(|stack| stack as &dyn Unit)
    }

    fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    fn siege(&self) -> Option<&SiegeState> {
        self.siege.as_ref()
    }

    fn side_player(&self, side: BattleSide) -> PlayerColor {
        match side {
            BattleSide::Attacker => self.players[0],
            BattleSide::Defender => self.players[1],
        }
    }

    /// Breadth-first walk over free hexes. Flyers ignore everything in between.
    fn distances(&self, unit: &dyn Unit, from: BattleHex) -> HexDistances {
        let mut result = HexDistances::unreachable();
        if !from.is_valid() {
            return result;
        }
        result.set(from, 0);

        if unit.has_bonus_of_type(BonusKind::Flying) {
            for value in 0..BattleConfig::FIELD_SIZE as i16 {
                let hex = BattleHex(value);
                if hex != from && self.can_stand(unit, hex) {
                    let steps = BattleHex::distance(from, hex).max(0) as u32;
                    result.set(hex, steps);
                }
            }
            return result;
        }

        let mut queue = VecDeque::from([from]);
        while let Some(hex) = queue.pop_front() {
            if hex != from && self.stops_at(unit, hex) {
                continue;
            }
            let here = result.get(hex);
            for next in hex.neighbours() {
                if result.is_reachable(next) || !self.can_stand(unit, next) {
                    continue;
                }
                result.set(next, here + 1);
                queue.push_back(next);
            }
        }
        result
    }
}

impl BattleStateMut for BattleState {
    fn as_query(&self) -> &dyn BattleQuery {
        self
    }

    fn update_unit(&mut self, change: &UnitChange) {
        match self.units.get_mut(&change.unit) {
            Some(stack) => stack.state_mut().apply_change(change),
            None => warn!(unit = %change.unit, "change for an unknown unit"),
        }
    }

    fn add_unit_bonuses(&mut self, unit: UnitId, bonuses: &[Bonus]) {
        match self.units.get_mut(&unit) {
            Some(stack) => stack.state_mut().add_bonuses(bonuses),
            None => warn!(%unit, "bonuses for an unknown unit"),
        }
    }

    fn remove_unit_bonuses(&mut self, unit: UnitId, bonuses: &[Bonus]) {
        match self.units.get_mut(&unit) {
            Some(stack) => stack.state_mut().remove_bonuses(bonuses),
            None => warn!(%unit, "bonus removal for an unknown unit"),
        }
    }

    fn add_obstacle(&mut self, obstacle: Obstacle) {
        if self.obstacles.iter().any(|existing| existing.id == obstacle.id) {
            warn!(id = obstacle.id, "obstacle id reused, replacing");
            self.obstacles.retain(|existing| existing.id != obstacle.id);
        }
        self.obstacles.push(obstacle);
    }

    fn remove_obstacle(&mut self, id: u32) {
        self.obstacles.retain(|obstacle| obstacle.id != id);
    }

    fn remove_unit(&mut self, id: UnitId) {
        if self.units.remove(&id).is_none() {
            warn!(unit = %id, "removing an unknown unit");
        }
    }

    fn set_wall_state(&mut self, part: WallPart, state: WallState) {
        match self.siege.as_mut() {
            Some(siege) => siege.set_wall_state(part, state),
            None => warn!(%part, "wall change outside of a siege"),
        }
    }

    fn spend_mana(&mut self, player: PlayerColor, amount: i32) {
        *self.mana_spent.entry(player).or_default() += amount;
    }
}
