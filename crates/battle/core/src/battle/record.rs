//! Mutation records and the replication boundary.
//!
//! Authoritative changes to a battle are expressed as [`BattleRecord`]s. A
//! [`ReplicationSink`] applies each record locally and makes sure every
//! observer sees the same sequence, so all copies of the battle converge.

use tracing::warn;

use super::{BattleQuery, BattleStateMut, Obstacle, WallPart, WallState};
use crate::bonus::Bonus;
use crate::combat::AttackOutcome;
use crate::unit::{PlayerColor, UnitChange, UnitId};

/// One hit on a wall part.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallHit {
    pub part: WallPart,
    pub damage: u8,
    /// State of the part once the hit is applied.
    pub state_after: WallState,
}

/// A mutation of the battle, applied identically by every observer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleRecord {
    /// New states for healed, raised or otherwise changed units.
    UnitsChanged(Vec<UnitChange>),
    UnitsAttacked(Vec<AttackOutcome>),
    BonusesAdded { unit: UnitId, bonuses: Vec<Bonus> },
    BonusesRemoved { unit: UnitId, bonuses: Vec<Bonus> },
    ObstaclesPlaced(Vec<Obstacle>),
    ObstaclesRemoved(Vec<u32>),
    UnitsRemoved(Vec<UnitId>),
    WallsAttacked(Vec<WallHit>),
    ManaSpent { player: PlayerColor, amount: i32 },
}

impl BattleRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnitsChanged(_) => "units_changed",
            Self::UnitsAttacked(_) => "units_attacked",
            Self::BonusesAdded { .. } => "bonuses_added",
            Self::BonusesRemoved { .. } => "bonuses_removed",
            Self::ObstaclesPlaced(_) => "obstacles_placed",
            Self::ObstaclesRemoved(_) => "obstacles_removed",
            Self::UnitsRemoved(_) => "units_removed",
            Self::WallsAttacked(_) => "walls_attacked",
            Self::ManaSpent { .. } => "mana_spent",
        }
    }
}

/// The authoritative "apply and replicate" channel.
pub trait ReplicationSink {
    /// Current battle, with every record sent so far already applied.
    fn battle(&self) -> &dyn BattleQuery;

    /// Applies `record` locally and forwards it to all observers.
    fn send_and_apply(&mut self, record: BattleRecord);

    /// Reports a request the authoritative side refused to carry out.
    fn complain(&mut self, problem: &str);
}

/// Replication over an in-process battle.
///
/// Every record is applied to the wrapped state and appended to a journal.
/// Replaying the journal on another copy of the starting battle with
/// [`replay`] yields the same battle.
pub struct LocalReplication<'a, S: BattleStateMut> {
    state: &'a mut S,
    journal: Vec<BattleRecord>,
    complaints: Vec<String>,
}

impl<'a, S: BattleStateMut> LocalReplication<'a, S> {
    pub fn new(state: &'a mut S) -> Self {
        Self {
            state,
            journal: Vec::new(),
            complaints: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        self.state
    }

    pub fn journal(&self) -> &[BattleRecord] {
        &self.journal
    }

    pub fn complaints(&self) -> &[String] {
        &self.complaints
    }

    pub fn into_journal(self) -> Vec<BattleRecord> {
        self.journal
    }
}

impl<S: BattleStateMut> ReplicationSink for LocalReplication<'_, S> {
    fn battle(&self) -> &dyn BattleQuery {
        self.state.as_query()
    }

    fn send_and_apply(&mut self, record: BattleRecord) {
        self.state.apply_record(&record);
        self.journal.push(record);
    }

    fn complain(&mut self, problem: &str) {
        warn!(problem, "replication refused a request");
        self.complaints.push(problem.to_owned());
    }
}

/// Applies a journal, in order, to an observer's copy of the battle.
pub fn replay(records: &[BattleRecord], state: &mut dyn BattleStateMut) {
    for record in records {
        state.apply_record(record);
    }
}
