//! Persisted form of a unit's mutable state.
//!
//! Field names follow the established save and network format. Missing fields
//! read as their defaults, and restoring a snapshot always resets the unit
//! first, so stale flags never survive a reload.

use tracing::error;

use super::{Unit, UnitId, UnitState};
use crate::battle::BattleHex;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AmmoSnapshot {
    pub used: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct RetaliationSnapshot {
    pub used: i32,
    pub total_cache: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HealthSnapshot {
    #[cfg_attr(feature = "serde", serde(rename = "firstHPleft"))]
    pub first_hp_left: i32,
    #[cfg_attr(feature = "serde", serde(rename = "fullUnits"))]
    pub full_units: i32,
    pub resurrected: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct UnitStateSnapshot {
    pub cloned: bool,
    pub defending: bool,
    pub defending_anim: bool,
    pub drained_mana: bool,
    pub fear: bool,
    pub had_morale: bool,
    pub ghost: bool,
    pub ghost_pending: bool,
    #[cfg_attr(feature = "serde", serde(rename = "moved"))]
    pub moved_this_turn: bool,
    pub summoned: bool,
    pub waiting: bool,
    pub casts: AmmoSnapshot,
    pub counter_attacks: RetaliationSnapshot,
    pub health: HealthSnapshot,
    pub shots: AmmoSnapshot,
    #[cfg_attr(feature = "serde", serde(rename = "cloneID"))]
    pub clone_id: i32,
    pub position: BattleHex,
}

impl Default for UnitStateSnapshot {
    fn default() -> Self {
        Self {
            cloned: false,
            defending: false,
            defending_anim: false,
            drained_mana: false,
            fear: false,
            had_morale: false,
            ghost: false,
            ghost_pending: false,
            moved_this_turn: false,
            summoned: false,
            waiting: false,
            casts: AmmoSnapshot::default(),
            counter_attacks: RetaliationSnapshot::default(),
            health: HealthSnapshot::default(),
            shots: AmmoSnapshot::default(),
            clone_id: -1,
            position: BattleHex::INVALID,
        }
    }
}

/// A committed change to one unit: its new state plus the health difference
/// observers animate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitChange {
    pub unit: UnitId,
    pub health_delta: i64,
    pub state: UnitStateSnapshot,
}

impl UnitState {
    pub fn snapshot(&self) -> UnitStateSnapshot {
        let retaliation_total = self.retaliations_available() + self.counter_attacks.used();
        UnitStateSnapshot {
            cloned: self.cloned,
            defending: self.defending,
            defending_anim: self.defending_anim,
            drained_mana: self.drained_mana,
            fear: self.fear,
            had_morale: self.had_morale,
            ghost: self.ghost,
            ghost_pending: self.ghost_pending,
            moved_this_turn: self.moved_this_turn,
            summoned: self.summoned,
            waiting: self.waiting,
            casts: AmmoSnapshot {
                used: self.casts.used(),
            },
            counter_attacks: RetaliationSnapshot {
                used: self.counter_attacks.used(),
                total_cache: self.counter_attacks.round_max().max(retaliation_total),
            },
            health: HealthSnapshot {
                first_hp_left: self.health.first_hp_left(),
                full_units: self.health.full_units(),
                resurrected: self.health.resurrected(),
            },
            shots: AmmoSnapshot {
                used: self.shots.used(),
            },
            clone_id: self.clone_id,
            position: self.position,
        }
    }

    /// Resets the unit, then restores every persisted field.
    pub fn restore(&mut self, snapshot: &UnitStateSnapshot) {
        self.reset();
        self.cloned = snapshot.cloned;
        self.defending = snapshot.defending;
        self.defending_anim = snapshot.defending_anim;
        self.drained_mana = snapshot.drained_mana;
        self.fear = snapshot.fear;
        self.had_morale = snapshot.had_morale;
        self.ghost = snapshot.ghost;
        self.ghost_pending = snapshot.ghost_pending;
        self.moved_this_turn = snapshot.moved_this_turn;
        self.summoned = snapshot.summoned;
        self.waiting = snapshot.waiting;
        self.casts.restore(snapshot.casts.used, 0);
        self.counter_attacks.restore(
            snapshot.counter_attacks.used,
            snapshot.counter_attacks.total_cache,
        );
        self.health.restore(
            snapshot.health.first_hp_left,
            snapshot.health.full_units,
            snapshot.health.resurrected,
        );
        self.shots.restore(snapshot.shots.used, 0);
        self.clone_id = snapshot.clone_id;
        self.position = snapshot.position;
    }

    /// Packages the current state as a change with the given health delta.
    pub fn to_change(&self, health_delta: i64) -> UnitChange {
        UnitChange {
            unit: self.unit_id(),
            health_delta,
            state: self.snapshot(),
        }
    }

    /// Applies a committed change. A change addressed to another unit is
    /// logged and still applied, as the host asked for it.
    pub fn apply_change(&mut self, change: &UnitChange) {
        if change.unit != self.unit_id() {
            error!(
                expected = %self.unit_id(),
                received = %change.unit,
                "unit change applied to the wrong unit"
            );
        }
        self.restore(&change.state);
    }
}
