//! Battle participants.
//!
//! Every combat rule is written against the [`Unit`] capability trait. Two
//! implementations exist: the live [`Stack`] owned by the battle, and the
//! detached [`UnitState`] copy returned by [`Unit::acquire`] that decision
//! makers and spell effects mutate freely before anything is committed.

mod ammo;
mod health;
mod snapshot;
mod stack;
mod state;

pub use ammo::{Ammo, AmmoContext, AmmoKind};
pub use health::{HealLevel, HealPower, HealthInfo, HealthPool};
pub use snapshot::{AmmoSnapshot, HealthSnapshot, RetaliationSnapshot, UnitChange, UnitStateSnapshot};
pub use stack::Stack;
pub use state::UnitState;

use std::fmt;

use arrayvec::ArrayVec;

use crate::battle::BattleHex;
use crate::bonus::{BonusBearer, BonusKind};

// ============================================================================
// Identifiers
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleSide {
    Attacker,
    Defender,
}

impl BattleSide {
    pub fn other(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

/// Owning player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlayerColor(pub u8);

impl PlayerColor {
    pub const NEUTRAL: PlayerColor = PlayerColor(255);
}

/// Army slot the unit came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SlotId(pub i32);

impl SlotId {
    pub const SUMMONED: SlotId = SlotId(-3);
    pub const WAR_MACHINES: SlotId = SlotId(-4);
    pub const ARROW_TOWERS: SlotId = SlotId(-5);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CreatureId(pub i32);

impl CreatureId {
    pub const CATAPULT: CreatureId = CreatureId(145);
    pub const BALLISTA: CreatureId = CreatureId(146);
    pub const FIRST_AID_TENT: CreatureId = CreatureId(147);
    pub const AMMO_CART: CreatureId = CreatureId(148);
    pub const ARROW_TOWERS: CreatureId = CreatureId(149);
}

/// Immutable facts about a unit fixed when it joins the battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitInfo {
    pub id: UnitId,
    pub side: BattleSide,
    pub owner: PlayerColor,
    pub slot: SlotId,
    pub creature: CreatureId,
    pub creature_level: u8,
    pub double_wide: bool,
    pub base_amount: i32,
    pub max_health: i32,
}

impl UnitInfo {
    pub fn health_info(&self) -> HealthInfo {
        HealthInfo {
            max_health: self.max_health,
            base_amount: self.base_amount,
        }
    }
}

// ============================================================================
// Unit capability
// ============================================================================

/// Read-only view of a battle participant.
///
/// Turn-relative queries take `turn`: `0` is the current round, positive values
/// look ahead. Per-round flags (defended, moved, waited) only hold for turn 0.
pub trait Unit: BonusBearer {
    fn info(&self) -> &UnitInfo;

    fn alive(&self) -> bool;
    fn is_ghost(&self) -> bool;
    fn is_clone(&self) -> bool;
    fn has_clone(&self) -> bool;
    fn is_summoned(&self) -> bool;
    fn had_morale(&self) -> bool;

    fn can_cast(&self) -> bool;
    fn is_caster(&self) -> bool;
    fn can_shoot(&self) -> bool;
    fn is_shooter(&self) -> bool;
    fn able_to_retaliate(&self) -> bool;

    fn count(&self) -> i32;
    fn first_hp_left(&self) -> i32;
    fn available_health(&self) -> i64;
    fn total_health(&self) -> i64;
    fn killed(&self) -> i32;

    fn position(&self) -> BattleHex;

    fn defended(&self, turn: i32) -> bool;
    fn moved(&self, turn: i32) -> bool;
    fn waited(&self, turn: i32) -> bool;

    /// Detached mutable copy of the current state.
    fn acquire(&self) -> UnitState;

    // ===== identity =====

    fn unit_id(&self) -> UnitId {
        self.info().id
    }

    fn unit_side(&self) -> BattleSide {
        self.info().side
    }

    fn unit_owner(&self) -> PlayerColor {
        self.info().owner
    }

    fn unit_slot(&self) -> SlotId {
        self.info().slot
    }

    fn creature(&self) -> CreatureId {
        self.info().creature
    }

    fn max_health(&self) -> i32 {
        self.info().max_health
    }

    fn base_amount(&self) -> i32 {
        self.info().base_amount
    }

    fn double_wide(&self) -> bool {
        self.info().double_wide
    }

    // ===== derived state =====

    fn is_dead(&self) -> bool {
        !self.alive() && !self.is_ghost()
    }

    fn is_turret(&self) -> bool {
        self.creature() == CreatureId::ARROW_TOWERS
    }

    fn is_catapult(&self) -> bool {
        self.creature() == CreatureId::CATAPULT
    }

    /// Living (or, with `allow_dead`, dead) on-field unit that is not a tower.
    fn is_valid_target(&self, allow_dead: bool) -> bool {
        (self.alive() || (allow_dead && self.is_dead()))
            && self.position().is_valid()
            && !self.is_turret()
    }

    fn initiative(&self, turn: i32) -> i32 {
        self.value_of_type_at(BonusKind::StacksSpeed, turn)
    }

    fn can_move(&self, turn: i32) -> bool {
        self.alive() && !self.has_bonus_of_type_at(BonusKind::NotActive, turn)
    }

    fn will_move(&self, turn: i32) -> bool {
        !self.defended(turn) && !self.moved(turn) && self.can_move(turn)
    }

    /// Ordering bucket within a round: 0 siege machines, 1 regular turn,
    /// 2 waited with morale, 3 waited without morale.
    fn battle_queue_phase(&self, turn: i32) -> u8 {
        if self.waited(turn) {
            if self.had_morale() { 2 } else { 3 }
        } else if self.is_catapult() || self.is_turret() {
            0
        } else {
            1
        }
    }

    // ===== geometry =====

    fn hexes(&self) -> ArrayVec<BattleHex, 2> {
        self.hexes_at(self.position())
    }

    fn hexes_at(&self, position: BattleHex) -> ArrayVec<BattleHex, 2> {
        position.occupied_hexes(self.double_wide(), self.unit_side())
    }

    fn covers(&self, hex: BattleHex) -> bool {
        self.hexes().contains(&hex)
    }

    /// Hexes adjacent to the unit standing at `position` (its own by default).
    fn surrounding_hexes(&self, position: Option<BattleHex>) -> ArrayVec<BattleHex, 8> {
        position
            .unwrap_or_else(|| self.position())
            .surrounding_hexes(self.double_wide(), self.unit_side())
    }

    fn description(&self) -> String {
        format!(
            "{} ({} x creature {}) at {}",
            self.unit_id(),
            self.count(),
            self.creature().0,
            self.position()
        )
    }
}

/// Whether `attacker` standing on `attacker_pos` can hit `defender` on
/// `defender_pos` in melee, considering the back hex of double-wide units.
///
/// Invalid positions fall back to the units' current positions.
pub fn is_melee_attack_possible(
    attacker: &dyn Unit,
    defender: &dyn Unit,
    attacker_pos: BattleHex,
    defender_pos: BattleHex,
) -> bool {
    let attacker_pos = if attacker_pos.is_valid() {
        attacker_pos
    } else {
        attacker.position()
    };
    let defender_pos = if defender_pos.is_valid() {
        defender_pos
    } else {
        defender.position()
    };

    let attacker_hexes = attacker.hexes_at(attacker_pos);
    let defender_hexes = defender.hexes_at(defender_pos);
    attacker_hexes.iter().any(|from| {
        defender_hexes
            .iter()
            .any(|to| BattleHex::mutual_position(*from, *to).is_some())
    })
}
