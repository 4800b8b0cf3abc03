use super::BattleHex;
use crate::spells::SpellId;
use crate::unit::BattleSide;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObstacleKind {
    /// Terrain obstacle that a spell can clear.
    Usual,
    /// Terrain obstacle nothing removes.
    Absolute,
    Moat,
    FireWall,
    ForceField,
    LandMine,
    Quicksand,
}

impl ObstacleKind {
    pub fn is_spell_created(self) -> bool {
        matches!(
            self,
            Self::FireWall | Self::ForceField | Self::LandMine | Self::Quicksand
        )
    }

    /// Units cannot enter the covered hexes.
    pub fn blocks_tiles(self) -> bool {
        matches!(self, Self::Usual | Self::Absolute | Self::ForceField)
    }

    /// Entering the hex ends movement.
    pub fn stops_movement(self) -> bool {
        matches!(self, Self::Moat | Self::Quicksand | Self::LandMine)
    }

    /// Whether a removal effect of `level` can clear this obstacle.
    pub fn removable_at(self, level: u8) -> bool {
        match self {
            Self::Absolute | Self::Moat => false,
            Self::Usual => true,
            Self::FireWall => level >= 2,
            Self::Quicksand | Self::LandMine | Self::ForceField => level >= 3,
        }
    }
}

/// An obstacle on the battlefield.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub position: BattleHex,
    /// Explicit footprint; empty means the obstacle covers `position` only.
    pub area: Vec<BattleHex>,
    /// Spell that created the obstacle and fires when it is triggered.
    pub spell: Option<SpellId>,
    pub caster_side: Option<BattleSide>,
    pub spell_level: u8,
    pub caster_power: i32,
    /// Rounds left, negative for permanent obstacles.
    pub turns_remaining: i32,
    /// Whether the side that did not place it can see it.
    pub visible_to_enemy: bool,
}

impl Obstacle {
    pub fn new(id: u32, kind: ObstacleKind, position: BattleHex) -> Self {
        Self {
            id,
            kind,
            position,
            area: Vec::new(),
            spell: None,
            caster_side: None,
            spell_level: 0,
            caster_power: 0,
            turns_remaining: -1,
            visible_to_enemy: true,
        }
    }

    pub fn covered_hexes(&self) -> Vec<BattleHex> {
        if self.area.is_empty() {
            vec![self.position]
        } else {
            self.area.clone()
        }
    }

    pub fn covers(&self, hex: BattleHex) -> bool {
        if self.area.is_empty() {
            self.position == hex
        } else {
            self.area.contains(&hex)
        }
    }

    pub fn visible_to(&self, side: BattleSide) -> bool {
        self.visible_to_enemy || self.caster_side.is_none_or(|caster| caster == side)
    }

    /// Ages the obstacle by one round; returns `false` once it has expired.
    pub fn tick_round(&mut self) -> bool {
        if self.turns_remaining < 0 {
            return true;
        }
        self.turns_remaining -= 1;
        self.turns_remaining > 0
    }
}
