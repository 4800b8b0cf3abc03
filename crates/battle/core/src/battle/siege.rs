//! Town walls during a siege.

use std::collections::BTreeMap;

use super::BattleHex;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WallPart {
    Keep,
    BottomTower,
    BottomWall,
    BelowGate,
    OverGate,
    UpperWall,
    UpperTower,
    Gate,
    IndestructibleGate,
    Indestructible,
}

impl WallPart {
    /// Parts a catapult or earthquake can damage.
    pub const DESTRUCTIBLE: [WallPart; 8] = [
        WallPart::Keep,
        WallPart::BottomTower,
        WallPart::BottomWall,
        WallPart::BelowGate,
        WallPart::OverGate,
        WallPart::UpperWall,
        WallPart::UpperTower,
        WallPart::Gate,
    ];

    const HEXES: [(i16, WallPart); 14] = [
        (50, WallPart::Keep),
        (183, WallPart::BottomTower),
        (182, WallPart::BottomWall),
        (130, WallPart::BelowGate),
        (78, WallPart::OverGate),
        (29, WallPart::UpperWall),
        (12, WallPart::UpperTower),
        (95, WallPart::IndestructibleGate),
        (96, WallPart::Gate),
        (45, WallPart::Indestructible),
        (62, WallPart::Indestructible),
        (112, WallPart::Indestructible),
        (147, WallPart::Indestructible),
        (165, WallPart::Indestructible),
    ];

    pub fn is_destructible(self) -> bool {
        !matches!(self, Self::Indestructible | Self::IndestructibleGate)
    }

    /// Hex a damaged part is shown at.
    pub fn hex(self) -> BattleHex {
        Self::HEXES
            .iter()
            .find(|(_, part)| *part == self)
            .map(|(hex, _)| BattleHex(*hex))
            .unwrap_or(BattleHex::INVALID)
    }

    pub fn at(hex: BattleHex) -> Option<WallPart> {
        Self::HEXES
            .iter()
            .find(|(value, _)| *value == hex.value())
            .map(|(_, part)| *part)
    }

    /// Position of the turret manned from this part, if any.
    pub fn turret_position(self) -> Option<BattleHex> {
        match self {
            Self::Keep => Some(BattleHex::CASTLE_CENTRAL_TOWER),
            Self::BottomTower => Some(BattleHex::CASTLE_BOTTOM_TOWER),
            Self::UpperTower => Some(BattleHex::CASTLE_UPPER_TOWER),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WallState {
    /// The town does not have this part.
    None,
    Destroyed,
    Damaged,
    Intact,
}

impl WallState {
    pub fn is_attackable(self) -> bool {
        matches!(self, Self::Damaged | Self::Intact)
    }

    /// State after taking `damage` hits.
    pub fn after_damage(self, damage: u8) -> WallState {
        let mut state = self;
        for _ in 0..damage {
            state = match state {
                Self::Intact => Self::Damaged,
                Self::Damaged | Self::Destroyed => Self::Destroyed,
                Self::None => Self::None,
            };
        }
        state
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FortLevel {
    None,
    Fort,
    Citadel,
    Castle,
}

/// Walls of the besieged town.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SiegeState {
    pub fort: FortLevel,
    walls: BTreeMap<WallPart, WallState>,
}

impl SiegeState {
    /// Walls matching the fort: the keep from a citadel up, towers only in a castle.
    pub fn new(fort: FortLevel) -> Self {
        let mut walls = BTreeMap::new();
        for part in WallPart::DESTRUCTIBLE {
            let state = match (fort, part) {
                (FortLevel::None, _) => WallState::None,
                (FortLevel::Fort, WallPart::Keep | WallPart::BottomTower | WallPart::UpperTower) => {
                    WallState::None
                }
                (FortLevel::Citadel, WallPart::BottomTower | WallPart::UpperTower) => {
                    WallState::None
                }
                _ => WallState::Intact,
            };
            walls.insert(part, state);
        }
        Self { fort, walls }
    }

    pub fn has_fort(&self) -> bool {
        self.fort != FortLevel::None
    }

    pub fn wall_state(&self, part: WallPart) -> WallState {
        self.walls.get(&part).copied().unwrap_or(WallState::None)
    }

    pub fn set_wall_state(&mut self, part: WallPart, state: WallState) {
        if part.is_destructible() {
            self.walls.insert(part, state);
        }
    }

    pub fn attackable_parts(&self) -> Vec<WallPart> {
        WallPart::DESTRUCTIBLE
            .into_iter()
            .filter(|part| self.wall_state(*part).is_attackable())
            .collect()
    }

    /// Wall part covering `hex` that still blocks passage.
    pub fn blocking_part_at(&self, hex: BattleHex) -> Option<WallPart> {
        let part = WallPart::at(hex)?;
        if part == WallPart::IndestructibleGate {
            return None;
        }
        if !part.is_destructible() {
            return Some(part);
        }
        match self.wall_state(part) {
            WallState::Damaged | WallState::Intact => Some(part),
            WallState::Destroyed | WallState::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_map_to_hexes_and_back() {
        for part in WallPart::DESTRUCTIBLE {
            assert_eq!(WallPart::at(part.hex()), Some(part));
        }
        assert_eq!(WallPart::at(BattleHex(62)), Some(WallPart::Indestructible));
        assert_eq!(WallPart::at(BattleHex(63)), None);
    }

    #[test]
    fn wall_degrades_in_steps() {
        assert_eq!(WallState::Intact.after_damage(1), WallState::Damaged);
        assert_eq!(WallState::Intact.after_damage(2), WallState::Destroyed);
        assert_eq!(WallState::None.after_damage(2), WallState::None);
    }

    #[test]
    fn fort_level_decides_towers() {
        let fort = SiegeState::new(FortLevel::Fort);
        assert_eq!(fort.wall_state(WallPart::Keep), WallState::None);
        assert_eq!(fort.wall_state(WallPart::Gate), WallState::Intact);
        assert_eq!(fort.attackable_parts().len(), 5);

        let castle = SiegeState::new(FortLevel::Castle);
        assert_eq!(castle.attackable_parts().len(), 8);
        assert!(!SiegeState::new(FortLevel::None).has_fort());
    }

    #[test]
    fn destroyed_wall_stops_blocking() {
        let mut siege = SiegeState::new(FortLevel::Castle);
        let hex = WallPart::UpperWall.hex();
        assert_eq!(siege.blocking_part_at(hex), Some(WallPart::UpperWall));
        siege.set_wall_state(WallPart::UpperWall, WallState::Destroyed);
        assert_eq!(siege.blocking_part_at(hex), None);
        assert_eq!(siege.attackable_parts().len(), 7);
    }

    #[test]
    fn gate_passage_never_blocks() {
        let siege = SiegeState::new(FortLevel::Castle);
        assert_eq!(siege.blocking_part_at(WallPart::IndestructibleGate.hex()), None);
        assert_eq!(siege.blocking_part_at(BattleHex(112)), Some(WallPart::Indestructible));
    }
}
