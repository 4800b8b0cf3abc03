//! Battlefield hex coordinates.
//!
//! The field is a 17 x 11 grid of hexes numbered row by row. Odd rows are
//! shifted half a hex to the left. The outermost columns hold war machines and
//! are never available for regular movement. Negative values are sentinels for
//! siege structures and "no position".

use std::fmt;

use arrayvec::ArrayVec;

use crate::config::BattleConfig;
use crate::unit::BattleSide;

/// The six hexagonal directions, clockwise from the upper left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HexDirection {
    TopLeft,
    TopRight,
    Right,
    BottomRight,
    BottomLeft,
    Left,
}

impl HexDirection {
    pub const ALL: [HexDirection; 6] = [
        HexDirection::TopLeft,
        HexDirection::TopRight,
        HexDirection::Right,
        HexDirection::BottomRight,
        HexDirection::BottomLeft,
        HexDirection::Left,
    ];
}

/// One battlefield hex, or a sentinel position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BattleHex(pub i16);

impl BattleHex {
    pub const INVALID: BattleHex = BattleHex(-1);
    /// Central keep tower of a besieged town.
    pub const CASTLE_CENTRAL_TOWER: BattleHex = BattleHex(-2);
    pub const CASTLE_BOTTOM_TOWER: BattleHex = BattleHex(-3);
    pub const CASTLE_UPPER_TOWER: BattleHex = BattleHex(-4);

    pub const fn new(value: i16) -> Self {
        Self(value)
    }

    /// Builds a hex from column and row, `None` when outside the field.
    pub fn from_xy(x: i16, y: i16) -> Option<Self> {
        if (0..BattleConfig::FIELD_WIDTH).contains(&x) && (0..BattleConfig::FIELD_HEIGHT).contains(&y)
        {
            Some(Self(x + y * BattleConfig::FIELD_WIDTH))
        } else {
            None
        }
    }

    pub const fn value(self) -> i16 {
        self.0
    }

    /// Index into per-hex tables. Only meaningful for valid hexes.
    pub fn index(self) -> usize {
        self.0.max(0) as usize
    }

    pub fn is_valid(self) -> bool {
        self.0 >= 0 && (self.0 as usize) < BattleConfig::FIELD_SIZE
    }

    /// Valid and outside the two war machine columns.
    pub fn is_available(self) -> bool {
        self.is_valid() && self.x() > 0 && self.x() < BattleConfig::FIELD_WIDTH - 1
    }

    pub fn x(self) -> i16 {
        self.0 % BattleConfig::FIELD_WIDTH
    }

    pub fn y(self) -> i16 {
        self.0 / BattleConfig::FIELD_WIDTH
    }

    /// Neighbour in `dir`, `None` when it falls off the field.
    pub fn move_in_direction(self, dir: HexDirection) -> Option<BattleHex> {
        if !self.is_valid() {
            return None;
        }
        let (x, y) = (self.x(), self.y());
        let odd = y % 2 == 1;
        let (nx, ny) = match dir {
            HexDirection::TopLeft => (if odd { x - 1 } else { x }, y - 1),
            HexDirection::TopRight => (if odd { x } else { x + 1 }, y - 1),
            HexDirection::Right => (x + 1, y),
            HexDirection::BottomRight => (if odd { x } else { x + 1 }, y + 1),
            HexDirection::BottomLeft => (if odd { x - 1 } else { x }, y + 1),
            HexDirection::Left => (x - 1, y),
        };
        BattleHex::from_xy(nx, ny)
    }

    /// Every on-field neighbour, in direction order.
    pub fn neighbours(self) -> ArrayVec<BattleHex, 6> {
        HexDirection::ALL
            .iter()
            .filter_map(|dir| self.move_in_direction(*dir))
            .collect()
    }

    /// Direction leading from `from` to `to`, `None` when they are not adjacent.
    pub fn mutual_position(from: BattleHex, to: BattleHex) -> Option<HexDirection> {
        HexDirection::ALL
            .into_iter()
            .find(|dir| from.move_in_direction(*dir) == Some(to))
    }

    /// Number of steps between two hexes.
    pub fn distance(a: BattleHex, b: BattleHex) -> i32 {
        let (ay, by) = (i32::from(a.y()), i32::from(b.y()));
        let ax = i32::from(a.x()) + ay / 2;
        let bx = i32::from(b.x()) + by / 2;
        let dx = bx - ax;
        let dy = by - ay;
        if (dx >= 0 && dy >= 0) || (dx < 0 && dy < 0) {
            dx.abs().max(dy.abs())
        } else {
            dx.abs() + dy.abs()
        }
    }

    /// The candidate nearest to `origin`.
    ///
    /// Ties are broken towards the enemy of `side` (largest column for the
    /// attacker, smallest for the defender), then towards the row of `origin`.
    pub fn closest_tile(
        side: BattleSide,
        origin: BattleHex,
        candidates: &[BattleHex],
    ) -> Option<BattleHex> {
        let closest = candidates
            .iter()
            .map(|hex| BattleHex::distance(origin, *hex))
            .min()?;
        candidates
            .iter()
            .copied()
            .filter(|hex| BattleHex::distance(origin, *hex) == closest)
            .min_by(|left, right| {
                if left.x() != right.x() {
                    match side {
                        BattleSide::Attacker => right.x().cmp(&left.x()),
                        BattleSide::Defender => left.x().cmp(&right.x()),
                    }
                } else {
                    (left.y() - origin.y())
                        .abs()
                        .cmp(&(right.y() - origin.y()).abs())
                }
            })
    }

    /// The second hex of a double-wide unit standing on `self`.
    pub fn back_hex(self, side: BattleSide) -> BattleHex {
        match side {
            BattleSide::Attacker => BattleHex(self.0 - 1),
            BattleSide::Defender => BattleHex(self.0 + 1),
        }
    }

    /// Hexes covered by a unit standing on `self`.
    pub fn occupied_hexes(self, double_wide: bool, side: BattleSide) -> ArrayVec<BattleHex, 2> {
        let mut hexes = ArrayVec::new();
        hexes.push(self);
        if double_wide {
            hexes.push(self.back_hex(side));
        }
        hexes
    }

    /// Hexes adjacent to a unit standing on `self`, excluding its own hexes.
    pub fn surrounding_hexes(self, double_wide: bool, side: BattleSide) -> ArrayVec<BattleHex, 8> {
        let mut hexes = ArrayVec::<BattleHex, 8>::new();
        let mut push = |hex: Option<BattleHex>| {
            if let Some(hex) = hex {
                if !hexes.contains(&hex) && !hexes.is_full() {
                    hexes.push(hex);
                }
            }
        };
        if !double_wide {
            for hex in self.neighbours() {
                push(Some(hex));
            }
            return hexes;
        }

        let back = self.back_hex(side);
        match side {
            BattleSide::Attacker => {
                for dir in &HexDirection::ALL[..5] {
                    push(self.move_in_direction(*dir));
                }
                push(back.move_in_direction(HexDirection::BottomLeft));
                push(back.move_in_direction(HexDirection::Left));
                push(back.move_in_direction(HexDirection::TopLeft));
            }
            BattleSide::Defender => {
                push(self.move_in_direction(HexDirection::TopLeft));
                for dir in &HexDirection::ALL[..5] {
                    push(back.move_in_direction(*dir));
                }
                push(self.move_in_direction(HexDirection::BottomLeft));
                push(self.move_in_direction(HexDirection::Left));
            }
        }
        hexes.retain(|hex| *hex != self && *hex != back);
        hexes
    }
}

impl Default for BattleHex {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<i16> for BattleHex {
    fn from(value: i16) -> Self {
        Self(value)
    }
}

impl fmt::Display for BattleHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INVALID => write!(f, "invalid"),
            Self::CASTLE_CENTRAL_TOWER => write!(f, "keep"),
            Self::CASTLE_BOTTOM_TOWER => write!(f, "bottom tower"),
            Self::CASTLE_UPPER_TOWER => write!(f, "upper tower"),
            hex if hex.is_valid() => write!(f, "{}({},{})", hex.0, hex.x(), hex.y()),
            hex => write!(f, "#{}", hex.0),
        }
    }
}

/// Shortest movement distance from a unit's origin to every hex.
///
/// Unreachable hexes hold `u32::MAX`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexDistances {
    distances: Vec<u32>,
}

impl HexDistances {
    pub const UNREACHABLE: u32 = u32::MAX;

    pub fn unreachable() -> Self {
        Self {
            distances: vec![Self::UNREACHABLE; BattleConfig::FIELD_SIZE],
        }
    }

    pub fn get(&self, hex: BattleHex) -> u32 {
        if !hex.is_valid() {
            return Self::UNREACHABLE;
        }
        self.distances
            .get(hex.index())
            .copied()
            .unwrap_or(Self::UNREACHABLE)
    }

    pub fn set(&mut self, hex: BattleHex, distance: u32) {
        if hex.is_valid() {
            if let Some(slot) = self.distances.get_mut(hex.index()) {
                *slot = distance;
            }
        }
    }

    pub fn is_reachable(&self, hex: BattleHex) -> bool {
        self.get(hex) != Self::UNREACHABLE
    }
}

impl Default for HexDistances {
    fn default() -> Self {
        Self::unreachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_round_trip() {
        let hex = BattleHex::from_xy(5, 3).unwrap();
        assert_eq!(hex, BattleHex(56));
        assert_eq!((hex.x(), hex.y()), (5, 3));
        assert!(BattleHex::from_xy(17, 0).is_none());
        assert!(BattleHex::from_xy(0, 11).is_none());
    }

    #[test]
    fn edge_columns_are_not_available() {
        assert!(BattleHex(0).is_valid());
        assert!(!BattleHex(0).is_available());
        assert!(!BattleHex(16).is_available());
        assert!(BattleHex(1).is_available());
        assert!(!BattleHex::INVALID.is_valid());
        assert!(!BattleHex::CASTLE_CENTRAL_TOWER.is_valid());
        assert!(!BattleHex(187).is_valid());
    }

    #[test]
    fn odd_rows_shift_left() {
        // Row 1 (odd): top-left of x=5 is x=4 on row 0.
        let hex = BattleHex::from_xy(5, 1).unwrap();
        assert_eq!(hex.move_in_direction(HexDirection::TopLeft), BattleHex::from_xy(4, 0));
        assert_eq!(hex.move_in_direction(HexDirection::TopRight), BattleHex::from_xy(5, 0));
        // Row 2 (even): top-left of x=5 is x=5 on row 1.
        let hex = BattleHex::from_xy(5, 2).unwrap();
        assert_eq!(hex.move_in_direction(HexDirection::TopLeft), BattleHex::from_xy(5, 1));
        assert_eq!(hex.move_in_direction(HexDirection::BottomRight), BattleHex::from_xy(6, 3));
    }

    #[test]
    fn edge_hexes_have_fewer_neighbours() {
        // Even rows lean right: the top-left corner still reaches row 1 twice.
        assert_eq!(BattleHex(0).neighbours().len(), 3);
        assert_eq!(BattleHex::from_xy(16, 0).unwrap().neighbours().len(), 2);
        // Odd rows lean left: the left edge loses both left-hand neighbours.
        let edge = BattleHex::from_xy(0, 1).unwrap();
        assert_eq!(
            edge.neighbours().as_slice(),
            &[BattleHex(0), BattleHex(18), BattleHex(34)]
        );
        assert_eq!(BattleHex::from_xy(8, 5).unwrap().neighbours().len(), 6);
    }

    #[test]
    fn mutual_position_is_symmetric() {
        let a = BattleHex::from_xy(8, 5).unwrap();
        for n in a.neighbours() {
            assert!(BattleHex::mutual_position(a, n).is_some());
            assert!(BattleHex::mutual_position(n, a).is_some());
            assert_eq!(BattleHex::distance(a, n), 1);
        }
        assert!(BattleHex::mutual_position(a, BattleHex::from_xy(10, 5).unwrap()).is_none());
    }

    #[test]
    fn distance_counts_steps() {
        let a = BattleHex::from_xy(2, 2).unwrap();
        assert_eq!(BattleHex::distance(a, a), 0);
        assert_eq!(BattleHex::distance(a, BattleHex::from_xy(6, 2).unwrap()), 4);
        assert_eq!(BattleHex::distance(a, BattleHex::from_xy(2, 4).unwrap()), 2);
    }

    #[test]
    fn closest_tile_prefers_enemy_direction() {
        let origin = BattleHex::from_xy(8, 4).unwrap();
        let left = BattleHex::from_xy(7, 4).unwrap();
        let right = BattleHex::from_xy(9, 4).unwrap();
        let far = BattleHex::from_xy(12, 4).unwrap();
        let candidates = [left, right, far];
        assert_eq!(
            BattleHex::closest_tile(BattleSide::Attacker, origin, &candidates),
            Some(right)
        );
        assert_eq!(
            BattleHex::closest_tile(BattleSide::Defender, origin, &candidates),
            Some(left)
        );
        assert_eq!(BattleHex::closest_tile(BattleSide::Defender, origin, &[]), None);
    }

    #[test]
    fn double_wide_surroundings() {
        let front = BattleHex::from_xy(8, 4).unwrap();
        let attacker = front.surrounding_hexes(true, BattleSide::Attacker);
        assert_eq!(attacker.len(), 8);
        assert!(!attacker.contains(&front));
        assert!(!attacker.contains(&front.back_hex(BattleSide::Attacker)));
        assert!(attacker.contains(&BattleHex::from_xy(6, 4).unwrap()));
        assert!(attacker.contains(&BattleHex::from_xy(9, 4).unwrap()));

        let defender = front.surrounding_hexes(true, BattleSide::Defender);
        assert_eq!(defender.len(), 8);
        assert!(defender.contains(&BattleHex::from_xy(10, 4).unwrap()));
        assert!(defender.contains(&BattleHex::from_xy(7, 4).unwrap()));
    }

    #[test]
    fn distances_default_unreachable() {
        let mut distances = HexDistances::default();
        assert!(!distances.is_reachable(BattleHex(10)));
        distances.set(BattleHex(10), 3);
        assert_eq!(distances.get(BattleHex(10)), 3);
        assert_eq!(distances.get(BattleHex::INVALID), HexDistances::UNREACHABLE);
    }
}
