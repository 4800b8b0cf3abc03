use crate::battle::BattleHex;
use crate::unit::UnitId;

/// One destination of a cast: a hex, a unit standing on it, or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destination {
    pub unit: Option<UnitId>,
    pub hex: BattleHex,
}

impl Destination {
    /// A bare location.
    pub fn at(hex: BattleHex) -> Self {
        Self { unit: None, hex }
    }

    pub fn on_unit(unit: UnitId, hex: BattleHex) -> Self {
        Self {
            unit: Some(unit),
            hex,
        }
    }

    pub fn is_location(&self) -> bool {
        self.unit.is_none() && self.hex.is_valid()
    }
}

/// Ordered destinations of a cast or of one effect.
pub type Target = Vec<Destination>;
