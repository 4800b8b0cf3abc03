//! Rough damage estimates used to rank attacks.
//!
//! Estimates only need to order candidates sensibly; they are never applied
//! to a unit. Hosts with the full damage formula plug it in through
//! [`DamageEstimator`].

use battle_core::{BonusBearer, BonusKind, Unit};

/// One side hitting another.
#[derive(Clone, Copy)]
pub struct AttackInfo<'a> {
    pub attacker: &'a dyn Unit,
    pub defender: &'a dyn Unit,
    pub shooting: bool,
    /// Hexes travelled before a melee attack.
    pub charged_fields: u32,
}

impl<'a> AttackInfo<'a> {
    pub fn new(attacker: &'a dyn Unit, defender: &'a dyn Unit, shooting: bool) -> Self {
        Self {
            attacker,
            defender,
            shooting,
            charged_fields: 0,
        }
    }

    #[must_use]
    pub fn with_charged_fields(mut self, charged_fields: u32) -> Self {
        self.charged_fields = charged_fields;
        self
    }
}

/// Inclusive damage bounds in health points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRange {
    pub min: i64,
    pub max: i64,
}

impl DamageRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn average(&self) -> i64 {
        (self.min + self.max) / 2
    }
}

/// Estimates the damage of one attack.
pub trait DamageEstimator {
    fn estimate(&self, attack: &AttackInfo<'_>) -> DamageRange;
}

/// Creature damage scaled by the attack/defence difference and jousting.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseDamageEstimator;

impl BaseDamageEstimator {
    /// Per-mille bonus for each attack point above the defence.
    pub const ATTACK_STEP: i64 = 50;
    pub const ATTACK_CAP: i64 = 3000;
    /// Per-mille reduction for each defence point above the attack.
    pub const DEFENCE_STEP: i64 = 25;
    pub const DEFENCE_CAP: i64 = 700;

    fn factor_per_mille(attack: &AttackInfo<'_>) -> i64 {
        let skill = i64::from(attack.attacker.value_of_subtype(BonusKind::PrimarySkill, 0));
        let defence = i64::from(attack.defender.value_of_subtype(BonusKind::PrimarySkill, 1));
        let mut factor = if skill >= defence {
            1000 + ((skill - defence) * Self::ATTACK_STEP).min(Self::ATTACK_CAP)
        } else {
            1000 - ((defence - skill) * Self::DEFENCE_STEP).min(Self::DEFENCE_CAP)
        };
        if !attack.shooting {
            let jousting = i64::from(attack.attacker.value_of_type(BonusKind::Jousting).max(0));
            factor += jousting * 10 * i64::from(attack.charged_fields);
        }
        factor
    }
}

impl DamageEstimator for BaseDamageEstimator {
    fn estimate(&self, attack: &AttackInfo<'_>) -> DamageRange {
        let count = i64::from(attack.attacker.count().max(0));
        let min = i64::from(attack.attacker.creature_damage(1).max(0)) * count;
        let max = i64::from(attack.attacker.creature_damage(2).max(0)) * count;
        let factor = Self::factor_per_mille(attack);
        DamageRange::new(min * factor / 1000, max * factor / 1000)
    }
}
