//! Stack hit points as "whole creatures plus the front creature's remainder".
//!
//! A stack of `count` creatures is stored as `full_units` untouched creatures
//! behind one front creature with `first_hp_left` hit points. Every operation
//! keeps `0 <= first_hp_left <= max_health` and re-splits the running total so
//! that a zero remainder promotes one full unit to the front.

use tracing::error;

/// How far a heal may go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum HealLevel {
    /// Tops up the front creature only.
    #[default]
    Heal,
    /// Restores dead creatures up to the initial stack size.
    Resurrect,
    /// Unbounded.
    #[cfg_attr(feature = "serde", serde(rename = "overHeal"))]
    Overheal,
}

/// Whether creatures restored by a heal survive the battle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum HealPower {
    /// Restored creatures are tracked and reclaimed when the battle ends.
    OneBattle,
    #[default]
    Permanent,
}

/// Static unit facts the pool needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthInfo {
    pub max_health: i32,
    pub base_amount: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthPool {
    max_health: i32,
    base_amount: i32,
    first_hp_left: i32,
    full_units: i32,
    resurrected: i32,
}

impl HealthPool {
    /// Creates an empty pool; call [`HealthPool::init`] to fill it.
    pub fn new(info: HealthInfo) -> Self {
        Self {
            max_health: info.max_health,
            base_amount: info.base_amount,
            first_hp_left: 0,
            full_units: 0,
            resurrected: 0,
        }
    }

    /// Fills the pool to the full initial stack.
    pub fn init(&mut self) {
        self.reset();
        self.full_units = if self.base_amount > 1 {
            self.base_amount - 1
        } else {
            0
        };
        self.first_hp_left = if self.base_amount > 0 {
            self.max_health
        } else {
            0
        };
    }

    pub fn reset(&mut self) {
        self.full_units = 0;
        self.first_hp_left = 0;
        self.resurrected = 0;
    }

    /// Overwrites the split fields, used when restoring a snapshot.
    pub fn restore(&mut self, first_hp_left: i32, full_units: i32, resurrected: i32) {
        self.first_hp_left = first_hp_left.clamp(0, self.max_health.max(0));
        self.full_units = full_units.max(0);
        self.resurrected = resurrected.max(0);
    }

    /// Applies damage and returns the amount actually taken.
    ///
    /// A lethal or front-clearing hit is clamped to [`HealthPool::available`].
    pub fn damage(&mut self, amount: i64) -> i64 {
        if amount < 0 {
            error!(amount, "negative damage ignored");
            return 0;
        }
        let old_count = self.count();
        let mut taken = amount;

        if amount >= i64::from(self.first_hp_left) {
            let available = self.available();
            taken = amount.min(available);
            let remaining = available - taken;
            if remaining <= 0 {
                self.first_hp_left = 0;
                self.full_units = 0;
            } else {
                self.set_from_total(remaining);
            }
        } else {
            // amount < first_hp_left <= i32::MAX
            self.first_hp_left -= amount as i32;
        }

        self.add_resurrected(self.count() - old_count);
        taken
    }

    /// Applies healing and returns the amount actually restored.
    pub fn heal(&mut self, amount: i64, level: HealLevel, power: HealPower) -> i64 {
        let max_heal = match level {
            HealLevel::Heal => i64::from((self.max_health - self.first_hp_left).max(0)),
            HealLevel::Resurrect => self.total() - self.available(),
            HealLevel::Overheal => i64::MAX,
        };
        let restored = amount.clamp(0, max_heal.max(0));
        if restored == 0 {
            return 0;
        }

        let old_count = self.count();
        self.set_from_total(self.available().saturating_add(restored));
        if power == HealPower::OneBattle {
            self.add_resurrected(self.count() - old_count);
        }
        restored
    }

    /// Re-splits a running total into full units plus a front remainder.
    pub fn set_from_total(&mut self, total: i64) {
        if self.max_health <= 0 {
            error!(max_health = self.max_health, "health pool without max health");
            self.first_hp_left = 0;
            self.full_units = 0;
            return;
        }
        let total = total.max(0);
        let max = i64::from(self.max_health);
        let mut remainder = total % max;
        let mut full = total / max;
        if remainder == 0 && full >= 1 {
            remainder = max;
            full -= 1;
        }
        self.first_hp_left = remainder as i32;
        self.full_units = i32::try_from(full).unwrap_or(i32::MAX);
    }

    /// Removes every creature restored with [`HealPower::OneBattle`].
    pub fn take_resurrected(&mut self) {
        if self.resurrected != 0 {
            let lost = i64::from(self.resurrected) * i64::from(self.max_health);
            let total = (self.available() - lost).max(0);
            self.set_from_total(total);
        }
        self.resurrected = 0;
    }

    fn add_resurrected(&mut self, amount: i32) {
        self.resurrected = (self.resurrected + amount).max(0);
    }

    pub fn count(&self) -> i32 {
        self.full_units + i32::from(self.first_hp_left > 0)
    }

    pub fn available(&self) -> i64 {
        i64::from(self.first_hp_left) + i64::from(self.max_health) * i64::from(self.full_units)
    }

    pub fn total(&self) -> i64 {
        i64::from(self.max_health) * i64::from(self.base_amount)
    }

    pub fn first_hp_left(&self) -> i32 {
        self.first_hp_left
    }

    pub fn full_units(&self) -> i32 {
        self.full_units
    }

    pub fn resurrected(&self) -> i32 {
        self.resurrected
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn base_amount(&self) -> i32 {
        self.base_amount
    }
}
