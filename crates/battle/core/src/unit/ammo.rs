//! Consumable per-unit resources: shots, spell casts and retaliations.
//!
//! A pool stores only what has been used. Its total is read from the unit's
//! bonuses on every query, so buffs and debuffs take effect immediately. The
//! retaliation pool additionally remembers the largest total seen this round so
//! that losing a bonus mid-round does not take back granted retaliations.

use tracing::error;

use crate::bonus::{BonusBearer, BonusKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmmoKind {
    Shots,
    Casts,
    Retaliations,
}

/// What a pool needs to know about its owner.
#[derive(Clone, Copy)]
pub struct AmmoContext<'a> {
    pub bonuses: &'a dyn BonusBearer,
    /// An allied ammo cart makes shots unlimited.
    pub has_ammo_cart: bool,
}

impl<'a> AmmoContext<'a> {
    pub fn new(bonuses: &'a dyn BonusBearer, has_ammo_cart: bool) -> Self {
        Self {
            bonuses,
            has_ammo_cart,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ammo {
    kind: AmmoKind,
    used: i32,
    /// Largest retaliation total seen this round.
    round_max: i32,
}

impl Ammo {
    pub fn new(kind: AmmoKind) -> Self {
        Self {
            kind,
            used: 0,
            round_max: 0,
        }
    }

    pub fn kind(&self) -> AmmoKind {
        self.kind
    }

    pub fn used(&self) -> i32 {
        self.used
    }

    pub fn round_max(&self) -> i32 {
        self.round_max
    }

    /// Restores persisted counters.
    pub fn restore(&mut self, used: i32, round_max: i32) {
        self.used = used.max(0);
        self.round_max = round_max.max(0);
    }

    pub fn is_limited(&self, ctx: AmmoContext<'_>) -> bool {
        match self.kind {
            AmmoKind::Shots => !ctx.has_ammo_cart,
            AmmoKind::Casts => true,
            AmmoKind::Retaliations => !ctx
                .bonuses
                .has_bonus_of_type(BonusKind::UnlimitedRetaliations),
        }
    }

    pub fn total(&self, ctx: AmmoContext<'_>) -> i32 {
        match self.kind {
            AmmoKind::Shots => ctx.bonuses.value_of_type(BonusKind::Shots),
            AmmoKind::Casts => ctx.bonuses.value_of_type(BonusKind::Casts),
            AmmoKind::Retaliations => self.round_max.max(Self::retaliations_from_bonuses(ctx)),
        }
    }

    pub fn available(&self, ctx: AmmoContext<'_>) -> i32 {
        self.total(ctx) - self.used
    }

    pub fn can_use(&self, amount: i32, ctx: AmmoContext<'_>) -> bool {
        !self.is_limited(ctx) || self.available(ctx) - amount >= 0
    }

    /// Consumes `amount`; overuse is logged and clamps the pool to exhausted.
    pub fn consume(&mut self, amount: i32, ctx: AmmoContext<'_>) {
        if !self.is_limited(ctx) {
            return;
        }
        self.latch(ctx);
        let available = self.available(ctx);
        if available - amount < 0 {
            error!(kind = %self.kind, amount, available, "ammo overuse");
            self.used += available.max(0);
        } else {
            self.used += amount;
        }
    }

    /// Remembers the current retaliation total for the rest of the round.
    pub fn latch(&mut self, ctx: AmmoContext<'_>) {
        if self.kind == AmmoKind::Retaliations {
            self.round_max = self.total(ctx);
        }
    }

    /// Refills the pool and forgets the round maximum.
    pub fn reset(&mut self) {
        self.used = 0;
        self.round_max = 0;
    }

    fn retaliations_from_bonuses(ctx: AmmoContext<'_>) -> i32 {
        1 + ctx
            .bonuses
            .value_of_type(BonusKind::AdditionalRetaliation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{Bonus, BonusList};

    fn bonuses(list: &[Bonus]) -> BonusList {
        list.iter().cloned().collect()
    }

    #[test]
    fn shots_follow_bonus_total() {
        let list = bonuses(&[Bonus::new(BonusKind::Shots, 10)]);
        let ctx = AmmoContext::new(&list, false);
        let mut shots = Ammo::new(AmmoKind::Shots);
        assert_eq!(shots.available(ctx), 10);
        shots.consume(3, ctx);
        assert_eq!(shots.available(ctx), 7);
        assert!(shots.can_use(7, ctx));
        assert!(!shots.can_use(8, ctx));
    }

    #[test]
    fn overuse_clamps_to_exhausted() {
        let list = bonuses(&[Bonus::new(BonusKind::Casts, 3)]);
        let ctx = AmmoContext::new(&list, false);
        let mut casts = Ammo::new(AmmoKind::Casts);
        casts.consume(5, ctx);
        assert_eq!(casts.used(), 3);
        assert_eq!(casts.available(ctx), 0);
        assert!(!casts.can_use(1, ctx));
    }

    #[test]
    fn ammo_cart_makes_shots_unlimited() {
        let list = bonuses(&[Bonus::new(BonusKind::Shots, 2)]);
        let ctx = AmmoContext::new(&list, true);
        let mut shots = Ammo::new(AmmoKind::Shots);
        shots.consume(50, ctx);
        assert_eq!(shots.used(), 0);
        assert!(shots.can_use(100, ctx));
    }

    #[test]
    fn retaliations_default_to_one() {
        let list = BonusList::new();
        let ctx = AmmoContext::new(&list, false);
        let mut retaliations = Ammo::new(AmmoKind::Retaliations);
        assert_eq!(retaliations.total(ctx), 1);
        retaliations.consume(1, ctx);
        assert!(!retaliations.can_use(1, ctx));
    }

    #[test]
    fn unlimited_retaliations_never_run_out() {
        let list = bonuses(&[Bonus::new(BonusKind::UnlimitedRetaliations, 0)]);
        let ctx = AmmoContext::new(&list, false);
        let mut retaliations = Ammo::new(AmmoKind::Retaliations);
        for _ in 0..5 {
            retaliations.consume(1, ctx);
        }
        assert!(retaliations.can_use(1, ctx));
    }

    #[test]
    fn retaliation_total_is_sticky_within_round() {
        let buffed = bonuses(&[Bonus::new(BonusKind::AdditionalRetaliation, 1)]);
        let mut retaliations = Ammo::new(AmmoKind::Retaliations);
        assert_eq!(retaliations.total(AmmoContext::new(&buffed, false)), 2);
        retaliations.latch(AmmoContext::new(&buffed, false));

        let plain = BonusList::new();
        let ctx = AmmoContext::new(&plain, false);
        assert_eq!(retaliations.total(ctx), 2);

        retaliations.reset();
        assert_eq!(retaliations.total(ctx), 1);
    }

    #[test]
    fn consume_latches_round_maximum() {
        let buffed = bonuses(&[Bonus::new(BonusKind::AdditionalRetaliation, 2)]);
        let mut retaliations = Ammo::new(AmmoKind::Retaliations);
        retaliations.consume(1, AmmoContext::new(&buffed, false));
        let plain = BonusList::new();
        assert_eq!(retaliations.available(AmmoContext::new(&plain, false)), 2);
    }
}
