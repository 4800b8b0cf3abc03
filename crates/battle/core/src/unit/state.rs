use tracing::error;

use super::{Ammo, AmmoContext, AmmoKind, HealLevel, HealPower, HealthPool, Unit, UnitInfo};
use crate::battle::BattleHex;
use crate::bonus::{Bonus, BonusBearer, BonusKind, BonusList};

/// Mutable combat state of one unit stack.
///
/// The battle owns one authoritative state per participant (inside a
/// [`super::Stack`]). Any number of detached copies can be taken with
/// [`Unit::acquire`], mutated speculatively, and turned into a
/// [`super::UnitChange`] for commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitState {
    info: UnitInfo,
    bonuses: BonusList,
    has_ammo_cart: bool,

    pub cloned: bool,
    pub defending: bool,
    pub defending_anim: bool,
    pub drained_mana: bool,
    pub fear: bool,
    pub had_morale: bool,
    pub ghost: bool,
    pub ghost_pending: bool,
    pub moved_this_turn: bool,
    pub summoned: bool,
    pub waiting: bool,

    pub(crate) casts: Ammo,
    pub(crate) counter_attacks: Ammo,
    pub(crate) shots: Ammo,
    pub(crate) health: HealthPool,

    /// Id of this unit's clone, negative when it has none.
    pub clone_id: i32,
    pub position: BattleHex,
}

impl UnitState {
    /// Creates a full-strength unit.
    pub fn new(info: UnitInfo, bonuses: BonusList) -> Self {
        let health = HealthPool::new(info.health_info());
        let mut state = Self {
            info,
            bonuses,
            has_ammo_cart: false,
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
            casts: Ammo::new(AmmoKind::Casts),
            counter_attacks: Ammo::new(AmmoKind::Retaliations),
            shots: Ammo::new(AmmoKind::Shots),
            health,
            clone_id: -1,
            position: BattleHex::INVALID,
        };
        state.local_init();
        state
    }

    #[must_use]
    pub fn at(mut self, position: BattleHex) -> Self {
        self.position = position;
        self
    }

    /// Clears every flag and counter and refills the health pool.
    pub fn local_init(&mut self) {
        self.reset();
        self.health.init();
    }

    /// Clears flags, counters and health. Identity and bonuses are kept.
    pub fn reset(&mut self) {
        self.cloned = false;
        self.defending = false;
        self.defending_anim = false;
        self.drained_mana = false;
        self.fear = false;
        self.had_morale = false;
        self.ghost = false;
        self.ghost_pending = false;
        self.moved_this_turn = false;
        self.summoned = false;
        self.waiting = false;

        self.casts.reset();
        self.counter_attacks.reset();
        self.health.reset();
        self.shots.reset();

        self.clone_id = -1;
        self.position = BattleHex::INVALID;
    }

    // ===== bonuses =====

    pub fn bonus_list(&self) -> &BonusList {
        &self.bonuses
    }

    pub fn add_bonuses(&mut self, bonuses: &[Bonus]) {
        self.bonuses.extend(bonuses.iter().cloned());
    }

    /// Removes bonuses, keeping the retaliations granted so far this round.
    pub fn remove_bonuses(&mut self, bonuses: &[Bonus]) {
        self.counter_attacks
            .latch(AmmoContext::new(&self.bonuses, self.has_ammo_cart));
        self.bonuses.remove_all(bonuses);
    }

    pub fn set_has_ammo_cart(&mut self, has_ammo_cart: bool) {
        self.has_ammo_cart = has_ammo_cart;
    }

    pub fn has_ammo_cart(&self) -> bool {
        self.has_ammo_cart
    }

    fn ammo_ctx(bonuses: &BonusList, has_ammo_cart: bool) -> AmmoContext<'_> {
        AmmoContext::new(bonuses, has_ammo_cart)
    }

    // ===== pools =====

    pub fn health(&self) -> &HealthPool {
        &self.health
    }

    pub fn casts(&self) -> &Ammo {
        &self.casts
    }

    pub fn shots(&self) -> &Ammo {
        &self.shots
    }

    pub fn counter_attacks(&self) -> &Ammo {
        &self.counter_attacks
    }

    pub fn casts_available(&self) -> i32 {
        self.casts
            .available(Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
    }

    pub fn shots_available(&self) -> i32 {
        self.shots
            .available(Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
    }

    pub fn retaliations_available(&self) -> i32 {
        self.counter_attacks
            .available(Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
    }

    pub fn use_casts(&mut self, amount: i32) {
        self.casts
            .consume(amount, Self::ammo_ctx(&self.bonuses, self.has_ammo_cart));
    }

    pub fn use_shots(&mut self, amount: i32) {
        self.shots
            .consume(amount, Self::ammo_ctx(&self.bonuses, self.has_ammo_cart));
    }

    pub fn use_retaliations(&mut self, amount: i32) {
        self.counter_attacks
            .consume(amount, Self::ammo_ctx(&self.bonuses, self.has_ammo_cart));
    }

    /// Makes every retaliation of the round available again.
    pub fn replenish_retaliations(&mut self) {
        self.counter_attacks.reset();
    }

    // ===== health =====

    /// Applies damage and returns the amount taken.
    ///
    /// Clones lose everything to any positive hit. A clone or summoned unit
    /// that dies becomes a pending ghost.
    pub fn damage(&mut self, amount: i64) -> i64 {
        let taken = if self.cloned {
            if amount > 0 {
                self.health.reset();
                1
            } else {
                0
            }
        } else {
            self.health.damage(amount)
        };

        if self.health.available() <= 0 && (self.cloned || self.summoned) {
            self.ghost_pending = true;
        }
        taken
    }

    /// Applies healing and returns the amount restored.
    pub fn heal(&mut self, amount: i64, level: HealLevel, power: HealPower) -> i64 {
        if level == HealLevel::Heal && power == HealPower::OneBattle {
            error!(unit = %self.info.id, "one-battle heal is not supported");
            return 0;
        }
        if self.cloned {
            error!(unit = %self.info.id, "attempt to heal a clone");
            return 0;
        }
        self.health.heal(amount, level, power)
    }

    /// Drops creatures raised for this battle only.
    pub fn take_resurrected(&mut self) {
        self.health.take_resurrected();
    }

    /// Empties the pool and marks the unit for removal at the end of the action.
    pub fn make_ghost(&mut self) {
        self.health.reset();
        self.ghost_pending = true;
    }

    /// Start-of-round bookkeeping.
    pub fn next_round(&mut self) {
        self.defending = false;
        self.defending_anim = false;
        self.waiting = false;
        self.moved_this_turn = false;
        self.had_morale = false;
        self.fear = false;
        self.drained_mana = false;
        self.counter_attacks.reset();
        self.bonuses.tick_round();
    }

    /// Can the unit be healed by a regular heal right now.
    pub fn can_be_healed(&self) -> bool {
        self.health.first_hp_left() < self.info.max_health
            && self.is_valid_target(false)
            && !self.has_bonus_of_type(BonusKind::SiegeWeapon)
    }
}

impl BonusBearer for UnitState {
    fn bonuses(&self) -> &[Bonus] {
        self.bonuses.as_slice()
    }
}

impl Unit for UnitState {
    fn info(&self) -> &UnitInfo {
        &self.info
    }

    fn alive(&self) -> bool {
        self.health.available() > 0
    }

    fn is_ghost(&self) -> bool {
        self.ghost
    }

    fn is_clone(&self) -> bool {
        self.cloned
    }

    fn has_clone(&self) -> bool {
        self.clone_id > 0
    }

    fn is_summoned(&self) -> bool {
        self.summoned
    }

    fn had_morale(&self) -> bool {
        self.had_morale
    }

    fn can_cast(&self) -> bool {
        self.casts
            .can_use(1, Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
    }

    fn is_caster(&self) -> bool {
        self.casts
            .total(Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
            > 0
    }

    fn can_shoot(&self) -> bool {
        self.shots
            .can_use(1, Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
            && self.has_bonus_of_type(BonusKind::Shooter)
    }

    fn is_shooter(&self) -> bool {
        self.shots
            .total(Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
            > 0
            && self.has_bonus_of_type(BonusKind::Shooter)
    }

    fn able_to_retaliate(&self) -> bool {
        self.alive()
            && self
                .counter_attacks
                .can_use(1, Self::ammo_ctx(&self.bonuses, self.has_ammo_cart))
            && !self.has_bonus_of_type(BonusKind::SiegeWeapon)
            && !self.has_bonus_of_type(BonusKind::Hypnotized)
            && !self.has_bonus_of_type(BonusKind::NoRetaliation)
    }

    fn count(&self) -> i32 {
        self.health.count()
    }

    fn first_hp_left(&self) -> i32 {
        self.health.first_hp_left()
    }

    fn available_health(&self) -> i64 {
        self.health.available()
    }

    fn total_health(&self) -> i64 {
        self.health.total()
    }

    fn killed(&self) -> i32 {
        (self.info.base_amount - self.health.count() + self.health.resurrected()).max(0)
    }

    fn position(&self) -> BattleHex {
        self.position
    }

    fn defended(&self, turn: i32) -> bool {
        turn == 0 && self.defending
    }

    fn moved(&self, turn: i32) -> bool {
        turn == 0 && self.moved_this_turn
    }

    fn waited(&self, turn: i32) -> bool {
        turn == 0 && self.waiting
    }

    fn acquire(&self) -> UnitState {
        self.clone()
    }
}
