use super::{Unit, UnitInfo, UnitState};
use crate::battle::BattleHex;
use crate::bonus::{Bonus, BonusBearer, BonusList};

/// A live battle participant.
///
/// Owns the authoritative [`UnitState`]. Every read goes straight to it, and
/// every write goes through the battle's record application so observers stay
/// in sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack {
    state: UnitState,
    initial_position: BattleHex,
    name: String,
}

impl Stack {
    pub fn new(info: UnitInfo, bonuses: BonusList, position: BattleHex) -> Self {
        Self {
            state: UnitState::new(info, bonuses).at(position),
            initial_position: position,
            name: String::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_position(&self) -> BattleHex {
        self.initial_position
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut UnitState {
        &mut self.state
    }

    /// Puts the unit back to full strength at its starting hex.
    pub fn local_init(&mut self) {
        self.state.local_init();
        self.state.position = self.initial_position;
    }
}

impl BonusBearer for Stack {
    fn bonuses(&self) -> &[Bonus] {
        self.state.bonuses()
    }
}

impl Unit for Stack {
    fn info(&self) -> &UnitInfo {
        self.state.info()
    }

    fn alive(&self) -> bool {
        self.state.alive()
    }

    fn is_ghost(&self) -> bool {
        self.state.is_ghost()
    }

    fn is_clone(&self) -> bool {
        self.state.is_clone()
    }

    fn has_clone(&self) -> bool {
        self.state.has_clone()
    }

    fn is_summoned(&self) -> bool {
        self.state.is_summoned()
    }

    fn had_morale(&self) -> bool {
        self.state.had_morale()
    }

    fn can_cast(&self) -> bool {
        self.state.can_cast()
    }

    fn is_caster(&self) -> bool {
        self.state.is_caster()
    }

    fn can_shoot(&self) -> bool {
        self.state.can_shoot()
    }

    fn is_shooter(&self) -> bool {
        self.state.is_shooter()
    }

    fn able_to_retaliate(&self) -> bool {
        self.state.able_to_retaliate()
    }

    fn count(&self) -> i32 {
        self.state.count()
    }

    fn first_hp_left(&self) -> i32 {
        self.state.first_hp_left()
    }

    fn available_health(&self) -> i64 {
        self.state.available_health()
    }

    fn total_health(&self) -> i64 {
        self.state.total_health()
    }

    fn killed(&self) -> i32 {
        self.state.killed()
    }

    fn position(&self) -> BattleHex {
        self.state.position()
    }

    fn defended(&self, turn: i32) -> bool {
        self.state.defended(turn)
    }

    fn moved(&self, turn: i32) -> bool {
        self.state.moved(turn)
    }

    fn waited(&self, turn: i32) -> bool {
        self.state.waited(turn)
    }

    fn acquire(&self) -> UnitState {
        self.state.clone()
    }

    fn description(&self) -> String {
        if self.name.is_empty() {
            self.state.description()
        } else {
            format!(
                "{} ({} x {}) at {}",
                self.unit_id(),
                self.count(),
                self.name,
                self.position()
            )
        }
    }
}
