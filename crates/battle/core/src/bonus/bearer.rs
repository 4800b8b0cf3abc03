use super::{Bonus, BonusDuration, BonusKind, NO_SUBTYPE};

/// Ordered list of resolved bonuses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BonusList {
    bonuses: Vec<Bonus>,
}

impl BonusList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bonus: Bonus) {
        self.bonuses.push(bonus);
    }

    pub fn extend(&mut self, bonuses: impl IntoIterator<Item = Bonus>) {
        self.bonuses.extend(bonuses);
    }

    /// Removes one matching entry for every bonus in `removed`.
    pub fn remove_all(&mut self, removed: &[Bonus]) {
        for bonus in removed {
            if let Some(index) = self.bonuses.iter().position(|b| b == bonus) {
                self.bonuses.remove(index);
            }
        }
    }

    pub fn retain(&mut self, keep: impl FnMut(&Bonus) -> bool) {
        self.bonuses.retain(keep);
    }

    /// Ages round-limited bonuses by one round and drops the expired ones.
    pub fn tick_round(&mut self) {
        for bonus in &mut self.bonuses {
            if let BonusDuration::Turns(remaining) = &mut bonus.duration {
                *remaining = remaining.saturating_sub(1);
            }
        }
        self.bonuses
            .retain(|bonus| !matches!(bonus.duration, BonusDuration::Turns(0)));
    }

    /// Drops every bonus that only lasts for the current battle.
    pub fn clear_battle_bonuses(&mut self) {
        self.bonuses.retain(|bonus| {
            !matches!(
                bonus.duration,
                BonusDuration::OneBattle | BonusDuration::Turns(_)
            )
        });
    }

    pub fn as_slice(&self) -> &[Bonus] {
        &self.bonuses
    }

    pub fn len(&self) -> usize {
        self.bonuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }
}

impl FromIterator<Bonus> for BonusList {
    fn from_iter<T: IntoIterator<Item = Bonus>>(iter: T) -> Self {
        Self {
            bonuses: iter.into_iter().collect(),
        }
    }
}

/// Read access to a resolved bonus list.
///
/// Only [`BonusBearer::bonuses`] is required; every query is derived from it.
pub trait BonusBearer {
    fn bonuses(&self) -> &[Bonus];

    fn has_bonus(&self, pred: &dyn Fn(&Bonus) -> bool) -> bool {
        self.bonuses().iter().any(|b| pred(b))
    }

    fn has_bonus_of_type(&self, kind: BonusKind) -> bool {
        self.bonuses().iter().any(|b| b.kind == kind)
    }

    fn has_bonus_of_subtype(&self, kind: BonusKind, subtype: i32) -> bool {
        self.bonuses()
            .iter()
            .any(|b| b.kind == kind && b.subtype == subtype)
    }

    /// Sum of matching bonus values.
    fn value_of(&self, pred: &dyn Fn(&Bonus) -> bool) -> i32 {
        self.bonuses()
            .iter()
            .filter(|b| pred(b))
            .fold(0i32, |acc, b| acc.saturating_add(b.value))
    }

    fn value_of_type(&self, kind: BonusKind) -> i32 {
        self.value_of(&|b| b.kind == kind)
    }

    fn value_of_subtype(&self, kind: BonusKind, subtype: i32) -> i32 {
        self.value_of(&|b| b.kind == kind && b.subtype == subtype)
    }

    /// Sum of values of `kind` still active `turn` rounds from now.
    fn value_of_type_at(&self, kind: BonusKind, turn: i32) -> i32 {
        self.value_of(&|b| b.kind == kind && b.active_at(turn))
    }

    fn has_bonus_of_type_at(&self, kind: BonusKind, turn: i32) -> bool {
        self.has_bonus(&|b| b.kind == kind && b.active_at(turn))
    }

    /// Largest value among matching bonuses, `None` when nothing matches.
    fn max_value_of(&self, pred: &dyn Fn(&Bonus) -> bool) -> Option<i32> {
        self.bonuses()
            .iter()
            .filter(|b| pred(b))
            .map(|b| b.value)
            .max()
    }

    fn bonuses_matching(&self, pred: &dyn Fn(&Bonus) -> bool) -> Vec<Bonus> {
        self.bonuses().iter().filter(|b| pred(b)).cloned().collect()
    }

    /// Own magic resistance percentage, clamped to `[0, 100]`.
    ///
    /// Auras from adjacent allies need the battlefield and are added by
    /// `BattleQuery::magic_resistance`.
    fn own_magic_resistance(&self) -> i32 {
        self.value_of_type(BonusKind::MagicResistance).clamp(0, 100)
    }

    /// Damage bonus reading `CreatureDamage`. Subtype 0 or no subtype covers
    /// both ends.
    fn creature_damage(&self, subtype: i32) -> i32 {
        self.value_of(&|b| {
            b.kind == BonusKind::CreatureDamage
                && (b.subtype == 0 || b.subtype == NO_SUBTYPE || b.subtype == subtype)
        })
    }
}

impl BonusBearer for BonusList {
    fn bonuses(&self) -> &[Bonus] {
        &self.bonuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusSource;
    use crate::spells::SpellId;

    fn list() -> BonusList {
        [
            Bonus::new(BonusKind::Shots, 12),
            Bonus::new(BonusKind::Shots, 4),
            Bonus::new(BonusKind::StacksSpeed, 6),
            Bonus::new(BonusKind::StacksSpeed, 2)
                .with_source(BonusSource::SpellEffect(SpellId::HASTE))
                .with_duration(BonusDuration::Turns(1)),
            Bonus::new(BonusKind::Spellcaster, 2).with_subtype(SpellId::CURE.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn values_sum_per_kind() {
        let bonuses = list();
        assert_eq!(bonuses.value_of_type(BonusKind::Shots), 16);
        assert_eq!(bonuses.value_of_subtype(BonusKind::Spellcaster, SpellId::CURE.0), 2);
        assert_eq!(bonuses.value_of_type(BonusKind::Casts), 0);
        assert!(bonuses.has_bonus_of_subtype(BonusKind::Spellcaster, SpellId::CURE.0));
        assert!(!bonuses.has_bonus_of_type(BonusKind::Flying));
    }

    #[test]
    fn turn_selection_excludes_expiring_bonuses() {
        let bonuses = list();
        assert_eq!(bonuses.value_of_type_at(BonusKind::StacksSpeed, 0), 8);
        assert_eq!(bonuses.value_of_type_at(BonusKind::StacksSpeed, 1), 6);
    }

    #[test]
    fn tick_round_drops_expired() {
        let mut bonuses = list();
        bonuses.tick_round();
        assert_eq!(bonuses.len(), 4);
        assert_eq!(bonuses.value_of_type(BonusKind::StacksSpeed), 6);
    }

    #[test]
    fn remove_all_removes_one_entry_per_bonus() {
        let mut bonuses = list();
        bonuses.remove_all(&[Bonus::new(BonusKind::Shots, 12)]);
        assert_eq!(bonuses.value_of_type(BonusKind::Shots), 4);
    }

    #[test]
    fn creature_damage_without_subtype_covers_both_ends() {
        let bonuses: BonusList = [
            Bonus::new(BonusKind::CreatureDamage, 2),
            Bonus::new(BonusKind::CreatureDamage, 3).with_subtype(2),
        ]
        .into_iter()
        .collect();
        assert_eq!(bonuses.creature_damage(1), 2);
        assert_eq!(bonuses.creature_damage(2), 5);
    }

    #[test]
    fn magic_resistance_is_clamped() {
        let bonuses: BonusList = [
            Bonus::new(BonusKind::MagicResistance, 80),
            Bonus::new(BonusKind::MagicResistance, 40),
        ]
        .into_iter()
        .collect();
        assert_eq!(bonuses.own_magic_resistance(), 100);
    }
}
