use super::effects::EffectConfig;
use super::{Positiveness, SpellId, SpellSchool};

/// Area covered around the aim point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpellRange {
    /// The aimed hex only.
    #[default]
    Single,
    /// Every hex within the given distance.
    Radius(u8),
    /// The whole battlefield.
    All,
}

/// One configured effect of a spell level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectEntry {
    /// The cast may go ahead even when this effect has nothing to do.
    #[cfg_attr(feature = "serde", serde(default))]
    pub optional: bool,
    /// Fires only when an obstacle created by the spell is triggered.
    #[cfg_attr(feature = "serde", serde(default))]
    pub indirect: bool,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub config: EffectConfig,
}

impl EffectEntry {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            optional: false,
            indirect: false,
            config,
        }
    }
}

/// Per school level parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpellLevel {
    /// Flat addition to the raw effect value.
    pub power: i32,
    pub cost: i32,
    pub range: SpellRange,
    /// Only units matching the spell's polarity are picked from the area.
    pub smart: bool,
    /// Obstacle hexes must be free of units and other obstacles.
    pub clear_affected: bool,
    pub effects: Vec<EffectEntry>,
}

/// Static description of a spell.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellDefinition {
    pub id: SpellId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub positiveness: Positiveness,
    /// Adventure map spells never act on battle units.
    #[cfg_attr(feature = "serde", serde(default))]
    pub adventure: bool,
    /// Spell level in the magic guild, 0 for creature abilities.
    pub circle: u8,
    /// Raw effect value per point of caster power.
    pub power: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub schools: Vec<SpellSchool>,
    /// Spells whose effects are removed from every affected unit.
    #[cfg_attr(feature = "serde", serde(default))]
    pub counters: Vec<SpellId>,
    /// Indexed by school level, none to expert.
    pub levels: [SpellLevel; 4],
}

impl SpellDefinition {
    pub fn new(id: SpellId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            positiveness: Positiveness::Neutral,
            adventure: false,
            circle: 1,
            power: 0,
            schools: Vec::new(),
            counters: Vec::new(),
            levels: Default::default(),
        }
    }

    #[must_use]
    pub fn with_schools(mut self, schools: &[SpellSchool]) -> Self {
        self.schools = schools.to_vec();
        self
    }

    #[must_use]
    pub fn positive(mut self) -> Self {
        self.positiveness = Positiveness::Positive;
        self
    }

    #[must_use]
    pub fn negative(mut self) -> Self {
        self.positiveness = Positiveness::Negative;
        self
    }

    #[must_use]
    pub fn adventure(mut self) -> Self {
        self.adventure = true;
        self
    }

    #[must_use]
    pub fn with_circle(mut self, circle: u8) -> Self {
        self.circle = circle;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: i32) -> Self {
        self.power = power;
        self
    }

    #[must_use]
    pub fn with_counters(mut self, counters: &[SpellId]) -> Self {
        self.counters = counters.to_vec();
        self
    }

    /// Sets level power and cost, none to expert.
    #[must_use]
    pub fn with_level_values(mut self, power: [i32; 4], cost: [i32; 4]) -> Self {
        for (index, level) in self.levels.iter_mut().enumerate() {
            level.power = power[index];
            level.cost = cost[index];
        }
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: SpellRange) -> Self {
        for level in &mut self.levels {
            level.range = range;
        }
        self
    }

    /// Adds the effect to every level.
    #[must_use]
    pub fn with_effect(self, config: EffectConfig) -> Self {
        self.with_entry(EffectEntry::new(config))
    }

    /// Adds an effect fired only by the spell's obstacles.
    #[must_use]
    pub fn with_indirect_effect(self, config: EffectConfig) -> Self {
        self.with_entry(EffectEntry {
            indirect: true,
            ..EffectEntry::new(config)
        })
    }

    #[must_use]
    pub fn with_entry(mut self, entry: EffectEntry) -> Self {
        for level in &mut self.levels {
            level.effects.push(entry.clone());
        }
        self
    }

    /// Edits one level in place.
    #[must_use]
    pub fn with_level(mut self, level: u8, edit: impl FnOnce(&mut SpellLevel)) -> Self {
        if let Some(info) = self.levels.get_mut(usize::from(level)) {
            edit(info);
        }
        self
    }

    pub fn level(&self, level: u8) -> &SpellLevel {
        &self.levels[usize::from(level.min(3))]
    }

    pub fn is_positive(&self) -> bool {
        self.positiveness == Positiveness::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.positiveness == Positiveness::Negative
    }

    pub fn is_neutral(&self) -> bool {
        self.positiveness == Positiveness::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_touch_every_level() {
        let spell = SpellDefinition::new(SpellId::HASTE, "Haste")
            .positive()
            .with_level_values([3, 3, 5, 5], [6, 6, 5, 5])
            .with_effect(EffectConfig::Cure)
            .with_level(3, |level| {
                level.range = SpellRange::All;
                level.smart = true;
            });
        assert!(spell.is_positive());
        assert_eq!(spell.level(2).power, 5);
        assert_eq!(spell.level(0).effects.len(), 1);
        assert_eq!(spell.level(3).range, SpellRange::All);
        assert_eq!(spell.level(9).range, SpellRange::All);
        assert_eq!(spell.level(1).range, SpellRange::Single);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn effect_entry_reads_flat_config() {
        let entry: EffectEntry =
            serde_json::from_str(r#"{ "type": "core:damage", "indirect": true }"#).unwrap();
        assert!(entry.indirect);
        assert!(!entry.optional);
        assert_eq!(entry.config, EffectConfig::Damage { animation: None });
    }
}
