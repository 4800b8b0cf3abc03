//! Spell data with compiled effects.

use std::collections::BTreeMap;

use tracing::debug;

use super::effects::{Effect, EffectRegistry};
use super::{EffectConfigError, Positiveness, SpellDefinition, SpellId, builtin_spells};

/// An effect built from its config, with the entry's flags.
#[derive(Debug)]
pub struct CompiledEffect {
    pub optional: bool,
    pub indirect: bool,
    pub effect: Box<dyn Effect>,
}

/// A spell and its effects built per school level.
#[derive(Debug)]
pub struct CatalogEntry {
    pub definition: SpellDefinition,
    pub levels: [Vec<CompiledEffect>; 4],
}

impl CatalogEntry {
    /// Effects of a school level, clamped to expert.
    pub fn effects(&self, level: u8) -> &[CompiledEffect] {
        &self.levels[usize::from(level.min(3))]
    }
}

/// Every spell a battle knows, looked up by id.
///
/// Effects are compiled once when a spell is inserted, so a bad config is
/// reported up front rather than at cast time.
#[derive(Debug)]
pub struct SpellCatalog {
    registry: EffectRegistry,
    spells: BTreeMap<SpellId, CatalogEntry>,
}

impl Default for SpellCatalog {
    fn default() -> Self {
        Self::new(EffectRegistry::core())
    }
}

impl SpellCatalog {
    pub fn new(registry: EffectRegistry) -> Self {
        Self {
            registry,
            spells: BTreeMap::new(),
        }
    }

    /// Catalog with the core effects and the built-in spells.
    pub fn builtin() -> Result<Self, EffectConfigError> {
        let mut catalog = Self::default();
        for spell in builtin_spells() {
            catalog.insert(spell)?;
        }
        Ok(catalog)
    }

    /// Adds or replaces a spell. Nothing is changed when an effect fails to
    /// build.
    pub fn insert(&mut self, definition: SpellDefinition) -> Result<(), EffectConfigError> {
        let mut levels: [Vec<CompiledEffect>; 4] = Default::default();
        for (compiled, level) in levels.iter_mut().zip(&definition.levels) {
            for entry in &level.effects {
                compiled.push(CompiledEffect {
                    optional: entry.optional,
                    indirect: entry.indirect,
                    effect: self.registry.create(&entry.config)?,
                });
            }
        }
        debug!(spell = %definition.id, name = %definition.name, "spell registered");
        self.spells
            .insert(definition.id, CatalogEntry { definition, levels });
        Ok(())
    }

    pub fn get(&self, id: SpellId) -> Option<&CatalogEntry> {
        self.spells.get(&id)
    }

    pub fn definition(&self, id: SpellId) -> Option<&SpellDefinition> {
        self.get(id).map(|entry| &entry.definition)
    }

    /// Positiveness of a known spell, neutral otherwise.
    pub fn positiveness(&self, id: SpellId) -> Positiveness {
        self.definition(id)
            .map(|spell| spell.positiveness)
            .unwrap_or_default()
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ObstacleKind;
    use crate::spells::EffectConfig;

    #[test]
    fn builtin_catalog_compiles() {
        let catalog = SpellCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        let mine = catalog.get(SpellId::LAND_MINE).unwrap();
        assert!(mine.effects(2).iter().any(|effect| effect.indirect));
        assert_eq!(catalog.positiveness(SpellId::SLOW), Positiveness::Negative);
        assert_eq!(catalog.positiveness(SpellId(999)), Positiveness::Neutral);
    }

    #[test]
    fn bad_effect_leaves_catalog_untouched() {
        let mut catalog = SpellCatalog::default();
        let broken = SpellDefinition::new(SpellId::FIRE_WALL, "Fire Wall").with_effect(
            EffectConfig::Wall {
                kind: ObstacleKind::Quicksand,
                turns: 2,
            },
        );
        assert!(catalog.insert(broken).is_err());
        assert!(catalog.get(SpellId::FIRE_WALL).is_none());
    }

    #[test]
    fn missing_effect_factory_is_reported() {
        let mut catalog = SpellCatalog::new(EffectRegistry::new());
        let cure = SpellDefinition::new(SpellId::CURE, "Cure").with_effect(EffectConfig::Cure);
        assert_eq!(
            catalog.insert(cure),
            Err(EffectConfigError::UnknownEffect("core:cure".into()))
        );
    }
}
