/// Battle configuration constants and tunable parameters.
///
/// Field geometry is fixed at compile time; the per-level spell tables can be
/// overridden by data (every field falls back to its default when omitted).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Number of units hit by a chain lightning, indexed by effect level.
    pub chain_lightning_targets: [u8; 4],
    /// Number of patch obstacles (land mines, quicksand) placed per effect level.
    pub patches_per_level: [u8; 4],
    /// Wall parts hit by an earthquake before the level bonus is added.
    pub earthquake_base_targets: u8,
    /// Enchant power used when a creature caster carries no explicit bonus.
    pub default_enchant_power: i32,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    pub const FIELD_WIDTH: i16 = 17;
    pub const FIELD_HEIGHT: i16 = 11;
    pub const FIELD_SIZE: usize = 187;
    /// Highest school mastery a caster can have (0 = none, 3 = expert).
    pub const MAX_SCHOOL_LEVEL: u8 = 3;
    /// Upper bound (inclusive) of every percentage roll.
    pub const PERCENT_ROLL_MAX: i64 = 99;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CHAIN_LIGHTNING_TARGETS: [u8; 4] = [4, 4, 5, 5];
    pub const DEFAULT_PATCHES_PER_LEVEL: [u8; 4] = [4, 4, 6, 8];
    pub const DEFAULT_EARTHQUAKE_TARGETS: u8 = 2;
    pub const DEFAULT_ENCHANT_POWER: i32 = 3;

    pub fn new() -> Self {
        Self {
            chain_lightning_targets: Self::DEFAULT_CHAIN_LIGHTNING_TARGETS,
            patches_per_level: Self::DEFAULT_PATCHES_PER_LEVEL,
            earthquake_base_targets: Self::DEFAULT_EARTHQUAKE_TARGETS,
            default_enchant_power: Self::DEFAULT_ENCHANT_POWER,
        }
    }

    /// Looks up a per-level table entry, clamping the level into range.
    pub fn per_level(table: &[u8; 4], level: u8) -> usize {
        let index = usize::from(level.min(Self::MAX_SCHOOL_LEVEL));
        usize::from(table[index])
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_size_matches_dimensions() {
        assert_eq!(
            BattleConfig::FIELD_SIZE,
            (BattleConfig::FIELD_WIDTH * BattleConfig::FIELD_HEIGHT) as usize
        );
    }

    #[test]
    fn per_level_clamps_out_of_range_levels() {
        let config = BattleConfig::default();
        assert_eq!(BattleConfig::per_level(&config.chain_lightning_targets, 0), 4);
        assert_eq!(BattleConfig::per_level(&config.chain_lightning_targets, 9), 5);
        assert_eq!(BattleConfig::per_level(&config.patches_per_level, 3), 8);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: BattleConfig =
            serde_json::from_str(r#"{ "earthquake_base_targets": 3 }"#).unwrap();
        assert_eq!(config.earthquake_base_targets, 3);
        assert_eq!(config.patches_per_level, BattleConfig::DEFAULT_PATCHES_PER_LEVEL);
    }
}
