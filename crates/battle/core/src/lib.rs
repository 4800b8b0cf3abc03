//! Deterministic combat rules for hex-grid tactical battles.
//!
//! `battle-core` owns the unit state model (health, ammunition, retaliations),
//! damage resolution with rebirth, and the data-configured spell effect
//! framework. The host owns the battle itself: rules read it through
//! [`BattleQuery`] and change it only by emitting [`BattleRecord`]s, either
//! replicated to every observer or applied straight into a detached copy.
//!
//! All randomness is injected through [`RandomSource`], so a battle replayed
//! with the same source and the same records ends in the same state.
pub mod battle;
pub mod bonus;
pub mod combat;
pub mod config;
pub mod error;
pub mod rng;
pub mod spells;
pub mod unit;

pub use battle::{
    BattleHex, BattleQuery, BattleRecord, BattleState, BattleStateMut, FortLevel, HexDirection,
    HexDistances, LocalReplication, Obstacle, ObstacleKind, ReplicationSink, SiegeState, WallHit,
    WallPart, WallState, replay,
};
pub use bonus::{Bonus, BonusBearer, BonusDuration, BonusKind, BonusList, BonusSource};
pub use combat::{AttackOutcome, RebirthRoll, adjust_spell_damage, rebirth_count, resolve_attack};
pub use config::BattleConfig;
pub use error::{EngineError, ErrorContext, ErrorSeverity};
pub use rng::{PcgRandom, RandAdapter, RandomSource, ScriptedRandom};
pub use spells::{
    ApplyContext, ApplyStrategy, CastError, CastMode, CastOutcome, CastPlan, Caster, Destination,
    HeroCaster, Mechanics, Positiveness, Problem, ProblemKind, SpellCatalog, SpellDefinition,
    SpellId, Target, trigger_obstacle,
};
pub use unit::{
    Ammo, AmmoKind, BattleSide, CreatureId, HealLevel, HealPower, HealthPool, PlayerColor, SlotId,
    Stack, Unit, UnitChange, UnitId, UnitInfo, UnitState, UnitStateSnapshot,
    is_melee_attack_possible,
};
