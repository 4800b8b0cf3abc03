//! Attack evaluation for battle AI.
//!
//! Given an attacker and a (possibly hypothetical) battle, [`PotentialTargets`]
//! lists every attack the unit can make this turn, estimates each exchange
//! with a [`DamageEstimator`] and picks the most valuable one. Damage rules
//! come from `battle-core`; this crate only ranks.
pub mod error;
pub mod estimator;
pub mod possibility;
pub mod potential_targets;

pub use error::TacticsError;
pub use estimator::{AttackInfo, BaseDamageEstimator, DamageEstimator, DamageRange};
pub use possibility::AttackPossibility;
pub use potential_targets::PotentialTargets;
