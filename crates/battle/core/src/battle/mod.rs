//! The battlefield: hex geometry, obstacles, siege walls and the boundaries
//! through which combat rules read and change a battle.

mod hex;
mod obstacle;
mod query;
mod record;
mod siege;
mod state;

pub use hex::{BattleHex, HexDirection, HexDistances};
pub use obstacle::{Obstacle, ObstacleKind};
pub use query::{BattleQuery, BattleStateMut};
pub use record::{BattleRecord, LocalReplication, ReplicationSink, WallHit, replay};
pub use siege::{FortLevel, SiegeState, WallPart, WallState};
pub use state::BattleState;
