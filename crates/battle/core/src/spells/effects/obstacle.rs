use tracing::debug;

use super::{Effect, EffectConfig, filter_locations, first_hex, mismatched, require_active_mode};
use crate::battle::{BattleHex, BattleQuery, BattleRecord, HexDirection, Obstacle, ObstacleKind};
use crate::config::BattleConfig;
use crate::rng::shuffle;
use crate::spells::{ApplyContext, Destination, EffectConfigError, Mechanics, Problem, Target};
use crate::unit::BattleSide;

/// A new obstacle carrying the spell that placed it.
fn spell_obstacle(m: &Mechanics<'_>, id: u32, kind: ObstacleKind, position: BattleHex) -> Obstacle {
    Obstacle {
        spell: Some(m.spell_id()),
        caster_side: Some(m.caster().caster_side()),
        spell_level: m.level(),
        caster_power: m.effect_power(),
        ..Obstacle::new(id, kind, position)
    }
}

// ============================================================================
// Patches
// ============================================================================

/// Scatters land mines or quicksand over random free hexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchObstacle {
    pub kind: ObstacleKind,
    pub hidden: bool,
}

pub(super) fn build_patch(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::PatchObstacle { kind, hidden } => match kind {
            ObstacleKind::LandMine | ObstacleKind::Quicksand => Ok(Box::new(PatchObstacle {
                kind: *kind,
                hidden: *hidden,
            })),
            _ => Err(EffectConfigError::InvalidParameter {
                effect: "core:patchObstacle",
                reason: "patches are land mines or quicksand",
            }),
        },
        _ => Err(mismatched("core:patchObstacle")),
    }
}

impl Effect for PatchObstacle {
    fn name(&self) -> &'static str {
        "core:patchObstacle"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_active_mode(m)?;
        // Natives see the mines and walk around them.
        if self.kind == ObstacleKind::LandMine
            && battle.has_native_stack(m.caster().caster_side().other())
        {
            return Err(Problem::no_target(m.spell_id(), "enemy has a native stack"));
        }
        Ok(())
    }

    fn applicable_at(
        &self,
        _m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        _aim: &Target,
        _target: &Target,
    ) -> Result<(), Problem> {
        Ok(())
    }

    fn transform_target(
        &self,
        _m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        _aim: &Target,
        _spell_target: &Target,
    ) -> Target {
        Target::new()
    }

    fn filter_target(&self, _m: &Mechanics<'_>, _battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_locations(target)
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, _target: &Target) {
        let obstacles: Vec<Obstacle> = {
            let (battle, rng) = ctx.parts();
            let mut free: Vec<BattleHex> = (0..BattleConfig::FIELD_SIZE as i16)
                .map(BattleHex)
                .filter(|hex| battle.is_obstacle_hex_free(*hex))
                .collect();
            shuffle(&mut free, rng);

            let count = BattleConfig::per_level(&battle.config().patches_per_level, m.level())
                .min(free.len());
            let first_id = battle.next_obstacle_id();
            free.into_iter()
                .take(count)
                .zip(first_id..)
                .map(|(hex, id)| Obstacle {
                    turns_remaining: -1,
                    visible_to_enemy: !self.hidden,
                    ..spell_obstacle(m, id, self.kind, hex)
                })
                .collect()
        };
        debug!(spell = %m.spell_id(), count = obstacles.len(), "patches placed");
        if !obstacles.is_empty() {
            ctx.submit(BattleRecord::ObstaclesPlaced(obstacles));
        }
    }
}

// ============================================================================
// Walls
// ============================================================================

/// Hexes covered by a wall centered on `center`, and whether part of the
/// shape fell off the field.
///
/// The wall grows away from the caster: towards the top right for the
/// attacker, the top left for the defender. From level 2 it also grows the
/// other way.
pub fn wall_footprint(side: BattleSide, center: BattleHex, level: u8) -> (Vec<BattleHex>, bool) {
    let (first, second) = match side {
        BattleSide::Attacker => (HexDirection::TopRight, HexDirection::TopLeft),
        BattleSide::Defender => (HexDirection::TopLeft, HexDirection::TopRight),
    };
    let mut steps = vec![first];
    if level >= 2 {
        steps.push(second);
    }

    let mut hexes = vec![center];
    let mut dropped = false;
    for step in steps {
        match center.move_in_direction(step).filter(|hex| hex.is_valid()) {
            Some(hex) => hexes.push(hex),
            None => dropped = true,
        }
    }
    (hexes, dropped)
}

/// Fire wall or force field across a short line of hexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wall {
    pub kind: ObstacleKind,
    pub turns: i32,
}

pub(super) fn build_wall(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::Wall { kind, turns } => match kind {
            ObstacleKind::FireWall | ObstacleKind::ForceField => Ok(Box::new(Wall {
                kind: *kind,
                turns: *turns,
            })),
            _ => Err(EffectConfigError::InvalidParameter {
                effect: "core:wall",
                reason: "walls are fire walls or force fields",
            }),
        },
        _ => Err(mismatched("core:wall")),
    }
}

impl Wall {
    fn footprint(m: &Mechanics<'_>, center: BattleHex) -> (Vec<BattleHex>, bool) {
        wall_footprint(m.caster().caster_side(), center, m.level())
    }
}

impl Effect for Wall {
    fn name(&self) -> &'static str {
        "core:wall"
    }

    fn applicable(&self, m: &Mechanics<'_>, _battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_active_mode(m)
    }

    fn applicable_at(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        aim: &Target,
        _target: &Target,
    ) -> Result<(), Problem> {
        let Some(center) = first_hex(aim) else {
            return Err(Problem::invalid(m.spell_id(), "wall needs a destination"));
        };
        let (hexes, dropped) = Self::footprint(m, center);
        if dropped {
            return Err(Problem::no_target(m.spell_id(), "wall does not fit on the field"));
        }
        let clear = m.level_info().clear_affected;
        let free = hexes.iter().all(|hex| {
            if clear {
                battle.is_obstacle_hex_free(*hex)
            } else {
                hex.is_available()
            }
        });
        if free {
            Ok(())
        } else {
            Err(Problem::no_target(m.spell_id(), "wall hexes are taken"))
        }
    }

    fn transform_target(
        &self,
        m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        aim: &Target,
        _spell_target: &Target,
    ) -> Target {
        let Some(center) = first_hex(aim) else {
            return Target::new();
        };
        Self::footprint(m, center)
            .0
            .into_iter()
            .map(Destination::at)
            .collect()
    }

    fn filter_target(&self, _m: &Mechanics<'_>, _battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_locations(target)
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        let hexes: Vec<BattleHex> = target.iter().map(|destination| destination.hex).collect();
        let Some(center) = hexes.first().copied() else {
            ctx.complain("invalid destination for a wall");
            return;
        };
        let first_id = ctx.battle().next_obstacle_id();
        let place = |id: u32, position: BattleHex| Obstacle {
            turns_remaining: self.turns,
            visible_to_enemy: true,
            ..spell_obstacle(m, id, self.kind, position)
        };

        // A fire wall burns in every hex on its own; a force field is one
        // obstacle spanning the whole shape.
        let obstacles: Vec<Obstacle> = match self.kind {
            ObstacleKind::ForceField => vec![Obstacle {
                area: hexes,
                ..place(first_id, center)
            }],
            _ => hexes
                .into_iter()
                .zip(first_id..)
                .map(|(hex, id)| place(id, hex))
                .collect(),
        };
        ctx.submit(BattleRecord::ObstaclesPlaced(obstacles));
    }
}

// ============================================================================
// Removal
// ============================================================================

/// Removes the obstacles on the aimed hex that the caster's level allows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoveObstacle;

pub(super) fn build_remove(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectConfigError> {
    match config {
        EffectConfig::RemoveObstacle => Ok(Box::new(RemoveObstacle)),
        _ => Err(mismatched("core:removeObstacle")),
    }
}

impl RemoveObstacle {
    fn removable_at(m: &Mechanics<'_>, battle: &dyn BattleQuery, hex: BattleHex) -> Vec<u32> {
        battle
            .obstacles_at(hex)
            .into_iter()
            .filter(|obstacle| obstacle.kind.removable_at(m.level()))
            .map(|obstacle| obstacle.id)
            .collect()
    }
}

impl Effect for RemoveObstacle {
    fn name(&self) -> &'static str {
        "core:removeObstacle"
    }

    fn applicable(&self, m: &Mechanics<'_>, battle: &dyn BattleQuery) -> Result<(), Problem> {
        require_active_mode(m)?;
        if battle
            .obstacles()
            .iter()
            .any(|obstacle| obstacle.kind.removable_at(m.level()))
        {
            Ok(())
        } else {
            Err(Problem::no_target(m.spell_id(), "no removable obstacle"))
        }
    }

    fn applicable_at(
        &self,
        m: &Mechanics<'_>,
        battle: &dyn BattleQuery,
        aim: &Target,
        _target: &Target,
    ) -> Result<(), Problem> {
        let removable = first_hex(aim).is_some_and(|hex| !Self::removable_at(m, battle, hex).is_empty());
        if removable {
            Ok(())
        } else {
            Err(Problem::no_target(m.spell_id(), "no removable obstacle here"))
        }
    }

    fn transform_target(
        &self,
        _m: &Mechanics<'_>,
        _battle: &dyn BattleQuery,
        aim: &Target,
        _spell_target: &Target,
    ) -> Target {
        first_hex(aim).map(Destination::at).into_iter().collect()
    }

    fn filter_target(&self, _m: &Mechanics<'_>, _battle: &dyn BattleQuery, target: &Target) -> Target {
        filter_locations(target)
    }

    fn apply(&self, m: &Mechanics<'_>, ctx: &mut ApplyContext<'_>, target: &Target) {
        let Some(hex) = first_hex(target) else {
            ctx.complain("no obstacle to remove");
            return;
        };
        if ctx.battle().obstacles_at(hex).is_empty() {
            ctx.complain("no obstacle to remove");
            return;
        }
        let removed = Self::removable_at(m, ctx.battle(), hex);
        if removed.is_empty() {
            ctx.complain("cannot remove this obstacle");
        } else {
            ctx.submit(BattleRecord::ObstaclesRemoved(removed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_wall_grows_away_from_caster() {
        let center = BattleHex(86);
        let (attacker, dropped) = wall_footprint(BattleSide::Attacker, center, 1);
        assert!(!dropped);
        assert_eq!(
            attacker,
            vec![center, center.move_in_direction(HexDirection::TopRight).unwrap()]
        );

        let (defender, _) = wall_footprint(BattleSide::Defender, center, 0);
        assert_eq!(
            defender,
            vec![center, center.move_in_direction(HexDirection::TopLeft).unwrap()]
        );
    }

    #[test]
    fn advanced_wall_covers_three_hexes() {
        let (hexes, dropped) = wall_footprint(BattleSide::Attacker, BattleHex(86), 2);
        assert!(!dropped);
        assert_eq!(hexes.len(), 3);
    }

    #[test]
    fn wall_on_top_row_drops_hexes() {
        let (hexes, dropped) = wall_footprint(BattleSide::Attacker, BattleHex(5), 3);
        assert!(dropped);
        assert_eq!(hexes, vec![BattleHex(5)]);
    }
}
