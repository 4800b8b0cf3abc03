use battle_core::combat::AttackFlags;
use battle_core::spells::EffectConfig;
use battle_core::{
    ApplyContext, BattleConfig, BattleHex, BattleQuery, BattleRecord, BattleSide, BattleState,
    BattleStateMut, Bonus, BonusBearer, BonusKind, BonusList, BonusSource, CastError, CastMode,
    CreatureId, Destination, HeroCaster, LocalReplication, Mechanics, Obstacle, ObstacleKind,
    PcgRandom, PlayerColor, ProblemKind, ScriptedRandom, SlotId, SpellCatalog, SpellDefinition,
    SpellId, Stack, Target, Unit, UnitId, UnitInfo, trigger_obstacle,
};

const RED: PlayerColor = PlayerColor(0);
const BLUE: PlayerColor = PlayerColor(1);

// ============================================================================
// Helpers
// ============================================================================

fn create_test_stack(id: u32, side: BattleSide, position: i16, max_health: i32, bonuses: &[Bonus]) -> Stack {
    let info = UnitInfo {
        id: UnitId(id),
        side,
        owner: match side {
            BattleSide::Attacker => RED,
            BattleSide::Defender => BLUE,
        },
        slot: SlotId(id as i32),
        creature: CreatureId(20),
        creature_level: 2,
        double_wide: false,
        base_amount: 10,
        max_health,
    };
    let list: BonusList = bonuses.iter().cloned().collect();
    Stack::new(info, list, BattleHex(position))
}

fn create_test_battle(config: BattleConfig) -> BattleState {
    let mut battle = BattleState::new(config, RED, BLUE);
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 86, 10, &[]));
    battle.add_stack(create_test_stack(2, BattleSide::Defender, 99, 10, &[]));
    battle
}

fn create_test_hero(school_level: u8) -> HeroCaster {
    HeroCaster {
        owner: RED,
        side: BattleSide::Attacker,
        school_level,
        spell_power: 2,
    }
}

fn spell_bonus(kind: BonusKind, value: i32, spell: SpellId) -> Bonus {
    Bonus::new(kind, value).with_source(BonusSource::SpellEffect(spell))
}

fn catalog() -> SpellCatalog {
    SpellCatalog::builtin().expect("builtin spells compile")
}

fn aim_at(hex: i16) -> Target {
    vec![Destination::at(BattleHex(hex))]
}

fn count_of(battle: &BattleState, id: u32) -> i32 {
    battle.stack(UnitId(id)).map(Unit::count).unwrap_or_default()
}

// ============================================================================
// Healing
// ============================================================================

/// A wiped out stack is raised in full by advanced resurrection and stays
/// raised after the battle.
#[test]
fn resurrection_raises_a_dead_stack() {
    let catalog = catalog();
    let mut battle = create_test_battle(BattleConfig::default());
    if let Some(stack) = battle.stack_mut(UnitId(1)) {
        stack.state_mut().damage(1_000);
    }
    assert!(battle.stack(UnitId(1)).is_some_and(|stack| stack.is_dead()));

    let hero = create_test_hero(2);
    let mechanics = Mechanics::new(&catalog, SpellId::RESURRECTION, &hero, CastMode::Hero)
        .expect("resurrection is known");
    let mut rng = ScriptedRandom::constant(0);
    let mut ctx = ApplyContext::direct(&mut battle, &mut rng);
    let outcome = mechanics.cast(&mut ctx, &aim_at(86)).expect("corpse can be raised");

    assert_eq!(outcome.affected, vec![UnitId(1)]);
    let raised = battle.stack(UnitId(1)).expect("unit stays on the field");
    assert!(raised.alive());
    assert_eq!(raised.count(), 10);
    assert_eq!(raised.state().health().resurrected(), 0);
}

/// A heal reports the amount granted even when less health was missing.
#[test]
fn cure_reports_the_granted_amount() {
    let catalog = catalog();
    let mut battle = create_test_battle(BattleConfig::default());
    if let Some(stack) = battle.stack_mut(UnitId(1)) {
        stack.state_mut().damage(3);
    }

    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::CURE, &hero, CastMode::Hero)
        .expect("cure is known");
    let mut rng = ScriptedRandom::constant(0);
    let mut sink = LocalReplication::new(&mut battle);
    {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(86)).expect("wounded ally under the aim");
    }

    let changes = sink
        .journal()
        .iter()
        .find_map(|record| match record {
            BattleRecord::UnitsChanged(changes) => Some(changes.clone()),
            _ => None,
        })
        .expect("cure changed the unit");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].unit, UnitId(1));
    // 5 per spell power point plus 10 at basic level.
    assert_eq!(changes[0].health_delta, 20);

    let cured = battle.stack(UnitId(1)).expect("unit stays on the field");
    assert_eq!(cured.available_health(), 100);
}

/// Healing needs an injured target.
#[test]
fn healthy_army_cannot_be_cured() {
    let catalog = catalog();
    let battle = create_test_battle(BattleConfig::default());
    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::CURE, &hero, CastMode::Hero)
        .expect("cure is known");

    let problem = mechanics.can_be_cast(&battle).expect_err("nobody needs curing");
    assert_eq!(problem.kind, ProblemKind::NoAppropriateTarget);
}

// ============================================================================
// Damage
// ============================================================================

/// Each hop of a chain lightning halves the damage of the previous one.
#[test]
fn chain_lightning_halves_every_hop() {
    let config = BattleConfig {
        chain_lightning_targets: [3; 4],
        ..BattleConfig::default()
    };
    let mut battle = BattleState::new(config, RED, BLUE);
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 18, 1_000, &[]));
    battle.add_stack(create_test_stack(2, BattleSide::Defender, 88, 1_000, &[]));
    battle.add_stack(create_test_stack(3, BattleSide::Defender, 90, 1_000, &[]));
    battle.add_stack(create_test_stack(4, BattleSide::Defender, 92, 1_000, &[]));

    let catalog = catalog();
    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::CHAIN_LIGHTNING, &hero, CastMode::Hero)
        .expect("chain lightning is known");

    let mut rng = ScriptedRandom::constant(99);
    let mut sink = LocalReplication::new(&mut battle);
    {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(88)).expect("enemy under the aim");
    }

    let hits = sink
        .journal()
        .iter()
        .find_map(|record| match record {
            BattleRecord::UnitsAttacked(hits) => Some(hits.clone()),
            _ => None,
        })
        .expect("lightning struck");
    let damage: Vec<(UnitId, i64)> = hits.iter().map(|hit| (hit.target, hit.damage_amount)).collect();
    // 40 per spell power point plus 25 at basic level.
    assert_eq!(damage, vec![(UnitId(2), 105), (UnitId(3), 52), (UnitId(4), 26)]);
    assert!(!hits[0].flags.contains(AttackFlags::SECONDARY));
    assert!(hits[1].flags.contains(AttackFlags::SECONDARY | AttackFlags::SPELL_EFFECT));
}

/// The next jump is measured from the hex struck, not from the unit's front.
#[test]
fn chain_lightning_jumps_from_the_struck_hex() {
    let config = BattleConfig {
        chain_lightning_targets: [2; 4],
        ..BattleConfig::default()
    };
    let mut battle = BattleState::new(config, RED, BLUE);
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 18, 1_000, &[]));
    // Double-wide defender standing on 90 with its back on 91.
    let wide = UnitInfo {
        double_wide: true,
        ..create_test_stack(2, BattleSide::Defender, 90, 1_000, &[]).info().clone()
    };
    battle.add_stack(Stack::new(wide, BonusList::new(), BattleHex(90)));
    // Three hexes from the front, but two from the back.
    battle.add_stack(create_test_stack(3, BattleSide::Defender, 93, 1_000, &[]));
    // Three hexes from the front, four from the back.
    battle.add_stack(create_test_stack(4, BattleSide::Defender, 87, 1_000, &[]));

    let catalog = catalog();
    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::CHAIN_LIGHTNING, &hero, CastMode::Hero)
        .expect("chain lightning is known");

    let mut rng = ScriptedRandom::constant(99);
    let mut sink = LocalReplication::new(&mut battle);
    {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(91)).expect("back of the enemy under the aim");
    }

    let struck: Vec<UnitId> = sink
        .journal()
        .iter()
        .find_map(|record| match record {
            BattleRecord::UnitsAttacked(hits) => Some(hits.iter().map(|hit| hit.target).collect()),
            _ => None,
        })
        .expect("lightning struck");
    assert_eq!(struck, vec![UnitId(2), UnitId(3)]);
}

/// A mirror sends a single-target curse back at a random unit of the caster.
#[test]
fn magic_mirror_reflects_onto_the_caster_side() {
    let catalog = catalog();
    let mut battle = BattleState::new(BattleConfig::default(), RED, BLUE);
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 86, 10, &[]));
    battle.add_stack(create_test_stack(2, BattleSide::Defender, 99, 10, &[Bonus::new(
        BonusKind::MagicMirror,
        100,
    )]));

    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::MAGIC_ARROW, &hero, CastMode::Hero)
        .expect("magic arrow is known");

    // Zero rolls: never resisted, always reflected, first unit picked.
    let mut rng = ScriptedRandom::constant(0);
    let mut sink = LocalReplication::new(&mut battle);
    let outcome = {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(99)).expect("enemy under the aim")
    };

    assert!(outcome.affected.is_empty());
    assert_eq!(outcome.reflected, vec![UnitId(2)]);
    assert_eq!(outcome.redirected.len(), 1);
    assert_eq!(outcome.redirected[0].affected, vec![UnitId(1)]);
    // Only the hero pays; the reflection is free.
    let mana_records = sink
        .journal()
        .iter()
        .filter(|record| matches!(record, BattleRecord::ManaSpent { .. }))
        .count();
    assert_eq!(mana_records, 1);

    assert_eq!(count_of(&battle, 1), 7);
    assert_eq!(count_of(&battle, 2), 10);
}

/// Resistance is rolled by the authoritative side only.
#[test]
fn speculative_casts_ignore_resistance() {
    let catalog = catalog();
    let mut battle = create_test_battle(BattleConfig::default());
    battle.add_stack(create_test_stack(3, BattleSide::Defender, 101, 10, &[Bonus::new(
        BonusKind::MagicResistance,
        100,
    )]));
    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::MAGIC_ARROW, &hero, CastMode::Hero)
        .expect("magic arrow is known");

    let mut speculative = battle.clone();
    let mut rng = ScriptedRandom::constant(50);
    let mut ctx = ApplyContext::direct(&mut speculative, &mut rng);
    let outcome = mechanics.cast(&mut ctx, &aim_at(101)).expect("enemy under the aim");
    assert_eq!(outcome.affected, vec![UnitId(3)]);
    assert_eq!(count_of(&speculative, 3), 7);

    let mut rng = ScriptedRandom::constant(50);
    let mut sink = LocalReplication::new(&mut battle);
    let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
    let outcome = mechanics.cast(&mut ctx, &aim_at(101)).expect("enemy under the aim");
    assert_eq!(outcome.resisted, vec![UnitId(3)]);
    assert_eq!(count_of(&battle, 3), 10);
}

// ============================================================================
// Dispelling
// ============================================================================

/// Basic dispel clears curses but never a disrupting ray.
#[test]
fn dispel_keeps_disrupting_ray() {
    let catalog = catalog();
    let slowed = spell_bonus(BonusKind::StacksSpeed, -2, SpellId::SLOW);
    let ray = spell_bonus(BonusKind::PrimarySkill, -3, SpellId::DISRUPTING_RAY).with_subtype(1);
    let mut battle = BattleState::new(BattleConfig::default(), RED, BLUE);
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 86, 10, &[slowed.clone(), ray.clone()]));
    battle.add_stack(create_test_stack(2, BattleSide::Defender, 99, 10, &[]));

    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::DISPEL, &hero, CastMode::Hero)
        .expect("dispel is known");
    let mut rng = ScriptedRandom::constant(0);
    let mut ctx = ApplyContext::direct(&mut battle, &mut rng);
    mechanics.cast(&mut ctx, &aim_at(86)).expect("a cursed ally");

    let bonuses = battle.stack(UnitId(1)).expect("unit present").bonuses().to_vec();
    assert!(!bonuses.contains(&slowed));
    assert!(bonuses.contains(&ray));
}

/// A dispel limited to positive effects leaves curses alone.
#[test]
fn positive_dispel_keeps_curses() {
    let mut catalog = catalog();
    let purge = SpellId(80);
    catalog
        .insert(SpellDefinition::new(purge, "Purge").with_effect(EffectConfig::Dispel {
            positive: true,
            negative: false,
            neutral: false,
            remove_spell_obstacles: false,
        }))
        .expect("dispel config is valid");

    let hasted = spell_bonus(BonusKind::StacksSpeed, 3, SpellId::HASTE);
    let slowed = spell_bonus(BonusKind::StacksSpeed, -2, SpellId::SLOW);
    let mut battle = BattleState::new(BattleConfig::default(), RED, BLUE);
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 86, 10, &[]));
    battle.add_stack(create_test_stack(2, BattleSide::Defender, 99, 10, &[hasted.clone(), slowed.clone()]));

    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, purge, &hero, CastMode::Hero).expect("purge was inserted");
    let mut rng = ScriptedRandom::constant(0);
    let mut ctx = ApplyContext::direct(&mut battle, &mut rng);
    mechanics.cast(&mut ctx, &aim_at(99)).expect("a hasted enemy");

    let bonuses = battle.stack(UnitId(2)).expect("unit present").bonuses().to_vec();
    assert!(!bonuses.contains(&hasted));
    assert!(bonuses.contains(&slowed));
}

// ============================================================================
// Obstacles
// ============================================================================

/// Land mines are hidden from the enemy and numbered from the next free id.
#[test]
fn land_mines_are_scattered_hidden() {
    let catalog = catalog();
    let mut battle = create_test_battle(BattleConfig::default());
    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::LAND_MINE, &hero, CastMode::Hero)
        .expect("land mine is known");

    let mut rng = PcgRandom::new(7);
    let mut ctx = ApplyContext::direct(&mut battle, &mut rng);
    mechanics.cast(&mut ctx, &aim_at(86)).expect("mines can be laid");

    let mines = battle.obstacles();
    assert_eq!(mines.len(), 4);
    let ids: Vec<u32> = mines.iter().map(|mine| mine.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    for mine in mines {
        assert_eq!(mine.kind, ObstacleKind::LandMine);
        assert!(!mine.visible_to_enemy);
        assert_eq!(mine.caster_side, Some(BattleSide::Attacker));
        assert!(battle.unit_at(mine.position, true).is_none());
    }
}

/// A triggered mine explodes with its animation and is gone afterwards.
#[test]
fn land_mine_trigger_damages_and_disarms() {
    let catalog = catalog();
    let mut battle = create_test_battle(BattleConfig::default());
    let mut mine = Obstacle::new(1, ObstacleKind::LandMine, BattleHex(99));
    mine.spell = Some(SpellId::LAND_MINE);
    mine.caster_side = Some(BattleSide::Attacker);
    mine.caster_power = 2;
    mine.visible_to_enemy = false;
    battle.add_obstacle(mine.clone());

    let mut rng = ScriptedRandom::constant(99);
    let mut sink = LocalReplication::new(&mut battle);
    let outcome = {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        trigger_obstacle(&catalog, &mine, UnitId(2), &mut ctx).expect("mine fires")
    };
    assert_eq!(outcome.affected, vec![UnitId(2)]);

    let journal = sink.journal().to_vec();
    assert_eq!(journal.len(), 2);
    match &journal[0] {
        BattleRecord::UnitsAttacked(hits) => {
            assert_eq!(hits[0].effect, Some(82));
            assert!(hits[0].flags.contains(AttackFlags::EFFECT));
            // 10 per spell power point plus 25 at basic level.
            assert_eq!(hits[0].damage_amount, 45);
        }
        other => panic!("unexpected record {other:?}"),
    }
    assert_eq!(journal[1], BattleRecord::ObstaclesRemoved(vec![1]));

    assert!(battle.obstacles().is_empty());
    assert_eq!(count_of(&battle, 2), 6);
}

// ============================================================================
// Spending
// ============================================================================

/// A creature caster uses up its cast; the stale copy it cast from does not
/// let it cast again.
#[test]
fn creature_cast_consumes_a_cast() {
    let catalog = catalog();
    let mut battle = BattleState::new(BattleConfig::default(), RED, BLUE);
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 86, 10, &[
        Bonus::new(BonusKind::Casts, 1),
        Bonus::new(BonusKind::Spellcaster, 2).with_subtype(SpellId::HASTE.0),
    ]));
    battle.add_stack(create_test_stack(3, BattleSide::Attacker, 52, 10, &[]));
    battle.add_stack(create_test_stack(2, BattleSide::Defender, 99, 10, &[]));

    let caster = battle.stack(UnitId(1)).expect("caster present").acquire();
    let mechanics = Mechanics::new(&catalog, SpellId::HASTE, &caster, CastMode::CreatureActive)
        .expect("haste is known");
    assert_eq!(mechanics.level(), 2);

    let mut rng = ScriptedRandom::constant(0);
    let mut ctx = ApplyContext::direct(&mut battle, &mut rng);
    mechanics.cast(&mut ctx, &aim_at(52)).expect("an ally to haste");

    let caster = battle.stack(UnitId(1)).expect("caster present");
    assert!(!caster.can_cast());
    let hasted = battle.stack(UnitId(3)).expect("ally present");
    assert_eq!(hasted.value_of_type(BonusKind::StacksSpeed), 5);

    let fresh = caster.acquire();
    let again = Mechanics::new(&catalog, SpellId::HASTE, &fresh, CastMode::CreatureActive)
        .expect("haste is known");
    let problem = again.can_be_cast(&battle).expect_err("no casts left");
    assert_eq!(problem.kind, ProblemKind::CasterCannotCast);
}

#[test]
fn unknown_spell_is_reported() {
    let catalog = catalog();
    let hero = create_test_hero(0);
    assert!(matches!(
        Mechanics::new(&catalog, SpellId(404), &hero, CastMode::Hero),
        Err(CastError::UnknownSpell(_))
    ));
}
