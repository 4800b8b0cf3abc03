use battle_core::{
    ApplyContext, BattleConfig, BattleHex, BattleQuery, BattleRecord, BattleSide, BattleState,
    BonusBearer, BonusKind, BonusList, CastMode, CreatureId, Destination, FortLevel, HeroCaster,
    LocalReplication, Mechanics, PcgRandom, PlayerColor, RandAdapter, ScriptedRandom, SiegeState,
    SlotId, SpellCatalog, SpellId, Stack, UnitId, UnitInfo, WallState, replay,
};
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

const RED: PlayerColor = PlayerColor(0);
const BLUE: PlayerColor = PlayerColor(1);

fn create_test_stack(id: u32, side: BattleSide, position: i16) -> Stack {
    let info = UnitInfo {
        id: UnitId(id),
        side,
        owner: if side == BattleSide::Attacker { RED } else { BLUE },
        slot: SlotId(id as i32),
        creature: CreatureId(30),
        creature_level: 3,
        double_wide: false,
        base_amount: 12,
        max_health: 25,
    };
    Stack::new(info, BonusList::new(), BattleHex(position))
}

/// Two attackers against two defenders in front of a castle.
fn create_test_siege() -> BattleState {
    let mut battle = BattleState::new(BattleConfig::default(), RED, BLUE)
        .with_siege(SiegeState::new(FortLevel::Castle));
    battle.add_stack(create_test_stack(1, BattleSide::Attacker, 35));
    battle.add_stack(create_test_stack(2, BattleSide::Attacker, 69));
    battle.add_stack(create_test_stack(3, BattleSide::Defender, 84));
    battle.add_stack(create_test_stack(4, BattleSide::Defender, 118));
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

fn aim_at(hex: i16) -> Vec<Destination> {
    vec![Destination::at(BattleHex(hex))]
}

/// Observers replaying the journal of a random cast end with the authoritative
/// battle.
#[test]
fn journal_replay_matches_authoritative_battle() {
    let catalog = SpellCatalog::builtin().expect("builtin spells compile");
    let start = create_test_siege();
    let mut authoritative = start.clone();

    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::EARTHQUAKE, &hero, CastMode::Hero)
        .expect("earthquake is known");
    let mut rng = PcgRandom::new(11);
    let mut sink = LocalReplication::new(&mut authoritative);
    {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(86)).expect("walls are standing");
    }
    let journal = sink.into_journal();

    let hits: Vec<_> = journal
        .iter()
        .filter_map(|record| match record {
            BattleRecord::WallsAttacked(hits) => Some(hits.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(hits.len(), 2);
    assert_ne!(hits[0].part, hits[1].part);
    assert!(hits.iter().all(|hit| hit.state_after == WallState::Damaged));

    let mut observer = start;
    replay(&journal, &mut observer);
    assert_eq!(observer, authoritative);
}

/// Casts with no rolls end the same whichever backend applies them.
#[test]
fn backends_converge_without_rolls() {
    let catalog = SpellCatalog::builtin().expect("builtin spells compile");
    let start = create_test_siege();
    let hero = create_test_hero(3);
    let mechanics = Mechanics::new(&catalog, SpellId::HASTE, &hero, CastMode::Hero)
        .expect("haste is known");

    let mut replicated = start.clone();
    let mut rng = ScriptedRandom::constant(0);
    let mut sink = LocalReplication::new(&mut replicated);
    let outcome = {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(35)).expect("allies on the field")
    };
    assert_eq!(outcome.affected, vec![UnitId(1), UnitId(2)]);

    let mut direct = start;
    let mut rng = ScriptedRandom::constant(0);
    let mut ctx = ApplyContext::direct(&mut direct, &mut rng);
    mechanics.cast(&mut ctx, &aim_at(35)).expect("allies on the field");

    assert_eq!(direct, replicated);
    for (id, hasted) in [(1, true), (2, true), (3, false), (4, false)] {
        let unit = direct.unit(UnitId(id)).expect("unit present");
        assert_eq!(unit.has_bonus_of_type(BonusKind::StacksSpeed), hasted, "unit {id}");
    }
    assert_eq!(direct.mana_spent(RED), 5);
}

/// Any `rand` generator can drive a battle.
#[test]
fn seeded_rand_generator_is_reproducible() {
    let catalog = SpellCatalog::builtin().expect("builtin spells compile");
    let hero = create_test_hero(2);
    let mechanics = Mechanics::new(&catalog, SpellId::EARTHQUAKE, &hero, CastMode::Hero)
        .expect("earthquake is known");

    let run = |seed: u64| {
        let mut battle = create_test_siege();
        let mut rng = RandAdapter::new(ChaCha8Rng::seed_from_u64(seed));
        let mut ctx = ApplyContext::direct(&mut battle, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(86)).expect("walls are standing");
        battle
    };
    assert_eq!(run(5), run(5));
}

#[cfg(feature = "serde")]
#[test]
fn journal_survives_json_transport() {
    let catalog = SpellCatalog::builtin().expect("builtin spells compile");
    let mut battle = create_test_siege();
    let hero = create_test_hero(0);
    let mechanics = Mechanics::new(&catalog, SpellId::MAGIC_ARROW, &hero, CastMode::Hero)
        .expect("magic arrow is known");

    let mut rng = ScriptedRandom::constant(99);
    let mut sink = LocalReplication::new(&mut battle);
    {
        let mut ctx = ApplyContext::replicated(&mut sink, &mut rng);
        mechanics.cast(&mut ctx, &aim_at(84)).expect("enemy under the aim");
    }
    let journal = sink.into_journal();

    let json = serde_json::to_string(&journal).expect("records serialize");
    let decoded: Vec<BattleRecord> = serde_json::from_str(&json).expect("records deserialize");
    assert_eq!(decoded, journal);
}
