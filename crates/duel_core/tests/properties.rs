//! Property tests over random rosters, configs, scripts and seeds.

use duel_core::damage::damage_bounds;
use duel_core::prelude::*;
use duel_core::scheduler::schedule_key;
use duel_test_utils::determinism::strategies::*;
use duel_test_utils::fixtures::DuelBuilder;
use proptest::prelude::*;

const MAX_STEPS: usize = 400;

fn build(
    a: &CombatantStats,
    b: &CombatantStats,
    config: BattleConfig,
    seed: u64,
    scripts: Option<(Vec<ActionKind>, Vec<ActionKind>)>,
) -> CombatEngine {
    let builder = DuelBuilder::new(Combatant::new(1, "A", a), Combatant::new(2, "B", b))
        .config(config)
        .seed(seed);
    let builder = match scripts {
        Some((script_a, script_b)) => builder
            .challenger(|f| f.with_policy(ScriptedPolicy::new(script_a)))
            .defender(|f| f.with_policy(ScriptedPolicy::new(script_b))),
        None => builder,
    };
    builder.build().unwrap()
}

fn assert_bounds(engine: &CombatEngine) -> std::result::Result<(), TestCaseError> {
    prop_assert!(engine.distance() <= engine.config().max_distance);
    for c in engine.combatants() {
        prop_assert!(c.health <= c.max_health);
        prop_assert!(c.stamina <= c.max_stamina);
        prop_assert!(c.action().is_some(), "every combatant keeps a pending action");
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Distance and resources stay in range after every event.
    #[test]
    fn prop_state_stays_bounded(
        a in arb_stats(),
        b in arb_stats(),
        config in arb_config(),
        seed in arb_seed(),
        script_a in arb_script(30),
        script_b in arb_script(30),
    ) {
        let mut engine = build(&a, &b, config, seed, Some((script_a, script_b)));
        assert_bounds(&engine)?;
        for _ in 0..MAX_STEPS {
            if !engine.step().unwrap() {
                break;
            }
            assert_bounds(&engine)?;
        }
    }

    /// The chosen event always has the smallest (time, priority) key.
    #[test]
    fn prop_scheduler_picks_minimum(
        a in arb_stats(),
        b in arb_stats(),
        config in arb_config(),
        seed in arb_seed(),
    ) {
        let mut engine = build(&a, &b, config, seed, None);
        for _ in 0..MAX_STEPS {
            if engine.is_battle_over() {
                break;
            }
            let expected = engine
                .combatants()
                .iter()
                .enumerate()
                .filter_map(|(slot, c)| schedule_key(slot, c))
                .min()
                .unwrap();
            let chosen = engine.determine_next_event().unwrap().clone();
            prop_assert_eq!((chosen.scheduled_at, chosen.kind.priority()), (expected.0, expected.1));
            prop_assert_eq!(chosen.owner, engine.combatants()[expected.2].id);
            engine.update().unwrap();
        }
    }

    /// Rolled damage never leaves `[attack_power * accuracy / 100, attack_power]`.
    #[test]
    fn prop_damage_within_bounds(
        a in arb_stats(),
        b in arb_stats(),
        seed in arb_seed(),
    ) {
        let config = BattleConfig { duration: 20_000, distance: 0, max_distance: 300 };
        let mut engine = build(&a, &b, config, seed, None);
        engine.run().unwrap();

        for entry in engine.events().completed() {
            let Some(outcome) = entry.outcome else { continue };
            let attacker = engine.combatant(entry.actor.id).unwrap();
            let (min, max) = damage_bounds(attacker.attack_power, attacker.accuracy);
            match outcome {
                Outcome::Hit | Outcome::Blocked | Outcome::Breached => {
                    let dmg = entry.damage.unwrap();
                    prop_assert!(min <= dmg && dmg <= max, "{dmg} outside [{min}, {max}]");
                }
                Outcome::Evaded => prop_assert_eq!(entry.damage, Some(0)),
                Outcome::Missed => prop_assert_eq!(entry.damage, None),
            }
        }
    }

    /// Full accuracy always deals exactly attack power.
    #[test]
    fn prop_full_accuracy_is_exact(
        attack_power in 0u32..80,
        seed in arb_seed(),
    ) {
        let stats = CombatantStats { attack_power, accuracy: 100, ..CombatantStats::default() };
        let config = BattleConfig { duration: 10_000, distance: 0, max_distance: 300 };
        let mut engine = build(&stats, &stats, config, seed, None);
        engine.run().unwrap();
        for entry in engine.events().completed() {
            if matches!(entry.outcome, Some(Outcome::Hit | Outcome::Blocked | Outcome::Breached)) {
                prop_assert_eq!(entry.damage, Some(attack_power));
            }
        }
    }

    /// Battles end, and a victory always means the loser has no health left.
    #[test]
    fn prop_battles_terminate(
        a in arb_stats(),
        b in arb_stats(),
        config in arb_config(),
        seed in arb_seed(),
    ) {
        let mut engine = build(&a, &b, config, seed, None);
        let outcome = engine.run().unwrap();
        prop_assert!(engine.is_battle_over());
        match outcome {
            BattleOutcome::Victory { winner, .. } => {
                for c in engine.combatants() {
                    prop_assert_eq!(c.is_defeated(), c.id != winner);
                }
            }
            BattleOutcome::Draw => {
                prop_assert!(engine.combatants().iter().all(Combatant::is_defeated));
            }
            BattleOutcome::TimeOut => {
                prop_assert!(engine.timer() >= config.duration);
            }
        }
    }

    /// Identical inputs produce identical logs.
    #[test]
    fn prop_same_seed_same_log(
        a in arb_stats(),
        b in arb_stats(),
        config in arb_config(),
        seed in arb_seed(),
    ) {
        let mut first = build(&a, &b, config, seed, None);
        let mut second = build(&a, &b, config, seed, None);
        first.run().unwrap();
        second.run().unwrap();
        prop_assert_eq!(first.events(), second.events());
        prop_assert_eq!(first.state_hash(), second.state_hash());
    }

    /// Timestamps in the log never go backwards.
    #[test]
    fn prop_timer_is_monotonic(
        a in arb_stats(),
        b in arb_stats(),
        config in arb_config(),
        seed in arb_seed(),
    ) {
        let mut engine = build(&a, &b, config, seed, None);
        engine.run().unwrap();
        let stamps: Vec<u64> = engine.events().iter().map(|e| e.timestamp).collect();
        prop_assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
