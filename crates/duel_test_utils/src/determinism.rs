//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the engine produces identical
//! battles given identical rosters, catalogs and seeds.
//!
//! # Testing Strategy
//!
//! The only source of chance in a duel is the damage roll, drawn from the
//! engine's seeded generator. Everything else must be a pure function of
//! the inputs:
//!
//! - **Tie-breaking**: equal completion times resolve by action priority,
//!   then roster order. Never by iteration order of a hashed collection.
//!
//! - **Arithmetic**: all quantities are integers.
//!
//! - **Policies**: decision policies see only the battle state.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual handlers resolve identically
//! 2. **Property tests**: random rosters and seeds still replay exactly
//! 3. **Integration tests**: full battles are reproducible
//! 4. **Parallel tests**: N battles on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use duel_core::engine::CombatEngine;
use duel_core::events::EventLog;
use tracing::debug;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run any stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Advance an engine one event, ignoring the end of the battle.
fn advance(engine: &mut CombatEngine) {
    if let Err(err) = engine.step() {
        debug!(%err, "Step failed");
    }
}

/// Run a battle twice with identical setup and compare final state hashes
/// and event logs.
///
/// Returns `true` if both runs were identical.
pub fn verify_battle_determinism<F>(setup_fn: F, max_steps: u64) -> bool
where
    F: Fn() -> CombatEngine,
{
    let result = verify_determinism(2, max_steps, &setup_fn, advance, |engine: &CombatEngine| {
        compute_hash(&(engine.state_hash(), engine.events()))
    });
    result.is_deterministic
}

/// Result of parallel battle runs.
#[derive(Debug, Clone)]
pub struct ParallelBattleResult {
    /// Final state hash from each battle.
    pub hashes: Vec<u64>,
    /// Number of battles run.
    pub num_battles: usize,
}

impl ParallelBattleResult {
    /// Check if all battles produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all battles matched.
    ///
    /// # Panics
    ///
    /// Panics if battles produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel battles diverged!\n\
                 Battles: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_battles,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N battles to completion on scoped threads and collect final hashes.
///
/// A battle whose thread panics or whose run fails contributes hash `0`,
/// which makes the result non-deterministic unless every battle failed.
pub fn run_parallel_battles_scoped<F>(setup_fn: F, num_battles: usize) -> ParallelBattleResult
where
    F: Fn() -> CombatEngine + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut engine = setup_fn();
                    match engine.run() {
                        Ok(_) => engine.state_hash(),
                        Err(_) => 0,
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(0))
            .collect()
    });

    ParallelBattleResult {
        hashes,
        num_battles,
    }
}

/// Compare two battles event by event, finding the first divergence.
///
/// # Returns
///
/// `None` if the battles match, `Some(n)` if they differ after `n` steps
/// (`0` means the setups already differ).
pub fn find_first_divergence<F>(setup_fn: F, max_steps: u64) -> Option<u64>
where
    F: Fn() -> CombatEngine,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for n in 1..=max_steps {
        advance(&mut first);
        advance(&mut second);

        if first.state_hash() != second.state_hash() {
            debug!(step = n, "Battles diverged");
            return Some(n);
        }
    }

    None
}

/// Verify that the bincode round trip preserves an event log exactly.
pub fn verify_log_serialization<F>(setup_fn: F) -> bool
where
    F: Fn() -> CombatEngine,
{
    let mut engine = setup_fn();
    if engine.run().is_err() {
        return false;
    }

    let Ok(bytes) = engine.events().encode() else {
        return false;
    };
    EventLog::decode(&bytes).is_ok_and(|restored| restored == *engine.events())
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for duel testing.
///
/// These strategies generate random but reproducible rosters, configs and
/// scripts for property-based testing.
pub mod strategies {
    use duel_core::catalog::ActionKind;
    use duel_core::combatant::{AttackRange, CombatantStats};
    use duel_core::BattleConfig;
    use proptest::prelude::*;

    /// Generate any action kind.
    pub fn arb_action_kind() -> impl Strategy<Value = ActionKind> {
        proptest::sample::select(ActionKind::ALL.to_vec())
    }

    /// Generate an attack range with `min <= max`.
    pub fn arb_attack_range() -> impl Strategy<Value = AttackRange> {
        (0u32..100, 0u32..150).prop_map(|(min, span)| AttackRange::new(min, min + span))
    }

    /// Generate valid combatant stats.
    pub fn arb_stats() -> impl Strategy<Value = CombatantStats> {
        (
            1u32..300,
            0u32..200,
            0u32..60,
            0u32..60,
            0u8..=100,
            0u32..100,
            0u32..120,
            arb_attack_range(),
        )
            .prop_map(
                |(
                    health,
                    stamina,
                    stamina_recovery,
                    attack_power,
                    accuracy,
                    blocking_power,
                    mobility,
                    range,
                )| CombatantStats {
                    health,
                    stamina,
                    stamina_recovery,
                    attack_power,
                    accuracy,
                    blocking_power,
                    mobility,
                    range,
                },
            )
    }

    /// Generate a valid battle configuration.
    pub fn arb_config() -> impl Strategy<Value = BattleConfig> {
        (100u64..20_000, 0u32..600)
            .prop_flat_map(|(duration, max_distance)| {
                (Just(duration), 0..=max_distance, Just(max_distance))
            })
            .prop_map(|(duration, distance, max_distance)| BattleConfig {
                duration,
                distance,
                max_distance,
            })
    }

    /// Generate a script of policy choices.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<ActionKind>> {
        proptest::collection::vec(arb_action_kind(), 0..max_len)
    }

    /// Generate a damage seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{self, DuelBuilder};
    use duel_core::prelude::*;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_standard_duel_determinism() {
        assert!(verify_battle_determinism(
            || fixtures::standard_duel(11).unwrap(),
            500
        ));
    }

    #[test]
    fn test_find_divergence_on_deterministic_battle() {
        let divergence = find_first_divergence(|| fixtures::mismatched_duel(3).unwrap(), 300);
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_find_divergence_detects_different_setups() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let calls = AtomicU64::new(0);
        let divergence = find_first_divergence(
            || {
                let seed = calls.fetch_add(1, Ordering::SeqCst);
                DuelBuilder::new(
                    Combatant::new(1, "A", &fixtures::balanced()),
                    Combatant::new(2, "B", &fixtures::balanced()),
                )
                .distance(u32::try_from(seed).unwrap() * 100)
                .build()
                .unwrap()
            },
            10,
        );
        assert_eq!(divergence, Some(0));
    }

    #[test]
    fn test_parallel_battles_match() {
        let result = run_parallel_battles_scoped(|| fixtures::standard_duel(99).unwrap(), 4);
        assert_eq!(result.hashes.len(), 4);
        result.assert_deterministic();
    }

    #[test]
    fn test_log_serialization_round_trip() {
        assert!(verify_log_serialization(|| fixtures::mismatched_duel(8).unwrap()));
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_random_rosters_replay_exactly(
            a in arb_stats(),
            b in arb_stats(),
            config in arb_config(),
            seed in arb_seed(),
        ) {
            let setup = || {
                DuelBuilder::new(Combatant::new(1, "A", &a), Combatant::new(2, "B", &b))
                    .config(config)
                    .seed(seed)
                    .build()
                    .unwrap()
            };
            prop_assert!(verify_battle_determinism(setup, 400));
        }

        #[test]
        fn prop_scripted_battles_replay_exactly(
            script_a in arb_script(20),
            script_b in arb_script(20),
            seed in arb_seed(),
        ) {
            let setup = || {
                DuelBuilder::new(
                    Combatant::new(1, "A", &fixtures::balanced()),
                    Combatant::new(2, "B", &fixtures::guardian()),
                )
                .seed(seed)
                .challenger(|f| f.with_policy(ScriptedPolicy::new(script_a.clone())))
                .defender(|f| f.with_policy(ScriptedPolicy::new(script_b.clone())))
                .build()
                .unwrap()
            };
            prop_assert!(verify_battle_determinism(setup, 300));
        }
    }
}
