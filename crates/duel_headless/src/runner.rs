//! Battle runner: play a scenario to the end and summarize it.

use std::path::Path;
use std::time::Instant;

use duel_core::prelude::{BattleOutcome, CombatantSnapshot, EventLog, Outcome};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::scenario::{Scenario, ScenarioError};

/// Tally of attack outcomes over a battle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackTally {
    /// Attacks that reached health directly.
    pub hits: u32,
    /// Attacks out of range.
    pub misses: u32,
    /// Attacks absorbed by a block.
    pub blocked: u32,
    /// Attacks that broke through a block.
    pub breached: u32,
    /// Attacks that met an evasion.
    pub evaded: u32,
}

impl AttackTally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Missed => self.misses += 1,
            Outcome::Blocked => self.blocked += 1,
            Outcome::Breached => self.breached += 1,
            Outcome::Evaded => self.evaded += 1,
        }
    }

    /// Total attacks resolved.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.blocked + self.breached + self.evaded
    }
}

/// Summary of one finished battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Scenario name.
    pub scenario: String,
    /// Damage seed used.
    pub seed: u64,
    /// How the battle ended.
    pub outcome: BattleOutcome,
    /// Engine time at the end.
    pub final_timer: u64,
    /// Events scheduled and resolved.
    pub events_resolved: u64,
    /// Deterministic state hash at the end.
    pub final_state_hash: u64,
    /// Attack outcomes.
    pub attacks: AttackTally,
    /// Final state of both fighters.
    pub fighters: Vec<CombatantSnapshot>,
    /// Complete event log.
    pub log: EventLog,
}

impl BattleReport {
    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Read a report written by [`BattleReport::save`].
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Run a scenario to completion. `seed` overrides the scenario seed.
pub fn run_battle(scenario: &Scenario, seed: Option<u64>) -> Result<BattleReport, ScenarioError> {
    let start = Instant::now();
    let seed = seed.unwrap_or(scenario.seed);
    let mut engine = scenario.build_engine(Some(seed))?;
    let outcome = engine.run()?;

    let mut attacks = AttackTally::default();
    for outcome in engine.events().completed().filter_map(|e| e.outcome) {
        attacks.record(outcome);
    }

    info!(
        scenario = %scenario.name,
        seed,
        ?outcome,
        events = engine.event_counter(),
        elapsed_ms = start.elapsed().as_millis(),
        "Battle finished"
    );

    Ok(BattleReport {
        scenario: scenario.name.clone(),
        seed,
        outcome,
        final_timer: engine.timer(),
        events_resolved: engine.event_counter(),
        final_state_hash: engine.state_hash(),
        attacks,
        fighters: engine.combatants().iter().map(CombatantSnapshot::from).collect(),
        log: engine.events().clone(),
    })
}

/// Result of replaying one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed verified.
    pub seed: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Runs that failed outright.
    pub failures: Vec<String>,
}

impl VerifyReport {
    /// Whether every run succeeded with the same final hash and log.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.failures.is_empty() && self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run the same scenario and seed `runs` times in parallel and compare.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> VerifyReport {
    let results: Vec<Result<u64, String>> = (0..runs)
        .into_par_iter()
        .map(|_| {
            run_battle(scenario, Some(seed))
                .map(|report| log_fingerprint(&report))
                .map_err(|e| e.to_string())
        })
        .collect();

    let mut hashes = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(hash) => hashes.push(hash),
            Err(e) => {
                warn!(seed, error = %e, "Verification run failed");
                failures.push(e);
            }
        }
    }

    VerifyReport {
        seed,
        hashes,
        failures,
    }
}

/// Hash covering the final state and the whole event log.
fn log_fingerprint(report: &BattleReport) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    report.final_state_hash.hash(&mut hasher);
    report.log.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::PolicySetup;
    use duel_core::prelude::{ActionKind, Team};

    #[test]
    fn test_run_skirmish() {
        let report = run_battle(&Scenario::skirmish(), None).unwrap();
        assert_eq!(report.seed, 12_345);
        assert_eq!(report.fighters.len(), 2);
        assert!(report.events_resolved > 0);
        assert_eq!(report.log.completed().count() as u64, report.events_resolved);
    }

    #[test]
    fn test_seed_override() {
        let report = run_battle(&Scenario::skirmish(), Some(99)).unwrap();
        assert_eq!(report.seed, 99);
    }

    #[test]
    fn test_scripted_knockout_report() {
        let mut scenario = Scenario::skirmish();
        scenario.battle.distance = 20;
        scenario.challenger.stats.attack_power = 50;
        scenario.challenger.stats.accuracy = 100;
        scenario.challenger.opening = Some(ActionKind::TryAttack);
        scenario.challenger.policy = PolicySetup::Scripted(vec![ActionKind::TryAttack; 5]);
        scenario.defender.opening = Some(ActionKind::Recover);
        scenario.defender.policy = PolicySetup::Scripted(Vec::new());

        let report = run_battle(&scenario, None).unwrap();
        assert_eq!(
            report.outcome,
            BattleOutcome::Victory {
                winner: 1,
                team: Team::Challenger
            }
        );
        assert_eq!(report.attacks.hits, 2);
        assert_eq!(report.attacks.total(), 2);
    }

    #[test]
    fn test_verify_skirmish() {
        let report = verify_determinism(&Scenario::skirmish(), 7, 4);
        assert_eq!(report.hashes.len(), 4);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_report_save_load() {
        let report = run_battle(&Scenario::skirmish(), None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report.save(&path).unwrap();
        assert!(path.exists());
        assert_eq!(BattleReport::load(&path).unwrap(), report);
    }
}
