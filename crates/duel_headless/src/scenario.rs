//! Scenario loading and configuration.
//!
//! Scenarios define a complete duel for headless runs: battle parameters,
//! the damage seed, both fighters with their policies and opening moves, and
//! optionally a custom action catalog.

use std::path::{Path, PathBuf};

use duel_core::prelude::{
    ActionCatalog, ActionKind, AttackRange, BattleConfig, Combatant, CombatEngine, CombatantId,
    CombatantStats, DecisionPolicy, DuelError, RuleBasedParams, RuleBasedPolicy, ScriptedPolicy,
    Side,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to serialize scenario: {0}")]
    WriteError(#[from] ron::Error),
    /// The engine rejected the scenario.
    #[error("Engine rejected scenario: {0}")]
    Engine(#[from] DuelError),
}

/// How a fighter chooses its actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicySetup {
    /// The built-in reactive policy.
    RuleBased(RuleBasedParams),
    /// A fixed list of choices, then idle.
    Scripted(Vec<ActionKind>),
}

impl Default for PolicySetup {
    fn default() -> Self {
        Self::RuleBased(RuleBasedParams::default())
    }
}

impl PolicySetup {
    /// Instantiate the policy.
    #[must_use]
    pub fn build(&self) -> Box<dyn DecisionPolicy> {
        match self {
            PolicySetup::RuleBased(params) => Box::new(RuleBasedPolicy::new(*params)),
            PolicySetup::Scripted(script) => Box::new(ScriptedPolicy::new(script.iter().copied())),
        }
    }
}

/// One fighter in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterSetup {
    /// Combatant id.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Starting statistics.
    pub stats: CombatantStats,
    /// Where the fighter stands.
    pub position: Side,
    /// Which way the fighter looks.
    pub facing: Side,
    /// Forced opening action; `None` lets the policy choose.
    #[serde(default)]
    pub opening: Option<ActionKind>,
    /// Decision policy.
    #[serde(default)]
    pub policy: PolicySetup,
}

impl FighterSetup {
    /// Create the combatant this setup describes.
    #[must_use]
    pub fn combatant(&self) -> Combatant {
        Combatant::new(self.id, self.name.clone(), &self.stats).at(self.position, self.facing)
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Duration, starting distance and arena width.
    pub battle: BattleConfig,
    /// Damage seed.
    pub seed: u64,
    /// First fighter to join.
    pub challenger: FighterSetup,
    /// Second fighter to join.
    pub defender: FighterSetup,
    /// Optional RON action catalog; the standard table when absent.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        info!(name = %scenario.name, path = %path.display(), "Loaded scenario");
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Serialize as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ScenarioError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// A standard duel: a balanced swordsman against a shield bearer.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Standard Skirmish".to_string(),
            description: "Balanced swordsman against a defensive shield bearer".to_string(),
            battle: BattleConfig {
                duration: 30_000,
                distance: 200,
                max_distance: 500,
            },
            seed: 12_345,
            challenger: FighterSetup {
                id: 1,
                name: "Swordsman".to_string(),
                stats: CombatantStats {
                    health: 100,
                    stamina: 100,
                    stamina_recovery: 25,
                    attack_power: 15,
                    accuracy: 70,
                    blocking_power: 20,
                    mobility: 40,
                    range: AttackRange::new(0, 60),
                },
                position: Side::Left,
                facing: Side::Right,
                opening: None,
                policy: PolicySetup::default(),
            },
            defender: FighterSetup {
                id: 2,
                name: "Shield Bearer".to_string(),
                stats: CombatantStats {
                    health: 90,
                    stamina: 120,
                    stamina_recovery: 30,
                    attack_power: 12,
                    accuracy: 90,
                    blocking_power: 80,
                    mobility: 25,
                    range: AttackRange::new(0, 50),
                },
                position: Side::Right,
                facing: Side::Left,
                opening: None,
                policy: PolicySetup::RuleBased(RuleBasedParams {
                    recover_below_percent: 30,
                    defend: true,
                }),
            },
            catalog: None,
        }
    }

    /// The action catalog this scenario uses.
    pub fn load_catalog(&self) -> Result<ActionCatalog, ScenarioError> {
        match &self.catalog {
            Some(path) => Ok(ActionCatalog::load(path)?),
            None => Ok(ActionCatalog::standard()),
        }
    }

    /// Build a ready-to-run engine: both fighters added and linked, openings
    /// seeded. `seed` overrides the scenario's own seed.
    pub fn build_engine(&self, seed: Option<u64>) -> Result<CombatEngine, ScenarioError> {
        let seed = seed.unwrap_or(self.seed);
        let mut engine = CombatEngine::with_parts(
            self.battle,
            self.load_catalog()?,
            duel_core::engine::seeded_rng(seed),
        )?;

        for fighter in [&self.challenger, &self.defender] {
            engine.add_combatant_with_policy(fighter.combatant(), fighter.policy.build())?;
        }
        engine.link_opponent(self.challenger.id, self.defender.id)?;
        engine.link_opponent(self.defender.id, self.challenger.id)?;

        for fighter in [&self.challenger, &self.defender] {
            match fighter.opening {
                Some(kind) => engine.seed_action(fighter.id, kind)?,
                None => {
                    engine.seed_from_policy(fighter.id)?;
                }
            }
        }
        Ok(engine)
    }
}
