//! Test fixtures and helpers.
//!
//! Fighter presets and a builder for fully wired duels, so tests start from
//! the same rosters.

use duel_core::prelude::*;

/// Balanced fighter: medium reach, moderate power, some blocking power.
#[must_use]
pub fn balanced() -> CombatantStats {
    CombatantStats {
        health: 100,
        stamina: 100,
        stamina_recovery: 25,
        attack_power: 15,
        accuracy: 70,
        blocking_power: 30,
        mobility: 40,
        range: AttackRange::new(0, 60),
    }
}

/// Heavy hitter with no blocking power.
#[must_use]
pub fn brawler() -> CombatantStats {
    CombatantStats {
        health: 120,
        stamina: 80,
        stamina_recovery: 20,
        attack_power: 25,
        accuracy: 50,
        blocking_power: 0,
        mobility: 30,
        range: AttackRange::new(0, 40),
    }
}

/// Defensive fighter with a deep blocking pool.
#[must_use]
pub fn guardian() -> CombatantStats {
    CombatantStats {
        health: 90,
        stamina: 120,
        stamina_recovery: 30,
        attack_power: 12,
        accuracy: 90,
        blocking_power: 80,
        mobility: 25,
        range: AttackRange::new(0, 50),
    }
}

/// Fast, long-reach fighter that cannot attack point blank.
#[must_use]
pub fn skirmisher() -> CombatantStats {
    CombatantStats {
        health: 80,
        stamina: 100,
        stamina_recovery: 25,
        attack_power: 12,
        accuracy: 80,
        blocking_power: 10,
        mobility: 60,
        range: AttackRange::new(30, 120),
    }
}

/// Fighter whose attacks always deal exactly `attack_power`.
#[must_use]
pub fn precise(attack_power: u32) -> CombatantStats {
    CombatantStats {
        attack_power,
        accuracy: 100,
        ..balanced()
    }
}

/// One side of a duel under construction.
#[derive(Debug)]
pub struct FighterSpec {
    /// The combatant.
    pub combatant: Combatant,
    /// Its policy; `None` uses the engine's default rule-based policy.
    pub policy: Option<Box<dyn DecisionPolicy>>,
    /// Forced opening action; `None` asks the policy.
    pub opening: Option<ActionKind>,
}

impl FighterSpec {
    /// A rule-based fighter that picks its own opening.
    #[must_use]
    pub fn new(combatant: Combatant) -> Self {
        Self {
            combatant,
            policy: None,
            opening: None,
        }
    }

    /// Use a specific policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl DecisionPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Force the opening action.
    #[must_use]
    pub fn opening(mut self, kind: ActionKind) -> Self {
        self.opening = Some(kind);
        self
    }
}

/// Builds a two-fighter engine with opponents linked both ways.
#[derive(Debug)]
pub struct DuelBuilder {
    config: BattleConfig,
    seed: u64,
    catalog: ActionCatalog,
    challenger: FighterSpec,
    defender: FighterSpec,
}

impl DuelBuilder {
    /// Challenger on the left, defender on the right, facing each other.
    #[must_use]
    pub fn new(challenger: Combatant, defender: Combatant) -> Self {
        Self {
            config: BattleConfig::default(),
            seed: 0,
            catalog: ActionCatalog::standard(),
            challenger: FighterSpec::new(challenger.at(Side::Left, Side::Right)),
            defender: FighterSpec::new(defender.at(Side::Right, Side::Left)),
        }
    }

    /// Set battle parameters.
    #[must_use]
    pub fn config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the starting distance.
    #[must_use]
    pub fn distance(mut self, distance: u32) -> Self {
        self.config.distance = distance;
        self
    }

    /// Set the damage seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Use a custom action catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: ActionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Adjust the challenger.
    #[must_use]
    pub fn challenger(mut self, f: impl FnOnce(FighterSpec) -> FighterSpec) -> Self {
        self.challenger = f(self.challenger);
        self
    }

    /// Adjust the defender.
    #[must_use]
    pub fn defender(mut self, f: impl FnOnce(FighterSpec) -> FighterSpec) -> Self {
        self.defender = f(self.defender);
        self
    }

    /// Build the engine and seed both opening actions.
    pub fn build(self) -> Result<CombatEngine> {
        let mut engine = CombatEngine::with_parts(
            self.config,
            self.catalog,
            duel_core::engine::seeded_rng(self.seed),
        )?;
        let ids = [self.challenger.combatant.id, self.defender.combatant.id];
        let mut openings = Vec::with_capacity(2);

        for spec in [self.challenger, self.defender] {
            openings.push((spec.combatant.id, spec.opening));
            match spec.policy {
                Some(policy) => engine.add_combatant_with_policy(spec.combatant, policy)?,
                None => engine.add_combatant(spec.combatant)?,
            };
        }
        engine.link_opponent(ids[0], ids[1])?;
        engine.link_opponent(ids[1], ids[0])?;

        for (id, opening) in openings {
            match opening {
                Some(kind) => engine.seed_action(id, kind)?,
                None => {
                    engine.seed_from_policy(id)?;
                }
            }
        }
        Ok(engine)
    }
}

/// A rule-based duel between two balanced fighters.
pub fn standard_duel(seed: u64) -> Result<CombatEngine> {
    DuelBuilder::new(
        Combatant::new(1, "Challenger", &balanced()),
        Combatant::new(2, "Defender", &balanced()),
    )
    .seed(seed)
    .build()
}

/// A rule-based duel between a brawler and a guardian.
pub fn mismatched_duel(seed: u64) -> Result<CombatEngine> {
    DuelBuilder::new(
        Combatant::new(1, "Brawler", &brawler()),
        Combatant::new(2, "Guardian", &guardian()),
    )
    .seed(seed)
    .build()
}
