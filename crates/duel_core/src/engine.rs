//! The combat engine: roster management and the discrete-event loop.
//!
//! A battle advances one event at a time:
//!
//! 1. [`CombatEngine::determine_next_event`] picks the pending action that
//!    completes first (ties broken by action priority, then roster order).
//! 2. [`CombatEngine::update`] resolves it and advances the timer by that
//!    action's base duration.
//!
//! [`CombatEngine::step`] and [`CombatEngine::run`] drive the loop until one
//! side is defeated or the duration elapses.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::catalog::{ActionCatalog, ActionKind};
use crate::combatant::{Combatant, CombatantId, Team};
use crate::error::{DuelError, Result};
use crate::events::EventLog;
use crate::policy::{DecisionPolicy, RuleBasedPolicy};
use crate::resolver;
use crate::scheduler;
use crate::state::{BattleConfig, BattleState};

/// Maximum roster size.
pub const MAX_COMBATANTS: usize = 2;

/// The default damage generator for `seed`.
#[must_use]
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Lifecycle of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    /// No event has been scheduled yet.
    NotStarted,
    /// Events are being resolved.
    Running,
    /// A side is defeated or time ran out.
    Over,
}

/// How a finished battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Exactly one combatant still has health.
    Victory {
        /// Surviving combatant.
        winner: CombatantId,
        /// The survivor's team.
        team: Team,
    },
    /// Nobody has health left.
    Draw,
    /// The duration elapsed with both combatants standing.
    TimeOut,
}

/// Deterministic one-on-one combat engine.
///
/// Generic over the random generator so tests can inject their own; the
/// default is a seeded [`ChaCha8Rng`].
#[derive(Debug)]
pub struct CombatEngine<R = ChaCha8Rng> {
    state: BattleState,
    rng: R,
    next_event: Option<usize>,
}

impl CombatEngine<ChaCha8Rng> {
    /// Create an engine with the standard action catalog and a seeded generator.
    pub fn new(config: BattleConfig, seed: u64) -> Result<Self> {
        Self::with_parts(config, ActionCatalog::standard(), seeded_rng(seed))
    }
}

impl<R: Rng> CombatEngine<R> {
    /// Create an engine from explicit parts.
    pub fn with_parts(config: BattleConfig, catalog: ActionCatalog, rng: R) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self {
            state: BattleState::new(config, catalog),
            rng,
            next_event: None,
        })
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Add a combatant driven by the default [`RuleBasedPolicy`].
    pub fn add_combatant(&mut self, combatant: Combatant) -> Result<Team> {
        self.add_combatant_with_policy(combatant, Box::new(RuleBasedPolicy::default()))
    }

    /// Add a combatant with its own decision policy.
    ///
    /// The first combatant joins as [`Team::Challenger`], the second as
    /// [`Team::Defender`]. Nothing changes on failure.
    pub fn add_combatant_with_policy(
        &mut self,
        mut combatant: Combatant,
        policy: Box<dyn DecisionPolicy>,
    ) -> Result<Team> {
        if self.state.combatants.len() >= MAX_COMBATANTS {
            return Err(DuelError::CapacityExceeded);
        }
        combatant.validate()?;
        if self.state.slot_of(combatant.id).is_some() {
            return Err(DuelError::DuplicateCombatant(combatant.id));
        }

        let team = if self.state.combatants.is_empty() {
            Team::Challenger
        } else {
            Team::Defender
        };
        combatant.team = Some(team);
        info!(id = combatant.id, name = %combatant.name, ?team, "Combatant joined");
        self.state.combatants.push(combatant);
        self.state.policies.push(policy);
        Ok(team)
    }

    /// Make `actor` treat `opponent` as its opponent. Call once per direction.
    pub fn link_opponent(&mut self, actor: CombatantId, opponent: CombatantId) -> Result<()> {
        if actor == opponent {
            return Err(DuelError::InvalidCombatant(format!(
                "combatant {actor} cannot oppose itself"
            )));
        }
        let slot = self.state.require_slot(actor)?;
        self.state.require_slot(opponent)?;
        self.state.combatants[slot].opponent = Some(opponent);
        Ok(())
    }

    /// Force a combatant's pending action, paying its stamina cost.
    pub fn seed_action(&mut self, id: CombatantId, kind: ActionKind) -> Result<()> {
        let slot = self.state.require_slot(id)?;
        self.state.assign(slot, kind)
    }

    /// Let the combatant's policy choose its opening action.
    pub fn seed_from_policy(&mut self, id: CombatantId) -> Result<ActionKind> {
        let slot = self.state.require_slot(id)?;
        let kind = self.state.decide(slot);
        self.state.assign(slot, kind)?;
        Ok(kind)
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Select the next event and advance the event counter.
    ///
    /// Fails with [`DuelError::NoPendingActions`] without changing anything
    /// when no combatant has a pending action.
    pub fn determine_next_event(&mut self) -> Result<&Action> {
        let slot = scheduler::select_next(&self.state.combatants)?;
        self.next_event = Some(slot);
        self.state.event_counter += 1;

        let combatant = &self.state.combatants[slot];
        let action = combatant.action().ok_or(DuelError::NoPendingActions)?;
        debug!(
            event = self.state.event_counter,
            combatant = combatant.id,
            action = %action.kind,
            scheduled_at = action.scheduled_at,
            "Next event"
        );
        Ok(action)
    }

    /// Resolve the scheduled event, then advance the timer by its base duration.
    ///
    /// Does nothing when no event is scheduled.
    pub fn update(&mut self) -> Result<()> {
        let Some(slot) = self.next_event.take() else {
            return Ok(());
        };
        let Some(action) = self.state.combatants[slot].take_action() else {
            warn!(slot, "Scheduled event vanished before update");
            return Ok(());
        };

        let duration = self.state.catalog.duration(action.kind)?;
        resolver::resolve(&mut self.state, slot, action, &mut self.rng)?;
        self.state.timer = self.state.timer.saturating_add(duration);

        #[cfg(feature = "debug-validation")]
        self.state.check_invariants();

        Ok(())
    }

    /// Schedule and resolve one event. Returns `false` once the battle is over.
    pub fn step(&mut self) -> Result<bool> {
        if self.is_battle_over() {
            return Ok(false);
        }
        self.determine_next_event()?;
        self.update()?;
        Ok(true)
    }

    /// Step until the battle is over.
    pub fn run(&mut self) -> Result<BattleOutcome> {
        loop {
            if let Some(outcome) = self.outcome() {
                info!(
                    ?outcome,
                    timer = self.state.timer,
                    events = self.state.event_counter,
                    "Battle over"
                );
                return Ok(outcome);
            }
            self.step()?;
        }
    }

    /// Whether time ran out or at most one combatant has health left.
    #[must_use]
    pub fn is_battle_over(&self) -> bool {
        self.state.is_over()
    }

    /// How the battle ended, or `None` while it is still running.
    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        let mut alive = self.state.alive();
        match (alive.next(), alive.next()) {
            (None, _) => Some(BattleOutcome::Draw),
            (Some(winner), None) => Some(BattleOutcome::Victory {
                winner: winner.id,
                team: winner.team.unwrap_or(Team::Challenger),
            }),
            (Some(_), Some(_)) if self.state.timer >= self.state.config.duration => {
                Some(BattleOutcome::TimeOut)
            }
            _ => None,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> BattlePhase {
        if self.state.event_counter == 0 {
            BattlePhase::NotStarted
        } else if self.is_battle_over() {
            BattlePhase::Over
        } else {
            BattlePhase::Running
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// First opposing combatant that still has health.
    #[must_use]
    pub fn find_target(&self, actor: CombatantId) -> Option<&Combatant> {
        let slot = self.state.slot_of(actor)?;
        self.state
            .find_target(slot)
            .map(|t| &self.state.combatants[t])
    }

    /// The action selected by the last [`determine_next_event`](Self::determine_next_event).
    #[must_use]
    pub fn next_event(&self) -> Option<&Action> {
        self.next_event
            .and_then(|slot| self.state.combatants[slot].action())
    }

    /// Look up a combatant.
    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.state.combatants.iter().find(|c| c.id == id)
    }

    /// All combatants in join order.
    #[must_use]
    pub fn combatants(&self) -> &[Combatant] {
        &self.state.combatants
    }

    /// Battle record so far.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.state.events
    }

    /// Current engine time.
    #[must_use]
    pub fn timer(&self) -> u64 {
        self.state.timer
    }

    /// Current distance between the combatants.
    #[must_use]
    pub fn distance(&self) -> u32 {
        self.state.distance
    }

    /// Number of events scheduled so far.
    #[must_use]
    pub fn event_counter(&self) -> u64 {
        self.state.event_counter
    }

    /// Battle parameters.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.state.config
    }

    /// Action table in use.
    #[must_use]
    pub fn catalog(&self) -> &ActionCatalog {
        &self.state.catalog
    }

    /// Deterministic hash of the battle state, for replay and divergence checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.state.timer.hash(&mut hasher);
        self.state.distance.hash(&mut hasher);
        self.state.event_counter.hash(&mut hasher);
        self.state.combatants.len().hash(&mut hasher);
        for combatant in &self.state.combatants {
            combatant.hash(&mut hasher);
        }
        self.state.events.len().hash(&mut hasher);
        hasher.finish()
    }
}
