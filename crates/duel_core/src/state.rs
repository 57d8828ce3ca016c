//! Mutable battle state shared by the engine and the resolver.
//!
//! Combatants and their policies live in parallel vectors indexed by roster
//! slot, so a policy can be borrowed mutably while the combatants it reasons
//! about are borrowed immutably.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{Action, ActionStatus};
use crate::catalog::{ActionCatalog, ActionKind};
use crate::combatant::{Combatant, CombatantId};
use crate::error::{DuelError, Result};
use crate::events::{CombatantSnapshot, EventEntry, EventLog, StateChanges};
use crate::policy::{DecisionContext, DecisionPolicy};

/// Duel parameters fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Ticks before the battle times out.
    pub duration: u64,
    /// Starting distance between the combatants.
    pub distance: u32,
    /// Arena width; distance never exceeds it.
    pub max_distance: u32,
}

impl BattleConfig {
    /// Reject parameters the engine cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(DuelError::InvalidConfig(
                "duration must be positive".to_string(),
            ));
        }
        if self.distance > self.max_distance {
            return Err(DuelError::InvalidConfig(format!(
                "distance {} exceeds max distance {}",
                self.distance, self.max_distance
            )));
        }
        Ok(())
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            duration: 30_000,
            distance: 200,
            max_distance: 500,
        }
    }
}

/// Resource levels captured before a resolution, for computing deltas.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    distance: u32,
    actor_stamina: u32,
    target: Option<(usize, u32, u32)>,
}

#[derive(Debug)]
pub(crate) struct BattleState {
    pub(crate) config: BattleConfig,
    pub(crate) timer: u64,
    pub(crate) distance: u32,
    pub(crate) catalog: ActionCatalog,
    pub(crate) combatants: Vec<Combatant>,
    pub(crate) policies: Vec<Box<dyn DecisionPolicy>>,
    pub(crate) events: EventLog,
    pub(crate) event_counter: u64,
}

impl BattleState {
    pub(crate) fn new(config: BattleConfig, catalog: ActionCatalog) -> Self {
        Self {
            config,
            timer: 0,
            distance: config.distance,
            catalog,
            combatants: Vec::with_capacity(2),
            policies: Vec::with_capacity(2),
            events: EventLog::new(),
            event_counter: 0,
        }
    }

    pub(crate) fn slot_of(&self, id: CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id == id)
    }

    pub(crate) fn require_slot(&self, id: CombatantId) -> Result<usize> {
        self.slot_of(id).ok_or(DuelError::UnknownCombatant(id))
    }

    /// First combatant on another team that still has health.
    pub(crate) fn find_target(&self, slot: usize) -> Option<usize> {
        let team = self.combatants.get(slot)?.team;
        self.combatants
            .iter()
            .position(|c| c.team != team && !c.is_defeated())
    }

    /// Slot of the combatant's linked opponent.
    pub(crate) fn opponent_slot(&self, slot: usize) -> Option<usize> {
        let id = self.combatants.get(slot)?.opponent?;
        self.slot_of(id)
    }

    pub(crate) fn time_remaining(&self) -> u64 {
        self.config.duration.saturating_sub(self.timer)
    }

    pub(crate) fn alive(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| !c.is_defeated())
    }

    pub(crate) fn is_over(&self) -> bool {
        self.timer >= self.config.duration || self.alive().count() <= 1
    }

    pub(crate) fn can_afford(&self, slot: usize, kind: ActionKind) -> bool {
        self.catalog
            .stamina_cost(kind)
            .is_ok_and(|cost| self.combatants[slot].can_afford(cost))
    }

    /// `kind` when the combatant can pay for it, otherwise `fallback`.
    pub(crate) fn affordable_or(&self, slot: usize, kind: ActionKind, fallback: ActionKind) -> ActionKind {
        if self.can_afford(slot, kind) {
            kind
        } else {
            debug!(
                combatant = self.combatants[slot].id,
                wanted = %kind,
                chosen = %fallback,
                "Cannot afford action, falling back"
            );
            fallback
        }
    }

    /// Ask the combatant's policy what follows an `idle`.
    pub(crate) fn decide(&mut self, slot: usize) -> ActionKind {
        let opponent = self.opponent_slot(slot);
        let ctx = DecisionContext {
            timer: self.timer,
            distance: self.distance,
            max_distance: self.config.max_distance,
            time_remaining: self.time_remaining(),
            actor: &self.combatants[slot],
            opponent: opponent.map(|o| &self.combatants[o]),
            catalog: &self.catalog,
        };
        let choice = self.policies[slot].decide(&ctx);
        self.affordable_or(slot, choice, ActionKind::Idle)
    }

    /// Ask the combatant's policy what follows a completed `blocking`.
    pub(crate) fn continue_block(&mut self, slot: usize) -> ActionKind {
        let opponent = self.opponent_slot(slot);
        let ctx = DecisionContext {
            timer: self.timer,
            distance: self.distance,
            max_distance: self.config.max_distance,
            time_remaining: self.time_remaining(),
            actor: &self.combatants[slot],
            opponent: opponent.map(|o| &self.combatants[o]),
            catalog: &self.catalog,
        };
        let choice = self.policies[slot].continue_block(&ctx);
        self.affordable_or(slot, choice, ActionKind::Idle)
    }

    /// Give a combatant a new pending action, paying its stamina cost.
    ///
    /// Logs a pending entry and lets the opponent's policy perceive it.
    pub(crate) fn assign(&mut self, slot: usize, kind: ActionKind) -> Result<()> {
        let def = *self.catalog.get(kind)?;
        let timer = self.timer;
        let actor = &mut self.combatants[slot];
        let target = if kind.is_targeted() { actor.opponent } else { None };

        actor.spend_stamina(def.stamina_cost);
        let action = Action::pending(kind, timer, def.duration, actor.id, target);
        let scheduled_at = action.scheduled_at;
        actor.assign(action);

        debug!(
            combatant = actor.id,
            action = %kind,
            scheduled_at,
            stamina = actor.stamina,
            "Assigned action"
        );

        let target_snapshot = target
            .and_then(|id| self.slot_of(id))
            .map(|t| CombatantSnapshot::from(&self.combatants[t]));
        let actor = &self.combatants[slot];
        let entry = EventEntry {
            sequence: 0,
            event_number: self.event_counter,
            timestamp: timer,
            actor: actor.into(),
            target: target_snapshot,
            action: kind,
            scheduled_at,
            stamina_cost: def.stamina_cost,
            in_range: actor.is_within_range(self.distance),
            distance: self.distance,
            time_remaining: self.time_remaining(),
            status: ActionStatus::Pending,
            outcome: None,
            damage: None,
            changes: StateChanges {
                actor_stamina: -i64::from(def.stamina_cost),
                ..StateChanges::default()
            },
            recent_actions: actor.recent_actions(),
        };
        self.events.push(entry);

        if let Some(observer) = self.find_target(slot) {
            if let Some(action) = self.combatants[slot].action() {
                self.policies[observer].perceive(&self.combatants[slot], action);
            }
        }
        Ok(())
    }

    pub(crate) fn mark(&self, slot: usize, target: Option<usize>) -> Mark {
        Mark {
            distance: self.distance,
            actor_stamina: self.combatants[slot].stamina,
            target: target.map(|t| {
                let c = &self.combatants[t];
                (t, c.health, c.blocking_power)
            }),
        }
    }

    /// Log the completion of a resolved action.
    pub(crate) fn record_completion(&mut self, slot: usize, action: &Action, mark: Mark) -> Result<()> {
        let stamina_cost = self.catalog.stamina_cost(action.kind)?;
        let actor = &self.combatants[slot];
        let mut changes = StateChanges {
            distance: i64::from(self.distance) - i64::from(mark.distance),
            actor_stamina: i64::from(actor.stamina) - i64::from(mark.actor_stamina),
            ..StateChanges::default()
        };
        let target = mark.target.map(|(t, health, blocking_power)| {
            let c = &self.combatants[t];
            changes.target_health = i64::from(c.health) - i64::from(health);
            changes.target_blocking_power = i64::from(c.blocking_power) - i64::from(blocking_power);
            CombatantSnapshot::from(c)
        });

        let entry = EventEntry {
            sequence: 0,
            event_number: self.event_counter,
            timestamp: self.timer,
            actor: actor.into(),
            target,
            action: action.kind,
            scheduled_at: action.scheduled_at,
            stamina_cost,
            in_range: actor.is_within_range(self.distance),
            distance: self.distance,
            time_remaining: self.time_remaining(),
            status: action.status,
            outcome: action.outcome,
            damage: action.damage,
            changes,
            recent_actions: actor.recent_actions(),
        };
        self.events.push(entry);
        Ok(())
    }

    /// Panic if any state invariant is broken.
    #[cfg(feature = "debug-validation")]
    pub(crate) fn check_invariants(&self) {
        assert!(
            self.distance <= self.config.max_distance,
            "distance {} exceeds max {}",
            self.distance,
            self.config.max_distance
        );
        for c in &self.combatants {
            assert!(c.health <= c.max_health, "{} health above max", c.name);
            assert!(c.stamina <= c.max_stamina, "{} stamina above max", c.name);
        }
        assert_eq!(self.combatants.len(), self.policies.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CombatantStats, Team};
    use crate::policy::ScriptedPolicy;

    fn state_with_pair() -> BattleState {
        let mut state = BattleState::new(BattleConfig::default(), ActionCatalog::standard());
        for (id, team) in [(1, Team::Challenger), (2, Team::Defender)] {
            let mut c = Combatant::new(id, format!("F{id}"), &CombatantStats::default());
            c.team = Some(team);
            c.opponent = Some(3 - id);
            state.combatants.push(c);
            state.policies.push(Box::new(ScriptedPolicy::default()));
        }
        state
    }

    #[test]
    fn test_config_validation() {
        assert!(BattleConfig::default().validate().is_ok());
        let zero = BattleConfig {
            duration: 0,
            ..BattleConfig::default()
        };
        assert!(matches!(zero.validate(), Err(DuelError::InvalidConfig(_))));
        let wide = BattleConfig {
            distance: 600,
            ..BattleConfig::default()
        };
        assert!(wide.validate().is_err());
    }

    #[test]
    fn test_find_target_skips_defeated() {
        let mut state = state_with_pair();
        assert_eq!(state.find_target(0), Some(1));
        assert_eq!(state.find_target(1), Some(0));
        state.combatants[1].health = 0;
        assert_eq!(state.find_target(0), None);
    }

    #[test]
    fn test_assign_deducts_cost_once_and_logs() {
        let mut state = state_with_pair();
        state.timer = 400;
        state.assign(0, ActionKind::TryAttack).unwrap();

        let c = &state.combatants[0];
        assert_eq!(c.stamina, 90);
        let action = c.action().unwrap();
        assert_eq!(action.scheduled_at, 600);
        assert_eq!(action.target, Some(2));

        let entry = state.events.last().unwrap();
        assert_eq!(entry.action, ActionKind::TryAttack);
        assert!(!entry.is_completed());
        assert_eq!(entry.changes.actor_stamina, -10);
        assert_eq!(entry.target.as_ref().map(|t| t.id), Some(2));
    }

    #[test]
    fn test_untargeted_actions_have_no_target() {
        let mut state = state_with_pair();
        state.assign(0, ActionKind::MoveForward).unwrap();
        assert_eq!(state.combatants[0].action().unwrap().target, None);
    }

    #[test]
    fn test_unaffordable_choice_falls_back_to_idle() {
        let mut state = state_with_pair();
        state.policies[0] = Box::new(ScriptedPolicy::new([ActionKind::TryAttack]));
        state.combatants[0].stamina = 3;
        assert_eq!(state.decide(0), ActionKind::Idle);
    }

    #[test]
    fn test_logged_history_excludes_logged_action() {
        let mut state = state_with_pair();
        state.assign(0, ActionKind::MoveForward).unwrap();
        assert!(state.events.last().unwrap().recent_actions.is_empty());

        state.assign(0, ActionKind::TryAttack).unwrap();
        assert_eq!(
            state.events.last().unwrap().recent_actions,
            vec![ActionKind::MoveForward]
        );

        let action = state.combatants[0].take_action().unwrap();
        let mark = state.mark(0, None);
        state
            .record_completion(0, &action.complete(None, None), mark)
            .unwrap();
        let entry = state.events.last().unwrap();
        assert!(entry.is_completed());
        assert_eq!(entry.recent_actions, vec![ActionKind::MoveForward]);
    }
}
