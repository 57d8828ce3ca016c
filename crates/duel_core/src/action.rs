//! Scheduled actions and their resolution outcomes.

use serde::{Deserialize, Serialize};

use crate::catalog::ActionKind;
use crate::combatant::CombatantId;

/// Lifecycle of an action. Exactly one transition, pending to completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Scheduled and waiting for its completion time.
    Pending,
    /// Resolved by the engine.
    Completed,
}

/// Result of an attack resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Damage went straight to health.
    Hit,
    /// The target stood outside the attacker's range.
    Missed,
    /// Blocking power absorbed the whole roll.
    Blocked,
    /// The roll exceeded blocking power; the excess went to health.
    Breached,
    /// The target was evading.
    Evaded,
}

impl Outcome {
    /// Whether the attack changed the target's health.
    #[must_use]
    pub const fn reached_health(self) -> bool {
        matches!(self, Outcome::Hit | Outcome::Breached)
    }
}

/// A typed unit of behavior owned by one combatant.
///
/// Actions are never reused: resolution consumes the action and the resolver
/// assigns a fresh successor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// What the action does.
    pub kind: ActionKind,
    /// Engine tick at which the action was assigned.
    pub issued_at: u64,
    /// Absolute engine tick at which the action completes.
    pub scheduled_at: u64,
    /// Combatant that performs the action.
    pub owner: CombatantId,
    /// Combatant the action is aimed at.
    pub target: Option<CombatantId>,
    /// Pending until resolved.
    pub status: ActionStatus,
    /// Set only by attack resolution.
    pub outcome: Option<Outcome>,
    /// Set only by attack resolution.
    pub damage: Option<u32>,
}

impl Action {
    /// Create a pending action completing `duration` ticks after `issued_at`.
    #[must_use]
    pub const fn pending(
        kind: ActionKind,
        issued_at: u64,
        duration: u64,
        owner: CombatantId,
        target: Option<CombatantId>,
    ) -> Self {
        Self {
            kind,
            issued_at,
            scheduled_at: issued_at.saturating_add(duration),
            owner,
            target,
            status: ActionStatus::Pending,
            outcome: None,
            damage: None,
        }
    }

    /// Consume the action as resolved.
    #[must_use]
    pub fn complete(mut self, outcome: Option<Outcome>, damage: Option<u32>) -> Self {
        self.status = ActionStatus::Completed;
        self.outcome = outcome;
        self.damage = damage;
        self
    }

    /// Whether the action still awaits resolution.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ActionStatus::Pending)
    }
}
