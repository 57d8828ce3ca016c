//! Combatant state: health, stamina, blocking power and the coarse spatial model.
//!
//! A combatant owns at most one pending [`Action`]. The engine replaces that
//! slot whenever an action resolves or a new one is assigned; it never queues.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::catalog::ActionKind;
use crate::error::{DuelError, Result};

/// Unique identifier for combatants, chosen by the caller.
pub type CombatantId = u32;

/// Number of earlier action kinds reported with each log entry.
pub const ACTION_HISTORY_LEN: usize = 3;

/// Side assigned by join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// First combatant to join.
    Challenger,
    /// Second combatant to join.
    Defender,
}

/// Coarse left/right position and facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Left side of the arena.
    #[default]
    Left,
    /// Right side of the arena.
    Right,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Inclusive interval of distances at which an attack can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackRange {
    /// Closest distance an attack reaches.
    pub min: u32,
    /// Farthest distance an attack reaches.
    pub max: u32,
}

impl AttackRange {
    /// Create a new attack range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether `distance` lies inside the range.
    #[must_use]
    pub const fn contains(self, distance: u32) -> bool {
        self.min <= distance && distance <= self.max
    }
}

/// Starting statistics for a combatant.
///
/// `health` and `stamina` are both the starting value and the maximum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantStats {
    /// Starting and maximum health.
    pub health: u32,
    /// Starting and maximum stamina.
    pub stamina: u32,
    /// Stamina regained by one `recover` action.
    pub stamina_recovery: u32,
    /// Maximum damage of one attack.
    pub attack_power: u32,
    /// Damage roll spread, 0-100. At 100 every attack deals `attack_power`.
    pub accuracy: u8,
    /// Depletable defense pool consumed by blocked attacks.
    pub blocking_power: u32,
    /// Distance covered by one move.
    pub mobility: u32,
    /// Valid attack distances.
    pub range: AttackRange,
}

impl CombatantStats {
    /// Reject stats the engine cannot simulate.
    pub fn validate(&self) -> Result<()> {
        if self.health == 0 {
            return Err(DuelError::InvalidCombatant(
                "max health must be positive".to_string(),
            ));
        }
        if self.accuracy > 100 {
            return Err(DuelError::InvalidCombatant(format!(
                "accuracy {} exceeds 100",
                self.accuracy
            )));
        }
        if self.range.min > self.range.max {
            return Err(DuelError::InvalidCombatant(format!(
                "attack range [{}, {}] is inverted",
                self.range.min, self.range.max
            )));
        }
        Ok(())
    }
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self {
            health: 100,
            stamina: 100,
            stamina_recovery: 10,
            attack_power: 10,
            accuracy: 80,
            blocking_power: 20,
            mobility: 50,
            range: AttackRange::new(0, 50),
        }
    }
}

/// An actor in the duel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combatant {
    /// Caller-assigned identifier.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Current stamina.
    pub stamina: u32,
    /// Maximum stamina.
    pub max_stamina: u32,
    /// Stamina regained per `recover`.
    pub stamina_recovery: u32,
    /// Maximum damage per attack.
    pub attack_power: u32,
    /// Damage roll spread (0-100).
    pub accuracy: u8,
    /// Remaining blocking power.
    pub blocking_power: u32,
    /// Distance delta per move.
    pub mobility: u32,
    /// Valid attack distances.
    pub range: AttackRange,
    /// Where this combatant stands.
    pub position: Side,
    /// Which way this combatant looks.
    pub facing: Side,
    /// Team, assigned when added to an engine.
    pub team: Option<Team>,
    /// Opponent this combatant reasons about, wired by the caller.
    pub opponent: Option<CombatantId>,
    action: Option<Action>,
    recent_actions: VecDeque<ActionKind>,
}

impl Combatant {
    /// Create a combatant standing on the left, facing right.
    #[must_use]
    pub fn new(id: CombatantId, name: impl Into<String>, stats: &CombatantStats) -> Self {
        Self {
            id,
            name: name.into(),
            health: stats.health,
            max_health: stats.health,
            stamina: stats.stamina,
            max_stamina: stats.stamina,
            stamina_recovery: stats.stamina_recovery,
            attack_power: stats.attack_power,
            accuracy: stats.accuracy,
            blocking_power: stats.blocking_power,
            mobility: stats.mobility,
            range: stats.range,
            position: Side::Left,
            facing: Side::Right,
            team: None,
            opponent: None,
            action: None,
            recent_actions: VecDeque::with_capacity(ACTION_HISTORY_LEN + 1),
        }
    }

    /// Builder method to set position and facing.
    #[must_use]
    pub fn at(mut self, position: Side, facing: Side) -> Self {
        self.position = position;
        self.facing = facing;
        self
    }

    /// Check the combatant against the same rules as [`CombatantStats::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.max_health == 0 {
            return Err(DuelError::InvalidCombatant(format!(
                "{}: max health must be positive",
                self.name
            )));
        }
        if self.health > self.max_health || self.stamina > self.max_stamina {
            return Err(DuelError::InvalidCombatant(format!(
                "{}: current resources exceed their maximum",
                self.name
            )));
        }
        if self.accuracy > 100 {
            return Err(DuelError::InvalidCombatant(format!(
                "{}: accuracy {} exceeds 100",
                self.name, self.accuracy
            )));
        }
        if self.range.min > self.range.max {
            return Err(DuelError::InvalidCombatant(format!(
                "{}: attack range [{}, {}] is inverted",
                self.name, self.range.min, self.range.max
            )));
        }
        Ok(())
    }

    /// The pending action, if any.
    #[must_use]
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Kind of the pending action, if any.
    #[must_use]
    pub fn pending_kind(&self) -> Option<ActionKind> {
        self.action.as_ref().map(|action| action.kind)
    }

    /// Up to three action kinds assigned before the latest one, oldest first.
    #[must_use]
    pub fn recent_actions(&self) -> Vec<ActionKind> {
        let earlier = self.recent_actions.len().saturating_sub(1);
        self.recent_actions.iter().take(earlier).copied().collect()
    }

    /// Whether health has reached zero.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health == 0
    }

    /// Whether `distance` lies inside this combatant's attack range.
    #[must_use]
    pub const fn is_within_range(&self, distance: u32) -> bool {
        self.range.contains(distance)
    }

    /// Whether this combatant faces the side `other` stands on.
    #[must_use]
    pub fn is_facing(&self, other: &Combatant) -> bool {
        self.facing == other.position
    }

    /// Whether current stamina covers `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.stamina >= cost
    }

    /// Replace the pending action, returning the one it displaced.
    pub(crate) fn assign(&mut self, action: Action) -> Option<Action> {
        if self.recent_actions.len() > ACTION_HISTORY_LEN {
            self.recent_actions.pop_front();
        }
        self.recent_actions.push_back(action.kind);
        self.action.replace(action)
    }

    /// Remove the pending action for resolution.
    pub(crate) fn take_action(&mut self) -> Option<Action> {
        self.action.take()
    }

    /// Deduct stamina, never going below zero.
    pub(crate) fn spend_stamina(&mut self, cost: u32) {
        self.stamina = self.stamina.saturating_sub(cost);
    }

    /// Regain `stamina_recovery`, capped at the maximum.
    pub(crate) fn recover_stamina(&mut self) {
        self.stamina = self
            .stamina
            .saturating_add(self.stamina_recovery)
            .min(self.max_stamina);
    }

    /// Lose health, floored at zero. Returns the health actually lost.
    pub(crate) fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        lost
    }

    /// Flip facing.
    pub(crate) fn turn_around(&mut self) {
        self.facing = self.facing.flipped();
    }
}
