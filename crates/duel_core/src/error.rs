//! Error types for the duel engine.

use thiserror::Error;

use crate::catalog::ActionKind;
use crate::combatant::CombatantId;

/// Result type alias using [`DuelError`].
pub type Result<T> = std::result::Result<T, DuelError>;

/// Top-level error type for all engine configuration errors.
///
/// Combat results (missed, blocked, breached...) are never errors; they are
/// recorded as [`Outcome`](crate::action::Outcome) values in the event log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DuelError {
    /// The roster already holds two combatants.
    #[error("Battle is full: a duel holds exactly two combatants")]
    CapacityExceeded,

    /// A combatant with this id is already in the roster.
    #[error("Combatant {0} already added to the battle")]
    DuplicateCombatant(CombatantId),

    /// Combatant stats are unusable.
    #[error("Invalid combatant: {0}")]
    InvalidCombatant(String),

    /// No combatant with this id is in the roster.
    #[error("Combatant not found: {0}")]
    UnknownCombatant(CombatantId),

    /// Scheduling was requested while no combatant holds a pending action.
    #[error("No pending combatant actions to schedule")]
    NoPendingActions,

    /// An action name did not match any known action type.
    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    /// The action catalog has no entry for this action type.
    #[error("Action catalog has no entry for '{0}'")]
    IncompleteCatalog(ActionKind),

    /// The action catalog declares a zero duration, which would stall the timer.
    #[error("Action '{0}' has a zero duration")]
    ZeroDuration(ActionKind),

    /// Battle parameters are inconsistent.
    #[error("Invalid battle configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse an action catalog.
    #[error("Failed to parse action catalog: {0}")]
    CatalogParse(String),

    /// Failed to encode or decode engine data.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
