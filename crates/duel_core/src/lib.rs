//! # Duel Core
//!
//! Deterministic discrete-event engine for one-on-one combat.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond the RON and bincode codecs
//! - No system randomness (damage rolls come from an injected, seedable generator)
//! - Integer arithmetic throughout
//!
//! Given the same roster, catalog and seed, a battle produces the same event
//! log and the same [`CombatEngine::state_hash`](engine::CombatEngine::state_hash).
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Action kinds, priorities, durations and costs
//! - [`combatant`] - Combatant stats and state
//! - [`action`] - Scheduled actions and outcomes
//! - [`policy`] - Decision policies
//! - [`scheduler`] - Next-event selection
//! - [`events`] - Battle event log
//! - [`engine`] - The combat engine

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod catalog;
pub mod combatant;
pub mod damage;
pub mod engine;
pub mod error;
pub mod events;
pub mod policy;
mod resolver;
pub mod scheduler;
mod state;

pub use state::BattleConfig;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{Action, ActionStatus, Outcome};
    pub use crate::catalog::{ActionCatalog, ActionCategory, ActionDef, ActionKind};
    pub use crate::combatant::{AttackRange, Combatant, CombatantId, CombatantStats, Side, Team};
    pub use crate::engine::{BattleOutcome, BattlePhase, CombatEngine};
    pub use crate::error::{DuelError, Result};
    pub use crate::events::{CombatantSnapshot, EventEntry, EventLog, StateChanges};
    pub use crate::policy::{
        DecisionContext, DecisionPolicy, RuleBasedParams, RuleBasedPolicy, ScriptedPolicy,
    };
    pub use crate::BattleConfig;
}
