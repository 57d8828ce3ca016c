//! Battle event log.
//!
//! Every assignment and every resolution appends one [`EventEntry`]. Entries
//! carry snapshots of both combatants so a log can be rendered or audited
//! without replaying the battle.

use serde::{Deserialize, Serialize};

use crate::action::{ActionStatus, Outcome};
use crate::catalog::ActionKind;
use crate::combatant::{Combatant, CombatantId, Side};
use crate::error::{DuelError, Result};

/// Frozen view of a combatant at the moment an entry was logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    /// Combatant id.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Health at snapshot time.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Stamina at snapshot time.
    pub stamina: u32,
    /// Maximum stamina.
    pub max_stamina: u32,
    /// Remaining blocking power.
    pub blocking_power: u32,
    /// Position.
    pub position: Side,
    /// Facing.
    pub facing: Side,
    /// Kind of the action pending at snapshot time.
    pub pending: Option<ActionKind>,
}

impl From<&Combatant> for CombatantSnapshot {
    fn from(c: &Combatant) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            health: c.health,
            max_health: c.max_health,
            stamina: c.stamina,
            max_stamina: c.max_stamina,
            blocking_power: c.blocking_power,
            position: c.position,
            facing: c.facing,
            pending: c.pending_kind(),
        }
    }
}

/// Signed resource deltas caused by one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateChanges {
    /// Change in distance.
    pub distance: i64,
    /// Change in the actor's stamina.
    pub actor_stamina: i64,
    /// Change in the target's health.
    pub target_health: i64,
    /// Change in the target's blocking power.
    pub target_blocking_power: i64,
}

impl StateChanges {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One line of the battle record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventEntry {
    /// Position of this entry in the log.
    pub sequence: u64,
    /// Event counter when the entry was written.
    pub event_number: u64,
    /// Engine timer when the entry was written.
    pub timestamp: u64,
    /// The acting combatant.
    pub actor: CombatantSnapshot,
    /// The target, when the action had one.
    pub target: Option<CombatantSnapshot>,
    /// Action kind.
    pub action: ActionKind,
    /// Completion time of the action.
    pub scheduled_at: u64,
    /// Stamina cost from the catalog.
    pub stamina_cost: u32,
    /// Whether the actor could reach its target at this distance.
    pub in_range: bool,
    /// Distance when the entry was written.
    pub distance: u32,
    /// Ticks left before time-out.
    pub time_remaining: u64,
    /// Pending for assignments, completed for resolutions.
    pub status: ActionStatus,
    /// Attack outcome, if any.
    pub outcome: Option<Outcome>,
    /// Damage rolled, if any.
    pub damage: Option<u32>,
    /// Resource deltas caused by a resolution.
    pub changes: StateChanges,
    /// Up to three action kinds the actor was given before this one.
    pub recent_actions: Vec<ActionKind>,
}

impl EventEntry {
    /// Whether this entry records a resolution.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ActionStatus::Completed
    }
}

/// Append-only record of a battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<EventEntry>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, stamping its sequence number.
    pub fn push(&mut self, mut entry: EventEntry) {
        entry.sequence = self.entries.len() as u64;
        self.entries.push(entry);
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[EventEntry] {
        &self.entries
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolution entries only.
    pub fn completed(&self) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter().filter(|e| e.is_completed())
    }

    /// Entries acted by one combatant.
    pub fn for_actor(&self, id: CombatantId) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter().filter(move |e| e.actor.id == id)
    }

    /// Last entry written.
    #[must_use]
    pub fn last(&self) -> Option<&EventEntry> {
        self.entries.last()
    }

    /// Encode to bincode.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| DuelError::Serialization(e.to_string()))
    }

    /// Decode from bincode.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| DuelError::Serialization(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a EventEntry;
    type IntoIter = std::slice::Iter<'a, EventEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::CombatantStats;

    fn entry(actor: &Combatant, status: ActionStatus) -> EventEntry {
        EventEntry {
            sequence: 99,
            event_number: 1,
            timestamp: 100,
            actor: actor.into(),
            target: None,
            action: ActionKind::Idle,
            scheduled_at: 200,
            stamina_cost: 0,
            in_range: false,
            distance: 40,
            time_remaining: 900,
            status,
            outcome: None,
            damage: None,
            changes: StateChanges::default(),
            recent_actions: vec![ActionKind::Idle],
        }
    }

    #[test]
    fn test_push_stamps_sequence() {
        let c = Combatant::new(3, "Logger", &CombatantStats::default());
        let mut log = EventLog::new();
        log.push(entry(&c, ActionStatus::Pending));
        log.push(entry(&c, ActionStatus::Completed));
        let seqs: Vec<u64> = log.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(log.completed().count(), 1);
        assert_eq!(log.for_actor(3).count(), 2);
        assert_eq!(log.for_actor(4).count(), 0);
    }

    #[test]
    fn test_bincode_round_trip() {
        let c = Combatant::new(3, "Logger", &CombatantStats::default());
        let mut log = EventLog::new();
        log.push(entry(&c, ActionStatus::Completed));
        let bytes = log.encode().unwrap();
        assert_eq!(EventLog::decode(&bytes).unwrap(), log);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = EventLog::decode(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(DuelError::Serialization(_))));
    }
}
