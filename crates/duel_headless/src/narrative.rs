//! Play-by-play narration of an event log.
//!
//! Entries are ordered by timestamp; at equal timestamps resolutions come
//! before the commitments they caused, then log order decides.

use std::cmp::Ordering;

use duel_core::prelude::{ActionKind, EventEntry, EventLog, Outcome};

/// Narrate a whole log, one line per entry, in replay order.
#[must_use]
pub fn narrate(log: &EventLog) -> Vec<String> {
    let mut entries: Vec<&EventEntry> = log.iter().collect();
    entries.sort_by(|a, b| replay_order(a, b));
    entries.into_iter().map(render_entry).collect()
}

/// Replay ordering: `(timestamp, completed before pending, sequence)`.
#[must_use]
pub fn replay_order(a: &EventEntry, b: &EventEntry) -> Ordering {
    let key = |e: &EventEntry| (e.timestamp, !e.is_completed(), e.sequence);
    key(a).cmp(&key(b))
}

/// Render one entry as a line of text.
#[must_use]
pub fn render_entry(entry: &EventEntry) -> String {
    let body = if entry.is_completed() {
        completed_line(entry)
    } else {
        pending_line(entry)
    };
    format!("[t={:>6}] {body}", entry.timestamp)
}

fn pending_line(entry: &EventEntry) -> String {
    let who = &entry.actor.name;
    let ticks = entry.scheduled_at.saturating_sub(entry.timestamp);
    let what = match entry.action {
        ActionKind::TryAttack => "winds up an attack",
        ActionKind::ReleaseAttack => "swings",
        ActionKind::StopAttack => "aborts the attack",
        ActionKind::TryBlock => "raises a guard",
        ActionKind::Blocking => "holds the block",
        ActionKind::KeepBlocking => "keeps blocking",
        ActionKind::TryEvade => "starts to dodge",
        ActionKind::Evading => "is evading",
        ActionKind::MoveForward => "advances",
        ActionKind::MoveBackward => "backs away",
        ActionKind::TurnAround => "turns around",
        ActionKind::Idle => "waits",
        ActionKind::Reset => "regains footing",
        ActionKind::Recover => "catches breath",
        ActionKind::OffBalance => "stumbles off balance",
    };
    let mut line = format!("{who} {what} ({ticks} ticks");
    if entry.stamina_cost > 0 {
        line.push_str(&format!(", {} stamina", entry.stamina_cost));
    }
    line.push(')');
    line
}

fn completed_line(entry: &EventEntry) -> String {
    let who = &entry.actor.name;
    let target = entry
        .target
        .as_ref()
        .map_or("nobody", |t| t.name.as_str());

    match (entry.action, entry.outcome) {
        (ActionKind::ReleaseAttack, Some(outcome)) => {
            let damage = entry.damage.unwrap_or(0);
            match outcome {
                Outcome::Hit => format!(
                    "{who} hits {target} for {damage} damage ({target} health {})",
                    entry.target.as_ref().map_or(0, |t| t.health)
                ),
                Outcome::Missed => format!(
                    "{who} swings at {target} but is out of reach at distance {}",
                    entry.distance
                ),
                Outcome::Blocked => format!(
                    "{target} blocks {who}'s {damage} damage ({} blocking power left)",
                    entry.target.as_ref().map_or(0, |t| t.blocking_power)
                ),
                Outcome::Breached => format!(
                    "{who} breaks through {target}'s guard, {} of {damage} damage lands",
                    -entry.changes.target_health
                ),
                Outcome::Evaded => format!("{target} slips away from {who}'s attack"),
            }
        }
        (ActionKind::ReleaseAttack, None) => format!("{who} swings at empty air"),
        (ActionKind::MoveForward, _) => {
            format!("{who} closes in, distance now {}", entry.distance)
        }
        (ActionKind::MoveBackward, _) => {
            format!("{who} retreats, distance now {}", entry.distance)
        }
        (ActionKind::Recover, _) => format!(
            "{who} recovers, stamina {}/{}",
            entry.actor.stamina, entry.actor.max_stamina
        ),
        (ActionKind::TurnAround, _) => format!("{who} now faces {:?}", entry.actor.facing),
        (kind, _) => format!("{who} finishes {kind}"),
    }
}
