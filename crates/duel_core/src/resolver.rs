//! Action resolution: one handler per action kind.
//!
//! Each handler applies its effect, logs the completed action, and assigns
//! the successor action(s). Damage is rolled only when an attack lands on a
//! block or on an undefended target.

use rand::Rng;
use tracing::debug;

use crate::action::{Action, Outcome};
use crate::catalog::ActionKind;
use crate::damage::roll_damage;
use crate::error::Result;
use crate::state::BattleState;

/// Resolve the action taken from roster `slot`.
pub(crate) fn resolve<R: Rng + ?Sized>(
    state: &mut BattleState,
    slot: usize,
    action: Action,
    rng: &mut R,
) -> Result<()> {
    if action.kind == ActionKind::ReleaseAttack {
        return release_attack(state, slot, action, rng);
    }

    let kind = action.kind;
    let mark = state.mark(slot, None);
    let actor = &mut state.combatants[slot];
    match kind {
        ActionKind::Recover => actor.recover_stamina(),
        ActionKind::TurnAround => actor.turn_around(),
        ActionKind::MoveForward => {
            state.distance = state.distance.saturating_sub(actor.mobility);
        }
        ActionKind::MoveBackward => {
            state.distance = state
                .distance
                .saturating_add(actor.mobility)
                .min(state.config.max_distance);
        }
        _ => {}
    }
    state.record_completion(slot, &action.complete(None, None), mark)?;

    let next = match kind {
        ActionKind::Idle => state.decide(slot),
        ActionKind::Reset
        | ActionKind::Recover
        | ActionKind::TurnAround
        | ActionKind::MoveForward
        | ActionKind::MoveBackward
        | ActionKind::StopAttack => ActionKind::Idle,
        ActionKind::OffBalance => ActionKind::Reset,
        ActionKind::TryBlock | ActionKind::KeepBlocking => {
            state.affordable_or(slot, ActionKind::Blocking, ActionKind::Idle)
        }
        ActionKind::Blocking => state.continue_block(slot),
        ActionKind::TryEvade | ActionKind::Evading => {
            state.affordable_or(slot, ActionKind::Evading, ActionKind::Idle)
        }
        ActionKind::TryAttack => ActionKind::ReleaseAttack,
        ActionKind::ReleaseAttack => ActionKind::Idle,
    };
    state.assign(slot, next)
}

fn release_attack<R: Rng + ?Sized>(
    state: &mut BattleState,
    slot: usize,
    action: Action,
    rng: &mut R,
) -> Result<()> {
    let Some(target) = state.find_target(slot) else {
        debug!(
            attacker = state.combatants[slot].id,
            "No live target, attack dissolves"
        );
        let mark = state.mark(slot, None);
        state.record_completion(slot, &action.complete(None, None), mark)?;
        return state.assign(slot, ActionKind::Idle);
    };

    let mark = state.mark(slot, Some(target));
    if !state.combatants[slot].is_within_range(state.distance) {
        state.record_completion(slot, &action.complete(Some(Outcome::Missed), None), mark)?;
        return state.assign(slot, ActionKind::OffBalance);
    }

    let (outcome, damage) = match state.combatants[target].pending_kind() {
        Some(kind) if kind.is_block_stance() => {
            let damage = roll_damage(&state.combatants[slot], rng);
            let defender = &mut state.combatants[target];
            if damage <= defender.blocking_power {
                defender.blocking_power -= damage;
                (Outcome::Blocked, damage)
            } else {
                let excess = damage - defender.blocking_power;
                defender.blocking_power = 0;
                defender.take_damage(excess);
                (Outcome::Breached, damage)
            }
        }
        Some(ActionKind::Evading) => (Outcome::Evaded, 0),
        _ => {
            let damage = roll_damage(&state.combatants[slot], rng);
            state.combatants[target].take_damage(damage);
            (Outcome::Hit, damage)
        }
    };

    debug!(
        attacker = state.combatants[slot].id,
        defender = state.combatants[target].id,
        ?outcome,
        damage,
        "Attack resolved"
    );
    state.record_completion(slot, &action.complete(Some(outcome), Some(damage)), mark)?;

    match outcome {
        Outcome::Blocked => state.assign(slot, ActionKind::OffBalance),
        Outcome::Evaded => {
            state.assign(target, ActionKind::Reset)?;
            state.assign(slot, ActionKind::OffBalance)
        }
        Outcome::Breached | Outcome::Hit => {
            state.assign(slot, ActionKind::Reset)?;
            state.assign(target, ActionKind::Reset)
        }
        Outcome::Missed => state.assign(slot, ActionKind::OffBalance),
    }
}
