//! Next-event selection.
//!
//! The next event is the pending action with the earliest `scheduled_at`.
//! Ties break on action priority (lower first) and then on roster order, so
//! selection is a pure function of the roster.

use crate::combatant::Combatant;
use crate::error::{DuelError, Result};

/// Ordering key for a pending action: `(scheduled_at, priority, roster index)`.
pub type ScheduleKey = (u64, u8, usize);

/// Roster index of the combatant whose pending action fires next.
///
/// Combatants without a pending action are skipped. Returns
/// [`DuelError::NoPendingActions`] when nobody has one.
pub fn select_next(combatants: &[Combatant]) -> Result<usize> {
    combatants
        .iter()
        .enumerate()
        .filter_map(|(slot, combatant)| schedule_key(slot, combatant))
        .min()
        .map(|(_, _, slot)| slot)
        .ok_or(DuelError::NoPendingActions)
}

/// Scheduling key of one roster entry, if it has a pending action.
#[must_use]
pub fn schedule_key(slot: usize, combatant: &Combatant) -> Option<ScheduleKey> {
    combatant
        .action()
        .filter(|action| action.is_pending())
        .map(|action| (action.scheduled_at, action.kind.priority(), slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::catalog::ActionKind;
    use crate::combatant::CombatantStats;

    fn roster(actions: &[Option<(ActionKind, u64)>]) -> Vec<Combatant> {
        actions
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let id = u32::try_from(i).unwrap() + 1;
                let mut c = Combatant::new(id, format!("C{id}"), &CombatantStats::default());
                if let Some((kind, at)) = spec {
                    c.assign(Action::pending(*kind, 0, *at, id, None));
                }
                c
            })
            .collect()
    }

    #[test]
    fn test_earliest_wins() {
        let r = roster(&[
            Some((ActionKind::Idle, 300)),
            Some((ActionKind::Recover, 100)),
        ]);
        assert_eq!(select_next(&r), Ok(1));
    }

    #[test]
    fn test_tie_breaks_on_priority() {
        let r = roster(&[
            Some((ActionKind::Idle, 200)),
            Some((ActionKind::TryAttack, 200)),
        ]);
        assert_eq!(select_next(&r), Ok(1));
    }

    #[test]
    fn test_full_tie_breaks_on_roster_order() {
        let r = roster(&[
            Some((ActionKind::MoveForward, 200)),
            Some((ActionKind::MoveForward, 200)),
        ]);
        assert_eq!(select_next(&r), Ok(0));
    }

    #[test]
    fn test_skips_combatants_without_actions() {
        let r = roster(&[None, Some((ActionKind::Reset, 50))]);
        assert_eq!(select_next(&r), Ok(1));
    }

    #[test]
    fn test_empty_or_idle_roster_is_an_error() {
        assert_eq!(select_next(&[]), Err(DuelError::NoPendingActions));
        let r = roster(&[None, None]);
        assert_eq!(select_next(&r), Err(DuelError::NoPendingActions));
    }
}
