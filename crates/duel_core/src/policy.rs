//! Decision policies: what a combatant does when it has nothing committed.
//!
//! The engine consults a combatant's policy whenever an `idle` action
//! resolves and whenever a `blocking` stance ends. Policies see a read-only
//! [`DecisionContext`] and must return an [`ActionKind`]; the engine falls
//! back to `idle` if the choice is unaffordable.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::catalog::{ActionCatalog, ActionKind};
use crate::combatant::Combatant;

/// Read-only view of the battle handed to a policy.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Current engine timer.
    pub timer: u64,
    /// Current distance between the combatants.
    pub distance: u32,
    /// Arena width.
    pub max_distance: u32,
    /// Ticks left before the battle times out.
    pub time_remaining: u64,
    /// The deciding combatant.
    pub actor: &'a Combatant,
    /// The actor's linked opponent, if any.
    pub opponent: Option<&'a Combatant>,
    /// Costs and durations of every action.
    pub catalog: &'a ActionCatalog,
}

impl DecisionContext<'_> {
    /// Whether the actor has enough stamina for `kind`.
    #[must_use]
    pub fn can_afford(&self, kind: ActionKind) -> bool {
        self.catalog
            .stamina_cost(kind)
            .is_ok_and(|cost| self.actor.can_afford(cost))
    }

    /// Whether the actor's attack would reach at the current distance.
    #[must_use]
    pub fn actor_in_range(&self) -> bool {
        self.actor.is_within_range(self.distance)
    }

    /// Whether the opponent is winding up or releasing an attack that would reach.
    #[must_use]
    pub fn opponent_threatens(&self) -> bool {
        self.opponent.is_some_and(|opponent| {
            matches!(
                opponent.pending_kind(),
                Some(ActionKind::TryAttack | ActionKind::ReleaseAttack)
            ) && opponent.is_within_range(self.distance)
        })
    }
}

/// Strategy that picks a combatant's next action.
pub trait DecisionPolicy: fmt::Debug + Send {
    /// Choose the action that follows an `idle`.
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> ActionKind;

    /// Choose what follows a completed `blocking` stance.
    fn continue_block(&mut self, ctx: &DecisionContext<'_>) -> ActionKind {
        if ctx.can_afford(ActionKind::KeepBlocking) {
            ActionKind::KeepBlocking
        } else {
            ActionKind::Idle
        }
    }

    /// Observe an action the opponent just committed to.
    fn perceive(&mut self, _opponent: &Combatant, _action: &Action) {}
}

/// Tuning knobs for [`RuleBasedPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBasedParams {
    /// Recover when stamina drops below this percentage of the maximum.
    pub recover_below_percent: u8,
    /// React to a threatening opponent with a block or evade.
    pub defend: bool,
}

impl Default for RuleBasedParams {
    fn default() -> Self {
        Self {
            recover_below_percent: 20,
            defend: true,
        }
    }
}

/// Simple reactive fighter: recover, face, defend, close in, attack.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedPolicy {
    params: RuleBasedParams,
}

impl RuleBasedPolicy {
    /// Create a policy with the given parameters.
    #[must_use]
    pub const fn new(params: RuleBasedParams) -> Self {
        Self { params }
    }

    /// Policy parameters.
    #[must_use]
    pub const fn params(&self) -> RuleBasedParams {
        self.params
    }

    fn stamina_low(&self, actor: &Combatant) -> bool {
        let threshold = u64::from(actor.max_stamina) * u64::from(self.params.recover_below_percent);
        u64::from(actor.stamina) * 100 < threshold
    }
}

impl DecisionPolicy for RuleBasedPolicy {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> ActionKind {
        let actor = ctx.actor;

        if self.stamina_low(actor) {
            return ActionKind::Recover;
        }

        if let Some(opponent) = ctx.opponent {
            if !actor.is_facing(opponent) {
                return ActionKind::TurnAround;
            }
        }

        if self.params.defend && ctx.opponent_threatens() {
            if actor.blocking_power > 0 && ctx.can_afford(ActionKind::TryBlock) {
                return ActionKind::TryBlock;
            }
            if ctx.can_afford(ActionKind::TryEvade) {
                return ActionKind::TryEvade;
            }
        }

        if ctx.actor_in_range() {
            ActionKind::TryAttack
        } else if ctx.distance > actor.range.max {
            ActionKind::MoveForward
        } else if ctx.distance < actor.range.min {
            ActionKind::MoveBackward
        } else {
            ActionKind::Idle
        }
    }
}

/// Replays a fixed list of choices, then idles forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    script: VecDeque<ActionKind>,
}

impl ScriptedPolicy {
    /// Create a policy from an ordered list of choices.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = ActionKind>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Choices not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DecisionPolicy for ScriptedPolicy {
    fn decide(&mut self, _ctx: &DecisionContext<'_>) -> ActionKind {
        self.script.pop_front().unwrap_or(ActionKind::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{AttackRange, CombatantStats, Side};

    fn pair() -> (Combatant, Combatant) {
        let stats = CombatantStats {
            range: AttackRange::new(0, 30),
            ..CombatantStats::default()
        };
        let a = Combatant::new(1, "A", &stats).at(Side::Left, Side::Right);
        let b = Combatant::new(2, "B", &stats).at(Side::Right, Side::Left);
        (a, b)
    }

    fn ctx<'a>(
        actor: &'a Combatant,
        opponent: &'a Combatant,
        catalog: &'a ActionCatalog,
        distance: u32,
    ) -> DecisionContext<'a> {
        DecisionContext {
            timer: 0,
            distance,
            max_distance: 500,
            time_remaining: 10_000,
            actor,
            opponent: Some(opponent),
            catalog,
        }
    }

    #[test]
    fn test_rule_based_closes_distance_then_attacks() {
        let catalog = ActionCatalog::standard();
        let (a, b) = pair();
        let mut policy = RuleBasedPolicy::default();
        assert_eq!(policy.decide(&ctx(&a, &b, &catalog, 200)), ActionKind::MoveForward);
        assert_eq!(policy.decide(&ctx(&a, &b, &catalog, 20)), ActionKind::TryAttack);
    }

    #[test]
    fn test_rule_based_backs_off_inside_minimum_range() {
        let catalog = ActionCatalog::standard();
        let (mut a, b) = pair();
        a.range = AttackRange::new(10, 30);
        let mut policy = RuleBasedPolicy::default();
        assert_eq!(policy.decide(&ctx(&a, &b, &catalog, 5)), ActionKind::MoveBackward);
    }

    #[test]
    fn test_rule_based_recovers_when_exhausted() {
        let catalog = ActionCatalog::standard();
        let (mut a, b) = pair();
        a.stamina = 5;
        let mut policy = RuleBasedPolicy::default();
        assert_eq!(policy.decide(&ctx(&a, &b, &catalog, 20)), ActionKind::Recover);
    }

    #[test]
    fn test_rule_based_turns_to_face_opponent() {
        let catalog = ActionCatalog::standard();
        let (mut a, b) = pair();
        a.facing = Side::Left;
        let mut policy = RuleBasedPolicy::default();
        assert_eq!(policy.decide(&ctx(&a, &b, &catalog, 20)), ActionKind::TurnAround);
    }

    #[test]
    fn test_rule_based_defends_against_wind_up() {
        let catalog = ActionCatalog::standard();
        let (a, mut b) = pair();
        b.assign(Action::pending(ActionKind::TryAttack, 0, 200, 2, Some(1)));
        let mut policy = RuleBasedPolicy::default();
        assert_eq!(policy.decide(&ctx(&a, &b, &catalog, 20)), ActionKind::TryBlock);

        let (mut a, _) = pair();
        a.blocking_power = 0;
        assert_eq!(policy.decide(&ctx(&a, &b, &catalog, 20)), ActionKind::TryEvade);
    }

    #[test]
    fn test_default_continue_block_depends_on_stamina() {
        let catalog = ActionCatalog::standard();
        let (mut a, b) = pair();
        let mut policy = ScriptedPolicy::default();
        assert_eq!(
            policy.continue_block(&ctx(&a, &b, &catalog, 20)),
            ActionKind::KeepBlocking
        );
        a.stamina = 0;
        assert_eq!(policy.continue_block(&ctx(&a, &b, &catalog, 20)), ActionKind::Idle);
    }

    #[test]
    fn test_rule_based_holds_block_without_threat() {
        let catalog = ActionCatalog::standard();
        let (mut a, mut b) = pair();
        b.assign(Action::pending(ActionKind::Recover, 0, 300, 2, None));
        let mut policy = RuleBasedPolicy::default();
        assert!(!ctx(&a, &b, &catalog, 20).opponent_threatens());
        assert_eq!(
            policy.continue_block(&ctx(&a, &b, &catalog, 20)),
            ActionKind::KeepBlocking
        );
        a.stamina = 0;
        assert_eq!(policy.continue_block(&ctx(&a, &b, &catalog, 20)), ActionKind::Idle);
    }

    #[test]
    fn test_scripted_policy_runs_out_to_idle() {
        let catalog = ActionCatalog::standard();
        let (a, b) = pair();
        let mut policy = ScriptedPolicy::new([ActionKind::MoveForward, ActionKind::TryAttack]);
        let c = ctx(&a, &b, &catalog, 100);
        assert_eq!(policy.decide(&c), ActionKind::MoveForward);
        assert_eq!(policy.decide(&c), ActionKind::TryAttack);
        assert_eq!(policy.remaining(), 0);
        assert_eq!(policy.decide(&c), ActionKind::Idle);
    }
}
