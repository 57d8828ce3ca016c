//! Action catalog: the closed set of action types and their timing/cost table.
//!
//! Every action a combatant can hold is one of the fifteen [`ActionKind`]
//! variants. The [`ActionCatalog`] maps each kind to its base duration (in
//! engine ticks) and stamina cost. The tie-break priority used by the
//! scheduler is fixed per kind and is not configurable.
//!
//! Catalogs can be loaded from RON:
//!
//! ```ron
//! {
//!     try_attack: (duration: 200, stamina_cost: 10),
//!     release_attack: (duration: 100, stamina_cost: 0),
//!     // ... one entry per action kind
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DuelError, Result};

/// Broad grouping of action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCategory {
    /// Wind-up, release and abort of an attack.
    Attack,
    /// Raising and holding a block.
    Defense,
    /// Entering and holding an evasive stance.
    Evasion,
    /// Changing distance or facing.
    Movement,
    /// Waiting, recovering and balance states.
    Neutral,
}

/// Every action type a combatant can perform.
///
/// Variants are declared in tie-break priority order, so the derived `Ord`
/// agrees with [`ActionKind::priority`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Start winding up an attack.
    TryAttack,
    /// Release a wound-up attack at the opponent.
    ReleaseAttack,
    /// Abort an attack.
    StopAttack,
    /// Start raising a block.
    TryBlock,
    /// Hold a block.
    Blocking,
    /// Decide to renew the block.
    KeepBlocking,
    /// Start an evasive stance.
    TryEvade,
    /// Hold the evasive stance.
    Evading,
    /// Close distance.
    MoveForward,
    /// Open distance.
    MoveBackward,
    /// Flip facing.
    TurnAround,
    /// Wait and pick the next action.
    Idle,
    /// Regain balance after an exchange.
    Reset,
    /// Catch breath and regain stamina.
    Recover,
    /// Stagger after a failed attack.
    OffBalance,
}

impl ActionKind {
    /// All action kinds, in priority order.
    pub const ALL: [ActionKind; 15] = [
        ActionKind::TryAttack,
        ActionKind::ReleaseAttack,
        ActionKind::StopAttack,
        ActionKind::TryBlock,
        ActionKind::Blocking,
        ActionKind::KeepBlocking,
        ActionKind::TryEvade,
        ActionKind::Evading,
        ActionKind::MoveForward,
        ActionKind::MoveBackward,
        ActionKind::TurnAround,
        ActionKind::Idle,
        ActionKind::Reset,
        ActionKind::Recover,
        ActionKind::OffBalance,
    ];

    /// Intra-tick tie-break priority. Lower resolves first.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            ActionKind::TryAttack => 1,
            ActionKind::ReleaseAttack => 2,
            ActionKind::StopAttack => 3,
            ActionKind::TryBlock => 4,
            ActionKind::Blocking => 5,
            ActionKind::KeepBlocking => 6,
            ActionKind::TryEvade => 7,
            ActionKind::Evading => 8,
            ActionKind::MoveForward => 9,
            ActionKind::MoveBackward => 10,
            ActionKind::TurnAround => 11,
            ActionKind::Idle => 12,
            ActionKind::Reset => 13,
            ActionKind::Recover => 14,
            ActionKind::OffBalance => 15,
        }
    }

    /// Category this action belongs to.
    #[must_use]
    pub const fn category(self) -> ActionCategory {
        match self {
            ActionKind::TryAttack | ActionKind::ReleaseAttack | ActionKind::StopAttack => {
                ActionCategory::Attack
            }
            ActionKind::TryBlock | ActionKind::Blocking | ActionKind::KeepBlocking => {
                ActionCategory::Defense
            }
            ActionKind::TryEvade | ActionKind::Evading => ActionCategory::Evasion,
            ActionKind::MoveForward | ActionKind::MoveBackward | ActionKind::TurnAround => {
                ActionCategory::Movement
            }
            ActionKind::Idle | ActionKind::Reset | ActionKind::Recover | ActionKind::OffBalance => {
                ActionCategory::Neutral
            }
        }
    }

    /// Snake-case name used in logs and configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ActionKind::TryAttack => "try_attack",
            ActionKind::ReleaseAttack => "release_attack",
            ActionKind::StopAttack => "stop_attack",
            ActionKind::TryBlock => "try_block",
            ActionKind::Blocking => "blocking",
            ActionKind::KeepBlocking => "keep_blocking",
            ActionKind::TryEvade => "try_evade",
            ActionKind::Evading => "evading",
            ActionKind::MoveForward => "move_forward",
            ActionKind::MoveBackward => "move_backward",
            ActionKind::TurnAround => "turn_around",
            ActionKind::Idle => "idle",
            ActionKind::Reset => "reset",
            ActionKind::Recover => "recover",
            ActionKind::OffBalance => "off_balance",
        }
    }

    /// Whether an attack landing on a combatant holding this action meets a block.
    #[must_use]
    pub const fn is_block_stance(self) -> bool {
        matches!(self, ActionKind::Blocking | ActionKind::KeepBlocking)
    }

    /// Whether this action is aimed at the opponent.
    #[must_use]
    pub const fn is_targeted(self) -> bool {
        matches!(self, ActionKind::TryAttack | ActionKind::ReleaseAttack)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = DuelError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| DuelError::UnknownAction(s.to_string()))
    }
}

/// Timing and cost of one action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionDef {
    /// Base duration in engine ticks.
    pub duration: u64,
    /// Stamina deducted when the action is assigned.
    pub stamina_cost: u32,
}

impl ActionDef {
    /// Create a new action definition.
    #[must_use]
    pub const fn new(duration: u64, stamina_cost: u32) -> Self {
        Self {
            duration,
            stamina_cost,
        }
    }
}

/// Immutable table of action definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionCatalog {
    entries: BTreeMap<ActionKind, ActionDef>,
}

impl ActionCatalog {
    /// The built-in action table.
    #[must_use]
    pub fn standard() -> Self {
        let entries = [
            (ActionKind::TryAttack, ActionDef::new(200, 10)),
            (ActionKind::ReleaseAttack, ActionDef::new(100, 0)),
            (ActionKind::StopAttack, ActionDef::new(100, 0)),
            (ActionKind::TryBlock, ActionDef::new(100, 5)),
            (ActionKind::Blocking, ActionDef::new(300, 5)),
            (ActionKind::KeepBlocking, ActionDef::new(100, 5)),
            (ActionKind::TryEvade, ActionDef::new(100, 10)),
            (ActionKind::Evading, ActionDef::new(200, 5)),
            (ActionKind::MoveForward, ActionDef::new(300, 5)),
            (ActionKind::MoveBackward, ActionDef::new(300, 5)),
            (ActionKind::TurnAround, ActionDef::new(100, 0)),
            (ActionKind::Idle, ActionDef::new(100, 0)),
            (ActionKind::Reset, ActionDef::new(200, 0)),
            (ActionKind::Recover, ActionDef::new(500, 0)),
            (ActionKind::OffBalance, ActionDef::new(300, 0)),
        ];
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Build a catalog from explicit entries and validate it.
    pub fn from_entries(entries: impl IntoIterator<Item = (ActionKind, ActionDef)>) -> Result<Self> {
        let catalog = Self {
            entries: entries.into_iter().collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from a RON string and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let catalog: Self =
            ron::from_str(ron).map_err(|e| DuelError::CatalogParse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a RON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or is incomplete.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DuelError::CatalogParse(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_ron_str(&contents)
    }

    /// Serialize the catalog as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| DuelError::Serialization(e.to_string()))
    }

    /// Check that every action kind has an entry with a non-zero duration.
    pub fn validate(&self) -> Result<()> {
        for kind in ActionKind::ALL {
            let def = self
                .entries
                .get(&kind)
                .ok_or(DuelError::IncompleteCatalog(kind))?;
            if def.duration == 0 {
                return Err(DuelError::ZeroDuration(kind));
            }
        }
        Ok(())
    }

    /// Look up an action definition.
    pub fn get(&self, kind: ActionKind) -> Result<&ActionDef> {
        self.entries
            .get(&kind)
            .ok_or(DuelError::IncompleteCatalog(kind))
    }

    /// Base duration of an action kind.
    pub fn duration(&self, kind: ActionKind) -> Result<u64> {
        self.get(kind).map(|def| def.duration)
    }

    /// Stamina cost of an action kind.
    pub fn stamina_cost(&self, kind: ActionKind) -> Result<u32> {
        self.get(kind).map(|def| def.stamina_cost)
    }

    /// Iterate over entries in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (ActionKind, &ActionDef)> {
        self.entries.iter().map(|(kind, def)| (*kind, def))
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_complete() {
        let catalog = ActionCatalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.iter().count(), ActionKind::ALL.len());
    }

    #[test]
    fn test_priorities_follow_declaration_order() {
        for (index, kind) in ActionKind::ALL.iter().enumerate() {
            assert_eq!(usize::from(kind.priority()), index + 1);
        }
        assert!(ActionKind::TryAttack < ActionKind::MoveForward);
        assert!(ActionKind::TryAttack.priority() < ActionKind::MoveForward.priority());
    }

    #[test]
    fn test_categories() {
        assert_eq!(ActionKind::StopAttack.category(), ActionCategory::Attack);
        assert_eq!(ActionKind::KeepBlocking.category(), ActionCategory::Defense);
        assert_eq!(ActionKind::Evading.category(), ActionCategory::Evasion);
        assert_eq!(ActionKind::TurnAround.category(), ActionCategory::Movement);
        assert_eq!(ActionKind::OffBalance.category(), ActionCategory::Neutral);
    }

    #[test]
    fn test_name_parsing() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.name().parse::<ActionKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(
            "quick_attack".parse::<ActionKind>(),
            Err(DuelError::UnknownAction("quick_attack".to_string()))
        );
    }

    #[test]
    fn test_missing_entry_is_rejected() {
        let entries = ActionCatalog::standard()
            .iter()
            .filter(|(kind, _)| *kind != ActionKind::Recover)
            .map(|(kind, def)| (kind, *def))
            .collect::<Vec<_>>();

        assert_eq!(
            ActionCatalog::from_entries(entries),
            Err(DuelError::IncompleteCatalog(ActionKind::Recover))
        );
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let standard = ActionCatalog::standard();
        let entries = standard.iter().map(|(kind, def)| {
            if kind == ActionKind::Idle {
                (kind, ActionDef::new(0, 0))
            } else {
                (kind, *def)
            }
        });

        assert_eq!(
            ActionCatalog::from_entries(entries),
            Err(DuelError::ZeroDuration(ActionKind::Idle))
        );
    }

    #[test]
    fn test_ron_catalog() {
        let catalog = ActionCatalog::standard();
        let ron = catalog.to_ron_string().unwrap();
        assert!(ron.contains("try_attack"));

        let parsed = ActionCatalog::from_ron_str(&ron).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_ron_catalog_with_unknown_action_fails() {
        let result = ActionCatalog::from_ron_str("{ heavy_attack: (duration: 10, stamina_cost: 1) }");
        assert!(matches!(result, Err(DuelError::CatalogParse(_))));
    }

    #[test]
    fn test_lookup() {
        let catalog = ActionCatalog::standard();
        assert_eq!(catalog.duration(ActionKind::Recover), Ok(500));
        assert_eq!(catalog.stamina_cost(ActionKind::TryAttack), Ok(10));
    }
}
