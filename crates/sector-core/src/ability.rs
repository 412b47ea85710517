//! Ability descriptions carried by asset definitions.
//!
//! Each variant carries its own parameters; the executor in `sector-rules`
//! dispatches over this enum exhaustively.

use crate::dice::DiceExpr;
use crate::model::Attribute;
use serde::{Deserialize, Serialize};

/// What happens when a bracket of an economic roll comes up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum BracketOutcome {
    /// Gain the rolled amount of FacCreds.
    Gain { amount: DiceExpr },
    /// Lose the rolled amount, never more than the balance.
    Lose { amount: DiceExpr },
    /// Pay a fixed amount; the asset is destroyed if the faction cannot.
    PayOrDestroy { amount: i64 },
    /// The asset is lost outright.
    Destroy,
    Nothing,
}

/// An inclusive range of die results and what it yields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBracket {
    pub min: i64,
    pub max: i64,
    pub outcome: BracketOutcome,
}

impl IncomeBracket {
    pub fn contains(&self, roll: i64) -> bool {
        (self.min..=self.max).contains(&roll)
    }
}

/// Which assets a movement ability may carry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum MoveScope {
    /// Only the asset using the ability.
    #[default]
    SelfOnly,
    /// Friendly assets sharing its world, optionally capped in number or
    /// restricted to one category.
    CoLocated {
        #[serde(default)]
        limit: Option<u32>,
        #[serde(default)]
        category: Option<Attribute>,
    },
}

/// The special action of an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityKind {
    /// Roll `die`; the bracket containing the result decides the outcome.
    EconomicRoll {
        die: DiceExpr,
        brackets: Vec<IncomeBracket>,
    },
    /// Move assets to a world within `range` hops.
    Relocate {
        range: u32,
        #[serde(default)]
        cost_per_asset: i64,
        #[serde(default)]
        scope: MoveScope,
    },
    /// Free action: pay `cost` and become stealthed.
    GoToGround { cost: i64 },
    /// Free action: pay `cost` and heal every damaged friendly asset on the
    /// same world by `heal`.
    FieldRepair { heal: DiceExpr, cost: i64 },
    /// Listed in the catalog but without rules support yet.
    Unimplemented { note: String },
}

impl AbilityKind {
    /// Free actions neither need nor consume the turn's action slot.
    pub fn is_free_action(&self) -> bool {
        matches!(
            self,
            AbilityKind::GoToGround { .. } | AbilityKind::FieldRepair { .. }
        )
    }

    pub fn is_movement(&self) -> bool {
        matches!(self, AbilityKind::Relocate { .. })
    }
}
