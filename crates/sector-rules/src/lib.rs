#![deny(warnings)]

//! Rules resolution for the sector faction game.
//!
//! Every resolver here is a pure function over a read-only snapshot. It
//! returns a report for display and a [`ChangeSet`](sector_core::ChangeSet)
//! for the caller to apply; nothing in this crate mutates a faction or the
//! sector.

pub mod ability;
pub mod campaign;
pub mod combat;
pub mod error;
pub mod expansion;
pub mod turn;

pub use ability::{ability_of, execute, resolve_movement, AbilityResult, MovementConfig};
pub use campaign::{
    abandon_campaign, advance_campaign, begin_homeworld_transition, begin_seizure, can_hold,
    CampaignProgress,
};
pub use combat::{
    check_roll, opposed_roll, resolve_attack, resolve_damage, AttackOrder, AttackReport,
    CheckRoll, DamageOutcome, OpposedRoll, TagContext,
};
pub use error::{InvariantViolation, RuleError};
pub use expansion::{
    check_target, expansion_cost, resolve_expansion, ExpansionCost, ExpansionReport, RivalRoll,
};
pub use turn::{ActionStatus, ActionType, Phase, TurnError, TurnState};
