#![deny(warnings)]

//! Turn-by-turn driver for the sector faction game.
//!
//! [`Game`] owns the snapshot, the catalog and the dice. Each operation
//! stages the matching action, asks a resolver for a change-set and applies
//! it atomically; a refused action leaves the game as it was.

pub mod apply;
pub mod game;
pub mod policy;

pub use apply::{apply_atomic, ApplyError};
pub use game::{ExpansionOutcome, Game, TurnSummary};
pub use policy::{choose, play_turn, ActionLog, Plan, TurnLog};

use sector_core::ValidationError;
use sector_econ::EconError;
use sector_rules::{RuleError, TurnError};
use thiserror::Error;

/// Everything a game operation can refuse with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a game needs at least one faction")]
    NoFactions,
    #[error("the game is over")]
    GameOver,
    #[error("the turn has already started")]
    NotInSetup,
    #[error("the turn can only end during the action phase")]
    NotInAction,
    #[error("no movement choice is open")]
    NoMovement,
}
