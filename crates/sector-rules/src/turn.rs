//! Phases of a faction turn and the one-action-type rule.
//!
//! A faction picks one action type per turn. It may repeat that type with
//! as many assets as it likes, but staging any other type is refused until
//! the next turn. Free actions bypass the slot entirely.

use crate::ability::MovementConfig;
use sector_core::{Campaign, SystemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Income and upkeep.
    Setup,
    Action,
    /// Campaign progress and victory checks.
    News,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Attack,
    BuyAsset,
    ChangeHomeworld,
    ExpandInfluence,
    RefitAsset,
    RepairAsset,
    RepairFaction,
    SellAsset,
    SeizePlanet,
    UseAbility,
}

impl ActionType {
    pub const ALL: [ActionType; 10] = [
        ActionType::Attack,
        ActionType::BuyAsset,
        ActionType::ChangeHomeworld,
        ActionType::ExpandInfluence,
        ActionType::RefitAsset,
        ActionType::RepairAsset,
        ActionType::RepairFaction,
        ActionType::SellAsset,
        ActionType::SeizePlanet,
        ActionType::UseAbility,
    ];

    /// The only action a faction may take while `campaign` runs.
    pub fn for_campaign(campaign: &Campaign) -> ActionType {
        match campaign {
            Campaign::Seizure { .. } => ActionType::SeizePlanet,
            Campaign::HomeworldTransition { .. } => ActionType::ChangeHomeworld,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::Attack => "attack",
            ActionType::BuyAsset => "buy asset",
            ActionType::ChangeHomeworld => "change homeworld",
            ActionType::ExpandInfluence => "expand influence",
            ActionType::RefitAsset => "refit asset",
            ActionType::RepairAsset => "repair asset",
            ActionType::RepairFaction => "repair faction",
            ActionType::SellAsset => "sell asset",
            ActionType::SeizePlanet => "seize planet",
            ActionType::UseAbility => "use ability",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Idle,
    Staged(ActionType),
    Committed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("not allowed during the {actual:?} phase")]
    WrongPhase { actual: Phase },
    #[error("a movement destination must be chosen or canceled first")]
    MovementPending,
    #[error("{0} is already staged")]
    AlreadyStaged(ActionType),
    #[error("this turn's action is {used}; cannot {requested}")]
    SlotUsed {
        used: ActionType,
        requested: ActionType,
    },
    #[error("an active campaign only allows {allowed}; cannot {requested}")]
    CampaignRestricted {
        allowed: ActionType,
        requested: ActionType,
    },
    #[error("nothing is staged")]
    NothingStaged,
    #[error("movement needs a staged ability use")]
    NotAbilityUse,
    #[error("no movement is open")]
    NoMovement,
    #[error("{0} is not a destination on offer")]
    NotADestination(SystemId),
}

/// Action bookkeeping for the faction whose turn it is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    turn: u32,
    phase: Phase,
    status: ActionStatus,
    used: Option<ActionType>,
    movement: Option<MovementConfig>,
}

impl TurnState {
    pub fn new(turn: u32) -> Self {
        Self {
            turn,
            phase: Phase::Setup,
            status: ActionStatus::Idle,
            used: None,
            movement: None,
        }
    }

    /// Turn counter compared against asset readiness stamps.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    /// Action type this turn's slot went to, if any.
    pub fn used(&self) -> Option<ActionType> {
        self.used
    }

    pub fn movement(&self) -> Option<&MovementConfig> {
        self.movement.as_ref()
    }

    pub fn in_movement(&self) -> bool {
        self.movement.is_some()
    }

    /// Step to the next phase. Leaving News starts a fresh turn.
    pub fn advance(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Setup => Phase::Action,
            Phase::Action => {
                self.movement = None;
                if matches!(self.status, ActionStatus::Staged(_)) {
                    self.status = self.settled_status();
                }
                Phase::News
            }
            Phase::News => {
                self.turn += 1;
                self.status = ActionStatus::Idle;
                self.used = None;
                Phase::Setup
            }
        };
        debug!(turn = self.turn, phase = ?self.phase, "phase advanced");
        self.phase
    }

    fn require_action_phase(&self) -> Result<(), TurnError> {
        if self.phase != Phase::Action {
            return Err(TurnError::WrongPhase { actual: self.phase });
        }
        if self.movement.is_some() {
            return Err(TurnError::MovementPending);
        }
        Ok(())
    }

    /// Stage `action`. Allowed when nothing has been taken yet this turn, or
    /// when `action` repeats the type already taken.
    pub fn stage(&mut self, action: ActionType, campaign: Option<&Campaign>) -> Result<(), TurnError> {
        self.require_action_phase()?;
        if let ActionStatus::Staged(staged) = self.status {
            return Err(TurnError::AlreadyStaged(staged));
        }
        if let Some(c) = campaign {
            let allowed = ActionType::for_campaign(c);
            if allowed != action {
                return Err(TurnError::CampaignRestricted {
                    allowed,
                    requested: action,
                });
            }
        }
        if let Some(used) = self.used {
            if used != action {
                return Err(TurnError::SlotUsed {
                    used,
                    requested: action,
                });
            }
        }
        self.status = ActionStatus::Staged(action);
        Ok(())
    }

    /// Finalise the staged action.
    pub fn commit(&mut self) -> Result<ActionType, TurnError> {
        let ActionStatus::Staged(action) = self.status else {
            return Err(TurnError::NothingStaged);
        };
        self.mark_used(action);
        self.status = ActionStatus::Committed;
        Ok(action)
    }

    /// Drop the staged action without effect.
    pub fn cancel(&mut self) -> Result<(), TurnError> {
        if !matches!(self.status, ActionStatus::Staged(_)) {
            return Err(TurnError::NothingStaged);
        }
        self.movement = None;
        self.status = self.settled_status();
        Ok(())
    }

    fn settled_status(&self) -> ActionStatus {
        if self.used.is_some() {
            ActionStatus::Committed
        } else {
            ActionStatus::Idle
        }
    }

    /// Reserve the slot for `action` for the rest of the turn.
    pub fn mark_used(&mut self, action: ActionType) {
        self.used = Some(action);
    }

    /// Free actions need only the action phase with no movement open.
    pub fn check_free_action(&self) -> Result<(), TurnError> {
        self.require_action_phase()
    }

    /// Open a destination choice for the staged ability use.
    pub fn enter_movement(&mut self, config: MovementConfig) -> Result<(), TurnError> {
        if self.phase != Phase::Action {
            return Err(TurnError::WrongPhase { actual: self.phase });
        }
        if self.status != ActionStatus::Staged(ActionType::UseAbility) {
            return Err(TurnError::NotAbilityUse);
        }
        if self.movement.is_some() {
            return Err(TurnError::MovementPending);
        }
        self.movement = Some(config);
        Ok(())
    }

    /// Close the choice on `destination` and commit the ability use.
    pub fn choose_destination(&mut self, destination: SystemId) -> Result<MovementConfig, TurnError> {
        let config = self.movement.as_ref().ok_or(TurnError::NoMovement)?;
        if !config.destinations.contains(&destination) {
            return Err(TurnError::NotADestination(destination));
        }
        let config = self.movement.take().ok_or(TurnError::NoMovement)?;
        self.commit()?;
        Ok(config)
    }

    /// Abandon the choice; the ability use is canceled with it.
    pub fn cancel_movement(&mut self) -> Result<(), TurnError> {
        if self.movement.take().is_none() {
            return Err(TurnError::NoMovement);
        }
        self.status = self.settled_status();
        Ok(())
    }
}
