#![deny(warnings)]

//! Core domain models and invariants for the sector faction game.
//!
//! This crate defines the serializable snapshot types (factions, assets,
//! the sector map, the asset catalog), dice, movement ranges and victory
//! bookkeeping, plus validation helpers that guarantee basic invariants.

pub mod ability;
pub mod catalog;
pub mod changes;
pub mod dice;
pub mod model;
pub mod movement;
pub mod sector;
pub mod tags;
pub mod victory;

pub use ability::{AbilityKind, BracketOutcome, IncomeBracket, MoveScope};
pub use catalog::{AssetDefinition, AssetFlags, AttackPattern, Catalog, CatalogError};
pub use changes::{Change, ChangeSet};
pub use dice::{DiceError, DiceExpr, DieRoller, ScriptedDice, SeededDice};
pub use model::{
    find_faction, AssetDefId, AssetId, AssetInstance, Attribute, Attributes, Campaign, Faction,
    FactionId, SystemId, MAX_RATING,
};
pub use movement::{reachable, DEFAULT_MOVE_RANGE};
pub use sector::{HexCoord, Sector, StarSystem};
pub use tags::{RollModifiers, RollPurpose, Tag};
pub use victory::{check_victory, is_eliminated, VictoryState};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Game configuration parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the dice stream.
    pub rng_seed: u64,
    /// Rounds to play before the game is called without a victor.
    pub max_turns: u32,
    /// Consecutive turns a seizure must hold before the world falls.
    pub seizure_turns: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            max_turns: 50,
            seizure_turns: 3,
        }
    }
}

/// Validation errors for snapshot invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate system id {0}")]
    DuplicateSystem(SystemId),
    #[error("two systems share hex {0}")]
    DuplicateHex(HexCoord),
    #[error("unknown system {0}")]
    UnknownSystem(SystemId),
    #[error("system {0} tech level {1} is outside 0..=5")]
    TechLevelOutOfRange(SystemId, u8),
    #[error("duplicate faction id {0}")]
    DuplicateFaction(FactionId),
    #[error("duplicate asset id {0}")]
    DuplicateAsset(AssetId),
    #[error("faction {0} has a rating above the cap")]
    RatingOutOfRange(FactionId),
    #[error("faction {0} hit points outside 0..=max")]
    InvalidHitPoints(FactionId),
    #[error("negative FacCred balance for {0}")]
    NegativeCredits(FactionId),
    #[error("asset {0} refers to unknown definition {1}")]
    UnknownDefinition(AssetId, AssetDefId),
    #[error("asset {0} hit points outside 1..=max")]
    InvalidAssetHp(AssetId),
}

/// Validate a faction roster against the sector and catalog.
pub fn validate_factions(
    factions: &[Faction],
    sector: &Sector,
    catalog: &Catalog,
) -> Result<(), ValidationError> {
    let mut faction_ids = BTreeSet::new();
    let mut asset_ids = BTreeSet::new();
    for f in factions {
        if !faction_ids.insert(f.id) {
            return Err(ValidationError::DuplicateFaction(f.id));
        }
        let a = &f.attributes;
        if a.force > MAX_RATING || a.cunning > MAX_RATING || a.wealth > MAX_RATING {
            return Err(ValidationError::RatingOutOfRange(f.id));
        }
        if a.hp < 0 || a.hp > a.max_hp {
            return Err(ValidationError::InvalidHitPoints(f.id));
        }
        if f.credits < 0 {
            return Err(ValidationError::NegativeCredits(f.id));
        }
        if !sector.contains(f.homeworld) {
            return Err(ValidationError::UnknownSystem(f.homeworld));
        }
        for asset in &f.assets {
            if !asset_ids.insert(asset.id) {
                return Err(ValidationError::DuplicateAsset(asset.id));
            }
            if catalog.get(&asset.def).is_none() {
                return Err(ValidationError::UnknownDefinition(
                    asset.id,
                    asset.def.clone(),
                ));
            }
            if !sector.contains(asset.location) {
                return Err(ValidationError::UnknownSystem(asset.location));
            }
            if asset.hp < 1 || asset.hp > asset.max_hp {
                return Err(ValidationError::InvalidAssetHp(asset.id));
            }
        }
    }
    Ok(())
}
