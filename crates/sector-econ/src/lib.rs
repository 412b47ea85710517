#![deny(warnings)]

//! Asset economy for the sector faction game.
//!
//! This crate provides validated helpers for:
//! - Buying, refitting and selling assets, with tag and tech-level gating
//! - Per-turn income, upkeep and asset-count overflow penalties
//! - Repairing assets and the faction itself
//!
//! Every helper reads the snapshot and returns a plan or a change-set; none
//! of them mutates a faction.

pub mod ledger;
pub mod purchase;

pub use ledger::{
    max_hp_for, plan_asset_repair, plan_faction_repair, turn_income, IncomeReport,
    REPAIR_COST,
};
pub use purchase::{
    controls_world, effective_tech_level, has_permission, refit_cost, sell_value,
    validate_purchase, validate_refit, validate_sale, PurchasePlan, RefitPlan, SalePlan,
};

use sector_core::{AssetDefId, AssetId, Attribute, SystemId, Tag};
use thiserror::Error;

/// Reasons an economic action is refused. The message is the reason shown
/// to the player.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EconError {
    #[error("unknown asset definition {0}")]
    UnknownDefinition(AssetDefId),
    #[error("faction owns no asset {0}")]
    UnknownAsset(AssetId),
    #[error("{0} can only be gained by expanding influence")]
    BaseOfInfluence(AssetDefId),
    #[error("insufficient FacCreds: {required} required, {available} available")]
    InsufficientCredits { required: i64, available: i64 },
    #[error("{attribute} rating {required} required, faction has {actual}")]
    RatingTooLow {
        attribute: Attribute,
        required: u8,
        actual: u8,
    },
    #[error("only factions tagged {0:?} may field this asset")]
    MissingTag(Tag),
    #[error("tech level {required} required, {system} supports {available}")]
    TechLevelTooLow {
        system: SystemId,
        required: u8,
        available: u8,
    },
    #[error("planetary government permission required on {0}")]
    PermissionRequired(SystemId),
    #[error("cannot refit a {from} asset into a {to} asset")]
    CategoryMismatch { from: Attribute, to: Attribute },
    #[error("asset is already a {0}")]
    SameDefinition(AssetDefId),
    #[error("{0} is at full strength")]
    NothingToRepair(String),
}
