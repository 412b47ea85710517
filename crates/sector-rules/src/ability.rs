//! Special abilities of assets.
//!
//! [`execute`] dispatches over [`AbilityKind`] and reports what the ability
//! would do. Movement abilities only open a destination choice; the move
//! itself is priced and emitted by [`resolve_movement`].

use crate::error::RuleError;
use sector_core::movement::reachable;
use sector_core::{
    AbilityKind, AssetDefId, AssetId, BracketOutcome, Catalog, Change, ChangeSet, DiceExpr,
    DieRoller, Faction, MoveScope, Sector, SystemId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// An open movement choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Asset whose ability opened the choice.
    pub source: AssetId,
    pub origin: SystemId,
    pub range: u32,
    pub cost_per_asset: i64,
    pub limit: Option<u32>,
    pub destinations: BTreeSet<SystemId>,
    pub movable: BTreeSet<AssetId>,
}

/// Outcome of running an ability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityResult {
    pub asset: AssetId,
    pub def: AssetDefId,
    pub success: bool,
    pub message: String,
    pub credits_gained: i64,
    pub credits_lost: i64,
    /// Whether using the ability spends the turn's action slot.
    pub requires_action: bool,
    pub movement: Option<MovementConfig>,
    /// The asset was lost as a result.
    pub destroy: bool,
    /// The die result an economic roll came up with.
    pub rolled: Option<i64>,
    pub changes: ChangeSet,
}

impl AbilityResult {
    fn failed(asset: AssetId, def: AssetDefId, message: impl Into<String>) -> Self {
        Self {
            asset,
            def,
            success: false,
            message: message.into(),
            credits_gained: 0,
            credits_lost: 0,
            requires_action: false,
            movement: None,
            destroy: false,
            rolled: None,
            changes: ChangeSet::new(),
        }
    }

    fn ok(asset: AssetId, def: AssetDefId, message: impl Into<String>, requires_action: bool) -> Self {
        Self {
            success: true,
            requires_action,
            ..Self::failed(asset, def, message)
        }
    }

    pub fn is_movement(&self) -> bool {
        self.movement.is_some()
    }
}

/// The ability carried by `def`, if any.
pub fn ability_of<'a>(catalog: &'a Catalog, def: &AssetDefId) -> Option<&'a AbilityKind> {
    catalog.get(def).and_then(|d| d.ability.as_ref())
}

/// Run the ability of `asset_id`.
///
/// Unknown assets and unready assets are refused. Assets with no ability,
/// or one without rules support, report `success = false` and change
/// nothing.
pub fn execute<D: DieRoller + ?Sized>(
    dice: &mut D,
    catalog: &Catalog,
    sector: &Sector,
    faction: &Faction,
    asset_id: AssetId,
    turn: u32,
) -> Result<AbilityResult, RuleError> {
    let asset = faction.asset(asset_id).ok_or(RuleError::UnknownAsset {
        faction: faction.id,
        asset: asset_id,
    })?;
    let def = catalog
        .get(&asset.def)
        .ok_or_else(|| RuleError::UnknownDefinition(asset.def.clone()))?;
    let Some(kind) = def.ability.as_ref() else {
        return Ok(AbilityResult::failed(
            asset_id,
            def.id.clone(),
            format!("{} has no special ability", def.name),
        ));
    };
    if !asset.is_ready(turn) {
        return Err(RuleError::NotReady {
            asset: asset_id,
            ready_on: asset.acquired_turn() + 1,
        });
    }

    let mut result = match kind {
        AbilityKind::EconomicRoll { die, brackets } => {
            let roll = die.roll(dice);
            let mut result = AbilityResult::ok(asset_id, def.id.clone(), "", true);
            result.rolled = Some(roll);
            let outcome = brackets
                .iter()
                .find(|b| b.contains(roll))
                .map_or(&BracketOutcome::Nothing, |b| &b.outcome);
            match outcome {
                BracketOutcome::Gain { amount } => {
                    let gain = roll_amount(dice, amount);
                    result.credits_gained = gain;
                    result.message = format!("rolled {roll}: gained {gain} FacCreds");
                }
                BracketOutcome::Lose { amount } => {
                    let loss = roll_amount(dice, amount).min(faction.credits);
                    result.credits_lost = loss;
                    result.message = format!("rolled {roll}: lost {loss} FacCreds");
                }
                BracketOutcome::PayOrDestroy { amount } => {
                    if faction.credits >= *amount {
                        result.credits_lost = *amount;
                        result.message = format!("rolled {roll}: paid {amount} FacCreds");
                    } else {
                        result.destroy = true;
                        result.message =
                            format!("rolled {roll}: could not pay {amount}, {} is lost", def.name);
                    }
                }
                BracketOutcome::Destroy => {
                    result.destroy = true;
                    result.message = format!("rolled {roll}: {} is lost", def.name);
                }
                BracketOutcome::Nothing => {
                    result.message = format!("rolled {roll}: nothing happens");
                }
            }
            result
        }
        AbilityKind::Relocate {
            range,
            cost_per_asset,
            scope,
        } => {
            let movable: BTreeSet<AssetId> = match scope {
                MoveScope::SelfOnly => BTreeSet::from([asset_id]),
                MoveScope::CoLocated { category, .. } => faction
                    .assets_at(asset.location)
                    .filter(|a| {
                        catalog.get(&a.def).is_some_and(|d| {
                            !d.is_base_of_influence()
                                && category.map_or(true, |c| c == d.category)
                        })
                    })
                    .map(|a| a.id)
                    .collect(),
            };
            let limit = match scope {
                MoveScope::SelfOnly => Some(1),
                MoveScope::CoLocated { limit, .. } => *limit,
            };
            let destinations = reachable(sector, asset.location, *range);
            let mut result = AbilityResult::ok(
                asset_id,
                def.id.clone(),
                format!("choose a destination within {range} hops"),
                true,
            );
            result.movement = Some(MovementConfig {
                source: asset_id,
                origin: asset.location,
                range: *range,
                cost_per_asset: *cost_per_asset,
                limit,
                destinations,
                movable,
            });
            result
        }
        AbilityKind::GoToGround { cost } => {
            if asset.stealthed {
                return Ok(AbilityResult::failed(
                    asset_id,
                    def.id.clone(),
                    format!("{} is already stealthed", def.name),
                ));
            }
            require_credits(faction, *cost)?;
            let mut result =
                AbilityResult::ok(asset_id, def.id.clone(), format!("{} goes to ground", def.name), false);
            result.credits_lost = *cost;
            result.changes.push(Change::SetStealth {
                faction: faction.id,
                asset: asset_id,
                stealthed: true,
            });
            result
        }
        AbilityKind::FieldRepair { heal, cost } => {
            let damaged: Vec<_> = faction
                .assets_at(asset.location)
                .filter(|a| a.is_damaged())
                .collect();
            if damaged.is_empty() {
                return Ok(AbilityResult::failed(
                    asset_id,
                    def.id.clone(),
                    "no damaged assets to repair here",
                ));
            }
            require_credits(faction, *cost)?;
            let mut result = AbilityResult::ok(
                asset_id,
                def.id.clone(),
                format!("repaired {} assets", damaged.len()),
                false,
            );
            result.credits_lost = *cost;
            for a in damaged {
                let amount = roll_amount(dice, heal).min(i64::from(a.max_hp - a.hp));
                if amount > 0 {
                    result.changes.push(Change::RepairAsset {
                        faction: faction.id,
                        asset: a.id,
                        amount: amount as i32,
                    });
                }
            }
            result
        }
        AbilityKind::Unimplemented { note } => {
            debug!(def = %def.id, %note, "ability without rules support");
            return Ok(AbilityResult::failed(
                asset_id,
                def.id.clone(),
                format!("{} is not yet supported: {note}", def.name),
            ));
        }
    };

    let net = result.credits_gained - result.credits_lost;
    if net != 0 {
        result.changes.push(Change::AdjustCredits {
            faction: faction.id,
            delta: net,
        });
    }
    if result.destroy {
        result.changes.push(Change::DestroyAsset {
            faction: faction.id,
            asset: asset_id,
        });
    }
    info!(
        faction = %faction.name,
        asset = %def.name,
        message = %result.message,
        "ability used"
    );
    Ok(result)
}

fn roll_amount<D: DieRoller + ?Sized>(dice: &mut D, expr: &DiceExpr) -> i64 {
    expr.roll(dice).max(0)
}

fn require_credits(faction: &Faction, required: i64) -> Result<(), RuleError> {
    if faction.credits < required {
        return Err(RuleError::InsufficientCredits {
            required,
            available: faction.credits,
        });
    }
    Ok(())
}

/// Move `assets` to `destination` under an open movement choice.
pub fn resolve_movement(
    config: &MovementConfig,
    faction: &Faction,
    destination: SystemId,
    assets: &[AssetId],
) -> Result<ChangeSet, RuleError> {
    if !config.destinations.contains(&destination) {
        return Err(RuleError::OutOfRange(destination));
    }
    let chosen: BTreeSet<AssetId> = assets.iter().copied().collect();
    if chosen.is_empty() {
        return Err(RuleError::NothingToMove);
    }
    if let Some(limit) = config.limit {
        if chosen.len() > limit as usize {
            return Err(RuleError::TooManyAssets(limit));
        }
    }
    if let Some(bad) = chosen.iter().find(|a| !config.movable.contains(a)) {
        return Err(RuleError::NotMovable(*bad));
    }
    let cost = config.cost_per_asset * chosen.len() as i64;
    require_credits(faction, cost)?;

    let mut set = ChangeSet::new();
    if cost > 0 {
        set.push(Change::AdjustCredits {
            faction: faction.id,
            delta: -cost,
        });
    }
    for asset in chosen {
        set.push(Change::MoveAsset {
            faction: faction.id,
            asset,
            to: destination,
        });
    }
    Ok(set)
}
