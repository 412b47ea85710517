//! Applying change-sets to the game snapshot.

use sector_core::{AssetId, Change, ChangeSet, Faction, FactionId, Sector, SystemId};
use thiserror::Error;
use tracing::trace;

/// A change-set that does not fit the snapshot. Nothing is applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("change names unknown faction {0}")]
    UnknownFaction(FactionId),
    #[error("change names unknown asset {asset} of {faction}")]
    UnknownAsset { faction: FactionId, asset: AssetId },
    #[error("change names unknown system {0}")]
    UnknownSystem(SystemId),
    #[error("asset id {0} is already in use")]
    DuplicateAsset(AssetId),
    #[error("change would leave {0} with a negative balance")]
    Overdrawn(FactionId),
}

/// Apply `set` to copies of the snapshot and swap them in only when every
/// change applied.
pub fn apply_atomic(
    factions: &mut Vec<Faction>,
    sector: &mut Sector,
    set: &ChangeSet,
) -> Result<(), ApplyError> {
    if set.is_empty() {
        return Ok(());
    }
    let mut next_factions = factions.clone();
    let mut next_sector = sector.clone();
    for change in set.iter() {
        apply_one(&mut next_factions, &mut next_sector, change)?;
    }
    *factions = next_factions;
    *sector = next_sector;
    Ok(())
}

fn faction_mut(factions: &mut [Faction], id: FactionId) -> Result<&mut Faction, ApplyError> {
    factions
        .iter_mut()
        .find(|f| f.id == id)
        .ok_or(ApplyError::UnknownFaction(id))
}

fn apply_one(factions: &mut [Faction], sector: &mut Sector, change: &Change) -> Result<(), ApplyError> {
    trace!(?change, "applying");
    let missing = |faction: FactionId, asset: AssetId| ApplyError::UnknownAsset { faction, asset };
    match change {
        Change::AdjustCredits { faction, delta } => {
            let f = faction_mut(factions, *faction)?;
            f.credits += delta;
            if f.credits < 0 {
                return Err(ApplyError::Overdrawn(*faction));
            }
        }
        Change::DamageAsset {
            faction,
            asset,
            amount,
        } => {
            let a = faction_mut(factions, *faction)?
                .asset_mut(*asset)
                .ok_or_else(|| missing(*faction, *asset))?;
            a.hp = (a.hp - amount).max(0);
        }
        Change::DamageFaction { faction, amount } => {
            let attrs = &mut faction_mut(factions, *faction)?.attributes;
            attrs.hp = (attrs.hp - amount).max(0);
        }
        Change::RepairAsset {
            faction,
            asset,
            amount,
        } => {
            let a = faction_mut(factions, *faction)?
                .asset_mut(*asset)
                .ok_or_else(|| missing(*faction, *asset))?;
            a.hp = (a.hp + amount).min(a.max_hp);
        }
        Change::RepairFaction { faction, amount } => {
            let attrs = &mut faction_mut(factions, *faction)?.attributes;
            attrs.hp = (attrs.hp + amount).min(attrs.max_hp);
        }
        Change::DestroyAsset { faction, asset } => {
            let f = faction_mut(factions, *faction)?;
            let before = f.assets.len();
            f.assets.retain(|a| a.id != *asset);
            if f.assets.len() == before {
                return Err(missing(*faction, *asset));
            }
        }
        Change::CreateAsset { faction, asset } => {
            if !sector.contains(asset.location) {
                return Err(ApplyError::UnknownSystem(asset.location));
            }
            if factions.iter().any(|f| f.asset(asset.id).is_some()) {
                return Err(ApplyError::DuplicateAsset(asset.id));
            }
            faction_mut(factions, *faction)?.assets.push(asset.clone());
        }
        Change::RefitAsset {
            faction,
            asset,
            def,
            max_hp,
            turn,
        } => {
            let a = faction_mut(factions, *faction)?
                .asset_mut(*asset)
                .ok_or_else(|| missing(*faction, *asset))?;
            // Damage carries over into the new frame.
            let damage = a.max_hp - a.hp;
            a.def = def.clone();
            a.max_hp = *max_hp;
            a.hp = (max_hp - damage).max(1);
            a.refitted_turn = Some(*turn);
        }
        Change::MoveAsset { faction, asset, to } => {
            if !sector.contains(*to) {
                return Err(ApplyError::UnknownSystem(*to));
            }
            let a = faction_mut(factions, *faction)?
                .asset_mut(*asset)
                .ok_or_else(|| missing(*faction, *asset))?;
            a.location = *to;
        }
        Change::SetStealth {
            faction,
            asset,
            stealthed,
        } => {
            faction_mut(factions, *faction)?
                .asset_mut(*asset)
                .ok_or_else(|| missing(*faction, *asset))?
                .stealthed = *stealthed;
        }
        Change::SetCampaign { faction, campaign } => {
            faction_mut(factions, *faction)?.campaign = campaign.clone();
        }
        Change::SetHomeworld { faction, system } => {
            if !sector.contains(*system) {
                return Err(ApplyError::UnknownSystem(*system));
            }
            faction_mut(factions, *faction)?.homeworld = *system;
        }
        Change::SetGovernment { system, faction } => {
            sector
                .system_mut(*system)
                .ok_or(ApplyError::UnknownSystem(*system))?
                .government = *faction;
        }
    }
    Ok(())
}
