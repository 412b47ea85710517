//! Change-sets: the only way a resolver expresses what should happen.
//!
//! Resolvers never touch the snapshot they read. They return a [`ChangeSet`]
//! and the owner of the snapshot applies it as one atomic update.

use crate::model::{AssetDefId, AssetId, AssetInstance, Campaign, FactionId, SystemId};
use serde::{Deserialize, Serialize};

/// One intended mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    AdjustCredits {
        faction: FactionId,
        delta: i64,
    },
    DamageAsset {
        faction: FactionId,
        asset: AssetId,
        amount: i32,
    },
    DamageFaction {
        faction: FactionId,
        amount: i32,
    },
    RepairAsset {
        faction: FactionId,
        asset: AssetId,
        amount: i32,
    },
    RepairFaction {
        faction: FactionId,
        amount: i32,
    },
    DestroyAsset {
        faction: FactionId,
        asset: AssetId,
    },
    CreateAsset {
        faction: FactionId,
        asset: AssetInstance,
    },
    RefitAsset {
        faction: FactionId,
        asset: AssetId,
        def: AssetDefId,
        max_hp: i32,
        turn: u32,
    },
    MoveAsset {
        faction: FactionId,
        asset: AssetId,
        to: SystemId,
    },
    SetStealth {
        faction: FactionId,
        asset: AssetId,
        stealthed: bool,
    },
    SetCampaign {
        faction: FactionId,
        campaign: Option<Campaign>,
    },
    SetHomeworld {
        faction: FactionId,
        system: SystemId,
    },
    SetGovernment {
        system: SystemId,
        faction: Option<FactionId>,
    },
}

/// An ordered batch of changes applied together or not at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn extend(&mut self, other: ChangeSet) {
        self.changes.extend(other.changes);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Net FacCred movement for one faction.
    pub fn credit_delta(&self, faction: FactionId) -> i64 {
        self.changes
            .iter()
            .map(|c| match c {
                Change::AdjustCredits { faction: f, delta } if *f == faction => *delta,
                _ => 0,
            })
            .sum()
    }

    /// Assets this batch destroys.
    pub fn destroyed(&self) -> impl Iterator<Item = (FactionId, AssetId)> + '_ {
        self.changes.iter().filter_map(|c| match *c {
            Change::DestroyAsset { faction, asset } => Some((faction, asset)),
            _ => None,
        })
    }
}

impl From<Vec<Change>> for ChangeSet {
    fn from(changes: Vec<Change>) -> Self {
        Self { changes }
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
