//! Static asset definitions and the catalog that indexes them.

use crate::ability::AbilityKind;
use crate::dice::DiceExpr;
use crate::model::{AssetDefId, Attribute};
use crate::tags::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// How an asset attacks: which ratings are opposed and the damage dealt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPattern {
    pub attacker: Attribute,
    pub defender: Attribute,
    pub damage: DiceExpr,
}

/// Marker flags on a definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetFlags {
    /// The asset has an ability usable as an action.
    pub has_action: bool,
    /// The asset has a passive special rule.
    pub has_special: bool,
    /// Requires planetary-government permission on the target world.
    pub requires_permission: bool,
    /// A territory claim; losing every one eliminates the faction.
    pub base_of_influence: bool,
    /// Enters play stealthed.
    pub stealth_on_purchase: bool,
}

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub id: AssetDefId,
    pub name: String,
    pub category: Attribute,
    pub cost: i64,
    /// Minimum rating in `category` needed to buy it.
    pub rating: u8,
    pub tech_level: u8,
    pub hp: i32,
    #[serde(default)]
    pub attack: Option<AttackPattern>,
    /// Counterattack damage; `none` means the asset never strikes back.
    #[serde(default)]
    pub counter: Option<DiceExpr>,
    #[serde(default)]
    pub flags: AssetFlags,
    /// Only factions with this tag may buy it.
    #[serde(default)]
    pub required_tag: Option<Tag>,
    /// FacCreds owed every turn.
    #[serde(default)]
    pub upkeep: i64,
    #[serde(default)]
    pub ability: Option<AbilityKind>,
}

impl AssetDefinition {
    pub fn is_base_of_influence(&self) -> bool {
        self.flags.base_of_influence
    }

    /// Counter damage, treating an absent pattern like `none`.
    pub fn counter_damage(&self) -> Option<&DiceExpr> {
        self.counter.as_ref().filter(|c| !c.is_zero())
    }
}

/// Problems found while assembling a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate asset definition: {0}")]
    Duplicate(AssetDefId),
    #[error("catalog has no base of influence definition")]
    MissingBaseOfInfluence,
    #[error("asset {0} has an ability but is not flagged has_action")]
    AbilityWithoutAction(AssetDefId),
    #[error("asset {0} must cost at least 1 and have positive hp")]
    NonPositiveStats(AssetDefId),
    #[error("asset {0} rating {1} exceeds the attribute cap")]
    RatingOutOfRange(AssetDefId, u8),
}

/// Every asset definition in play, built once and shared by reference.
#[derive(Clone, Debug)]
pub struct Catalog {
    assets: BTreeMap<AssetDefId, AssetDefinition>,
    base_of_influence: AssetDefId,
}

impl Catalog {
    pub fn new(defs: Vec<AssetDefinition>) -> Result<Self, CatalogError> {
        let mut assets = BTreeMap::new();
        let mut base = None;
        for d in defs {
            if d.cost < 1 || d.hp < 1 {
                return Err(CatalogError::NonPositiveStats(d.id));
            }
            if d.rating > crate::model::MAX_RATING {
                return Err(CatalogError::RatingOutOfRange(d.id, d.rating));
            }
            if d.ability.is_some() && !d.flags.has_action {
                return Err(CatalogError::AbilityWithoutAction(d.id));
            }
            if d.is_base_of_influence() && base.is_none() {
                base = Some(d.id.clone());
            }
            let id = d.id.clone();
            if assets.insert(id.clone(), d).is_some() {
                return Err(CatalogError::Duplicate(id));
            }
        }
        let base_of_influence = base.ok_or(CatalogError::MissingBaseOfInfluence)?;
        Ok(Self {
            assets,
            base_of_influence,
        })
    }

    pub fn get(&self, id: &AssetDefId) -> Option<&AssetDefinition> {
        self.assets.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetDefinition> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Definition used when a faction expands its influence.
    pub fn base_of_influence(&self) -> &AssetDefinition {
        // Presence checked in `new`.
        &self.assets[&self.base_of_influence]
    }

    /// Whether `id` names a territory claim. Unknown ids are not claims.
    pub fn is_base_of_influence(&self, id: &AssetDefId) -> bool {
        self.get(id).is_some_and(AssetDefinition::is_base_of_influence)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn def(id: &str, category: Attribute, cost: i64, rating: u8, tl: u8, hp: i32) -> AssetDefinition {
        AssetDefinition {
            id: AssetDefId::new(id),
            name: id.to_string(),
            category,
            cost,
            rating,
            tech_level: tl,
            hp,
            attack: None,
            counter: None,
            flags: AssetFlags::default(),
            required_tag: None,
            upkeep: 0,
            ability: None,
        }
    }

    pub fn base() -> AssetDefinition {
        let mut d = def("base_of_influence", Attribute::Cunning, 1, 0, 0, 1);
        d.flags.base_of_influence = true;
        d
    }
}
