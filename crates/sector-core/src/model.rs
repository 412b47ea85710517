//! Factions, asset instances and the identifiers that tie them together.

use crate::tags::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a faction in the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

/// Identifier of a star system in the sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SystemId(pub u32);

/// Identifier of an owned asset instance, unique across all factions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Catalog key of an asset definition, e.g. "strike_fleet".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetDefId(pub String);

impl AssetDefId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

impl fmt::Display for AssetDefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three faction ratings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Force,
    Cunning,
    Wealth,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Force, Attribute::Cunning, Attribute::Wealth];
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Force => "Force",
            Attribute::Cunning => "Cunning",
            Attribute::Wealth => "Wealth",
        })
    }
}

/// Highest rating an attribute can reach.
pub const MAX_RATING: u8 = 8;

/// Faction ratings and hit points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub force: u8,
    pub cunning: u8,
    pub wealth: u8,
    pub hp: i32,
    pub max_hp: i32,
}

impl Attributes {
    /// Rating for a given attribute.
    pub fn rating(&self, attribute: Attribute) -> u8 {
        match attribute {
            Attribute::Force => self.force,
            Attribute::Cunning => self.cunning,
            Attribute::Wealth => self.wealth,
        }
    }

    /// Highest of the three ratings.
    pub fn highest(&self) -> u8 {
        self.force.max(self.cunning).max(self.wealth)
    }

    /// Lowest of the three ratings.
    pub fn lowest(&self) -> u8 {
        self.force.min(self.cunning).min(self.wealth)
    }
}

/// An asset owned by a faction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInstance {
    pub id: AssetId,
    pub def: AssetDefId,
    pub location: SystemId,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub stealthed: bool,
    /// Turn the asset was bought on.
    pub purchased_turn: u32,
    /// Turn the asset was last refitted on, if ever.
    #[serde(default)]
    pub refitted_turn: Option<u32>,
}

impl AssetInstance {
    /// Most recent turn the asset changed hands or shape.
    pub fn acquired_turn(&self) -> u32 {
        self.refitted_turn
            .map_or(self.purchased_turn, |t| t.max(self.purchased_turn))
    }

    /// Whether the asset may attack, counterattack or use abilities on `turn`.
    pub fn is_ready(&self, turn: u32) -> bool {
        self.acquired_turn() < turn
    }

    pub fn is_damaged(&self) -> bool {
        self.hp < self.max_hp
    }
}

/// A multi-turn undertaking that monopolises a faction's action slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Campaign {
    /// Holding a world by force until its government falls.
    Seizure { system: SystemId, turns_held: u32 },
    /// Relocating the faction homeworld.
    HomeworldTransition {
        target: SystemId,
        turns_remaining: u32,
    },
}

impl Campaign {
    pub fn system(&self) -> SystemId {
        match *self {
            Campaign::Seizure { system, .. } => system,
            Campaign::HomeworldTransition { target, .. } => target,
        }
    }
}

/// A faction and everything it owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub attributes: Attributes,
    /// Spendable FacCreds.
    pub credits: i64,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    #[serde(default)]
    pub assets: Vec<AssetInstance>,
    pub homeworld: SystemId,
    #[serde(default)]
    pub campaign: Option<Campaign>,
}

impl Faction {
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn rating(&self, attribute: Attribute) -> u8 {
        self.attributes.rating(attribute)
    }

    pub fn asset(&self, id: AssetId) -> Option<&AssetInstance> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn asset_mut(&mut self, id: AssetId) -> Option<&mut AssetInstance> {
        self.assets.iter_mut().find(|a| a.id == id)
    }

    /// Assets located in `system`, in ownership order.
    pub fn assets_at(&self, system: SystemId) -> impl Iterator<Item = &AssetInstance> {
        self.assets.iter().filter(move |a| a.location == system)
    }

    pub fn has_presence_at(&self, system: SystemId) -> bool {
        self.assets_at(system).next().is_some()
    }
}

/// Look up a faction in a roster slice.
pub fn find_faction(factions: &[Faction], id: FactionId) -> Option<&Faction> {
    factions.iter().find(|f| f.id == id)
}
