#![deny(warnings)]

//! YAML loading for the asset catalog and game scenarios.
//!
//! The catalog ships as data in `assets/catalog/assets.yaml` and is compiled
//! into the crate; a scenario names the sector, the starting factions and the
//! game configuration.

use sector_core::{
    validate_factions, AssetDefId, AssetDefinition, AssetId, AssetInstance, Attributes, Catalog,
    CatalogError, Faction, FactionId, GameConfig, Sector, StarSystem, SystemId, Tag,
    ValidationError,
};
use sector_econ::max_hp_for;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Catalog file layout this loader understands.
pub const SCHEMA_VERSION: u32 = 1;

const BUILTIN_CATALOG: &str = include_str!("../../../assets/catalog/assets.yaml");

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid yaml: {0}")]
    Yaml(String),
    #[error("catalog schema version {found} is not supported")]
    Schema { found: u32 },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("faction {faction} starts with unknown asset {def}")]
    UnknownStartingAsset { faction: String, def: AssetDefId },
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        LoadError::Yaml(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    schema_version: u32,
    assets: Vec<AssetDefinition>,
}

pub fn parse_catalog(text: &str) -> Result<Catalog, LoadError> {
    let file: CatalogFile = serde_yaml::from_str(text)?;
    if file.schema_version != SCHEMA_VERSION {
        return Err(LoadError::Schema {
            found: file.schema_version,
        });
    }
    let catalog = Catalog::new(file.assets)?;
    debug!(assets = catalog.len(), "catalog parsed");
    Ok(catalog)
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, LoadError> {
    let text = fs::read_to_string(path.as_ref())?;
    let catalog = parse_catalog(&text)?;
    info!(path = %path.as_ref().display(), assets = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// The catalog bundled with the game.
pub fn default_catalog() -> Result<Catalog, LoadError> {
    parse_catalog(BUILTIN_CATALOG)
}

/// A starting asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSeed {
    pub def: AssetDefId,
    pub location: SystemId,
}

/// A faction as written in a scenario; hit points and ids are derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionSeed {
    pub name: String,
    pub force: u8,
    pub cunning: u8,
    pub wealth: u8,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    pub homeworld: SystemId,
    #[serde(default)]
    pub assets: Vec<AssetSeed>,
}

/// A playable setup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub config: GameConfig,
    pub systems: Vec<StarSystem>,
    pub factions: Vec<FactionSeed>,
}

impl Scenario {
    /// Build the sector and the starting roster.
    ///
    /// Factions are numbered from 1 in file order. Each starts at full hit
    /// points with a Base of Influence on its homeworld whose hit points
    /// equal the faction's own.
    pub fn build(&self, catalog: &Catalog) -> Result<(Sector, Vec<Faction>), LoadError> {
        let sector = Sector::new(self.systems.clone())?;
        let base = catalog.base_of_influence();
        let mut next_asset = 1u64;
        let mut factions = Vec::with_capacity(self.factions.len());
        for (idx, seed) in (1u32..).zip(&self.factions) {
            let mut attributes = Attributes {
                force: seed.force,
                cunning: seed.cunning,
                wealth: seed.wealth,
                hp: 0,
                max_hp: 0,
            };
            attributes.max_hp = max_hp_for(&attributes);
            attributes.hp = attributes.max_hp;

            let mut assets = vec![AssetInstance {
                id: AssetId(next_asset),
                def: base.id.clone(),
                location: seed.homeworld,
                hp: attributes.max_hp,
                max_hp: attributes.max_hp,
                stealthed: false,
                purchased_turn: 0,
                refitted_turn: None,
            }];
            next_asset += 1;
            for a in &seed.assets {
                let def = catalog
                    .get(&a.def)
                    .ok_or_else(|| LoadError::UnknownStartingAsset {
                        faction: seed.name.clone(),
                        def: a.def.clone(),
                    })?;
                assets.push(AssetInstance {
                    id: AssetId(next_asset),
                    def: def.id.clone(),
                    location: a.location,
                    hp: def.hp,
                    max_hp: def.hp,
                    stealthed: def.flags.stealth_on_purchase,
                    purchased_turn: 0,
                    refitted_turn: None,
                });
                next_asset += 1;
            }
            factions.push(Faction {
                id: FactionId(idx),
                name: seed.name.clone(),
                attributes,
                credits: seed.credits,
                xp: 0,
                tags: seed.tags.clone(),
                assets,
                homeworld: seed.homeworld,
                campaign: None,
            });
        }
        validate_factions(&factions, &sector, catalog)?;
        Ok((sector, factions))
    }
}

pub fn parse_scenario(text: &str) -> Result<Scenario, LoadError> {
    Ok(serde_yaml::from_str(text)?)
}

pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, LoadError> {
    let text = fs::read_to_string(path.as_ref())?;
    let scenario = parse_scenario(&text)?;
    info!(
        path = %path.as_ref().display(),
        name = %scenario.name,
        factions = scenario.factions.len(),
        "scenario loaded"
    );
    Ok(scenario)
}
