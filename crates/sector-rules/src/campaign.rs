//! Multi-turn campaigns: seizing a world and moving the homeworld.

use crate::error::RuleError;
use sector_core::{
    find_faction, Campaign, Catalog, Change, ChangeSet, Faction, FactionId, Sector, SystemId,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where a campaign stands after a News phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignProgress {
    Continuing,
    Completed,
    /// The conditions broke and the campaign ended without result.
    Lapsed,
}

fn faction_of(factions: &[Faction], id: FactionId) -> Result<&Faction, RuleError> {
    find_faction(factions, id).ok_or(RuleError::UnknownFaction(id))
}

/// A faction can hold a world by force while it has a visible asset able
/// to fight there and every rival asset on the world is hidden.
pub fn can_hold(catalog: &Catalog, factions: &[Faction], faction: FactionId, system: SystemId) -> bool {
    let fighting = factions
        .iter()
        .filter(|f| f.id == faction)
        .flat_map(|f| f.assets_at(system))
        .any(|a| {
            !a.stealthed && catalog.get(&a.def).is_some_and(|d| d.attack.is_some())
        });
    let contested = factions
        .iter()
        .filter(|f| f.id != faction)
        .flat_map(|f| f.assets_at(system))
        .any(|a| !a.stealthed);
    fighting && !contested
}

pub fn begin_seizure(
    catalog: &Catalog,
    sector: &Sector,
    factions: &[Faction],
    faction: FactionId,
    system: SystemId,
) -> Result<ChangeSet, RuleError> {
    let f = faction_of(factions, faction)?;
    let world = sector.system(system).ok_or(RuleError::UnknownSystem(system))?;
    if f.campaign.is_some() {
        return Err(RuleError::CampaignActive);
    }
    if world.government == Some(faction) {
        return Err(RuleError::AlreadyGoverned(system));
    }
    if !can_hold(catalog, factions, faction, system) {
        return Err(RuleError::SeizureBlocked(system));
    }
    info!(faction = %f.name, world = %world.name, "seizure begun");
    Ok(ChangeSet::from(vec![Change::SetCampaign {
        faction,
        campaign: Some(Campaign::Seizure {
            system,
            turns_held: 0,
        }),
    }]))
}

fn has_base_on(catalog: &Catalog, faction: &Faction, system: SystemId) -> bool {
    faction
        .assets_at(system)
        .any(|a| catalog.is_base_of_influence(&a.def))
}

/// Start moving the homeworld to `target`. Takes one turn per hex of
/// distance, and at least one.
pub fn begin_homeworld_transition(
    catalog: &Catalog,
    sector: &Sector,
    faction: &Faction,
    target: SystemId,
) -> Result<ChangeSet, RuleError> {
    if faction.campaign.is_some() {
        return Err(RuleError::CampaignActive);
    }
    if target == faction.homeworld {
        return Err(RuleError::AlreadyHome(target));
    }
    let distance = sector
        .hex_distance(faction.homeworld, target)
        .ok_or(RuleError::UnknownSystem(target))?;
    if !has_base_on(catalog, faction, target) {
        return Err(RuleError::NoBaseOnTarget(target));
    }
    info!(faction = %faction.name, %target, distance, "homeworld transition begun");
    Ok(ChangeSet::from(vec![Change::SetCampaign {
        faction: faction.id,
        campaign: Some(Campaign::HomeworldTransition {
            target,
            turns_remaining: distance.max(1),
        }),
    }]))
}

/// Move the faction's campaign on by one turn.
pub fn advance_campaign(
    catalog: &Catalog,
    factions: &[Faction],
    faction: FactionId,
    seizure_turns: u32,
) -> Result<(CampaignProgress, ChangeSet), RuleError> {
    let f = faction_of(factions, faction)?;
    let campaign = f.campaign.as_ref().ok_or(RuleError::NoCampaign)?;
    let mut set = ChangeSet::new();
    let progress = match *campaign {
        Campaign::Seizure { system, turns_held } => {
            if !can_hold(catalog, factions, faction, system) {
                CampaignProgress::Lapsed
            } else if turns_held + 1 >= seizure_turns {
                set.push(Change::SetGovernment {
                    system,
                    faction: Some(faction),
                });
                CampaignProgress::Completed
            } else {
                set.push(Change::SetCampaign {
                    faction,
                    campaign: Some(Campaign::Seizure {
                        system,
                        turns_held: turns_held + 1,
                    }),
                });
                CampaignProgress::Continuing
            }
        }
        Campaign::HomeworldTransition {
            target,
            turns_remaining,
        } => {
            if !has_base_on(catalog, f, target) {
                CampaignProgress::Lapsed
            } else if turns_remaining <= 1 {
                set.push(Change::SetHomeworld {
                    faction,
                    system: target,
                });
                CampaignProgress::Completed
            } else {
                set.push(Change::SetCampaign {
                    faction,
                    campaign: Some(Campaign::HomeworldTransition {
                        target,
                        turns_remaining: turns_remaining - 1,
                    }),
                });
                CampaignProgress::Continuing
            }
        }
    };
    if progress != CampaignProgress::Continuing {
        set.push(Change::SetCampaign {
            faction,
            campaign: None,
        });
    }
    info!(faction = %f.name, system = %campaign.system(), ?progress, "campaign advanced");
    Ok((progress, set))
}

pub fn abandon_campaign(faction: &Faction) -> Result<ChangeSet, RuleError> {
    if faction.campaign.is_none() {
        return Err(RuleError::NoCampaign);
    }
    Ok(ChangeSet::from(vec![Change::SetCampaign {
        faction: faction.id,
        campaign: None,
    }]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_core::{
        AssetDefId, AssetDefinition, AssetFlags, AssetId, AssetInstance, AttackPattern, Attribute,
        Attributes, DiceExpr, HexCoord, StarSystem,
    };

    fn def(id: &str, attack: bool, base: bool) -> AssetDefinition {
        AssetDefinition {
            id: AssetDefId::new(id),
            name: id.into(),
            category: Attribute::Force,
            cost: 3,
            rating: 1,
            tech_level: 0,
            hp: 4,
            attack: attack.then(|| AttackPattern {
                attacker: Attribute::Force,
                defender: Attribute::Force,
                damage: DiceExpr::dice(1, 4, 0),
            }),
            counter: None,
            flags: AssetFlags {
                base_of_influence: base,
                ..Default::default()
            },
            required_tag: None,
            upkeep: 0,
            ability: None,
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            def("base_of_influence", false, true),
            def("security_personnel", true, false),
            def("informers", false, false),
        ])
        .unwrap()
    }

    fn sector() -> Sector {
        let sys = |id: u32, col: i32| StarSystem {
            id: SystemId(id),
            name: format!("S{id}"),
            hex: HexCoord::new(col, 0),
            tech_level: 3,
            routes: vec![],
            government: None,
        };
        Sector::new(vec![sys(1, 0), sys(2, 3), sys(3, 1)]).unwrap()
    }

    fn asset(id: u64, def: &str, system: u32) -> AssetInstance {
        AssetInstance {
            id: AssetId(id),
            def: AssetDefId::new(def),
            location: SystemId(system),
            hp: 4,
            max_hp: 4,
            stealthed: false,
            purchased_turn: 0,
            refitted_turn: None,
        }
    }

    fn faction(id: u32, assets: Vec<AssetInstance>) -> Faction {
        Faction {
            id: FactionId(id),
            name: format!("F{id}"),
            attributes: Attributes {
                force: 3,
                cunning: 3,
                wealth: 3,
                hp: 15,
                max_hp: 15,
            },
            credits: 5,
            xp: 0,
            tags: Default::default(),
            assets,
            homeworld: SystemId(1),
            campaign: None,
        }
    }

    fn apply_campaign(f: &mut Faction, set: &ChangeSet) {
        for c in set.iter() {
            if let Change::SetCampaign { campaign, .. } = c {
                f.campaign = campaign.clone();
            }
        }
    }

    #[test]
    fn seizure_needs_a_fighter_and_no_visible_rivals() {
        let cat = catalog();
        let mut roster = vec![
            faction(1, vec![asset(1, "informers", 2)]),
            faction(2, vec![asset(2, "informers", 2)]),
        ];
        let seize = |r: &[Faction]| begin_seizure(&cat, &sector(), r, FactionId(1), SystemId(2));
        assert_eq!(seize(&roster), Err(RuleError::SeizureBlocked(SystemId(2))));
        roster[0].assets.push(asset(3, "security_personnel", 2));
        assert_eq!(seize(&roster), Err(RuleError::SeizureBlocked(SystemId(2))));
        roster[1].assets[0].stealthed = true;
        assert!(seize(&roster).is_ok());
    }

    #[test]
    fn seizure_completes_after_holding() {
        let cat = catalog();
        let mut roster = vec![faction(1, vec![asset(1, "security_personnel", 2)])];
        let set = begin_seizure(&cat, &sector(), &roster, FactionId(1), SystemId(2)).unwrap();
        apply_campaign(&mut roster[0], &set);
        for _ in 0..2 {
            let (p, set) = advance_campaign(&cat, &roster, FactionId(1), 3).unwrap();
            assert_eq!(p, CampaignProgress::Continuing);
            apply_campaign(&mut roster[0], &set);
        }
        let (p, set) = advance_campaign(&cat, &roster, FactionId(1), 3).unwrap();
        assert_eq!(p, CampaignProgress::Completed);
        assert!(set.changes.contains(&Change::SetGovernment {
            system: SystemId(2),
            faction: Some(FactionId(1))
        }));
        apply_campaign(&mut roster[0], &set);
        assert!(roster[0].campaign.is_none());
    }

    #[test]
    fn seizure_lapses_when_fighters_leave() {
        let cat = catalog();
        let mut roster = vec![faction(1, vec![asset(1, "security_personnel", 2)])];
        let set = begin_seizure(&cat, &sector(), &roster, FactionId(1), SystemId(2)).unwrap();
        apply_campaign(&mut roster[0], &set);
        roster[0].assets[0].location = SystemId(3);
        let (p, set) = advance_campaign(&cat, &roster, FactionId(1), 3).unwrap();
        assert_eq!(p, CampaignProgress::Lapsed);
        assert_eq!(
            set.changes,
            vec![Change::SetCampaign {
                faction: FactionId(1),
                campaign: None
            }]
        );
    }

    #[test]
    fn homeworld_transition_takes_distance_turns() {
        let cat = catalog();
        let mut f = faction(1, vec![asset(1, "security_personnel", 2)]);
        assert_eq!(
            begin_homeworld_transition(&cat, &sector(), &f, SystemId(2)),
            Err(RuleError::NoBaseOnTarget(SystemId(2)))
        );
        assert_eq!(
            begin_homeworld_transition(&cat, &sector(), &f, SystemId(1)),
            Err(RuleError::AlreadyHome(SystemId(1)))
        );
        f.assets.push(asset(2, "base_of_influence", 2));
        let set = begin_homeworld_transition(&cat, &sector(), &f, SystemId(2)).unwrap();
        apply_campaign(&mut f, &set);
        assert_eq!(
            f.campaign,
            Some(Campaign::HomeworldTransition {
                target: SystemId(2),
                turns_remaining: 3
            })
        );
        let mut roster = vec![f];
        let mut last = CampaignProgress::Continuing;
        let mut turns = 0;
        while last == CampaignProgress::Continuing {
            let (p, set) = advance_campaign(&cat, &roster, FactionId(1), 3).unwrap();
            apply_campaign(&mut roster[0], &set);
            last = p;
            turns += 1;
            if p == CampaignProgress::Completed {
                assert!(set.changes.contains(&Change::SetHomeworld {
                    faction: FactionId(1),
                    system: SystemId(2)
                }));
            }
        }
        assert_eq!(turns, 3);
        assert_eq!(last, CampaignProgress::Completed);
    }

    #[test]
    fn abandon() {
        let mut f = faction(1, vec![]);
        assert_eq!(abandon_campaign(&f), Err(RuleError::NoCampaign));
        f.campaign = Some(Campaign::Seizure {
            system: SystemId(2),
            turns_held: 1,
        });
        assert_eq!(abandon_campaign(&f).unwrap().len(), 1);
        assert_eq!(
            begin_seizure(&catalog(), &sector(), &[f], FactionId(1), SystemId(2)),
            Err(RuleError::CampaignActive)
        );
    }
}
