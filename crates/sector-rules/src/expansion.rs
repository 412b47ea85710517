//! Expanding influence: planting a Base of Influence on a world.

use crate::combat::{check_roll, CheckRoll};
use crate::error::RuleError;
use sector_core::tags::{self, RollPurpose};
use sector_core::{
    find_faction, AssetId, AssetInstance, Attribute, Catalog, Change, ChangeSet, DieRoller,
    Faction, FactionId, Sector, SystemId,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Price of a new claim. Each hit point costs one FacCred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionCost {
    pub cost: i64,
    pub actual_hp: i32,
}

/// Hit points are capped at the faction's own maximum.
pub fn expansion_cost(faction: &Faction, desired_hp: i32) -> Result<ExpansionCost, RuleError> {
    if desired_hp < 1 {
        return Err(RuleError::InvalidHp(desired_hp));
    }
    let actual_hp = desired_hp.min(faction.attributes.max_hp.max(1));
    Ok(ExpansionCost {
        cost: i64::from(actual_hp),
        actual_hp,
    })
}

/// A world can be claimed when the faction already has a non-claim asset
/// there and no claim of its own.
pub fn check_target(
    catalog: &Catalog,
    faction: &Faction,
    system: SystemId,
) -> Result<(), RuleError> {
    let mut present = false;
    for asset in faction.assets_at(system) {
        if catalog.is_base_of_influence(&asset.def) {
            return Err(RuleError::AlreadyClaimed(system));
        }
        present = true;
    }
    if present {
        Ok(())
    } else {
        Err(RuleError::NoPresence(system))
    }
}

/// One rival's contest roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RivalRoll {
    pub faction: FactionId,
    pub roll: CheckRoll,
    pub cunning: u8,
    pub total: i32,
    /// Entitled to an immediate free attack on the new claim.
    pub can_attack: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionReport {
    pub faction: FactionId,
    pub system: SystemId,
    pub base: AssetId,
    pub cost: ExpansionCost,
    pub roll: CheckRoll,
    pub cunning: u8,
    pub total: i32,
    pub rivals: Vec<RivalRoll>,
    /// No rival matched the expanding total.
    pub success: bool,
}

impl ExpansionReport {
    pub fn attackers(&self) -> impl Iterator<Item = FactionId> + '_ {
        self.rivals.iter().filter(|r| r.can_attack).map(|r| r.faction)
    }
}

/// Roll the expansion and return the claim to create.
///
/// The claim is created and paid for whatever the rivals roll; a rival
/// that meets the expanding total earns a free attack on it instead.
#[allow(clippy::too_many_arguments)]
pub fn resolve_expansion<D: DieRoller + ?Sized>(
    dice: &mut D,
    catalog: &Catalog,
    sector: &Sector,
    factions: &[Faction],
    expanding: FactionId,
    system: SystemId,
    desired_hp: i32,
    new_id: AssetId,
    turn: u32,
) -> Result<(ExpansionReport, ChangeSet), RuleError> {
    let faction = find_faction(factions, expanding).ok_or(RuleError::UnknownFaction(expanding))?;
    if !sector.contains(system) {
        return Err(RuleError::UnknownSystem(system));
    }
    check_target(catalog, faction, system)?;
    let cost = expansion_cost(faction, desired_hp)?;
    if faction.credits < cost.cost {
        return Err(RuleError::InsufficientCredits {
            required: cost.cost,
            available: faction.credits,
        });
    }

    let mods = tags::roll_modifiers(faction.tags.iter(), RollPurpose::Expansion);
    let roll = check_roll(dice, mods);
    let cunning = faction.rating(Attribute::Cunning);
    let total = roll.kept as i32 + i32::from(cunning);

    let mut rivals = Vec::new();
    for rival in factions
        .iter()
        .filter(|f| f.id != expanding && f.has_presence_at(system))
    {
        let rmods = tags::roll_modifiers(rival.tags.iter(), RollPurpose::ExpansionRival);
        let rroll = check_roll(dice, rmods);
        let rcunning = rival.rating(Attribute::Cunning);
        let rtotal = rroll.kept as i32 + i32::from(rcunning);
        let can_attack = if rmods.loses_ties && !mods.loses_ties {
            rtotal > total
        } else {
            rtotal >= total
        };
        rivals.push(RivalRoll {
            faction: rival.id,
            roll: rroll,
            cunning: rcunning,
            total: rtotal,
            can_attack,
        });
    }
    let success = rivals.iter().all(|r| !r.can_attack);

    let base = catalog.base_of_influence();
    let set = ChangeSet::from(vec![
        Change::AdjustCredits {
            faction: expanding,
            delta: -cost.cost,
        },
        Change::CreateAsset {
            faction: expanding,
            asset: AssetInstance {
                id: new_id,
                def: base.id.clone(),
                location: system,
                hp: cost.actual_hp,
                max_hp: cost.actual_hp,
                stealthed: false,
                purchased_turn: turn,
                refitted_turn: None,
            },
        },
    ]);
    info!(
        faction = %faction.name,
        %system,
        total,
        rivals = rivals.len(),
        success,
        "influence expanded"
    );
    let report = ExpansionReport {
        faction: expanding,
        system,
        base: new_id,
        cost,
        roll,
        cunning,
        total,
        rivals,
        success,
    };
    Ok((report, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_core::{
        AssetDefId, AssetDefinition, AssetFlags, Attributes, HexCoord, ScriptedDice, StarSystem,
        Tag,
    };

    fn def(id: &str, base: bool) -> AssetDefinition {
        AssetDefinition {
            id: AssetDefId::new(id),
            name: id.into(),
            category: Attribute::Cunning,
            cost: 2,
            rating: 1,
            tech_level: 0,
            hp: 4,
            attack: None,
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
        Catalog::new(vec![def("base_of_influence", true), def("smugglers", false)]).unwrap()
    }

    fn sector() -> Sector {
        Sector::new(
            (1..=3)
                .map(|i| StarSystem {
                    id: SystemId(i),
                    name: format!("S{i}"),
                    hex: HexCoord::new(i as i32, 0),
                    tech_level: 3,
                    routes: vec![],
                    government: None,
                })
                .collect(),
        )
        .unwrap()
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

    fn faction(id: u32, cunning: u8, assets: Vec<AssetInstance>) -> Faction {
        Faction {
            id: FactionId(id),
            name: format!("F{id}"),
            attributes: Attributes {
                force: 1,
                cunning,
                wealth: 1,
                hp: 12,
                max_hp: 12,
            },
            credits: 20,
            xp: 0,
            tags: Default::default(),
            assets,
            homeworld: SystemId(1),
            campaign: None,
        }
    }

    fn expand(dice: &mut ScriptedDice, roster: &[Faction]) -> (ExpansionReport, ChangeSet) {
        resolve_expansion(
            dice,
            &catalog(),
            &sector(),
            roster,
            FactionId(1),
            SystemId(2),
            5,
            AssetId(99),
            4,
        )
        .unwrap()
    }

    #[test]
    fn cost_caps_at_max_hp() {
        let f = faction(1, 1, vec![]);
        assert_eq!(
            expansion_cost(&f, 20).unwrap(),
            ExpansionCost {
                cost: 12,
                actual_hp: 12
            }
        );
        assert_eq!(expansion_cost(&f, 3).unwrap().cost, 3);
        assert_eq!(expansion_cost(&f, 0), Err(RuleError::InvalidHp(0)));
    }

    #[test]
    fn target_preconditions() {
        let cat = catalog();
        let f = faction(
            1,
            1,
            vec![asset(1, "smugglers", 2), asset(2, "base_of_influence", 1), asset(3, "smugglers", 1)],
        );
        assert!(check_target(&cat, &f, SystemId(2)).is_ok());
        assert_eq!(
            check_target(&cat, &f, SystemId(1)),
            Err(RuleError::AlreadyClaimed(SystemId(1)))
        );
        assert_eq!(
            check_target(&cat, &f, SystemId(3)),
            Err(RuleError::NoPresence(SystemId(3)))
        );
    }

    #[test]
    fn contested_expansion_flags_rival() {
        let roster = vec![
            faction(1, 3, vec![asset(1, "smugglers", 2)]),
            faction(2, 4, vec![asset(2, "smugglers", 2)]),
            faction(3, 8, vec![asset(3, "smugglers", 3)]),
        ];
        let mut dice = ScriptedDice::new([5, 5]);
        let (report, set) = expand(&mut dice, &roster);
        assert_eq!(report.total, 8);
        assert_eq!(report.rivals.len(), 1, "only rivals on the world roll");
        assert_eq!(report.rivals[0].total, 9);
        assert!(report.rivals[0].can_attack);
        assert!(!report.success);
        assert_eq!(report.attackers().collect::<Vec<_>>(), vec![FactionId(2)]);
        // The claim stands either way.
        assert_eq!(set.credit_delta(FactionId(1)), -5);
        assert!(matches!(
            &set.changes[1],
            Change::CreateAsset { asset, .. } if asset.hp == 5 && asset.purchased_turn == 4
        ));
    }

    #[test]
    fn ties_go_to_the_rival_unless_fanatical() {
        let mut roster = vec![
            faction(1, 3, vec![asset(1, "smugglers", 2)]),
            faction(2, 3, vec![asset(2, "smugglers", 2)]),
        ];
        let mut dice = ScriptedDice::new([6, 6]);
        let (report, _) = expand(&mut dice, &roster);
        assert!(report.rivals[0].can_attack);

        roster[1].tags.insert(Tag::Fanatical);
        let mut dice = ScriptedDice::new([6, 6]);
        let (report, _) = expand(&mut dice, &roster);
        assert!(!report.rivals[0].can_attack);
        assert!(report.success);
    }

    #[test]
    fn uncontested_and_unaffordable() {
        let mut roster = vec![faction(1, 1, vec![asset(1, "smugglers", 2)])];
        let mut dice = ScriptedDice::new([1]);
        let (report, _) = expand(&mut dice, &roster);
        assert!(report.success && report.rivals.is_empty());

        roster[0].credits = 2;
        let err = resolve_expansion(
            &mut ScriptedDice::default(),
            &catalog(),
            &sector(),
            &roster,
            FactionId(1),
            SystemId(2),
            5,
            AssetId(9),
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RuleError::InsufficientCredits {
                required: 5,
                available: 2
            }
        );
    }
}
