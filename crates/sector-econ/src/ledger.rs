//! Per-turn income, upkeep and repairs.

use crate::EconError;
use sector_core::{AssetId, Attribute, Attributes, Catalog, Change, ChangeSet, Faction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Faction hit points contributed by each rating, indexed by rating.
const HP_BY_RATING: [i32; 9] = [0, 1, 2, 4, 6, 9, 12, 16, 20];

/// Hit points every faction starts from.
pub const BASE_FACTION_HP: i32 = 4;

/// FacCreds charged per repair action.
pub const REPAIR_COST: i64 = 1;

/// Maximum faction hit points for a set of ratings.
pub fn max_hp_for(attrs: &Attributes) -> i32 {
    let hp = |r: u8| HP_BY_RATING[usize::from(r.min(8))];
    BASE_FACTION_HP + hp(attrs.force) + hp(attrs.cunning) + hp(attrs.wealth)
}

/// Breakdown of one turn's income.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeReport {
    /// `ceil(wealth / 2) + floor((force + cunning) / 4)`.
    pub gross: i64,
    pub upkeep: i64,
    /// One FacCred per asset beyond the rating of its category.
    pub overflow_penalty: i64,
    /// Change to apply to the balance; never takes it below zero.
    pub net: i64,
    /// Owed but unpaid because the balance ran dry.
    pub shortfall: i64,
}

impl IncomeReport {
    pub fn into_changes(&self, faction: &Faction) -> ChangeSet {
        let mut set = ChangeSet::new();
        if self.net != 0 {
            set.push(Change::AdjustCredits {
                faction: faction.id,
                delta: self.net,
            });
        }
        set
    }
}

/// Income due at the start of `faction`'s turn.
pub fn turn_income(faction: &Faction, catalog: &Catalog) -> IncomeReport {
    let a = &faction.attributes;
    let gross = (i64::from(a.wealth) + 1) / 2 + (i64::from(a.force) + i64::from(a.cunning)) / 4;

    let mut upkeep = 0;
    let mut per_category: BTreeMap<Attribute, i64> = BTreeMap::new();
    for asset in &faction.assets {
        let Some(def) = catalog.get(&asset.def) else {
            continue;
        };
        upkeep += def.upkeep;
        if !def.is_base_of_influence() {
            *per_category.entry(def.category).or_default() += 1;
        }
    }
    let overflow_penalty = per_category
        .iter()
        .map(|(&attr, &n)| (n - i64::from(faction.rating(attr))).max(0))
        .sum::<i64>();

    let owed = gross - upkeep - overflow_penalty;
    let net = owed.max(-faction.credits);
    IncomeReport {
        gross,
        upkeep,
        overflow_penalty,
        net,
        shortfall: net - owed,
    }
}

/// Repair an asset by the faction's rating in its category, for
/// [`REPAIR_COST`]. Never heals past max hp.
pub fn plan_asset_repair(
    catalog: &Catalog,
    faction: &Faction,
    asset_id: AssetId,
) -> Result<ChangeSet, EconError> {
    let asset = faction
        .asset(asset_id)
        .ok_or(EconError::UnknownAsset(asset_id))?;
    let def = catalog
        .get(&asset.def)
        .ok_or_else(|| EconError::UnknownDefinition(asset.def.clone()))?;
    if !asset.is_damaged() {
        return Err(EconError::NothingToRepair(asset_id.to_string()));
    }
    if faction.credits < REPAIR_COST {
        return Err(EconError::InsufficientCredits {
            required: REPAIR_COST,
            available: faction.credits,
        });
    }
    let heal = i32::from(faction.rating(def.category)).min(asset.max_hp - asset.hp);
    Ok(ChangeSet::from(vec![
        Change::AdjustCredits {
            faction: faction.id,
            delta: -REPAIR_COST,
        },
        Change::RepairAsset {
            faction: faction.id,
            asset: asset_id,
            amount: heal,
        },
    ]))
}

/// Repair the faction itself by `ceil((highest + lowest) / 2)`. Free.
pub fn plan_faction_repair(faction: &Faction) -> Result<ChangeSet, EconError> {
    let a = &faction.attributes;
    if a.hp >= a.max_hp {
        return Err(EconError::NothingToRepair(faction.name.clone()));
    }
    let heal = (i32::from(a.highest()) + i32::from(a.lowest()) + 1) / 2;
    Ok(ChangeSet::from(vec![Change::RepairFaction {
        faction: faction.id,
        amount: heal.min(a.max_hp - a.hp),
    }]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_core::{
        AssetDefId, AssetDefinition, AssetFlags, AssetInstance, FactionId, SystemId,
    };

    fn def(id: &str, category: Attribute, upkeep: i64, base: bool) -> AssetDefinition {
        AssetDefinition {
            id: AssetDefId::new(id),
            name: id.into(),
            category,
            cost: 2,
            rating: 1,
            tech_level: 0,
            hp: 4,
            attack: None,
            counter: None,
            flags: AssetFlags {
                base_of_influence: base,
                ..AssetFlags::default()
            },
            required_tag: None,
            upkeep,
            ability: None,
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            def("base_of_influence", Attribute::Cunning, 0, true),
            def("mercenaries", Attribute::Wealth, 1, false),
            def("hitmen", Attribute::Force, 0, false),
        ])
        .unwrap()
    }

    fn asset(id: u64, def: &str, hp: i32) -> AssetInstance {
        AssetInstance {
            id: AssetId(id),
            def: AssetDefId::new(def),
            location: SystemId(1),
            hp,
            max_hp: 4,
            stealthed: false,
            purchased_turn: 0,
            refitted_turn: None,
        }
    }

    fn faction(force: u8, cunning: u8, wealth: u8, credits: i64) -> Faction {
        let mut attributes = Attributes {
            force,
            cunning,
            wealth,
            hp: 0,
            max_hp: 0,
        };
        attributes.max_hp = max_hp_for(&attributes);
        attributes.hp = attributes.max_hp;
        Faction {
            id: FactionId(3),
            name: "Guild".into(),
            attributes,
            credits,
            xp: 0,
            tags: Default::default(),
            assets: vec![],
            homeworld: SystemId(1),
            campaign: None,
        }
    }

    #[test]
    fn max_hp_table() {
        let a = Attributes {
            force: 1,
            cunning: 1,
            wealth: 1,
            hp: 0,
            max_hp: 0,
        };
        assert_eq!(max_hp_for(&a), 7);
        let b = Attributes {
            force: 8,
            cunning: 5,
            wealth: 3,
            hp: 0,
            max_hp: 0,
        };
        assert_eq!(max_hp_for(&b), 4 + 20 + 9 + 4);
    }

    #[test]
    fn income_formula() {
        let f = faction(3, 2, 5, 0);
        let r = turn_income(&f, &catalog());
        assert_eq!(r.gross, 3 + 1);
        assert_eq!(r.net, 4);
        assert_eq!(r.shortfall, 0);
    }

    #[test]
    fn upkeep_and_overflow() {
        let mut f = faction(1, 1, 1, 10);
        f.assets = vec![
            asset(1, "base_of_influence", 4),
            asset(2, "base_of_influence", 4),
            asset(3, "mercenaries", 4),
            asset(4, "mercenaries", 4),
            asset(5, "hitmen", 4),
        ];
        let r = turn_income(&f, &catalog());
        assert_eq!(r.gross, 1);
        assert_eq!(r.upkeep, 2);
        // Two Wealth assets on a Wealth 1 faction; bases never count.
        assert_eq!(r.overflow_penalty, 1);
        assert_eq!(r.net, -2);
        assert_eq!(r.into_changes(&f).credit_delta(f.id), -2);
    }

    #[test]
    fn income_never_overdraws() {
        let mut f = faction(1, 1, 1, 1);
        f.assets = (0..4).map(|i| asset(i, "mercenaries", 4)).collect();
        let r = turn_income(&f, &catalog());
        assert_eq!(r.net, -1);
        assert_eq!(r.shortfall, 5);
    }

    #[test]
    fn asset_repair() {
        let cat = catalog();
        let mut f = faction(3, 1, 1, 2);
        f.assets = vec![asset(1, "hitmen", 2), asset(2, "hitmen", 4)];
        let set = plan_asset_repair(&cat, &f, AssetId(1)).unwrap();
        assert_eq!(set.credit_delta(f.id), -1);
        assert!(set.changes.contains(&Change::RepairAsset {
            faction: f.id,
            asset: AssetId(1),
            amount: 2
        }));
        assert!(matches!(
            plan_asset_repair(&cat, &f, AssetId(2)),
            Err(EconError::NothingToRepair(_))
        ));
        f.credits = 0;
        assert!(matches!(
            plan_asset_repair(&cat, &f, AssetId(1)),
            Err(EconError::InsufficientCredits { .. })
        ));
    }

    #[test]
    fn faction_repair() {
        let mut f = faction(5, 2, 1, 0);
        assert!(plan_faction_repair(&f).is_err());
        f.attributes.hp -= 10;
        let set = plan_faction_repair(&f).unwrap();
        assert_eq!(
            set.changes,
            vec![Change::RepairFaction {
                faction: f.id,
                amount: 3
            }]
        );
    }
}
