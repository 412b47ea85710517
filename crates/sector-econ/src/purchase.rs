//! Buying, refitting and selling assets.

use crate::EconError;
use sector_core::{
    tags, AssetDefId, AssetDefinition, AssetId, AssetInstance, Catalog, Change, ChangeSet,
    Faction, Sector, StarSystem, SystemId,
};
use serde::Serialize;
use tracing::debug;

/// A validated purchase, ready to be turned into changes once the caller
/// has allocated an asset id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PurchasePlan {
    pub def: AssetDefId,
    pub cost: i64,
    pub location: SystemId,
    pub hp: i32,
    pub stealthed: bool,
    pub turn: u32,
}

impl PurchasePlan {
    pub fn instantiate(&self, id: AssetId) -> AssetInstance {
        AssetInstance {
            id,
            def: self.def.clone(),
            location: self.location,
            hp: self.hp,
            max_hp: self.hp,
            stealthed: self.stealthed,
            purchased_turn: self.turn,
            refitted_turn: None,
        }
    }

    pub fn into_changes(self, faction: &Faction, id: AssetId) -> ChangeSet {
        let asset = self.instantiate(id);
        ChangeSet::from(vec![
            Change::AdjustCredits {
                faction: faction.id,
                delta: -self.cost,
            },
            Change::CreateAsset {
                faction: faction.id,
                asset,
            },
        ])
    }
}

/// A validated refit of an existing asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefitPlan {
    pub asset: AssetId,
    pub from: AssetDefId,
    pub to: AssetDefId,
    pub cost: i64,
    pub max_hp: i32,
    pub turn: u32,
}

impl RefitPlan {
    pub fn into_changes(self, faction: &Faction) -> ChangeSet {
        let mut set = ChangeSet::new();
        if self.cost > 0 {
            set.push(Change::AdjustCredits {
                faction: faction.id,
                delta: -self.cost,
            });
        }
        set.push(Change::RefitAsset {
            faction: faction.id,
            asset: self.asset,
            def: self.to,
            max_hp: self.max_hp,
            turn: self.turn,
        });
        set
    }
}

/// A validated sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SalePlan {
    pub asset: AssetId,
    pub refund: i64,
}

impl SalePlan {
    pub fn into_changes(self, faction: &Faction) -> ChangeSet {
        ChangeSet::from(vec![
            Change::DestroyAsset {
                faction: faction.id,
                asset: self.asset,
            },
            Change::AdjustCredits {
                faction: faction.id,
                delta: self.refund,
            },
        ])
    }
}

/// A faction controls a world it calls home or holds a Base of Influence on.
pub fn controls_world(faction: &Faction, system: SystemId, catalog: &Catalog) -> bool {
    faction.homeworld == system
        || faction
            .assets_at(system)
            .any(|a| catalog.is_base_of_influence(&a.def))
}

/// Tech level the faction may buy at on `system`.
///
/// Tag bonuses only apply on worlds the faction controls.
pub fn effective_tech_level(faction: &Faction, system: &StarSystem, catalog: &Catalog) -> u8 {
    if controls_world(faction, system.id, catalog) {
        tags::boosted_tech_level(
            faction.tags.iter(),
            system.tech_level,
            faction.homeworld == system.id,
        )
    } else {
        system.tech_level
    }
}

/// Planetary-government-equivalent control of a world.
pub fn has_permission(faction: &Faction, system: &StarSystem) -> bool {
    let is_homeworld = faction.homeworld == system.id;
    system.government == Some(faction.id)
        || faction.tags.iter().any(|t| t.grants_permission(is_homeworld))
}

/// Checks shared by purchase and refit, in order: balance, rating, tag,
/// tech level, permission.
fn check_eligibility(
    catalog: &Catalog,
    sector: &Sector,
    faction: &Faction,
    def: &AssetDefinition,
    target: SystemId,
    cost: i64,
) -> Result<(), EconError> {
    if faction.credits < cost {
        return Err(EconError::InsufficientCredits {
            required: cost,
            available: faction.credits,
        });
    }
    let actual = faction.rating(def.category);
    if actual < def.rating {
        return Err(EconError::RatingTooLow {
            attribute: def.category,
            required: def.rating,
            actual,
        });
    }
    if let Some(tag) = def.required_tag {
        if !faction.has_tag(tag) {
            return Err(EconError::MissingTag(tag));
        }
    }
    if let Some(system) = sector.system(target) {
        let available = effective_tech_level(faction, system, catalog);
        if def.tech_level > available {
            return Err(EconError::TechLevelTooLow {
                system: target,
                required: def.tech_level,
                available,
            });
        }
        if def.flags.requires_permission && !has_permission(faction, system) {
            return Err(EconError::PermissionRequired(target));
        }
    }
    Ok(())
}

/// Validate buying `def_id` on `target` during `turn`. The first failing
/// check decides the reason.
pub fn validate_purchase(
    catalog: &Catalog,
    sector: &Sector,
    faction: &Faction,
    def_id: &AssetDefId,
    target: SystemId,
    turn: u32,
) -> Result<PurchasePlan, EconError> {
    let def = catalog
        .get(def_id)
        .ok_or_else(|| EconError::UnknownDefinition(def_id.clone()))?;
    if def.is_base_of_influence() {
        return Err(EconError::BaseOfInfluence(def_id.clone()));
    }
    check_eligibility(catalog, sector, faction, def, target, def.cost)?;
    debug!(faction = %faction.id, asset = %def_id, %target, cost = def.cost, "purchase validated");
    Ok(PurchasePlan {
        def: def.id.clone(),
        cost: def.cost,
        location: target,
        hp: def.hp,
        stealthed: def.flags.stealth_on_purchase,
        turn,
    })
}

/// Upgrades charge the difference; downgrades and sidegrades are free.
pub fn refit_cost(current: &AssetDefinition, target: &AssetDefinition) -> i64 {
    (target.cost - current.cost).max(0)
}

/// Validate refitting an owned asset into `target_id` where it stands.
pub fn validate_refit(
    catalog: &Catalog,
    sector: &Sector,
    faction: &Faction,
    asset_id: AssetId,
    target_id: &AssetDefId,
    turn: u32,
) -> Result<RefitPlan, EconError> {
    let asset = faction
        .asset(asset_id)
        .ok_or(EconError::UnknownAsset(asset_id))?;
    let current = catalog
        .get(&asset.def)
        .ok_or_else(|| EconError::UnknownDefinition(asset.def.clone()))?;
    let target = catalog
        .get(target_id)
        .ok_or_else(|| EconError::UnknownDefinition(target_id.clone()))?;
    if current.is_base_of_influence() {
        return Err(EconError::BaseOfInfluence(current.id.clone()));
    }
    if target.is_base_of_influence() {
        return Err(EconError::BaseOfInfluence(target.id.clone()));
    }
    if current.id == target.id {
        return Err(EconError::SameDefinition(target.id.clone()));
    }
    if current.category != target.category {
        return Err(EconError::CategoryMismatch {
            from: current.category,
            to: target.category,
        });
    }
    let cost = refit_cost(current, target);
    check_eligibility(catalog, sector, faction, target, asset.location, cost)?;
    Ok(RefitPlan {
        asset: asset_id,
        from: current.id.clone(),
        to: target.id.clone(),
        cost,
        max_hp: target.hp,
        turn,
    })
}

/// Half the purchase cost, rounded down.
pub fn sell_value(def: &AssetDefinition) -> i64 {
    def.cost / 2
}

/// Validate selling an owned asset. Territory claims cannot be sold.
pub fn validate_sale(
    catalog: &Catalog,
    faction: &Faction,
    asset_id: AssetId,
) -> Result<SalePlan, EconError> {
    let asset = faction
        .asset(asset_id)
        .ok_or(EconError::UnknownAsset(asset_id))?;
    let def = catalog
        .get(&asset.def)
        .ok_or_else(|| EconError::UnknownDefinition(asset.def.clone()))?;
    if def.is_base_of_influence() {
        return Err(EconError::BaseOfInfluence(def.id.clone()));
    }
    Ok(SalePlan {
        asset: asset_id,
        refund: sell_value(def),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sector_core::{
        AssetFlags, Attribute, Attributes, FactionId, HexCoord, StarSystem, Tag,
    };

    fn def(id: &str, category: Attribute, cost: i64, rating: u8, tl: u8) -> AssetDefinition {
        AssetDefinition {
            id: AssetDefId::new(id),
            name: id.to_string(),
            category,
            cost,
            rating,
            tech_level: tl,
            hp: 5,
            attack: None,
            counter: None,
            flags: AssetFlags::default(),
            required_tag: None,
            upkeep: 0,
            ability: None,
        }
    }

    fn catalog() -> Catalog {
        let mut base = def("base_of_influence", Attribute::Cunning, 1, 0, 0);
        base.flags.base_of_influence = true;
        let mut militia = def("militia_unit", Attribute::Force, 4, 1, 3);
        militia.flags.requires_permission = true;
        let mut slaves = def("gengineered_slaves", Attribute::Force, 2, 1, 0);
        slaves.required_tag = Some(Tag::EugenicsCultists);
        Catalog::new(vec![
            base,
            militia,
            slaves,
            def("strike_fleet", Attribute::Force, 15, 4, 4),
            def("postech_infantry", Attribute::Force, 8, 4, 4),
            def("capital_fleet", Attribute::Force, 30, 8, 5),
            def("franchise", Attribute::Wealth, 2, 1, 2),
        ])
        .unwrap()
    }

    fn sector() -> Sector {
        let sys = |id: u32, col: i32, tl: u8| StarSystem {
            id: SystemId(id),
            name: format!("S{id}"),
            hex: HexCoord::new(col, 0),
            tech_level: tl,
            routes: vec![],
            government: None,
        };
        Sector::new(vec![sys(1, 0, 4), sys(2, 1, 2), sys(3, 2, 3)]).unwrap()
    }

    fn faction(credits: i64, force: u8) -> Faction {
        Faction {
            id: FactionId(1),
            name: "Hegemony".into(),
            attributes: Attributes {
                force,
                cunning: 3,
                wealth: 3,
                hp: 15,
                max_hp: 15,
            },
            credits,
            xp: 0,
            tags: Default::default(),
            assets: vec![],
            homeworld: SystemId(1),
            campaign: None,
        }
    }

    fn base_at(id: u64, system: u32) -> AssetInstance {
        AssetInstance {
            id: AssetId(id),
            def: AssetDefId::new("base_of_influence"),
            location: SystemId(system),
            hp: 5,
            max_hp: 5,
            stealthed: false,
            purchased_turn: 0,
            refitted_turn: None,
        }
    }

    #[test]
    fn insufficient_credits_reason() {
        let err = validate_purchase(
            &catalog(),
            &sector(),
            &faction(10, 5),
            &AssetDefId::new("strike_fleet"),
            SystemId(1),
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EconError::InsufficientCredits {
                required: 15,
                available: 10
            }
        );
        assert_eq!(err.to_string(), "insufficient FacCreds: 15 required, 10 available");
    }

    #[test]
    fn first_failure_wins() {
        // Short on both credits and rating: credits are checked first.
        let err = validate_purchase(
            &catalog(),
            &sector(),
            &faction(1, 1),
            &AssetDefId::new("capital_fleet"),
            SystemId(1),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, EconError::InsufficientCredits { .. }));
        let err = validate_purchase(
            &catalog(),
            &sector(),
            &faction(100, 1),
            &AssetDefId::new("capital_fleet"),
            SystemId(1),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, EconError::RatingTooLow { required: 8, .. }));
    }

    #[test]
    fn unknown_and_base_definitions() {
        let cat = catalog();
        let f = faction(100, 8);
        assert!(matches!(
            validate_purchase(&cat, &sector(), &f, &AssetDefId::new("nope"), SystemId(1), 1),
            Err(EconError::UnknownDefinition(_))
        ));
        assert!(matches!(
            validate_purchase(
                &cat,
                &sector(),
                &f,
                &AssetDefId::new("base_of_influence"),
                SystemId(1),
                1
            ),
            Err(EconError::BaseOfInfluence(_))
        ));
    }

    #[test]
    fn tag_exclusive_assets() {
        let cat = catalog();
        let id = AssetDefId::new("gengineered_slaves");
        let mut f = faction(10, 3);
        assert_eq!(
            validate_purchase(&cat, &sector(), &f, &id, SystemId(1), 1),
            Err(EconError::MissingTag(Tag::EugenicsCultists))
        );
        f.tags.insert(Tag::EugenicsCultists);
        assert!(validate_purchase(&cat, &sector(), &f, &id, SystemId(1), 1).is_ok());
    }

    #[test]
    fn tech_bonus_needs_control() {
        let cat = catalog();
        let infantry = AssetDefId::new("postech_infantry");
        let mut f = faction(50, 5);
        f.tags.insert(Tag::TechnicalExpertise);
        // System 2 is TL2 and not controlled.
        assert_eq!(
            validate_purchase(&cat, &sector(), &f, &infantry, SystemId(2), 1),
            Err(EconError::TechLevelTooLow {
                system: SystemId(2),
                required: 4,
                available: 2
            })
        );
        f.assets.push(base_at(7, 2));
        let plan = validate_purchase(&cat, &sector(), &f, &infantry, SystemId(2), 1).unwrap();
        assert_eq!(plan.location, SystemId(2));
        assert_eq!(plan.cost, 8);
    }

    #[test]
    fn permission_gating() {
        let cat = catalog();
        let militia = AssetDefId::new("militia_unit");
        let sec = sector();
        let mut f = faction(50, 5);
        assert_eq!(
            validate_purchase(&cat, &sec, &f, &militia, SystemId(1), 1),
            Err(EconError::PermissionRequired(SystemId(1)))
        );
        f.tags.insert(Tag::Colonists);
        assert!(validate_purchase(&cat, &sec, &f, &militia, SystemId(1), 1).is_ok());
        // Colonists only count on the homeworld.
        assert_eq!(
            validate_purchase(&cat, &sec, &f, &militia, SystemId(3), 1),
            Err(EconError::PermissionRequired(SystemId(3)))
        );
        let mut governed = sec.clone();
        if let Some(s) = governed.system_mut(SystemId(3)) {
            s.government = Some(FactionId(1));
        }
        assert!(validate_purchase(&cat, &governed, &f, &militia, SystemId(3), 1).is_ok());
    }

    #[test]
    fn plan_builds_stamped_instance() {
        let plan = validate_purchase(
            &catalog(),
            &sector(),
            &faction(10, 3),
            &AssetDefId::new("franchise"),
            SystemId(1),
            6,
        )
        .unwrap();
        let f = faction(10, 3);
        let set = plan.into_changes(&f, AssetId(42));
        assert_eq!(set.credit_delta(f.id), -2);
        match &set.changes[1] {
            Change::CreateAsset { asset, .. } => {
                assert_eq!(asset.id, AssetId(42));
                assert_eq!(asset.purchased_turn, 6);
                assert!(!asset.is_ready(6));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn refit_costs() {
        let cheap = def("a", Attribute::Force, 4, 1, 0);
        let dear = def("b", Attribute::Force, 10, 1, 0);
        let same = def("c", Attribute::Force, 4, 1, 0);
        assert_eq!(refit_cost(&cheap, &dear), 6);
        assert_eq!(refit_cost(&dear, &cheap), 0);
        assert_eq!(refit_cost(&cheap, &same), 0);
    }

    #[test]
    fn refit_validation() {
        let cat = catalog();
        let mut f = faction(5, 5);
        f.tags.insert(Tag::Colonists);
        f.assets.push(AssetInstance {
            id: AssetId(3),
            def: AssetDefId::new("militia_unit"),
            location: SystemId(1),
            hp: 2,
            max_hp: 5,
            stealthed: false,
            purchased_turn: 0,
            refitted_turn: None,
        });
        let plan = validate_refit(
            &cat,
            &sector(),
            &f,
            AssetId(3),
            &AssetDefId::new("postech_infantry"),
            4,
        )
        .unwrap();
        assert_eq!(plan.cost, 4);
        assert_eq!(plan.turn, 4);
        assert_eq!(
            validate_refit(&cat, &sector(), &f, AssetId(3), &AssetDefId::new("franchise"), 4),
            Err(EconError::CategoryMismatch {
                from: Attribute::Force,
                to: Attribute::Wealth
            })
        );
        assert_eq!(
            validate_refit(&cat, &sector(), &f, AssetId(3), &AssetDefId::new("strike_fleet"), 4),
            Err(EconError::InsufficientCredits {
                required: 11,
                available: 5
            })
        );
        f.assets.push(base_at(8, 1));
        assert!(matches!(
            validate_refit(&cat, &sector(), &f, AssetId(8), &AssetDefId::new("militia_unit"), 4),
            Err(EconError::BaseOfInfluence(_))
        ));
    }

    #[test]
    fn sale_refunds_half() {
        let cat = catalog();
        let mut f = faction(0, 5);
        f.assets.push(AssetInstance {
            id: AssetId(5),
            def: AssetDefId::new("strike_fleet"),
            location: SystemId(1),
            hp: 5,
            max_hp: 5,
            stealthed: false,
            purchased_turn: 0,
            refitted_turn: None,
        });
        f.assets.push(base_at(6, 1));
        let plan = validate_sale(&cat, &f, AssetId(5)).unwrap();
        assert_eq!(plan.refund, 7);
        assert!(validate_sale(&cat, &f, AssetId(6)).is_err());
        assert_eq!(validate_sale(&cat, &f, AssetId(99)), Err(EconError::UnknownAsset(AssetId(99))));
    }

    proptest! {
        #[test]
        fn purchase_monotonic_in_balance_and_rating(
            credits in 0i64..40,
            force in 0u8..8,
            extra_credits in 0i64..20,
            extra_force in 0u8..3,
            pick in 0usize..4,
        ) {
            let ids = ["strike_fleet", "postech_infantry", "militia_unit", "capital_fleet"];
            let id = AssetDefId::new(ids[pick]);
            let cat = catalog();
            let sec = sector();
            let before = validate_purchase(&cat, &sec, &faction(credits, force), &id, SystemId(1), 1);
            let richer = faction(credits + extra_credits, (force + extra_force).min(8));
            let after = validate_purchase(&cat, &sec, &richer, &id, SystemId(1), 1);
            if before.is_ok() {
                prop_assert!(after.is_ok());
            }
        }
    }
}
