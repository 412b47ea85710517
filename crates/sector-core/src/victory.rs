//! Elimination and victory bookkeeping.

use crate::catalog::Catalog;
use crate::model::{Faction, FactionId};
use serde::{Deserialize, Serialize};

/// Outcome of a victory check over the roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryState {
    /// More than one faction still holds a territory claim.
    Ongoing { survivors: Vec<FactionId> },
    Victor(FactionId),
    /// Nobody holds a claim any more.
    Draw,
}

/// Number of territory claims the faction holds anywhere.
pub fn bases_held(faction: &Faction, catalog: &Catalog) -> usize {
    faction
        .assets
        .iter()
        .filter(|a| catalog.is_base_of_influence(&a.def))
        .count()
}

/// A faction is out exactly when it holds no Base of Influence.
pub fn is_eliminated(faction: &Faction, catalog: &Catalog) -> bool {
    bases_held(faction, catalog) == 0
}

pub fn check_victory(factions: &[Faction], catalog: &Catalog) -> VictoryState {
    let survivors: Vec<FactionId> = factions
        .iter()
        .filter(|f| !is_eliminated(f, catalog))
        .map(|f| f.id)
        .collect();
    match survivors.as_slice() {
        [] => VictoryState::Draw,
        [only] => VictoryState::Victor(*only),
        _ => VictoryState::Ongoing { survivors },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{base, def};
    use crate::model::{AssetDefId, AssetId, AssetInstance, Attribute, Attributes, SystemId};
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![base(), def("strike_fleet", Attribute::Force, 12, 4, 4, 8)]).unwrap()
    }

    fn asset(id: u64, def: &str) -> AssetInstance {
        AssetInstance {
            id: AssetId(id),
            def: AssetDefId::new(def),
            location: SystemId(1),
            hp: 1,
            max_hp: 1,
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
                force: 1,
                cunning: 1,
                wealth: 1,
                hp: 0,
                max_hp: 7,
            },
            credits: 0,
            xp: 0,
            tags: Default::default(),
            assets,
            homeworld: SystemId(1),
            campaign: None,
        }
    }

    #[test]
    fn fleets_do_not_keep_a_faction_alive() {
        let cat = catalog();
        let f = faction(1, vec![asset(1, "strike_fleet"), asset(2, "strike_fleet")]);
        assert!(is_eliminated(&f, &cat));
        let g = faction(2, vec![asset(3, "base_of_influence")]);
        assert!(!is_eliminated(&g, &cat), "zero hp does not matter");
    }

    #[test]
    fn victory_states() {
        let cat = catalog();
        let alive = |id| faction(id, vec![asset(u64::from(id), "base_of_influence")]);
        let dead = |id| faction(id, vec![]);
        assert_eq!(check_victory(&[alive(1), dead(2)], &cat), VictoryState::Victor(FactionId(1)));
        assert_eq!(check_victory(&[dead(1), dead(2)], &cat), VictoryState::Draw);
        assert_eq!(
            check_victory(&[alive(1), alive(2), dead(3)], &cat),
            VictoryState::Ongoing {
                survivors: vec![FactionId(1), FactionId(2)]
            }
        );
    }

    proptest! {
        #[test]
        fn victor_iff_single_claimant(holdings in proptest::collection::vec(0usize..3, 1..6)) {
            let cat = catalog();
            let roster: Vec<Faction> = holdings
                .iter()
                .enumerate()
                .map(|(i, &n)| {
                    let assets = (0..n).map(|k| asset((i * 10 + k) as u64, "base_of_influence")).collect();
                    faction(i as u32, assets)
                })
                .collect();
            let claimants = holdings.iter().filter(|&&n| n > 0).count();
            for f in &roster {
                if bases_held(f, &cat) > 0 {
                    prop_assert!(!is_eliminated(f, &cat));
                }
            }
            let has_victor = matches!(check_victory(&roster, &cat), VictoryState::Victor(_));
            prop_assert_eq!(has_victor, claimants == 1);
        }
    }
}
