//! A greedy policy that plays a faction's turn.
//!
//! Every candidate action gets a utility score; the best one is played and,
//! where the action type allows it, repeated with the faction's other assets.

use crate::game::{ExpansionOutcome, Game, TurnSummary};
use crate::GameError;
use sector_core::{
    AbilityKind, AssetDefId, AssetId, DieRoller, Faction, FactionId, SystemId,
};
use sector_econ::{validate_purchase, IncomeReport};
use sector_rules::{check_target, expansion_cost, AbilityResult, AttackReport};
use serde::Serialize;
use tracing::debug;

/// Bonus for striking a rival's Base of Influence.
const BASE_TARGET_BONUS: f64 = 5.0;
const EXPANSION_VALUE: f64 = 3.0;
const REPAIR_VALUE: f64 = 4.0;
const INCOME_VALUE: f64 = 2.5;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum Plan {
    Attack {
        asset: AssetId,
        defender: FactionId,
        target: AssetId,
    },
    Expand {
        system: SystemId,
        hp: i32,
    },
    Buy {
        def: AssetDefId,
        system: SystemId,
    },
    RepairFaction,
    UseAbility {
        asset: AssetId,
    },
    Pass,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionLog {
    Attack(AttackReport),
    Expansion(ExpansionOutcome),
    Bought {
        def: AssetDefId,
        system: SystemId,
        asset: AssetId,
    },
    Ability(AbilityResult),
    RepairedFaction,
    Refused {
        plan: Plan,
        reason: String,
    },
}

/// Everything one faction did on its turn.
#[derive(Clone, Debug, Serialize)]
pub struct TurnLog {
    pub faction: FactionId,
    pub income: IncomeReport,
    pub actions: Vec<ActionLog>,
    pub summary: TurnSummary,
}

/// Rough chance that a rating beats another on opposed 1d10s.
fn win_chance(attacker: u8, defender: u8) -> f64 {
    (0.45 + 0.1 * (f64::from(attacker) - f64::from(defender))).clamp(0.05, 0.95)
}

fn attack_plans<D: DieRoller>(game: &Game<D>) -> Vec<(Plan, f64)> {
    let me = game.current_faction();
    let turn = game.turn();
    let catalog = game.catalog();
    let mut plans = Vec::new();
    for asset in me.assets.iter().filter(|a| a.is_ready(turn)) {
        let Some(pattern) = catalog.get(&asset.def).and_then(|d| d.attack.as_ref()) else {
            continue;
        };
        for rival in game.factions().iter().filter(|f| f.id != me.id) {
            for target in rival.assets_at(asset.location).filter(|t| !t.stealthed) {
                let chance = win_chance(me.rating(pattern.attacker), rival.rating(pattern.defender));
                let bonus = if catalog.is_base_of_influence(&target.def) {
                    BASE_TARGET_BONUS
                } else {
                    0.0
                };
                let score = chance * (pattern.damage.expected_value() + bonus);
                plans.push((
                    Plan::Attack {
                        asset: asset.id,
                        defender: rival.id,
                        target: target.id,
                    },
                    score,
                ));
            }
        }
    }
    plans
}

fn expansion_plans<D: DieRoller>(game: &Game<D>, me: &Faction) -> Vec<(Plan, f64)> {
    let hp = me.credits.min(i64::from(me.attributes.max_hp)).min(4) as i32;
    if hp < 1 {
        return Vec::new();
    }
    let mut systems: Vec<SystemId> = me.assets.iter().map(|a| a.location).collect();
    systems.sort();
    systems.dedup();
    systems
        .into_iter()
        .filter(|s| check_target(game.catalog(), me, *s).is_ok())
        .filter(|_| expansion_cost(me, hp).is_ok_and(|c| c.cost <= me.credits))
        .map(|system| (Plan::Expand { system, hp }, EXPANSION_VALUE + f64::from(hp) * 0.5))
        .collect()
}

fn purchase_plans<D: DieRoller>(game: &Game<D>, me: &Faction) -> Vec<(Plan, f64)> {
    let mut plans = Vec::new();
    for def in game.catalog().iter().filter(|d| !d.is_base_of_influence()) {
        if validate_purchase(game.catalog(), game.sector(), me, &def.id, me.homeworld, game.turn())
            .is_err()
        {
            continue;
        }
        let punch = def.attack.as_ref().map_or(0.0, |a| a.damage.expected_value());
        let income = match def.ability {
            Some(AbilityKind::EconomicRoll { .. }) => INCOME_VALUE,
            _ => 0.0,
        };
        let score = punch * 0.5 + f64::from(def.hp) * 0.2 + income - def.upkeep as f64;
        plans.push((
            Plan::Buy {
                def: def.id.clone(),
                system: me.homeworld,
            },
            score,
        ));
    }
    plans
}

fn income_ability_plans<D: DieRoller>(game: &Game<D>, me: &Faction) -> Vec<(Plan, f64)> {
    me.assets
        .iter()
        .filter(|a| a.is_ready(game.turn()))
        .filter(|a| {
            matches!(
                game.catalog().get(&a.def).and_then(|d| d.ability.as_ref()),
                Some(AbilityKind::EconomicRoll { .. })
            )
        })
        .map(|a| (Plan::UseAbility { asset: a.id }, INCOME_VALUE))
        .collect()
}

/// Score every candidate and return the best, or [`Plan::Pass`].
pub fn choose<D: DieRoller>(game: &Game<D>) -> Plan {
    let me = game.current_faction();
    let mut plans = attack_plans(game);
    plans.extend(expansion_plans(game, me));
    plans.extend(purchase_plans(game, me));
    plans.extend(income_ability_plans(game, me));
    if me.attributes.hp * 2 < me.attributes.max_hp {
        plans.push((Plan::RepairFaction, REPAIR_VALUE));
    }
    plans
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .filter(|(_, score)| *score > 0.0)
        .map_or(Plan::Pass, |(plan, score)| {
            debug!(faction = %me.name, ?plan, score, "plan chosen");
            plan
        })
}

fn execute<D: DieRoller>(game: &mut Game<D>, plan: &Plan) -> Result<Option<ActionLog>, GameError> {
    Ok(Some(match plan {
        Plan::Attack {
            asset,
            defender,
            target,
        } => ActionLog::Attack(game.attack(*asset, *defender, *target)?),
        Plan::Expand { system, hp } => ActionLog::Expansion(game.expand_influence(*system, *hp)?),
        Plan::Buy { def, system } => ActionLog::Bought {
            asset: game.buy_asset(def, *system)?,
            def: def.clone(),
            system: *system,
        },
        Plan::RepairFaction => {
            game.repair_faction()?;
            ActionLog::RepairedFaction
        }
        Plan::UseAbility { asset } => ActionLog::Ability(game.use_ability(*asset)?),
        Plan::Pass => return Ok(None),
    }))
}

fn record<D: DieRoller>(game: &mut Game<D>, plan: Plan, log: &mut Vec<ActionLog>) {
    match execute(game, &plan) {
        Ok(Some(entry)) => log.push(entry),
        Ok(None) => {}
        Err(e) => log.push(ActionLog::Refused {
            plan,
            reason: e.to_string(),
        }),
    }
}

/// Play the current faction's whole turn: income, one action type, news.
pub fn play_turn<D: DieRoller>(game: &mut Game<D>) -> Result<TurnLog, GameError> {
    let faction = game.current_id();
    let income = game.start_turn()?;
    let mut actions = Vec::new();
    match choose(game) {
        Plan::Pass => {}
        plan @ Plan::Attack { .. } => {
            record(game, plan, &mut actions);
            // Keep attacking with every other ready asset.
            let mut used = Vec::new();
            loop {
                let next = attack_plans(game)
                    .into_iter()
                    .filter(|(p, _)| matches!(p, Plan::Attack { asset, .. } if !used.contains(asset)))
                    .filter(|(p, _)| !actions.iter().any(|a| attacked_with(a, p)))
                    .max_by(|a, b| a.1.total_cmp(&b.1));
                let Some((plan, _)) = next else { break };
                if let Plan::Attack { asset, .. } = &plan {
                    used.push(*asset);
                }
                record(game, plan, &mut actions);
            }
        }
        plan @ Plan::UseAbility { .. } => {
            record(game, plan, &mut actions);
            let me = game.current_faction().clone();
            for (plan, _) in income_ability_plans(game, &me) {
                if !actions.iter().any(|a| used_ability(a, &plan)) {
                    record(game, plan, &mut actions);
                }
            }
        }
        plan => record(game, plan, &mut actions),
    }
    let summary = game.end_turn()?;
    Ok(TurnLog {
        faction,
        income,
        actions,
        summary,
    })
}

fn attacked_with(log: &ActionLog, plan: &Plan) -> bool {
    match (log, plan) {
        (ActionLog::Attack(report), Plan::Attack { asset, .. }) => {
            report.order.attacking_asset == *asset
        }
        (ActionLog::Refused { plan: Plan::Attack { asset: a, .. }, .. }, Plan::Attack { asset, .. }) => {
            a == asset
        }
        _ => false,
    }
}

fn used_ability(log: &ActionLog, plan: &Plan) -> bool {
    match (log, plan) {
        (ActionLog::Ability(result), Plan::UseAbility { asset }) => result.asset == *asset,
        _ => false,
    }
}
