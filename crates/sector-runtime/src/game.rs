//! The game loop: whose turn it is, what they may do, and applying it.

use crate::apply::apply_atomic;
use crate::GameError;
use sector_core::{
    check_victory, find_faction, is_eliminated, validate_factions, AssetDefId, AssetId,
    AttackPattern, Catalog, Change, ChangeSet, DieRoller, Faction, FactionId, GameConfig, Sector,
    SeededDice, SystemId, VictoryState,
};
use sector_econ::{
    plan_asset_repair, plan_faction_repair, turn_income, validate_purchase, validate_refit,
    validate_sale, IncomeReport, RefitPlan,
};
use sector_rules::{
    ability, abandon_campaign, advance_campaign, begin_homeworld_transition, begin_seizure,
    resolve_attack, resolve_expansion, resolve_movement, AbilityResult, ActionType, AttackOrder,
    AttackReport, CampaignProgress, ExpansionReport, Phase, RuleError, TurnState,
};
use serde::Serialize;
use tracing::{info, warn};

/// Result of expanding influence, including the free attacks it provoked.
#[derive(Clone, Debug, Serialize)]
pub struct ExpansionOutcome {
    pub report: ExpansionReport,
    pub free_attacks: Vec<AttackReport>,
}

/// What happened when a faction ended its turn.
#[derive(Clone, Debug, Serialize)]
pub struct TurnSummary {
    pub faction: FactionId,
    pub turn: u32,
    pub round: u32,
    pub campaign: Option<CampaignProgress>,
    pub victory: VictoryState,
    /// Faction to act next, if the game goes on.
    pub next: Option<FactionId>,
}

/// A running game.
pub struct Game<D = SeededDice> {
    config: GameConfig,
    catalog: Catalog,
    sector: Sector,
    factions: Vec<Faction>,
    dice: D,
    state: TurnState,
    current: usize,
    round: u32,
    next_asset_id: u64,
    outcome: Option<VictoryState>,
}

impl Game<SeededDice> {
    /// Start a game rolling dice seeded from `config`.
    pub fn new(
        config: GameConfig,
        catalog: Catalog,
        sector: Sector,
        factions: Vec<Faction>,
    ) -> Result<Self, GameError> {
        let dice = SeededDice::new(config.rng_seed);
        Game::with_dice(config, catalog, sector, factions, dice)
    }
}

impl<D: DieRoller> Game<D> {
    pub fn with_dice(
        config: GameConfig,
        catalog: Catalog,
        sector: Sector,
        factions: Vec<Faction>,
        dice: D,
    ) -> Result<Self, GameError> {
        if factions.is_empty() {
            return Err(GameError::NoFactions);
        }
        validate_factions(&factions, &sector, &catalog)?;
        let next_asset_id = factions
            .iter()
            .flat_map(|f| f.assets.iter().map(|a| a.id.0))
            .max()
            .map_or(1, |m| m + 1);
        info!(
            factions = factions.len(),
            systems = sector.len(),
            seed = config.rng_seed,
            "game started"
        );
        Ok(Self {
            config,
            catalog,
            sector,
            factions,
            dice,
            // Starting assets carry turn 0 and are ready on turn 1.
            state: TurnState::new(1),
            current: 0,
            round: 1,
            next_asset_id,
            outcome: None,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        find_faction(&self.factions, id)
    }

    pub fn turn_state(&self) -> &TurnState {
        &self.state
    }

    pub fn turn(&self) -> u32 {
        self.state.turn()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Final result once the game has ended.
    pub fn outcome(&self) -> Option<&VictoryState> {
        self.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn current_faction(&self) -> &Faction {
        &self.factions[self.current]
    }

    pub fn current_id(&self) -> FactionId {
        self.current_faction().id
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    fn apply(&mut self, set: &ChangeSet) -> Result<(), GameError> {
        apply_atomic(&mut self.factions, &mut self.sector, set)?;
        for asset in set.iter().filter_map(|c| match c {
            Change::CreateAsset { asset, .. } => Some(asset.id.0),
            _ => None,
        }) {
            self.next_asset_id = self.next_asset_id.max(asset + 1);
        }
        Ok(())
    }

    /// Id the next created asset will take. Only applying a creation
    /// moves the counter on.
    fn peek_asset_id(&self) -> AssetId {
        AssetId(self.next_asset_id)
    }

    /// Stage `action`, run `resolve`, apply its changes and commit. Any
    /// failure cancels the stage and leaves the game untouched.
    fn act<R>(
        &mut self,
        action: ActionType,
        resolve: impl FnOnce(&mut Self) -> Result<(R, ChangeSet), GameError>,
    ) -> Result<R, GameError> {
        self.ensure_running()?;
        let campaign = self.current_faction().campaign.clone();
        self.state.stage(action, campaign.as_ref())?;
        let result = resolve(self).and_then(|(r, set)| {
            self.apply(&set)?;
            Ok(r)
        });
        match result {
            Ok(r) => {
                self.state.commit()?;
                Ok(r)
            }
            Err(e) => {
                self.state.cancel()?;
                warn!(%action, error = %e, "action refused");
                Err(e)
            }
        }
    }

    /// Setup phase: collect income and move to the action phase.
    pub fn start_turn(&mut self) -> Result<IncomeReport, GameError> {
        self.ensure_running()?;
        if self.state.phase() != Phase::Setup {
            return Err(GameError::NotInSetup);
        }
        let faction = self.current_faction();
        let report = turn_income(faction, &self.catalog);
        let set = report.into_changes(faction);
        info!(
            faction = %faction.name,
            turn = self.state.turn(),
            net = report.net,
            shortfall = report.shortfall,
            "income collected"
        );
        self.apply(&set)?;
        self.state.advance();
        Ok(report)
    }

    pub fn buy_asset(&mut self, def: &AssetDefId, system: SystemId) -> Result<AssetId, GameError> {
        self.act(ActionType::BuyAsset, |g| {
            if !g.sector.contains(system) {
                return Err(RuleError::UnknownSystem(system).into());
            }
            let id = g.peek_asset_id();
            let faction = g.current_faction();
            let plan = validate_purchase(&g.catalog, &g.sector, faction, def, system, g.state.turn())?;
            info!(faction = %faction.name, asset = %def, %system, "asset bought");
            Ok((id, plan.into_changes(faction, id)))
        })
    }

    pub fn attack(
        &mut self,
        attacking_asset: AssetId,
        defender: FactionId,
        defending_asset: AssetId,
    ) -> Result<AttackReport, GameError> {
        let order = AttackOrder {
            attacker: self.current_id(),
            attacking_asset,
            defender,
            defending_asset,
        };
        self.act(ActionType::Attack, |g| {
            let turn = g.state.turn();
            Ok(resolve_attack(&mut g.dice, &g.catalog, &g.factions, order, turn)?)
        })
    }

    /// Plant a Base of Influence, then let every rival that won the contest
    /// take its free attack on it.
    pub fn expand_influence(
        &mut self,
        system: SystemId,
        desired_hp: i32,
    ) -> Result<ExpansionOutcome, GameError> {
        let report = self.act(ActionType::ExpandInfluence, |g| {
            let id = g.peek_asset_id();
            let expanding = g.current_id();
            let turn = g.state.turn();
            Ok(resolve_expansion(
                &mut g.dice,
                &g.catalog,
                &g.sector,
                &g.factions,
                expanding,
                system,
                desired_hp,
                id,
                turn,
            )?)
        })?;
        let mut free_attacks = Vec::new();
        for rival in report.attackers().collect::<Vec<_>>() {
            if self.faction(report.faction).and_then(|f| f.asset(report.base)).is_none() {
                break;
            }
            let Some(attacker) = self.best_attacker(rival, system) else {
                continue;
            };
            let order = AttackOrder {
                attacker: rival,
                attacking_asset: attacker,
                defender: report.faction,
                defending_asset: report.base,
            };
            let turn = self.state.turn();
            match resolve_attack(&mut self.dice, &self.catalog, &self.factions, order, turn) {
                Ok((attack, set)) => {
                    self.apply(&set)?;
                    free_attacks.push(attack);
                }
                Err(e) => warn!(%rival, error = %e, "free attack not possible"),
            }
        }
        Ok(ExpansionOutcome {
            report,
            free_attacks,
        })
    }

    /// The ready asset of `faction` on `system` with the strongest attack.
    fn best_attacker(&self, faction: FactionId, system: SystemId) -> Option<AssetId> {
        let f = self.faction(faction)?;
        let turn = self.state.turn();
        f.assets_at(system)
            .filter(|a| a.is_ready(turn))
            .filter_map(|a| {
                let pattern: &AttackPattern = self.catalog.get(&a.def)?.attack.as_ref()?;
                let strength = pattern.damage.expected_value() + f64::from(f.rating(pattern.attacker));
                Some((a.id, strength))
            })
            .max_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(id, _)| id)
    }

    pub fn refit_asset(&mut self, asset: AssetId, target: &AssetDefId) -> Result<RefitPlan, GameError> {
        self.act(ActionType::RefitAsset, |g| {
            let faction = g.current_faction();
            let plan = validate_refit(&g.catalog, &g.sector, faction, asset, target, g.state.turn())?;
            let set = plan.clone().into_changes(faction);
            Ok((plan, set))
        })
    }

    pub fn repair_asset(&mut self, asset: AssetId) -> Result<(), GameError> {
        self.act(ActionType::RepairAsset, |g| {
            Ok(((), plan_asset_repair(&g.catalog, g.current_faction(), asset)?))
        })
    }

    pub fn repair_faction(&mut self) -> Result<(), GameError> {
        self.act(ActionType::RepairFaction, |g| {
            Ok(((), plan_faction_repair(g.current_faction())?))
        })
    }

    /// Sell an asset; returns the refund.
    pub fn sell_asset(&mut self, asset: AssetId) -> Result<i64, GameError> {
        self.act(ActionType::SellAsset, |g| {
            let faction = g.current_faction();
            let plan = validate_sale(&g.catalog, faction, asset)?;
            let refund = plan.refund;
            Ok((refund, plan.into_changes(faction)))
        })
    }

    /// Use an asset's ability.
    ///
    /// Free actions apply at once without touching the action slot. A
    /// movement ability leaves the game waiting in movement mode for
    /// [`Game::move_assets`] or [`Game::cancel_movement`].
    pub fn use_ability(&mut self, asset: AssetId) -> Result<AbilityResult, GameError> {
        self.ensure_running()?;
        let def = self
            .current_faction()
            .asset(asset)
            .map(|a| a.def.clone())
            .ok_or(RuleError::UnknownAsset {
                faction: self.current_id(),
                asset,
            })?;
        let free = ability::ability_of(&self.catalog, &def).is_some_and(|k| k.is_free_action());
        let turn = self.state.turn();

        if free {
            self.state.check_free_action()?;
            let result = ability::execute(
                &mut self.dice,
                &self.catalog,
                &self.sector,
                &self.factions[self.current],
                asset,
                turn,
            )?;
            self.apply(&result.changes)?;
            return Ok(result);
        }

        let campaign = self.current_faction().campaign.clone();
        self.state.stage(ActionType::UseAbility, campaign.as_ref())?;
        let executed = ability::execute(
            &mut self.dice,
            &self.catalog,
            &self.sector,
            &self.factions[self.current],
            asset,
            turn,
        );
        let result = match executed {
            Ok(result) => result,
            Err(e) => {
                self.state.cancel()?;
                return Err(e.into());
            }
        };
        if !result.success {
            self.state.cancel()?;
            return Ok(result);
        }
        if let Some(config) = &result.movement {
            self.state.enter_movement(config.clone())?;
            return Ok(result);
        }
        if let Err(e) = self.apply(&result.changes) {
            self.state.cancel()?;
            return Err(e);
        }
        self.state.commit()?;
        Ok(result)
    }

    /// Finish an open movement choice.
    pub fn move_assets(&mut self, destination: SystemId, assets: &[AssetId]) -> Result<(), GameError> {
        let config = self.state.movement().ok_or(GameError::NoMovement)?;
        let set = resolve_movement(config, self.current_faction(), destination, assets)?;
        self.apply(&set)?;
        self.state.choose_destination(destination)?;
        info!(faction = %self.current_faction().name, %destination, moved = assets.len(), "assets moved");
        Ok(())
    }

    pub fn cancel_movement(&mut self) -> Result<(), GameError> {
        Ok(self.state.cancel_movement()?)
    }

    /// Begin or keep holding a seizure of `system`.
    pub fn seize_planet(&mut self, system: SystemId) -> Result<(), GameError> {
        self.act(ActionType::SeizePlanet, |g| {
            let faction = g.current_faction();
            if faction.campaign.as_ref().is_some_and(|c| c.system() == system) {
                return Ok(((), ChangeSet::new()));
            }
            let set = begin_seizure(&g.catalog, &g.sector, &g.factions, faction.id, system)?;
            Ok(((), set))
        })
    }

    /// Begin or keep up a move of the homeworld to `target`.
    pub fn change_homeworld(&mut self, target: SystemId) -> Result<(), GameError> {
        self.act(ActionType::ChangeHomeworld, |g| {
            let faction = g.current_faction();
            if faction.campaign.as_ref().is_some_and(|c| c.system() == target) {
                return Ok(((), ChangeSet::new()));
            }
            Ok(((), begin_homeworld_transition(&g.catalog, &g.sector, faction, target)?))
        })
    }

    /// Drop the current campaign. Does not use the action slot.
    pub fn abandon_campaign(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        self.state.check_free_action()?;
        let set = abandon_campaign(self.current_faction())?;
        self.apply(&set)
    }

    /// News phase: advance the campaign, check for a victor and pass the
    /// turn to the next faction still in the game.
    pub fn end_turn(&mut self) -> Result<TurnSummary, GameError> {
        self.ensure_running()?;
        if self.state.phase() != Phase::Action {
            return Err(GameError::NotInAction);
        }
        if self.state.in_movement() {
            self.state.cancel_movement()?;
        }
        self.state.advance();

        let faction = self.current_id();
        let turn = self.state.turn();
        let campaign = if self.current_faction().campaign.is_some() {
            let (progress, set) =
                advance_campaign(&self.catalog, &self.factions, faction, self.config.seizure_turns)?;
            self.apply(&set)?;
            Some(progress)
        } else {
            None
        };

        let victory = check_victory(&self.factions, &self.catalog);
        self.state.advance();
        let next = match &victory {
            VictoryState::Ongoing { .. } => self.rotate(),
            _ => None,
        };
        if next.is_none() || self.round > self.config.max_turns {
            info!(?victory, round = self.round, "game over");
            self.outcome = Some(victory.clone());
        }
        Ok(TurnSummary {
            faction,
            turn,
            round: self.round,
            campaign,
            victory,
            next: next.filter(|_| !self.is_over()),
        })
    }

    /// Move to the next surviving faction, counting a round each time the
    /// order wraps.
    fn rotate(&mut self) -> Option<FactionId> {
        let n = self.factions.len();
        for step in 1..=n {
            let idx = (self.current + step) % n;
            if is_eliminated(&self.factions[idx], &self.catalog) {
                continue;
            }
            if idx <= self.current {
                self.round += 1;
            }
            self.current = idx;
            return Some(self.factions[idx].id);
        }
        None
    }
}
