#![deny(warnings)]

//! Headless CLI: load a scenario and let the greedy policy play it out.

use anyhow::{Context, Result};
use sector_catalog::{default_catalog, load_catalog, load_scenario};
use sector_core::victory::bases_held;
use sector_core::{Catalog, Faction, FactionId, VictoryState};
use sector_runtime::{play_turn, Game, TurnLog};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_SCENARIO: &str = "assets/scenarios/skirmish.yaml";

#[derive(Debug, Default)]
struct Args {
    scenario: Option<String>,
    catalog: Option<String>,
    turns: Option<u32>,
    seed: Option<u64>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next(),
            "--catalog" => args.catalog = it.next(),
            "--turns" => args.turns = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

#[derive(Serialize)]
struct Standing<'a> {
    faction: FactionId,
    name: &'a str,
    hp: i32,
    max_hp: i32,
    credits: i64,
    assets: usize,
    bases: usize,
}

impl<'a> Standing<'a> {
    fn of(faction: &'a Faction, catalog: &Catalog) -> Self {
        Self {
            faction: faction.id,
            name: &faction.name,
            hp: faction.attributes.hp,
            max_hp: faction.attributes.max_hp,
            credits: faction.credits,
            assets: faction.assets.len(),
            bases: bases_held(faction, catalog),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    scenario: &'a str,
    rounds: u32,
    outcome: Option<&'a VictoryState>,
    standings: Vec<Standing<'a>>,
    turns: &'a [TurnLog],
}

fn describe(game: &Game) -> String {
    let name = |id: FactionId| game.faction(id).map_or("?", |f| f.name.as_str()).to_string();
    match game.outcome() {
        Some(VictoryState::Victor(id)) => format!("{} wins", name(*id)),
        Some(VictoryState::Draw) => "draw, no claims left".to_string(),
        Some(VictoryState::Ongoing { survivors }) => {
            format!("called with {} factions standing", survivors.len())
        }
        None => "unfinished".to_string(),
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    info!(
        git_sha = env!("GIT_SHA"),
        built = env!("BUILD_DATE"),
        ?args,
        "starting CLI"
    );

    let path = args.scenario.as_deref().unwrap_or(DEFAULT_SCENARIO);
    let scenario = load_scenario(path).with_context(|| format!("loading scenario {path}"))?;
    let catalog = match &args.catalog {
        Some(p) => load_catalog(p).with_context(|| format!("loading catalog {p}"))?,
        None => default_catalog().context("loading built-in catalog")?,
    };
    let mut config = scenario.config.clone();
    if let Some(turns) = args.turns {
        config.max_turns = turns;
    }
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    let (sector, factions) = scenario.build(&catalog)?;
    let mut game = Game::new(config, catalog, sector, factions)?;

    let mut turns = Vec::new();
    while !game.is_over() {
        turns.push(play_turn(&mut game)?);
    }

    let standings: Vec<Standing> = game
        .factions()
        .iter()
        .map(|f| Standing::of(f, game.catalog()))
        .collect();
    if args.json {
        let report = Report {
            scenario: &scenario.name,
            rounds: game.round(),
            outcome: game.outcome(),
            standings,
            turns: &turns,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} | rounds: {} | turns: {} | {}",
        scenario.name,
        game.round(),
        turns.len(),
        describe(&game)
    );
    for s in &standings {
        println!(
            "  {:<20} hp {:>2}/{:<2} | credits {:>3} | assets {:>2} | claims {}",
            s.name, s.hp, s.max_hp, s.credits, s.assets, s.bases
        );
    }
    Ok(())
}
