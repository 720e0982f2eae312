//! Enhancement cost advisor CLI.
//!
//! Reads a scenario snapshot (character, item, prices, config) and prints
//! expected attempts, time and cost.
//!
//! Usage:
//!   cargo run --bin enhance -- --scenario sword.json table
//!   cargo run --bin enhance -- --scenario sword.json compare
//!   cargo run --bin enhance -- --scenario sword.json range --from 8 --to 12
//!   cargo run --bin enhance -- --scenario sword.json --json value --level 10

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use enhancer::advisor::predict_session;
use enhancer::enhancement::{CharacterSnapshot, ItemGameData, MaterialRequirement};
use enhancer::pricing::{MarketPrices, PriceMode, PriceQuote};
use enhancer::report;
use enhancer::scenario::{RecoverySpec, Scenario};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enhance")]
#[command(about = "Expected cost of enhancing an item", long_about = None)]
struct Cli {
    /// Scenario snapshot file
    #[arg(short, long, global = true, default_value = "scenario.json")]
    scenario: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Also save the JSON report to a timestamped file
    #[arg(long, global = true)]
    save: bool,

    /// Override the scenario's price side
    #[arg(long, global = true, value_enum)]
    price_mode: Option<ModeArg>,

    /// Override the scenario's highest level
    #[arg(long, global = true)]
    max_target: Option<u8>,

    /// Override the protection threshold (0 = never)
    #[arg(long, global = true)]
    protect_from: Option<u8>,

    /// Debug logging (RUST_LOG wins if set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Ask,
    Bid,
    Mid,
}

impl From<ModeArg> for PriceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ask => PriceMode::Ask,
            ModeArg::Bid => PriceMode::Bid,
            ModeArg::Mid => PriceMode::Mid,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cost table +1..=max under the configured policy
    Table,
    /// Cheapest policy per level, with the recovery item if configured
    Compare,
    /// Expected cost between two levels
    Range {
        #[arg(long, default_value = "0")]
        from: u8,
        #[arg(long)]
        to: u8,
    },
    /// Value of the item already enhanced to a level
    Value {
        #[arg(long)]
        level: u8,
    },
    /// Remaining cost of a session in progress
    Session {
        #[arg(long)]
        current: u8,
        #[arg(long)]
        target: u8,
    },
    /// Write a sample scenario file to start from
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init = cli.command {
        sample_scenario()
            .save(&cli.scenario)
            .with_context(|| format!("writing {}", cli.scenario.display()))?;
        println!("Sample scenario written to: {}", cli.scenario.display());
        return Ok(());
    }

    let mut scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading {}", cli.scenario.display()))?;
    if let Some(mode) = cli.price_mode {
        scenario.config.price_mode = mode.into();
    }
    if let Some(max_target) = cli.max_target {
        scenario.config.max_target = max_target;
    }
    if let Some(protect_from) = cli.protect_from {
        scenario.config.protect_from = protect_from;
    }

    let mut cache = scenario.refresh()?;
    let item_id = scenario.item.item_id.clone();

    let (text, json) = match cli.command {
        Commands::Table => {
            let table = cache.cost_table(scenario.config.table_policy())?;
            (report::table_text(&item_id, &table), report::to_json(&table)?)
        }
        Commands::Compare => {
            let comparison = scenario.compare(&mut cache)?;
            (report::comparison_text(&comparison), report::to_json(&comparison)?)
        }
        Commands::Range { from, to } => {
            let result = cache.progression(scenario.config.table_policy(), from, to)?;
            (report::progression_text(&result), report::to_json(&result)?)
        }
        Commands::Value { level } => {
            let valuation = scenario.valuation(&mut cache, level)?;
            (report::valuation_text(&item_id, &valuation), report::to_json(&valuation)?)
        }
        Commands::Session { current, target } => {
            let policy = scenario.config.table_policy();
            let prediction = predict_session(&mut cache, policy, current, target)?;
            (report::prediction_text(&prediction), report::to_json(&prediction)?)
        }
        Commands::Init => unreachable!("handled above"),
    };
    info!(hits = cache.hits(), "solver memo");

    if cli.json {
        println!("{}", json);
    } else {
        println!("{}", text);
    }

    if cli.save {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("enhance_report_{}.json", stamp);
        std::fs::write(&filename, &json).with_context(|| format!("writing {}", filename))?;
        println!("JSON report saved to: {}", filename);
    }
    Ok(())
}

fn sample_scenario() -> Scenario {
    Scenario {
        character: CharacterSnapshot::new(60),
        item: ItemGameData {
            item_id: "cheese_sword".into(),
            item_level: 1,
            base_curve: vec![
                0.50, 0.45, 0.45, 0.40, 0.40, 0.40, 0.35, 0.35, 0.35, 0.35, 0.30, 0.30, 0.30,
                0.30, 0.30, 0.30, 0.30, 0.30, 0.30, 0.30,
            ],
            materials: vec![MaterialRequirement {
                item_id: "cheese".into(),
                count: 1.0,
            }],
            protection_item: Some("cheese_sword".into()),
            base_action_seconds: 12.0,
        },
        prices: MarketPrices::new()
            .with("cheese", PriceQuote::market(20.0, 15.0))
            .with("cheese_sword", PriceQuote::market(400.0, 300.0))
            .with("philosophers_mirror", PriceQuote::market(1_000_000.0, 900_000.0)),
        config: Default::default(),
        recovery: Some(RecoverySpec {
            item_id: "philosophers_mirror".into(),
            offsets: (1, 2),
            combine: Default::default(),
        }),
    }
}
