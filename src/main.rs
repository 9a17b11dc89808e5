//! Skirmish - Entry Point
//!
//! Loads a scenario, fights the battle in real time and prints a summary.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tokio::runtime::Runtime;

use skirmish::core::error::Result;
use skirmish::scenario::Scenario;
use skirmish::simulation::{BattleLog, BattleSummary, Simulator};

/// Automated battle between the armies of a scenario file
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Resolve a squad and army battle described by a scenario file")]
struct Args {
    /// Scenario file (.toml or .json)
    #[arg(long, short = 's')]
    scenario: PathBuf,

    /// Battle log output path (overrides the scenario's battle_log_path)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Milliseconds between attack rounds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Maximum rounds before the battle is declared a draw
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skirmish=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let scenario = Scenario::load(&args.scenario)?;
    let mut config = scenario.simulator_config();
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Some(max_ticks) = args.max_ticks {
        config.max_ticks = max_ticks;
    }
    if let Some(path) = args.log {
        config.battle_log_path = Some(path);
    }

    let writer: Box<dyn Write> = match &config.battle_log_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::sink()),
    };
    let mut log = BattleLog::new(writer);

    let rt = Runtime::new()?;
    let simulator = Simulator::new(config);
    let summary = rt.block_on(simulator.play_scenario(&scenario, &mut log))?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &BattleSummary) {
    println!("\n=== BATTLE RESULT ===");
    match summary.outcome.winner() {
        Some(winner) => println!("Winner: {winner}"),
        None => println!("Draw"),
    }
    println!("Rounds: {}", summary.ticks);
    println!(
        "Attacks: {} ({} successful)",
        summary.attacks, summary.successful_attacks
    );
    for army in &summary.armies {
        println!(
            "  {}: {} squads, {} units standing",
            army.name, army.alive_squads, army.alive_units
        );
    }
}
