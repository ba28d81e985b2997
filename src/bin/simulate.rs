//! Expedition balance simulator CLI.
//!
//! Runs seeded expeditions through the engine, or replays a scripted
//! scenario file.
//!
//! Usage:
//!   cargo run --bin simulate -- [OPTIONS]
//!
//! Examples:
//!   cargo run --bin simulate                        # 1000 runs at tier 1
//!   cargo run --bin simulate -- -n 100 --tier 3     # 100 runs at tier 3
//!   cargo run --bin simulate -- --seed 42 --catch-up
//!   cargo run --bin simulate -- --scenario demos/retreat.json

use clap::Parser;
use delve::combat::TickPolicy;
use delve::simulator::{replay_scenario, run_simulation, Scenario, SimConfig};
use delve::Result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Expedition balance simulator
#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Run seeded expeditions and report clear and retreat rates")]
struct Args {
    /// Number of expeditions to simulate
    #[arg(long, short = 'n', default_value_t = 1000)]
    runs: u32,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Monsters queued per expedition
    #[arg(long, default_value_t = 5)]
    monsters: u32,

    /// Monster tier (1-5)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=5))]
    tier: u32,

    /// Milliseconds passed to each update
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Travel time before the first fight, in seconds
    #[arg(long, default_value_t = 0.0)]
    travel: f64,

    /// Resolve every boundary inside one update instead of one phase per update
    #[arg(long)]
    catch_up: bool,

    /// Replay a JSON scenario instead of running random expeditions
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Write the report as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Increase log output (-v per-run summaries, -vv combat log)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            if e.is_usage_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    if let Some(path) = &args.scenario {
        return run_scenario(path, args.json.as_ref());
    }

    let config = SimConfig {
        num_runs: args.runs,
        seed: args.seed,
        tier: args.tier,
        monsters_per_expedition: args.monsters,
        tick_seconds: args.tick_ms as f64 / 1000.0,
        tick_policy: if args.catch_up {
            TickPolicy::CatchUp
        } else {
            TickPolicy::Stepwise
        },
        travel_seconds: args.travel,
        verbosity: args.verbose.saturating_add(1),
        ..Default::default()
    };

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║              DELVE EXPEDITION SIMULATOR                       ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Configuration:");
    println!("  Runs:           {}", config.num_runs);
    println!("  Tier:           {}", config.tier);
    println!("  Monsters:       {}", config.monsters_per_expedition);
    println!("  Tick:           {:.3}s", config.tick_seconds);
    println!("  Policy:         {:?}", config.tick_policy);
    if let Some(seed) = config.seed {
        println!("  Seed:           {}", seed);
    }
    println!();

    let report = run_simulation(&config)?;
    println!("{}", report.to_text());

    if let Some(path) = &args.json {
        std::fs::write(path, report.to_json()?)?;
        println!("JSON report saved to: {}", path.display());
    }
    Ok(())
}

fn run_scenario(path: &Path, json: Option<&PathBuf>) -> Result<()> {
    let scenario = Scenario::load(path)?;
    tracing::info!(
        path = %path.display(),
        ticks = scenario.ticks.len(),
        seconds = scenario.total_seconds(),
        "replaying scenario"
    );

    let outcome = replay_scenario(&scenario)?;
    for event in &outcome.events {
        println!("{event:?}");
    }
    println!();
    println!("Final state:        {}", outcome.status.state);
    if let Some(adventurer) = &outcome.status.adventurer {
        println!(
            "Adventurer:         {} {}/{}",
            adventurer.name, adventurer.current_hp, adventurer.max_hp
        );
    }
    println!("Monsters defeated:  {}", outcome.status.monsters_defeated);
    println!("Monsters remaining: {}", outcome.status.monsters_remaining);

    if let Some(path) = json {
        let body = serde_json::to_string_pretty(&outcome.status)?;
        std::fs::write(path, body)?;
        println!("Status saved to: {}", path.display());
    }
    Ok(())
}
