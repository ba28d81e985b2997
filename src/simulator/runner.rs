//! Drives the real engine through simulated expeditions.
//!
//! Statistics are collected from the events the engine publishes, the same
//! way loot and progression tracking would consume them in the game.

use super::config::SimConfig;
use super::generation::generate_expedition;
use super::report::{RunStats, SimReport};
use super::scenario::Scenario;
use crate::combat::{CombatEvent, CombatState, ExpeditionEngine};
use crate::commands::{execute, status, Command, ExpeditionRequest, ExpeditionStatus};
use crate::error::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

/// Run the full simulation and return a report.
pub fn run_simulation(config: &SimConfig) -> Result<SimReport> {
    let mut all_runs = Vec::with_capacity(config.num_runs as usize);

    for run_idx in 0..config.num_runs {
        // Create RNG for this run
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(run_idx as u64)),
            None => ChaCha8Rng::from_entropy(),
        };

        let monsters = generate_expedition(config.tier, config.monsters_per_expedition, &mut rng);
        let request = ExpeditionRequest::new(config.adventurer.clone(), monsters);
        let run = simulate_single_run(config, request)?;

        if config.verbosity >= 2 {
            debug!(
                run = run_idx + 1,
                of = config.num_runs,
                kills = run.monsters_defeated,
                cleared = run.cleared,
                retreated = run.retreated,
                seconds = run.total_seconds(),
                "run finished"
            );
        }
        all_runs.push(run);
    }

    let report = SimReport::from_runs(all_runs);
    if config.verbosity >= 1 {
        info!(
            runs = report.num_runs,
            clear_rate = report.clear_rate,
            "simulation complete"
        );
    }
    Ok(report)
}

/// Tracks one expedition from dispatch until the adventurer is idle again.
fn simulate_single_run(config: &SimConfig, request: ExpeditionRequest) -> Result<RunStats> {
    let mut engine = ExpeditionEngine::with_config(config.engine_config())?;
    let mut stats = RunStats::default();

    let events = execute(&mut engine, Command::StartExpedition(request))?;
    stats.record(&events);

    while engine.state() != CombatState::Idle {
        if stats.ticks >= config.max_ticks_per_run {
            stats.timed_out = true;
            break;
        }
        let before = engine.state();
        let events = engine.update(config.tick_seconds);
        stats.ticks += 1;
        stats.add_time(before, config.tick_seconds);
        stats.record(&events);
    }

    stats.final_hp = engine.adventurer().map_or(0, |a| a.current_hp);
    Ok(stats)
}

/// Everything a replayed scenario produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub events: Vec<CombatEvent>,
    pub status: ExpeditionStatus,
}

/// Replays a scripted scenario tick by tick.
pub fn replay_scenario(scenario: &Scenario) -> Result<ScenarioOutcome> {
    let mut engine = ExpeditionEngine::with_config(scenario.engine.clone())?;
    let mut events = execute(
        &mut engine,
        Command::StartExpedition(scenario.expedition.clone()),
    )?;

    for (index, seconds) in scenario.ticks.iter().enumerate() {
        events.extend(execute(&mut engine, Command::AdvanceTime(*seconds))?);
        if scenario.force_retreat_after == Some(index) {
            events.extend(execute(&mut engine, Command::ForceRetreat)?);
        }
    }

    for event in &events {
        if let CombatEvent::CombatLogUpdated { line } = event {
            trace!("{line}");
        }
    }

    Ok(ScenarioOutcome {
        events,
        status: status(&engine),
    })
}
