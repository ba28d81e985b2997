//! Simulation report generation.

use crate::combat::{CombatEvent, CombatState};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one simulated expedition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub monsters_defeated: u32,
    pub cleared: bool,
    pub retreated: bool,
    pub timed_out: bool,
    pub ticks: u64,
    pub seconds_traveling: f64,
    pub seconds_fighting: f64,
    pub seconds_recovering: f64,
    pub final_hp: u32,
}

impl RunStats {
    /// Process the events raised by one engine call.
    pub fn record(&mut self, events: &[CombatEvent]) {
        for event in events {
            match event {
                CombatEvent::MonsterDefeated { .. } => self.monsters_defeated += 1,
                CombatEvent::ExpeditionCompleted { ending_state } => match ending_state {
                    CombatState::Regenerating => self.cleared = true,
                    CombatState::Retreating => self.retreated = true,
                    _ => {}
                },
                _ => {}
            }
        }
    }

    /// Attribute `seconds` to the state the engine was in when the tick began.
    pub fn add_time(&mut self, state: CombatState, seconds: f64) {
        match state {
            CombatState::Traveling => self.seconds_traveling += seconds,
            CombatState::Fighting => self.seconds_fighting += seconds,
            CombatState::Retreating | CombatState::Regenerating => {
                self.seconds_recovering += seconds
            }
            CombatState::Idle => {}
        }
    }

    pub fn total_seconds(&self) -> f64 {
        self.seconds_traveling + self.seconds_fighting + self.seconds_recovering
    }
}

/// Aggregated results from multiple simulation runs.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub num_runs: u32,
    pub runs_cleared: u32,
    pub runs_retreated: u32,
    pub runs_timed_out: u32,
    pub clear_rate: f64,

    pub avg_monsters_defeated: f64,
    pub avg_seconds_fighting: f64,
    pub avg_seconds_recovering: f64,
    pub avg_seconds_total: f64,

    /// Monsters defeated -> number of runs
    pub kill_distribution: BTreeMap<u32, u32>,

    pub run_stats: Vec<RunStats>,
}

impl SimReport {
    pub fn from_runs(runs: Vec<RunStats>) -> Self {
        let num_runs = runs.len() as u32;
        let divisor = num_runs.max(1) as f64;
        let runs_cleared = runs.iter().filter(|r| r.cleared).count() as u32;
        let runs_retreated = runs.iter().filter(|r| r.retreated).count() as u32;
        let runs_timed_out = runs.iter().filter(|r| r.timed_out).count() as u32;

        let average = |f: fn(&RunStats) -> f64| runs.iter().map(f).sum::<f64>() / divisor;
        let avg_monsters_defeated = average(|r| r.monsters_defeated as f64);
        let avg_seconds_fighting = average(|r| r.seconds_fighting);
        let avg_seconds_recovering = average(|r| r.seconds_recovering);
        let avg_seconds_total = average(RunStats::total_seconds);

        let mut kill_distribution = BTreeMap::new();
        for run in &runs {
            *kill_distribution.entry(run.monsters_defeated).or_insert(0) += 1;
        }

        Self {
            num_runs,
            runs_cleared,
            runs_retreated,
            runs_timed_out,
            clear_rate: runs_cleared as f64 / divisor,
            avg_monsters_defeated,
            avg_seconds_fighting,
            avg_seconds_recovering,
            avg_seconds_total,
            kill_distribution,
            run_stats: runs,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══ Expedition Simulation Report ═══\n");
        out.push_str(&format!("Runs:              {}\n", self.num_runs));
        out.push_str(&format!(
            "Cleared:           {} ({:.1}%)\n",
            self.runs_cleared,
            self.clear_rate * 100.0
        ));
        out.push_str(&format!("Retreated:         {}\n", self.runs_retreated));
        out.push_str(&format!("Timed out:         {}\n", self.runs_timed_out));
        out.push_str(&format!(
            "Avg kills:         {:.2}\n",
            self.avg_monsters_defeated
        ));
        out.push_str(&format!(
            "Avg time fighting: {:.1}s\n",
            self.avg_seconds_fighting
        ));
        out.push_str(&format!(
            "Avg recovery:      {:.1}s\n",
            self.avg_seconds_recovering
        ));
        out.push_str(&format!("Avg expedition:    {:.1}s\n", self.avg_seconds_total));
        out.push_str("\nKills per run:\n");
        for (kills, count) in &self.kill_distribution {
            let pct = *count as f64 / self.num_runs.max(1) as f64 * 100.0;
            out.push_str(&format!("  {:>3}: {:>5} ({:.1}%)\n", kills, count, pct));
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
