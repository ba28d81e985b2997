// Tick and timing
pub const TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_TRAVEL_DURATION_SECONDS: f64 = 0.0;

/// Slack used when comparing accumulated seconds or fractional points.
pub const TIME_EPSILON: f64 = 1e-9;

/// Consecutive zero-length catch-up steps that change nothing before an
/// update gives up on the rest of its interval.
pub const MAX_STALLED_CATCH_UP_STEPS: usize = 64;

// Offline progression
pub const MAX_OFFLINE_SECONDS: i64 = 7 * 24 * 60 * 60;

// Combat log
pub const COMBAT_LOG_CAPACITY: usize = 10;

// Simulator defaults
pub const DEFAULT_ADVENTURER_HP: u32 = 100;
pub const DEFAULT_ADVENTURER_ATTACK: u32 = 10;
pub const DEFAULT_ADVENTURER_RETREAT_THRESHOLD: f64 = 0.25;
pub const DEFAULT_ADVENTURER_REGEN: u32 = 2;
pub const SIM_MAX_TICKS_PER_RUN: u64 = 100_000;

// Monster tier base stats: (base_hp, hp_step, base_attack, attack_step)
// Index 0 = Tier 1. Steps apply per queue position above the first.
pub const MONSTER_TIER_STATS: [(u32, u32, u32, u32); 5] = [
    (20, 4, 3, 1),    // Tier 1: Warrens
    (45, 8, 6, 1),    // Tier 2: Crypts
    (90, 12, 10, 2),  // Tier 3: Deep Halls
    (160, 20, 16, 3), // Tier 4: Molten Depths
    (280, 30, 25, 4), // Tier 5: The Abyss
];
pub const MONSTER_STAT_VARIANCE_MIN: f64 = 0.85;
pub const MONSTER_STAT_VARIANCE_MAX: f64 = 1.15;
pub const ELITE_MULTIPLIERS: (f64, f64) = (1.8, 1.3);
