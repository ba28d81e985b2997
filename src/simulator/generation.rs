//! Seeded monster factory for simulated expeditions.
//!
//! All randomness lives here. The engine only ever receives finished stat
//! blocks.

use rand::Rng;

use crate::commands::StatBlock;
use crate::core::constants::*;

/// Gets tier-specific monster name prefixes
fn tier_prefixes(tier: u32) -> &'static [&'static str] {
    match tier {
        1 => &["Sewer", "Mangy", "Squeaking", "Burrow", "Dim"],
        2 => &["Grave", "Bone", "Hollow", "Crypt", "Pale"],
        3 => &["Deep", "Shadow", "Stone", "Echoing", "Blind"],
        4 => &["Molten", "Ember", "Ash", "Scorched", "Cinder"],
        5 => &["Abyssal", "Void", "Nameless", "Starving", "Ancient"],
        _ => &["Wild", "Fierce", "Dark", "Savage", "Grim"],
    }
}

/// Gets tier-specific monster name suffixes
fn tier_suffixes(tier: u32) -> &'static [&'static str] {
    match tier {
        1 => &["Rat", "Kobold", "Slime", "Bat", "Goblin"],
        2 => &["Skeleton", "Ghoul", "Wight", "Zombie", "Shade"],
        3 => &["Troll", "Basilisk", "Golem", "Crawler", "Ogre"],
        4 => &["Salamander", "Imp", "Drake", "Elemental", "Hellhound"],
        5 => &["Horror", "Devourer", "Wyrm", "Lich", "Behemoth"],
        _ => &["Beast", "Horror", "Fiend", "Terror", "Monster"],
    }
}

/// Generates a tier-themed monster name
pub fn generate_monster_name(tier: u32, rng: &mut impl Rng) -> String {
    let prefixes = tier_prefixes(tier);
    let suffixes = tier_suffixes(tier);

    let prefix = prefixes[rng.gen_range(0..prefixes.len())];
    let suffix = suffixes[rng.gen_range(0..suffixes.len())];

    format!("{} {}", prefix, suffix)
}

/// Looks up tier base stats. Tiers are 1-indexed; out-of-range tiers clamp.
fn tier_base_stats(tier: u32) -> (u32, u32, u32, u32) {
    let index = (tier.saturating_sub(1) as usize).min(MONSTER_TIER_STATS.len() - 1);
    MONSTER_TIER_STATS[index]
}

/// Returns (hp, attack) for the monster at `position` (0-based) in the queue.
fn calc_monster_stats(tier: u32, position: u32, rng: &mut impl Rng) -> (u32, u32) {
    let (base_hp, hp_step, base_attack, attack_step) = tier_base_stats(tier);

    let raw_hp = base_hp + position * hp_step;
    let raw_attack = base_attack + position * attack_step;

    let hp_var = rng.gen_range(MONSTER_STAT_VARIANCE_MIN..MONSTER_STAT_VARIANCE_MAX);
    let attack_var = rng.gen_range(MONSTER_STAT_VARIANCE_MIN..MONSTER_STAT_VARIANCE_MAX);

    let hp = ((raw_hp as f64) * hp_var).max(1.0) as u32;
    let attack = ((raw_attack as f64) * attack_var).max(1.0) as u32;
    (hp, attack)
}

pub fn generate_monster(tier: u32, position: u32, rng: &mut impl Rng) -> StatBlock {
    let (hp, attack) = calc_monster_stats(tier, position, rng);
    StatBlock::new(generate_monster_name(tier, rng), hp as i64, attack as i64)
}

pub fn generate_elite(tier: u32, position: u32, rng: &mut impl Rng) -> StatBlock {
    let (hp, attack) = calc_monster_stats(tier, position, rng);
    let (hp_m, attack_m) = ELITE_MULTIPLIERS;
    StatBlock::new(
        format!("Elite {}", generate_monster_name(tier, rng)),
        (hp as f64 * hp_m).max(1.0) as i64,
        (attack as f64 * attack_m).max(1.0) as i64,
    )
}

/// A queue of `count` monsters of rising strength, guarded by an elite at
/// the end.
pub fn generate_expedition(tier: u32, count: u32, rng: &mut impl Rng) -> Vec<StatBlock> {
    (0..count)
        .map(|position| {
            if position + 1 == count {
                generate_elite(tier, position, rng)
            } else {
                generate_monster(tier, position, rng)
            }
        })
        .collect()
}

pub fn default_adventurer() -> StatBlock {
    StatBlock::new(
        "Adventurer",
        DEFAULT_ADVENTURER_HP as i64,
        DEFAULT_ADVENTURER_ATTACK as i64,
    )
    .with_retreat(DEFAULT_ADVENTURER_RETREAT_THRESHOLD)
    .with_regen(DEFAULT_ADVENTURER_REGEN as i64)
}
