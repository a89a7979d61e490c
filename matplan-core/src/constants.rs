//! Centralized cost tables for Matplan requirement math.
//!
//! These values define the deterministic currency and ember math used by the
//! requirement calculator. They are kept as literal constants so any change
//! goes through code review rather than an external data file.

// Progression bounds -------------------------------------------------------
pub const MAX_ASCENSION_RANK: u8 = 4;
pub const MIN_SKILL_LEVEL: u8 = 1;
pub const MAX_SKILL_LEVEL: u8 = 10;
pub const SKILL_TRACK_COUNT: usize = 3;
pub const MIN_LEVEL: u32 = 1;

// Resource identifiers -----------------------------------------------------
pub const CURRENCY_ID: &str = "qp";
pub const CURRENCY_NAME: &str = "QP";
pub const CURRENCY_ICON: &str = "icons/qp.png";
pub const CURRENCY_RARITY_LABEL: &str = "currency";
pub const EMBER_ID_PREFIX: &str = "ember-";
pub const ASCENSION_ID_PREFIX: &str = "ascension-";
pub const SKILL_ID_PREFIX: &str = "skill-";
pub const PLACEHOLDER_RARITY_LABEL: &str = "unknown";

// Rarity multipliers -------------------------------------------------------
/// Multiplier applied when a rarity falls outside 1–5.
pub const DEFAULT_RARITY_MULTIPLIER: f64 = 1.0;
const RARITY_MULTIPLIERS: [f64; 5] = [1.0, 1.5, 2.0, 3.0, 4.0];

// Currency tables (indexed by rarity - 1) -----------------------------------
pub const DEFAULT_PER_LEVEL_RATE: u64 = 10_000;
const PER_LEVEL_RATE: [u64; 5] = [2_500, 5_000, 10_000, 20_000, 30_000];

pub const DEFAULT_BASE_ASCENSION_COST: u64 = 30_000;
const BASE_ASCENSION_COST: [u64; 5] = [10_000, 15_000, 30_000, 50_000, 100_000];

pub const DEFAULT_CASTING_COST: u64 = 300_000;
const CASTING_COST: [u64; 5] = [50_000, 100_000, 300_000, 900_000, 3_000_000];

/// Base currency for raising a skill from level `n` to `n + 1`, indexed by `n - 1`.
const PER_SKILL_LEVEL_COST: [u64; 9] = [
    10_000, 20_000, 60_000, 80_000, 200_000, 240_000, 400_000, 480_000, 1_000_000,
];

// Ember tiers --------------------------------------------------------------
pub const EMBER_BRONZE_FACTOR: f64 = 6.0;
pub const EMBER_SILVER_FACTOR: f64 = 4.0;
pub const EMBER_GOLD_FACTOR: f64 = 2.0;

/// Rarities at or below this value receive the low-rarity tier scaling.
pub const EMBER_LOW_RARITY_CEILING: u8 = 2;
pub const EMBER_LOW_RARITY_BRONZE_SCALE: f64 = 1.5;
pub const EMBER_LOW_RARITY_SILVER_SCALE: f64 = 0.8;
pub const EMBER_LOW_RARITY_GOLD_SCALE: f64 = 0.5;

// Farming ------------------------------------------------------------------
/// Tokens of this length or shorter are ignored by word-overlap matching.
pub const MATCH_TOKEN_MIN_EXCLUSIVE: usize = 2;

// Plan cache ---------------------------------------------------------------
/// Distinct inputs a `PlanCache` keeps before evicting the oldest.
pub const PLAN_CACHE_CAPACITY: usize = 64;

fn rarity_index(rarity: u8) -> Option<usize> {
    (1..=5).contains(&rarity).then(|| usize::from(rarity - 1))
}

/// Scaling applied to skill currency and ember amounts for a rarity.
#[must_use]
pub fn rarity_multiplier(rarity: u8) -> f64 {
    rarity_index(rarity).map_or(DEFAULT_RARITY_MULTIPLIER, |idx| RARITY_MULTIPLIERS[idx])
}

/// Currency spent per character level gained.
#[must_use]
pub fn per_level_rate(rarity: u8) -> u64 {
    rarity_index(rarity).map_or(DEFAULT_PER_LEVEL_RATE, |idx| PER_LEVEL_RATE[idx])
}

/// Currency spent per ascension step.
#[must_use]
pub fn base_ascension_cost(rarity: u8) -> u64 {
    rarity_index(rarity).map_or(DEFAULT_BASE_ASCENSION_COST, |idx| BASE_ASCENSION_COST[idx])
}

/// One-time surcharge for reaching the final ascension rank.
#[must_use]
pub fn casting_cost(rarity: u8) -> u64 {
    rarity_index(rarity).map_or(DEFAULT_CASTING_COST, |idx| CASTING_COST[idx])
}

/// Unscaled currency for leaving skill level `level`. Zero at or past the cap.
#[must_use]
pub fn per_skill_level_cost(level: u8) -> u64 {
    level
        .checked_sub(1)
        .and_then(|idx| PER_SKILL_LEVEL_COST.get(usize::from(idx)))
        .copied()
        .unwrap_or(0)
}
