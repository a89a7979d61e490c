//! Farming reference lookups.
//!
//! A material name is resolved against the reference dataset by trying each
//! [`MatchTier`] in order; the first tier that finds an entry wins and later
//! tiers are never consulted. The matched entry's locations are then returned
//! in the dataset's own rank order with per-spot run estimates attached.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::MATCH_TOKEN_MIN_EXCLUSIVE;
use crate::numbers::{ceil_f64_to_u64, u64_to_f64};

/// One acquisition location as listed in the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingLocation {
    pub area: String,
    pub quest: String,
    #[serde(default)]
    pub ap: u32,
    #[serde(default)]
    pub drop_chance_percent: f64,
    #[serde(default)]
    pub ap_per_drop: f64,
    #[serde(default)]
    pub runs: u64,
    pub no: u32,
}

/// A material and its best-known acquisition locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingEntry {
    pub item_name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub best_farming_locations: Vec<FarmingLocation>,
}

/// The farming reference dataset, kept in its original iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FarmingDataset(pub Vec<FarmingEntry>);

impl FarmingDataset {
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Load the dataset from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into farming entries.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FarmingEntry> {
        self.0.iter()
    }
}

/// Matching strategy that produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Substring,
    WordOverlap,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Substring => f.write_str("substring"),
            Self::WordOverlap => f.write_str("word overlap"),
        }
    }
}

/// A query prepared once for every tier.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    folded: String,
    tokens: Vec<String>,
}

impl MatchQuery {
    #[must_use]
    pub fn new(name: &str) -> Self {
        let folded = name.trim().to_lowercase();
        let tokens = folded
            .split_whitespace()
            .filter(|token| token.chars().count() > MATCH_TOKEN_MIN_EXCLUSIVE)
            .map(str::to_string)
            .collect();
        Self { folded, tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

type TierMatcher = fn(&MatchQuery, &str) -> bool;

fn exact_match(query: &MatchQuery, candidate: &str) -> bool {
    candidate == query.folded
}

fn substring_match(query: &MatchQuery, candidate: &str) -> bool {
    candidate.contains(query.folded.as_str()) || query.folded.contains(candidate)
}

fn word_overlap_match(query: &MatchQuery, candidate: &str) -> bool {
    !query.tokens.is_empty()
        && query
            .tokens
            .iter()
            .all(|token| candidate.contains(token.as_str()))
}

/// Tiers in precedence order.
pub const MATCH_TIERS: [(MatchTier, TierMatcher); 3] = [
    (MatchTier::Exact, exact_match),
    (MatchTier::Substring, substring_match),
    (MatchTier::WordOverlap, word_overlap_match),
];

/// A dataset entry selected for a material name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDescriptor<'a> {
    pub entry: &'a FarmingEntry,
    pub tier: MatchTier,
}

/// Outcome of resolving a material name against the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FarmingMatch<'a> {
    Found(MaterialDescriptor<'a>),
    NotFound,
}

impl<'a> FarmingMatch<'a> {
    #[must_use]
    pub const fn descriptor(&self) -> Option<&MaterialDescriptor<'a>> {
        match self {
            Self::Found(descriptor) => Some(descriptor),
            Self::NotFound => None,
        }
    }
}

fn first_match<'a>(
    matcher: TierMatcher,
    query: &MatchQuery,
    dataset: &'a FarmingDataset,
) -> Option<&'a FarmingEntry> {
    dataset
        .iter()
        .find(|entry| matcher(query, &entry.item_name.trim().to_lowercase()))
}

/// Try a single tier against the dataset in iteration order.
#[must_use]
pub fn match_tier<'a>(
    tier: MatchTier,
    query: &MatchQuery,
    dataset: &'a FarmingDataset,
) -> Option<&'a FarmingEntry> {
    MATCH_TIERS
        .iter()
        .find(|(candidate, _)| *candidate == tier)
        .and_then(|(_, matcher)| first_match(*matcher, query, dataset))
}

/// Resolve a material name; the first tier that matches wins.
#[must_use]
pub fn resolve<'a>(material_name: &str, dataset: &'a FarmingDataset) -> FarmingMatch<'a> {
    let query = MatchQuery::new(material_name);
    if query.folded.is_empty() {
        return FarmingMatch::NotFound;
    }
    for (tier, matcher) in MATCH_TIERS {
        if let Some(entry) = first_match(matcher, &query, dataset) {
            log::debug!(
                "resolved `{material_name}` to `{}` via {tier} match",
                entry.item_name
            );
            return FarmingMatch::Found(MaterialDescriptor { entry, tier });
        }
    }
    log::debug!("no farming entry for `{material_name}`");
    FarmingMatch::NotFound
}

/// Runs needed to expect a drop; unbounded when the drop rate is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEstimate {
    Runs(u64),
    Unbounded,
}

impl RunEstimate {
    #[must_use]
    pub fn for_one_drop(drop_chance_percent: f64) -> Self {
        if drop_chance_percent > 0.0 && drop_chance_percent.is_finite() {
            Self::Runs(ceil_f64_to_u64(100.0 / drop_chance_percent))
        } else {
            Self::Unbounded
        }
    }

    #[must_use]
    pub const fn times(self, count: u64) -> Self {
        match self {
            Self::Runs(runs) => Self::Runs(runs.saturating_mul(count)),
            Self::Unbounded => Self::Unbounded,
        }
    }
}

impl fmt::Display for RunEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runs(runs) => write!(f, "{runs}"),
            Self::Unbounded => f.write_str("∞"),
        }
    }
}

/// A ranked location with derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingSpot {
    pub area: String,
    pub quest: String,
    pub ap_cost: u32,
    pub drop_rate_percent: f64,
    pub ap_per_drop: f64,
    pub runs_observed: u64,
    pub rank: u32,
    pub runs_for_one_drop: RunEstimate,
    pub runs_for_deficit: RunEstimate,
}

impl FarmingSpot {
    fn from_location(location: &FarmingLocation, deficit: u64) -> Self {
        let runs_for_one_drop = RunEstimate::for_one_drop(location.drop_chance_percent);
        Self {
            area: location.area.clone(),
            quest: location.quest.clone(),
            ap_cost: location.ap,
            drop_rate_percent: location.drop_chance_percent,
            ap_per_drop: location.ap_per_drop,
            runs_observed: location.runs,
            rank: location.no,
            runs_for_one_drop,
            runs_for_deficit: runs_for_one_drop.times(deficit),
        }
    }
}

/// Locations for a resolved material in dataset rank order.
#[must_use]
pub fn spots(descriptor: &MaterialDescriptor<'_>, deficit: u64) -> Vec<FarmingSpot> {
    let mut ranked: Vec<&FarmingLocation> =
        descriptor.entry.best_farming_locations.iter().collect();
    ranked.sort_by_key(|location| location.no);
    ranked
        .into_iter()
        .map(|location| FarmingSpot::from_location(location, deficit))
        .collect()
}

/// AP to cover a deficit at the top-ranked spot, if there is one.
#[must_use]
pub fn estimated_ap(spots: &[FarmingSpot], deficit: u64) -> Option<u64> {
    spots
        .first()
        .map(|top| ceil_f64_to_u64(top.ap_per_drop * u64_to_f64(deficit)))
}

/// Full lookup result for one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum FarmingReport {
    Matched {
        item_name: String,
        icon: String,
        tier: MatchTier,
        spots: Vec<FarmingSpot>,
        estimated_ap: Option<u64>,
    },
    NotFound {
        query: String,
    },
}

/// Resolve a material and rank its spots for the given deficit.
#[must_use]
pub fn lookup(material_name: &str, deficit: u64, dataset: &FarmingDataset) -> FarmingReport {
    match resolve(material_name, dataset) {
        FarmingMatch::Found(descriptor) => {
            let spots = spots(&descriptor, deficit);
            let estimated_ap = estimated_ap(&spots, deficit);
            FarmingReport::Matched {
                item_name: descriptor.entry.item_name.clone(),
                icon: descriptor.entry.icon.clone(),
                tier: descriptor.tier,
                spots,
                estimated_ap,
            }
        }
        FarmingMatch::NotFound => FarmingReport::NotFound {
            query: material_name.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(no: u32, drop: f64, ap_per_drop: f64) -> FarmingLocation {
        FarmingLocation {
            area: format!("Area {no}"),
            quest: format!("Quest {no}"),
            ap: 40,
            drop_chance_percent: drop,
            ap_per_drop,
            runs: 1_000,
            no,
        }
    }

    fn entry(name: &str, locations: Vec<FarmingLocation>) -> FarmingEntry {
        FarmingEntry {
            item_name: name.to_string(),
            icon: String::new(),
            best_farming_locations: locations,
        }
    }

    fn dataset() -> FarmingDataset {
        FarmingDataset(vec![
            entry("Proof of Hero Fragment", vec![location(1, 50.0, 80.0)]),
            entry("Proof of Hero", vec![location(2, 40.0, 100.0), location(1, 25.0, 160.0)]),
            entry("Dragon Fang", Vec::new()),
            entry("Eternal Gear", vec![location(1, 10.0, 400.0)]),
        ])
    }

    #[test]
    fn exact_match_beats_earlier_substring_match() {
        let data = dataset();
        let resolved = resolve("proof of hero", &data);
        let descriptor = resolved.descriptor().unwrap();
        assert_eq!(descriptor.tier, MatchTier::Exact);
        assert_eq!(descriptor.entry.item_name, "Proof of Hero");
    }

    #[test]
    fn substring_matches_in_either_direction() {
        let data = dataset();
        let forward = resolve("Fang", &data);
        assert_eq!(forward.descriptor().unwrap().entry.item_name, "Dragon Fang");
        assert_eq!(forward.descriptor().unwrap().tier, MatchTier::Substring);

        let backward = resolve("Dragon Fang (ascension)", &data);
        assert_eq!(backward.descriptor().unwrap().entry.item_name, "Dragon Fang");
    }

    #[test]
    fn word_overlap_requires_every_long_token() {
        let data = dataset();
        let overlap = resolve("Gear Eternal", &data);
        let descriptor = overlap.descriptor().unwrap();
        assert_eq!(descriptor.tier, MatchTier::WordOverlap);
        assert_eq!(descriptor.entry.item_name, "Eternal Gear");

        assert_eq!(resolve("Gear Mystic", &data), FarmingMatch::NotFound);
    }

    #[test]
    fn short_tokens_never_overlap() {
        let query = MatchQuery::new("of to a");
        assert!(query.tokens().is_empty());
        assert!(match_tier(MatchTier::WordOverlap, &query, &dataset()).is_none());
        assert_eq!(resolve("   ", &dataset()), FarmingMatch::NotFound);
    }

    #[test]
    fn resolve_agrees_with_the_first_matching_tier() {
        let data = dataset();
        for name in ["proof of hero", "Fang", "Gear Eternal", "Gear Mystic", "Hero Fragment"] {
            let query = MatchQuery::new(name);
            let expected = MATCH_TIERS.iter().find_map(|(tier, _)| {
                match_tier(*tier, &query, &data).map(|entry| (*tier, entry.item_name.as_str()))
            });
            let resolved = resolve(name, &data)
                .descriptor()
                .map(|d| (d.tier, d.entry.item_name.as_str()));
            assert_eq!(resolved, expected, "{name}");
        }
    }

    #[test]
    fn spots_follow_rank_and_derive_runs() {
        let data = dataset();
        let resolved = resolve("Proof of Hero", &data);
        let spots = spots(resolved.descriptor().unwrap(), 3);
        assert_eq!(spots.iter().map(|s| s.rank).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(spots[0].runs_for_one_drop, RunEstimate::Runs(4));
        assert_eq!(spots[0].runs_for_deficit, RunEstimate::Runs(12));
        assert_eq!(spots[1].runs_for_one_drop, RunEstimate::Runs(3));
        assert_eq!(estimated_ap(&spots, 3), Some(480));
    }

    #[test]
    fn zero_drop_rate_is_unbounded() {
        assert_eq!(RunEstimate::for_one_drop(0.0), RunEstimate::Unbounded);
        assert_eq!(RunEstimate::Unbounded.times(5).to_string(), "∞");
    }

    #[test]
    fn lookup_distinguishes_not_found_from_zero_locations() {
        let data = dataset();
        match lookup("Dragon Fang", 2, &data) {
            FarmingReport::Matched {
                spots, estimated_ap, ..
            } => {
                assert!(spots.is_empty());
                assert_eq!(estimated_ap, None);
            }
            FarmingReport::NotFound { .. } => panic!("expected a match"),
        }
        assert!(matches!(
            lookup("Phoenix Feather", 2, &data),
            FarmingReport::NotFound { .. }
        ));
        assert!(matches!(
            lookup("Dragon Fang", 2, &FarmingDataset::empty()),
            FarmingReport::NotFound { .. }
        ));
    }
}
