//! Requirement calculation from a progression target.
//!
//! [`calculate_requirements`] is a pure function producing pre-merge
//! requirement lines. The same item may appear twice (once from ascension,
//! once from skills); merging is left to [`crate::aggregate`].
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Catalog, EntityMetadata, ItemAmount};
use crate::constants::{
    CURRENCY_ICON, CURRENCY_NAME, CURRENCY_RARITY_LABEL, EMBER_BRONZE_FACTOR, EMBER_GOLD_FACTOR,
    EMBER_LOW_RARITY_BRONZE_SCALE, EMBER_LOW_RARITY_CEILING, EMBER_LOW_RARITY_GOLD_SCALE,
    EMBER_LOW_RARITY_SILVER_SCALE, EMBER_SILVER_FACTOR, MAX_ASCENSION_RANK, base_ascension_cost,
    casting_cost, per_level_rate, per_skill_level_cost, rarity_multiplier,
};
use crate::numbers::{floor_f64_to_u64, u32_to_f64, u64_to_f64};
use crate::progression::{ProgressionTarget, SkillTrack};
use crate::resource::{EmberTier, ItemId, RawResourceId};

/// Options controlling which requirement classes are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcOptions {
    #[serde(default = "CalcOptions::default_include_currency")]
    pub include_currency: bool,
}

impl CalcOptions {
    const fn default_include_currency() -> bool {
        true
    }
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self {
            include_currency: Self::default_include_currency(),
        }
    }
}

/// A single resource requirement line.
///
/// The deficit is derived from `required` and `current` on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequirement {
    pub id: RawResourceId,
    pub name: String,
    pub rarity_label: String,
    pub icon: String,
    pub required: u64,
    #[serde(default)]
    pub current: u64,
}

impl MaterialRequirement {
    #[must_use]
    pub const fn deficit(&self) -> u64 {
        self.required.saturating_sub(self.current)
    }

    fn currency(amount: u64) -> Self {
        Self {
            id: RawResourceId::Currency,
            name: CURRENCY_NAME.to_string(),
            rarity_label: CURRENCY_RARITY_LABEL.to_string(),
            icon: CURRENCY_ICON.to_string(),
            required: amount,
            current: 0,
        }
    }

    fn ember(tier: EmberTier, amount: u64) -> Self {
        Self {
            id: RawResourceId::Ember(tier),
            name: tier.display_name().to_string(),
            rarity_label: tier.key().to_string(),
            icon: format!("icons/embers/{}.png", tier.key()),
            required: amount,
            current: 0,
        }
    }

    fn catalog_item(id: RawResourceId, item_id: ItemId, amount: u64, catalog: &Catalog) -> Self {
        let record = catalog.item_or_placeholder(item_id);
        Self {
            id,
            rarity_label: record.rarity_label().to_string(),
            name: record.name,
            icon: record.icon,
            required: amount,
            current: 0,
        }
    }
}

/// Compute every requirement line for moving an entity from current to target.
///
/// Returns an empty list when every axis is already at or past its target.
#[must_use]
pub fn calculate_requirements(
    target: &ProgressionTarget,
    entity: &EntityMetadata,
    catalog: &Catalog,
    options: CalcOptions,
) -> Vec<MaterialRequirement> {
    let mut out = Vec::new();

    if options.include_currency {
        let qp = currency_cost(target, entity.rarity);
        if qp > 0 {
            out.push(MaterialRequirement::currency(qp));
        }
    }

    out.extend(
        ember_cost(target, entity.rarity)
            .into_iter()
            .map(|(tier, amount)| MaterialRequirement::ember(tier, amount)),
    );

    for (item_id, amount) in ascension_materials(target, entity) {
        out.push(MaterialRequirement::catalog_item(
            RawResourceId::ascension(item_id),
            item_id,
            amount,
            catalog,
        ));
    }

    for (item_id, amount) in skill_materials(target, entity) {
        out.push(MaterialRequirement::catalog_item(
            RawResourceId::skill(item_id),
            item_id,
            amount,
            catalog,
        ));
    }

    out
}

/// Total currency for levels, ascensions, the final-rank casting, and skills.
#[must_use]
pub fn currency_cost(target: &ProgressionTarget, rarity: u8) -> u64 {
    let levels = u64::from(target.target_level.saturating_sub(target.current_level));
    let mut total = levels.saturating_mul(per_level_rate(rarity));

    let ascensions = target.target_ascension.saturating_sub(target.current_ascension);
    if ascensions > 0 {
        total = total.saturating_add(u64::from(ascensions) * base_ascension_cost(rarity));
        if target.target_ascension >= MAX_ASCENSION_RANK
            && target.current_ascension < MAX_ASCENSION_RANK
        {
            total = total.saturating_add(casting_cost(rarity));
        }
    }

    let multiplier = rarity_multiplier(rarity);
    for track in &target.skills {
        for level in track.current..track.target {
            let scaled = u64_to_f64(per_skill_level_cost(level)) * multiplier;
            total = total.saturating_add(floor_f64_to_u64(scaled));
        }
    }

    total
}

/// Ember counts per tier; zero-valued tiers are omitted.
#[must_use]
pub fn ember_cost(target: &ProgressionTarget, rarity: u8) -> Vec<(EmberTier, u64)> {
    if target.target_level <= target.current_level {
        return Vec::new();
    }
    let levels = u32_to_f64(target.target_level - target.current_level);
    let multiplier = rarity_multiplier(rarity);
    let low_rarity = (1..=EMBER_LOW_RARITY_CEILING).contains(&rarity);

    EmberTier::ALL
        .into_iter()
        .filter_map(|tier| {
            let (factor, low_scale) = match tier {
                EmberTier::Bronze => (EMBER_BRONZE_FACTOR, EMBER_LOW_RARITY_BRONZE_SCALE),
                EmberTier::Silver => (EMBER_SILVER_FACTOR, EMBER_LOW_RARITY_SILVER_SCALE),
                EmberTier::Gold => (EMBER_GOLD_FACTOR, EMBER_LOW_RARITY_GOLD_SCALE),
            };
            let mut raw = levels * factor * multiplier;
            if low_rarity {
                raw *= low_scale;
            }
            let amount = floor_f64_to_u64(raw);
            (amount > 0).then_some((tier, amount))
        })
        .collect()
}

/// Items needed for every ascension step in `[current, target)`, summed per item.
#[must_use]
pub fn ascension_materials(
    target: &ProgressionTarget,
    entity: &EntityMetadata,
) -> BTreeMap<ItemId, u64> {
    let mut totals = BTreeMap::new();
    for step in target.current_ascension..target.target_ascension {
        match entity.ascension_materials_by_step.get(&step) {
            Some(costs) => accumulate(&mut totals, costs),
            None => log::debug!(
                "entity {} has no ascension data for step {step}; skipping",
                entity.id
            ),
        }
    }
    totals
}

/// Items needed across all skill tracks, merged into one map before emission.
#[must_use]
pub fn skill_materials(
    target: &ProgressionTarget,
    entity: &EntityMetadata,
) -> BTreeMap<ItemId, u64> {
    let mut totals = BTreeMap::new();
    for track in &target.skills {
        accumulate_skill_track(&mut totals, track, entity);
    }
    totals
}

fn accumulate_skill_track(
    totals: &mut BTreeMap<ItemId, u64>,
    track: &SkillTrack,
    entity: &EntityMetadata,
) {
    for level in track.current..track.target {
        match entity.skill_materials_by_level.get(&level) {
            Some(costs) => accumulate(totals, costs),
            None => log::debug!(
                "entity {} has no skill data for level {level}; skipping",
                entity.id
            ),
        }
    }
}

fn accumulate(totals: &mut BTreeMap<ItemId, u64>, costs: &[ItemAmount]) {
    for cost in costs {
        let slot = totals.entry(cost.item_id).or_insert(0);
        *slot = slot.saturating_add(u64::from(cost.amount));
    }
}
