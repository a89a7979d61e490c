//! Explicit recomputation pipeline.
//!
//! validate → calculate → aggregate → reconcile with the ledger. Callers
//! invoke [`recompute`] after every mutation; nothing here holds hidden
//! state besides the optional [`PlanCache`].
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use crate::aggregate::{AggregatedMaterial, aggregate};
use crate::catalog::{Catalog, EntityMetadata};
use crate::constants::PLAN_CACHE_CAPACITY;
use crate::ledger::InventoryLedger;
use crate::progression::{ProgressionTarget, ValidationErrors};
use crate::requirements::{CalcOptions, MaterialRequirement, calculate_requirements};
use crate::resource::RawResourceId;

/// Merged, ledger-reconciled materials for one progression target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub materials: Vec<AggregatedMaterial>,
}

/// Headline totals for a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub distinct_materials: usize,
    pub outstanding_materials: usize,
    pub total_deficit: u64,
    pub currency_deficit: u64,
}

impl Plan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Materials still short of their requirement.
    pub fn outstanding(&self) -> impl Iterator<Item = &AggregatedMaterial> {
        self.materials.iter().filter(|m| m.deficit() > 0)
    }

    #[must_use]
    pub fn find(&self, ledger_key: &str) -> Option<&AggregatedMaterial> {
        self.materials.iter().find(|m| m.ledger_key() == ledger_key)
    }

    /// Totals across every material; currency is reported separately and
    /// left out of `total_deficit`.
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            distinct_materials: self.materials.len(),
            ..PlanSummary::default()
        };
        for material in self.outstanding() {
            summary.outstanding_materials += 1;
            if material.id == RawResourceId::Currency {
                summary.currency_deficit = material.deficit();
            } else {
                summary.total_deficit = summary.total_deficit.saturating_add(material.deficit());
            }
        }
        summary
    }

    /// Re-read owned quantities after the ledger changed.
    pub fn refresh(&mut self, ledger: &mut InventoryLedger) {
        ledger.reconcile(&mut self.materials);
    }
}

/// Full pipeline from target to reconciled plan.
///
/// # Errors
///
/// Returns the per-field validation errors when the target is invalid. No
/// computation happens in that case; any previously computed plan is the
/// caller's to keep or discard.
pub fn recompute(
    target: &ProgressionTarget,
    entity: &EntityMetadata,
    catalog: &Catalog,
    ledger: &mut InventoryLedger,
    options: CalcOptions,
) -> Result<Plan, ValidationErrors> {
    target.validate()?;
    let requirements = calculate_requirements(target, entity, catalog, options);
    Ok(reconcile_requirements(&requirements, ledger))
}

/// Merge pre-computed requirement lines and attach owned quantities.
#[must_use]
pub fn reconcile_requirements(
    requirements: &[MaterialRequirement],
    ledger: &mut InventoryLedger,
) -> Plan {
    let mut materials = aggregate(requirements);
    ledger.reconcile(&mut materials);
    Plan { materials }
}

/// Memoizes requirement lists per `(target, entity, options)` tuple.
///
/// Holds at most `capacity` inputs; the oldest insertion is evicted first.
/// The catalog is assumed fixed for the cache's lifetime; call
/// [`PlanCache::clear`] when it is reloaded.
#[derive(Debug, Clone)]
pub struct PlanCache {
    entries: HashMap<u64, Vec<MaterialRequirement>>,
    order: VecDeque<u64>,
    capacity: usize,
    hits: u64,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::with_capacity_limit(PLAN_CACHE_CAPACITY)
    }
}

impl PlanCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` inputs (minimum one).
    #[must_use]
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
    }

    /// Same contract as [`recompute`], reusing requirement lines for inputs seen before.
    ///
    /// # Errors
    ///
    /// Returns the per-field validation errors when the target is invalid.
    pub fn recompute(
        &mut self,
        target: &ProgressionTarget,
        entity: &EntityMetadata,
        catalog: &Catalog,
        ledger: &mut InventoryLedger,
        options: CalcOptions,
    ) -> Result<Plan, ValidationErrors> {
        target.validate()?;
        let key = input_key(target, entity, options);
        if let Some(requirements) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("plan cache hit for entity {}", entity.id);
            return Ok(reconcile_requirements(requirements, ledger));
        }
        let requirements = calculate_requirements(target, entity, catalog, options);
        let plan = reconcile_requirements(&requirements, ledger);
        self.insert(key, requirements);
        Ok(plan)
    }

    fn insert(&mut self, key: u64, requirements: Vec<MaterialRequirement>) {
        while self.order.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            log::debug!("plan cache full, evicted {oldest:016x}");
        }
        self.order.push_back(key);
        self.entries.insert(key, requirements);
    }
}

fn input_key(target: &ProgressionTarget, entity: &EntityMetadata, options: CalcOptions) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    target.hash(&mut hasher);
    options.hash(&mut hasher);
    entity.id.hash(&mut hasher);
    entity.rarity.hash(&mut hasher);
    // Material tables are hashed through their serialized form.
    let tables = serde_json::to_vec(&(
        &entity.ascension_materials_by_step,
        &entity.skill_materials_by_level,
    ))
    .unwrap_or_default();
    hasher.write(&tables);
    hasher.finish()
}

/// Display-side narrowing of a plan. Never touches the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub only_outstanding: bool,
}

impl MaterialFilter {
    #[must_use]
    pub fn matches(&self, material: &AggregatedMaterial) -> bool {
        if self.only_outstanding && material.deficit() == 0 {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => material
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply<'a>(
        &'a self,
        plan: &'a Plan,
    ) -> impl Iterator<Item = &'a AggregatedMaterial> + 'a {
        plan.materials.iter().filter(move |m| self.matches(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemAmount;
    use crate::progression::{Field, SkillTrack};
    use crate::resource::ItemId;
    use std::collections::BTreeMap;

    fn entity() -> EntityMetadata {
        let mut entity = EntityMetadata::bare(7, 4);
        entity.ascension_materials_by_step = BTreeMap::from([(
            0,
            vec![ItemAmount {
                item_id: ItemId(6503),
                amount: 5,
            }],
        )]);
        entity.skill_materials_by_level = BTreeMap::from([(
            1,
            vec![ItemAmount {
                item_id: ItemId(6503),
                amount: 3,
            }],
        )]);
        entity
    }

    fn target() -> ProgressionTarget {
        ProgressionTarget {
            current_level: 1,
            target_level: 10,
            current_ascension: 0,
            target_ascension: 1,
            skills: [SkillTrack::new(1, 2), SkillTrack::new(1, 1), SkillTrack::new(1, 1)],
        }
    }

    #[test]
    fn recompute_merges_and_reconciles() {
        let mut ledger = InventoryLedger::from_snapshot(BTreeMap::from([("6503".to_string(), 6)]));
        let plan = recompute(
            &target(),
            &entity(),
            &Catalog::empty(),
            &mut ledger,
            CalcOptions::default(),
        )
        .unwrap();
        let proof = plan.find("6503").unwrap();
        assert_eq!(proof.required, 8);
        assert_eq!(proof.current, 6);
        assert_eq!(proof.deficit(), 2);
        assert_eq!(proof.source_ids.len(), 2);
        assert!(ledger.contains("qp"));
        assert!(ledger.contains("ember-gold"));

        let summary = plan.summary();
        assert_eq!(summary.distinct_materials, plan.materials.len());
        assert!(summary.currency_deficit > 0);
    }

    #[test]
    fn invalid_target_blocks_computation() {
        let mut bad = target();
        bad.target_level = 0;
        let mut ledger = InventoryLedger::new();
        let errors = recompute(
            &bad,
            &entity(),
            &Catalog::empty(),
            &mut ledger,
            CalcOptions::default(),
        )
        .unwrap_err();
        assert_eq!(errors.for_field(Field::TargetLevel).count(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn cache_reuses_requirements_for_same_inputs() {
        let mut cache = PlanCache::new();
        let mut ledger = InventoryLedger::new();
        let first = cache
            .recompute(&target(), &entity(), &Catalog::empty(), &mut ledger, CalcOptions::default())
            .unwrap();
        let second = cache
            .recompute(&target(), &entity(), &Catalog::empty(), &mut ledger, CalcOptions::default())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);

        let options = CalcOptions {
            include_currency: false,
        };
        cache
            .recompute(&target(), &entity(), &Catalog::empty(), &mut ledger, options)
            .unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_evicts_oldest_input_when_full() {
        let mut cache = PlanCache::with_capacity_limit(2);
        let mut ledger = InventoryLedger::new();
        let mut run = |cache: &mut PlanCache, target_level: u32| {
            let mut target = target();
            target.target_level = target_level;
            let options = CalcOptions::default();
            cache
                .recompute(&target, &entity(), &Catalog::empty(), &mut ledger, options)
                .unwrap()
        };

        run(&mut cache, 10);
        run(&mut cache, 20);
        run(&mut cache, 30);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hits(), 0);

        // The newest two are still cached.
        run(&mut cache, 30);
        run(&mut cache, 20);
        assert_eq!(cache.hits(), 2);

        // The first input was evicted, so it is calculated again.
        run(&mut cache, 10);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(PlanCache::new().capacity(), PLAN_CACHE_CAPACITY);
    }

    #[test]
    fn filter_narrows_display_without_touching_export() {
        let mut ledger =
            InventoryLedger::from_snapshot(BTreeMap::from([("6503".to_string(), 100)]));
        let plan = recompute(
            &target(),
            &entity(),
            &Catalog::empty(),
            &mut ledger,
            CalcOptions::default(),
        )
        .unwrap();
        let before = ledger.export();

        let outstanding = MaterialFilter {
            search: None,
            only_outstanding: true,
        };
        assert!(outstanding.apply(&plan).all(|m| m.deficit() > 0));
        assert!(outstanding.apply(&plan).all(|m| m.ledger_key() != "6503"));

        let search = MaterialFilter {
            search: Some("  EMBER ".to_string()),
            only_outstanding: false,
        };
        assert_eq!(search.apply(&plan).count(), 3);
        assert_eq!(ledger.export(), before);
    }
}
