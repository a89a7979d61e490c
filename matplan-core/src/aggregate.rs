//! Merging of requirement lines that refer to the same underlying resource.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::requirements::MaterialRequirement;
use crate::resource::RawResourceId;

/// Pre-merge ids that contributed to an aggregated line, in input order.
pub type SourceIds = SmallVec<[RawResourceId; 4]>;

/// A merged requirement line carrying its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMaterial {
    /// Bare identity (provenance stripped).
    pub id: RawResourceId,
    pub name: String,
    pub rarity_label: String,
    pub icon: String,
    pub required: u64,
    /// Owned quantity, filled in by the inventory ledger after merging.
    #[serde(default)]
    pub current: u64,
    pub source_ids: SourceIds,
}

impl AggregatedMaterial {
    #[must_use]
    pub const fn deficit(&self) -> u64 {
        self.required.saturating_sub(self.current)
    }

    /// Key under which the ledger tracks this material.
    #[must_use]
    pub fn ledger_key(&self) -> String {
        self.id.ledger_key()
    }

    /// Every distinct ledger key this material answers to: its own key first,
    /// then the keys of merged-in sources in input order.
    #[must_use]
    pub fn ledger_keys(&self) -> SmallVec<[String; 4]> {
        let mut keys: SmallVec<[String; 4]> = SmallVec::new();
        keys.push(self.ledger_key());
        for source in &self.source_ids {
            let key = source.ledger_key();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Whether an update to `key` reaches this material.
    #[must_use]
    pub fn answers_to(&self, key: &str) -> bool {
        self.ledger_key() == key || self.source_ids.iter().any(|id| id.ledger_key() == key)
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.deficit() == 0
    }
}

/// Case-folded, trimmed form of a resource name used as a fallback merge key.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Provenance-free identity used as the primary merge key.
fn bare_id(id: RawResourceId) -> RawResourceId {
    match id {
        RawResourceId::CatalogItem { id, .. } => RawResourceId::CatalogItem { id, source: None },
        other => other,
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, idx: usize) -> usize {
        let mut root = idx;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = idx;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Merge requirement lines by catalog identity, falling back to normalized name.
///
/// Two lines land in the same group when they share a bare id or a
/// normalized name, transitively. Totals do not depend on input order; the
/// output is sorted by bare id. `current` is left at zero for the ledger to
/// fill in.
#[must_use]
pub fn aggregate(requirements: &[MaterialRequirement]) -> Vec<AggregatedMaterial> {
    let mut groups = DisjointSet::new(requirements.len());
    let mut by_id: HashMap<RawResourceId, usize> = HashMap::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for (idx, req) in requirements.iter().enumerate() {
        if let Some(&first) = by_id.get(&bare_id(req.id)) {
            groups.union(first, idx);
        } else {
            by_id.insert(bare_id(req.id), idx);
        }
        let name = normalize_name(&req.name);
        if name.is_empty() {
            continue;
        }
        if let Some(&first) = by_name.get(&name) {
            groups.union(first, idx);
        } else {
            by_name.insert(name, idx);
        }
    }

    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    for idx in 0..requirements.len() {
        members.entry(groups.find(idx)).or_default().push(idx);
    }

    let mut merged: Vec<AggregatedMaterial> = members
        .into_values()
        .filter_map(|indices| merge_group(requirements, &indices))
        .collect();
    merged.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
    merged
}

fn merge_group(
    requirements: &[MaterialRequirement],
    indices: &[usize],
) -> Option<AggregatedMaterial> {
    let representative = indices
        .iter()
        .map(|&idx| &requirements[idx])
        .min_by(|a, b| {
            bare_id(a.id)
                .cmp(&bare_id(b.id))
                .then_with(|| a.name.trim().cmp(b.name.trim()))
                .then_with(|| a.icon.cmp(&b.icon))
        })?;

    let required = indices
        .iter()
        .fold(0u64, |acc, &idx| acc.saturating_add(requirements[idx].required));
    let source_ids = indices.iter().map(|&idx| requirements[idx].id).collect();

    Some(AggregatedMaterial {
        id: bare_id(representative.id),
        name: representative.name.trim().to_string(),
        rarity_label: representative.rarity_label.clone(),
        icon: representative.icon.clone(),
        required,
        current: 0,
        source_ids,
    })
}
