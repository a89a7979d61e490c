//! Owned-quantity tracking and deficit reconciliation.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::aggregate::AggregatedMaterial;
use crate::resource::RawResourceId;

/// Flat `resourceId → quantity` payload exchanged with the persistence sink.
pub type InventorySnapshot = BTreeMap<String, u64>;

/// Shortcut adjustments offered next to each material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    Add1,
    Add10,
    Add100,
    Subtract1,
    SetZero,
}

impl QuickAction {
    #[must_use]
    pub const fn apply(self, owned: u64) -> u64 {
        match self {
            Self::Add1 => owned.saturating_add(1),
            Self::Add10 => owned.saturating_add(10),
            Self::Add100 => owned.saturating_add(100),
            Self::Subtract1 => owned.saturating_sub(1),
            Self::SetZero => 0,
        }
    }
}

/// Change notification for one pre-merge requirement id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUpdate {
    pub source_id: RawResourceId,
    pub delta: i64,
}

/// Errors raised when an inventory import payload is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("inventory payload is not valid JSON: {0}")]
    Json(String),
    #[error("inventory payload must be a flat JSON object")]
    NotAnObject,
    #[error("`{0}` is not a known resource id")]
    UnknownKey(String),
    #[error("quantity for `{key}` must be a non-negative integer (got {value})")]
    InvalidQuantity { key: String, value: String },
}

/// Owned quantities keyed by ledger key.
///
/// Keys are created on first sight and only ever zeroed, never removed. A
/// merged material owns the sum of the quantities under every distinct key
/// it answers to, so stock recorded under a name-merged id still counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryLedger {
    entries: BTreeMap<String, u64>,
}

impl InventoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from a persisted snapshot.
    #[must_use]
    pub const fn from_snapshot(entries: InventorySnapshot) -> Self {
        Self { entries }
    }

    /// Owned quantity for a key, zero when never seen.
    #[must_use]
    pub fn owned(&self, key: &str) -> u64 {
        self.entries.get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned quantity for a resource id, under its ledger key.
    #[must_use]
    pub fn owned_id(&self, id: RawResourceId) -> u64 {
        self.owned(&id.ledger_key())
    }

    fn owned_total(&self, material: &AggregatedMaterial) -> u64 {
        material
            .ledger_keys()
            .iter()
            .fold(0u64, |acc, key| acc.saturating_add(self.owned(key)))
    }

    /// Register every material's key and copy owned quantities onto them.
    pub fn reconcile(&mut self, materials: &mut [AggregatedMaterial]) {
        for material in materials.iter_mut() {
            self.entries.entry(material.ledger_key()).or_insert(0);
            material.current = self.owned_total(material);
        }
    }

    /// Set the owned quantity for a resource, clamping negatives to zero.
    ///
    /// The value is stored under the id's ledger key, so `skill-6503` and
    /// `6503` address the same stock. Every material answering to that key
    /// picks up the change, and one [`SourceUpdate`] carrying the delta is
    /// returned per contributing pre-merge id.
    pub fn update(
        &mut self,
        id: RawResourceId,
        quantity: i64,
        materials: &mut [AggregatedMaterial],
    ) -> Vec<SourceUpdate> {
        let key = id.ledger_key();
        let new_owned = u64::try_from(quantity).unwrap_or(0);
        let slot = self.entries.entry(key.clone()).or_insert(0);
        let delta = signed_delta(*slot, new_owned);
        *slot = new_owned;

        let mut updates = Vec::new();
        for material in materials.iter_mut().filter(|m| m.answers_to(&key)) {
            material.current = self.owned_total(material);
            if delta != 0 {
                updates.extend(material.source_ids.iter().map(|&source_id| SourceUpdate {
                    source_id,
                    delta,
                }));
            }
        }
        updates
    }

    /// Apply a shortcut adjustment relative to the quantity under the id's key.
    pub fn quick_action(
        &mut self,
        id: RawResourceId,
        action: QuickAction,
        materials: &mut [AggregatedMaterial],
    ) -> Vec<SourceUpdate> {
        let next = action.apply(self.owned_id(id));
        self.update(id, i64::try_from(next).unwrap_or(i64::MAX), materials)
    }

    /// Apply a validated map of quantities; overwrites only the keys it names.
    ///
    /// Keys are taken as-is and are expected in ledger-key form, as produced
    /// by [`InventoryLedger::export`] or [`InventoryLedger::import_json`].
    pub fn bulk_import(&mut self, snapshot: &InventorySnapshot) {
        for (key, &quantity) in snapshot {
            self.entries.insert(key.clone(), quantity);
        }
    }

    /// Validate every value of a JSON object before applying any of them.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the ledger untouched, if the payload is not a
    /// flat object, any key is not a resource id, or any value is not a
    /// non-negative integer. Composite keys are folded onto their ledger key
    /// and their quantities summed.
    pub fn import_json(&mut self, payload: &str) -> Result<usize, ImportError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|err| ImportError::Json(err.to_string()))?;
        let Value::Object(map) = value else {
            return Err(ImportError::NotAnObject);
        };
        let snapshot = validate_snapshot(&map)?;
        let applied = snapshot.len();
        self.bulk_import(&snapshot);
        log::debug!("imported {applied} inventory entries");
        Ok(applied)
    }

    /// Zero every known key without removing any of them.
    pub fn clear(&mut self) {
        for quantity in self.entries.values_mut() {
            *quantity = 0;
        }
    }

    /// Full ledger contents, regardless of any display filtering.
    #[must_use]
    pub fn export(&self) -> InventorySnapshot {
        self.entries.clone()
    }

    /// Export serialized as a flat JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }
}

fn validate_snapshot(map: &Map<String, Value>) -> Result<InventorySnapshot, ImportError> {
    let mut snapshot = InventorySnapshot::new();
    for (key, value) in map {
        let id: RawResourceId = key
            .parse()
            .map_err(|_| ImportError::UnknownKey(key.clone()))?;
        let quantity = value.as_u64().ok_or_else(|| ImportError::InvalidQuantity {
            key: key.clone(),
            value: value.to_string(),
        })?;
        let slot = snapshot.entry(id.ledger_key()).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }
    Ok(snapshot)
}

fn signed_delta(before: u64, after: u64) -> i64 {
    if after >= before {
        i64::try_from(after - before).unwrap_or(i64::MAX)
    } else {
        i64::try_from(before - after).map_or(i64::MIN, |diff| -diff)
    }
}
