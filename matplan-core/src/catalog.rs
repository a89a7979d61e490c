//! Catalog data consumed from the catalog provider.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::constants::PLACEHOLDER_RARITY_LABEL;
use crate::resource::ItemId;

/// Quantity of a single item required by one progression step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAmount {
    pub item_id: ItemId,
    pub amount: u32,
}

/// Upgrade metadata for a single entity.
///
/// Ascension steps are keyed by the rank being left (0–3). Skill levels are
/// keyed by the level being left (1–9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub rarity: u8,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default)]
    pub ascension_materials_by_step: BTreeMap<u8, Vec<ItemAmount>>,
    #[serde(default)]
    pub skill_materials_by_level: BTreeMap<u8, Vec<ItemAmount>>,
}

fn default_max_level() -> u32 {
    90
}

impl EntityMetadata {
    /// Metadata with no material tables (useful for currency-only math and tests).
    #[must_use]
    pub fn bare(id: u32, rarity: u8) -> Self {
        Self {
            id,
            name: String::new(),
            rarity,
            max_level: default_max_level(),
            ascension_materials_by_step: BTreeMap::new(),
            skill_materials_by_level: BTreeMap::new(),
        }
    }
}

/// Display metadata for a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rarity_hint: Option<String>,
}

impl ItemRecord {
    /// Stand-in used when the catalog has no record for an item.
    #[must_use]
    pub fn placeholder(id: ItemId) -> Self {
        Self {
            id,
            name: format!("Item #{id}"),
            icon: format!("icons/items/{id}.png"),
            rarity_hint: None,
        }
    }

    #[must_use]
    pub fn rarity_label(&self) -> &str {
        self.rarity_hint
            .as_deref()
            .unwrap_or(PLACEHOLDER_RARITY_LABEL)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogData {
    #[serde(default)]
    entities: Vec<EntityMetadata>,
    #[serde(default)]
    items: Vec<ItemRecord>,
}

/// Indexed catalog of entities and items.
///
/// An empty catalog is the valid "not loaded yet" state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "CatalogData")]
pub struct Catalog {
    entities: Vec<EntityMetadata>,
    items: Vec<ItemRecord>,
    entity_index: HashMap<u32, usize>,
    item_index: HashMap<ItemId, usize>,
}

impl From<CatalogData> for Catalog {
    fn from(data: CatalogData) -> Self {
        Self::new(data.entities, data.items)
    }
}

impl Catalog {
    #[must_use]
    pub fn new(entities: Vec<EntityMetadata>, items: Vec<ItemRecord>) -> Self {
        let entity_index = entities
            .iter()
            .enumerate()
            .map(|(idx, entity)| (entity.id, idx))
            .collect();
        let item_index = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id, idx))
            .collect();
        Self {
            entities,
            items,
            entity_index,
            item_index,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a catalog from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.items.is_empty()
    }

    #[must_use]
    pub fn entity(&self, id: u32) -> Option<&EntityMetadata> {
        self.entity_index.get(&id).map(|&idx| &self.entities[idx])
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.item_index.get(&id).map(|&idx| &self.items[idx])
    }

    /// Item display metadata, degrading to a placeholder on a miss.
    #[must_use]
    pub fn item_or_placeholder(&self, id: ItemId) -> ItemRecord {
        self.item(id)
            .cloned()
            .unwrap_or_else(|| ItemRecord::placeholder(id))
    }

    #[must_use]
    pub fn entities(&self) -> &[EntityMetadata] {
        &self.entities
    }

    #[must_use]
    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }
}
