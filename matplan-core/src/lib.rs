//! Matplan Planning Engine
//!
//! Platform-agnostic core logic for the Matplan upgrade planner: requirement
//! calculation, material merging, inventory deficits, and farming lookups.
//! This crate performs no I/O of its own; catalog data and inventory
//! persistence are supplied through [`CatalogProvider`] and [`InventoryStorage`].

pub mod aggregate;
pub mod catalog;
pub mod constants;
pub mod farming;
pub mod ledger;
pub mod numbers;
pub mod plan;
pub mod progression;
pub mod requirements;
pub mod resource;

// Re-export commonly used types
pub use aggregate::{AggregatedMaterial, SourceIds, aggregate, normalize_name};
pub use catalog::{Catalog, EntityMetadata, ItemAmount, ItemRecord};
pub use farming::{
    FarmingDataset, FarmingEntry, FarmingLocation, FarmingMatch, FarmingReport, FarmingSpot,
    MatchTier, MaterialDescriptor, RunEstimate, lookup, resolve, spots,
};
pub use ledger::{ImportError, InventoryLedger, InventorySnapshot, QuickAction, SourceUpdate};
pub use plan::{MaterialFilter, Plan, PlanCache, PlanSummary, recompute};
pub use progression::{
    Field, FieldError, ProgressionTarget, SkillTrack, ValidationError, ValidationErrors,
};
pub use requirements::{CalcOptions, MaterialRequirement, calculate_requirements};
pub use resource::{EmberTier, ItemId, RawResourceId, ResourceIdError, SourceKind};

/// Trait for abstracting reference data loading
/// Platform-specific implementations should provide this
pub trait CatalogProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load entity and item metadata
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;

    /// Load the farming reference dataset
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be loaded or parsed.
    fn load_farming_dataset(&self) -> Result<FarmingDataset, Self::Error>;
}

/// Trait for abstracting inventory save/load operations
/// Platform-specific implementations should provide this
pub trait InventoryStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save an inventory snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_inventory(&self, name: &str, snapshot: &InventorySnapshot) -> Result<(), Self::Error>;

    /// Load an inventory snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_inventory(&self, name: &str) -> Result<Option<InventorySnapshot>, Self::Error>;

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn delete_inventory(&self, name: &str) -> Result<(), Self::Error>;
}

/// Catalog and farming data as loaded at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub catalog: Catalog,
    pub farming: FarmingDataset,
}

/// Main planning engine binding a data provider to inventory storage
pub struct PlannerEngine<P, S>
where
    P: CatalogProvider,
    S: InventoryStorage,
{
    provider: P,
    storage: S,
}

impl<P, S> PlannerEngine<P, S>
where
    P: CatalogProvider,
    S: InventoryStorage,
{
    /// Create a new engine with the provided data provider and storage
    pub const fn new(provider: P, storage: S) -> Self {
        Self { provider, storage }
    }

    /// Load catalog and farming data, substituting empty data for any source that fails.
    #[must_use]
    pub fn load_reference_data(&self) -> ReferenceData {
        ReferenceData {
            catalog: self.load_catalog(),
            farming: self.load_farming(),
        }
    }

    /// Load the catalog, or an empty one when the provider fails.
    #[must_use]
    pub fn load_catalog(&self) -> Catalog {
        self.provider.load_catalog().unwrap_or_else(|err| {
            log::warn!("catalog unavailable, continuing with empty catalog: {err}");
            Catalog::empty()
        })
    }

    /// Load the farming dataset, or an empty one when the provider fails.
    /// Every lookup against the empty dataset reports not found.
    #[must_use]
    pub fn load_farming(&self) -> FarmingDataset {
        self.provider.load_farming_dataset().unwrap_or_else(|err| {
            log::warn!("farming dataset unavailable, continuing without farming data: {err}");
            FarmingDataset::empty()
        })
    }

    /// Persist the full ledger contents
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_inventory(&self, name: &str, ledger: &InventoryLedger) -> Result<(), S::Error> {
        self.storage.save_inventory(name, &ledger.export())
    }

    /// Load a ledger, starting empty when nothing was saved under `name`
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn load_inventory(&self, name: &str) -> Result<InventoryLedger, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let snapshot = self.storage.load_inventory(name).map_err(Into::into)?;
        Ok(snapshot.map_or_else(InventoryLedger::new, InventoryLedger::from_snapshot))
    }

    /// Remove a saved ledger
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    pub fn delete_inventory(&self, name: &str) -> Result<(), S::Error> {
        self.storage.delete_inventory(name)
    }
}
