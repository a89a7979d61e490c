use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use matplan_core::{Catalog, CatalogProvider, FarmingDataset, InventorySnapshot, InventoryStorage};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("no {0} source configured")]
    NotConfigured(&'static str),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Arc<serde_json::Error>,
    },
}

/// Raw reference payloads read from disk, parsed on demand.
#[derive(Debug)]
pub struct FileSources {
    catalog: Result<Payload, LoadError>,
    farming: Result<Payload, LoadError>,
}

#[derive(Debug)]
struct Payload {
    path: PathBuf,
    text: String,
}

impl FileSources {
    /// Read both files concurrently. Failures are kept and surface when parsed.
    pub async fn read(catalog: Option<&Path>, farming: Option<&Path>) -> Self {
        let (catalog, farming) = tokio::join!(
            read_payload(catalog, "catalog"),
            read_payload(farming, "farming")
        );
        Self { catalog, farming }
    }
}

async fn read_payload(path: Option<&Path>, kind: &'static str) -> Result<Payload, LoadError> {
    let path = path.ok_or(LoadError::NotConfigured(kind))?;
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
    log::debug!("read {kind} data from {}", path.display());
    Ok(Payload {
        path: path.to_path_buf(),
        text,
    })
}

fn parse_payload<T>(
    payload: &Result<Payload, LoadError>,
    parse: impl FnOnce(&str) -> Result<T, serde_json::Error>,
) -> Result<T, LoadError> {
    let payload = payload.as_ref().map_err(Clone::clone)?;
    parse(&payload.text).map_err(|source| LoadError::Parse {
        path: payload.path.clone(),
        source: Arc::new(source),
    })
}

impl CatalogProvider for FileSources {
    type Error = LoadError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        parse_payload(&self.catalog, Catalog::from_json)
    }

    fn load_farming_dataset(&self) -> Result<FarmingDataset, Self::Error> {
        parse_payload(&self.farming, FarmingDataset::from_json)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("inventory file {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Inventory snapshots stored as flat JSON objects, one file per name.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Split a file path into a storage rooted at its directory plus the file name.
    pub fn for_file(path: &Path) -> (Self, String) {
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let name = path
            .file_name()
            .map_or_else(|| "inventory.json".to_string(), |n| n.to_string_lossy().into_owned());
        (Self::new(root), name)
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl InventoryStorage for JsonFileStorage {
    type Error = StorageError;

    fn save_inventory(&self, name: &str, snapshot: &InventorySnapshot) -> Result<(), Self::Error> {
        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(snapshot).map_err(|source| {
            StorageError::Malformed {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| StorageError::Io { path, source })
    }

    fn load_inventory(&self, name: &str) -> Result<Option<InventorySnapshot>, Self::Error> {
        let path = self.path_for(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str::<BTreeMap<String, u64>>(&text)
            .map(Some)
            .map_err(|source| StorageError::Malformed { path, source })
    }

    fn delete_inventory(&self, name: &str) -> Result<(), Self::Error> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}
