//! In-memory identity map of discovered assets.
//!
//! One coarse lock guards both merges and snapshot reads. Readers always get
//! copies, never the live map, so iteration is immune to a concurrent merge.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use vrepo_api::{AssetType, ordered};
use vrepo_plugin::Asset;

/// Outcome of a merge: ids seen for the first time vs. ids overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub news: usize,
    pub refreshed: usize,
}

/// Asset counts broken down by type and by source repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_assets: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_repository: BTreeMap<String, usize>,
}

/// Thread-safe map from asset id to the last merged asset.
#[derive(Default)]
pub struct AssetRegistry {
    /// Mapping from asset id to the authoritative asset
    assets: RwLock<HashMap<String, Arc<Asset>>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Asset>>> {
        self.assets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Asset>>> {
        self.assets.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Asset>> {
        self.read().get(id).cloned()
    }

    /// Assets whose type is ordered under `asset_type`.
    pub fn lookup_type(&self, asset_type: &AssetType) -> Vec<Arc<Asset>> {
        self.read()
            .values()
            .filter(|a| ordered(a.asset_type(), asset_type))
            .cloned()
            .collect()
    }

    /// Partition a single snapshot by the requested types.
    ///
    /// Every requested type gets an entry, empty if nothing matches. Assets
    /// are filed under their own type only, so each lands in at most one
    /// bucket; use [`lookup_type`](Self::lookup_type) for lattice matching.
    pub fn lookup_types(&self, types: &[AssetType]) -> HashMap<AssetType, Vec<Arc<Asset>>> {
        let mut partition: HashMap<AssetType, Vec<Arc<Asset>>> = types
            .iter()
            .map(|t| (t.clone(), Vec::new()))
            .collect();

        let assets = self.read();
        for asset in assets.values() {
            if let Some(bucket) = partition.get_mut(asset.asset_type()) {
                bucket.push(Arc::clone(asset));
            }
        }
        partition
    }

    /// Defensive copy of the current contents.
    pub fn snapshot(&self) -> Vec<Arc<Asset>> {
        self.read().values().cloned().collect()
    }

    /// Insert or overwrite; returns `true` if the id was new.
    pub fn put(&self, asset: Arc<Asset>) -> bool {
        self.write()
            .insert(asset.id().to_string(), asset)
            .is_none()
    }

    /// Apply a batch of assets under one write lock. Later entries overwrite earlier ones.
    pub fn merge<I>(&self, assets: I) -> MergeCounts
    where
        I: IntoIterator<Item = Arc<Asset>>,
    {
        let mut counts = MergeCounts::default();
        let mut map = self.write();
        for asset in assets {
            match map.insert(asset.id().to_string(), asset) {
                None => counts.news += 1,
                Some(_) => counts.refreshed += 1,
            }
        }
        counts
    }

    pub fn stats(&self) -> RegistryStats {
        let assets = self.read();

        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_repository: BTreeMap<String, usize> = BTreeMap::new();
        for asset in assets.values() {
            *by_type
                .entry(asset.asset_type().name().to_string())
                .or_default() += 1;
            let repository = asset
                .repository()
                .map(|r| r.name().to_string())
                .unwrap_or_else(|| "unbound".to_string());
            *by_repository.entry(repository).or_default() += 1;
        }

        RegistryStats {
            total_assets: assets.len(),
            by_type,
            by_repository,
        }
    }
}
