//! Assets: units of discoverable, retrievable and publishable data.

use crate::repository::Repository;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use vrepo_api::{AssetType, Properties};

/// Id given to assets whose repository assigns ids on publication.
pub const UNASSIGNED_ID: &str = "unassigned";

/// An asset, identified by a globally unique id.
///
/// Discovered assets are created unbound by a repository browser and bound
/// to that repository when discovery collects them. Assets built by clients
/// for publication are bound to their target repository up front.
#[derive(Clone)]
pub struct Asset {
    id: String,
    name: String,
    asset_type: AssetType,
    properties: Properties,
    repository: OnceLock<Arc<Repository>>,
}

impl Asset {
    /// Browser-facing constructor: an unbound asset.
    pub fn new(asset_type: AssetType, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset_type,
            properties: Properties::new(),
            repository: OnceLock::new(),
        }
    }

    /// Client-facing constructor for publication with a client-defined id.
    pub fn for_publication(
        asset_type: AssetType,
        id: impl Into<String>,
        name: impl Into<String>,
        repository: Arc<Repository>,
    ) -> Self {
        let asset = Self::new(asset_type, id, name);
        asset.bind(repository);
        asset
    }

    /// Client-facing constructor for publication with a repository-generated id.
    pub fn unassigned(
        asset_type: AssetType,
        name: impl Into<String>,
        repository: Arc<Repository>,
    ) -> Self {
        Self::for_publication(asset_type, UNASSIGNED_ID, name, repository)
    }

    pub fn with_property(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.set(key, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asset_type(&self) -> &AssetType {
        &self.asset_type
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The repository this asset was discovered from or targets.
    pub fn repository(&self) -> Option<&Arc<Repository>> {
        self.repository.get()
    }

    pub fn is_bound(&self) -> bool {
        self.repository.get().is_some()
    }

    /// Bind the asset to a repository. The first binding sticks; later calls return `false`.
    pub fn bind(&self, repository: Arc<Repository>) -> bool {
        self.repository.set(repository).is_ok()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{},{}", self.asset_type, self.id, self.name)?;
        if !self.properties.is_empty() {
            write!(f, ", {:?}", self.properties.snapshot())?;
        }
        match self.repository() {
            Some(repository) => write!(f, ",{}]", repository.name()),
            None => f.write_str(",unbound]"),
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.asset_type)
            .field("repository", &self.repository().map(|r| r.name().to_string()))
            .finish()
    }
}
