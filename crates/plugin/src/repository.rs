//! Base repositories: a validated, descriptive wrapper around plugin-provided proxies.

use crate::accessor::{Accessor, Browser, Reader, Writer};
use std::fmt;
use std::sync::Arc;
use vrepo_api::{AssetType, Properties, VrError, VrResult, ordered};

/// Access point to a base repository, provided by a plugin.
///
/// `None` stands for a capability the proxy failed to declare; such proxies
/// are rejected when wrapped in a [`Repository`].
pub trait RepositoryProxy: Send + Sync {
    fn browser(&self) -> Option<Arc<dyn Browser>>;

    fn readers(&self) -> Option<Vec<Arc<dyn Reader>>>;

    fn writers(&self) -> Option<Vec<Arc<dyn Writer>>>;

    /// Release connections or other resources held by the proxy.
    fn shutdown(&self) {}
}

/// A proxy assembled from fixed capabilities.
#[derive(Default, Clone)]
pub struct StaticProxy {
    browser: Option<Arc<dyn Browser>>,
    readers: Option<Vec<Arc<dyn Reader>>>,
    writers: Option<Vec<Arc<dyn Writer>>>,
}

impl StaticProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_browser(mut self, browser: impl Browser + 'static) -> Self {
        self.browser = Some(Arc::new(browser));
        self
    }

    pub fn with_shared_browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn with_reader(mut self, reader: impl Reader + 'static) -> Self {
        self.readers
            .get_or_insert_with(Vec::new)
            .push(Arc::new(reader));
        self
    }

    pub fn with_writer(mut self, writer: impl Writer + 'static) -> Self {
        self.writers
            .get_or_insert_with(Vec::new)
            .push(Arc::new(writer));
        self
    }

    pub fn with_readers(mut self, readers: Vec<Arc<dyn Reader>>) -> Self {
        self.readers = Some(readers);
        self
    }

    pub fn with_writers(mut self, writers: Vec<Arc<dyn Writer>>) -> Self {
        self.writers = Some(writers);
        self
    }
}

impl RepositoryProxy for StaticProxy {
    fn browser(&self) -> Option<Arc<dyn Browser>> {
        self.browser.clone()
    }

    fn readers(&self) -> Option<Vec<Arc<dyn Reader>>> {
        // A proxy that declares only writers still has a (empty) reader list.
        match (&self.readers, &self.writers) {
            (None, Some(_)) => Some(Vec::new()),
            (readers, _) => readers.clone(),
        }
    }

    fn writers(&self) -> Option<Vec<Arc<dyn Writer>>> {
        match (&self.writers, &self.readers) {
            (None, Some(_)) => Some(Vec::new()),
            (writers, _) => writers.clone(),
        }
    }
}

/// A base repository with discovery, dissemination and ingestion capabilities.
pub struct Repository {
    name: String,
    proxy: Arc<dyn RepositoryProxy>,
    browser: Arc<dyn Browser>,
    readers: Vec<Arc<dyn Reader>>,
    writers: Vec<Arc<dyn Writer>>,
    properties: Properties,
}

impl Repository {
    /// Wrap a proxy, validating its declared capabilities.
    pub fn new(name: impl Into<String>, proxy: impl RepositoryProxy + 'static) -> VrResult<Self> {
        Self::from_proxy(name, Arc::new(proxy))
    }

    pub fn from_proxy(name: impl Into<String>, proxy: Arc<dyn RepositoryProxy>) -> VrResult<Self> {
        let name = name.into();
        let invalid = |reason: &str| VrError::InvalidRepository {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("repository name is empty"));
        }
        let browser = proxy
            .browser()
            .ok_or_else(|| invalid("proxy declares no browser"))?;
        let readers = proxy
            .readers()
            .ok_or_else(|| invalid("proxy declares no reader list"))?;
        let writers = proxy
            .writers()
            .ok_or_else(|| invalid("proxy declares no writer list"))?;
        if readers.is_empty() && writers.is_empty() {
            return Err(invalid("proxy defines no readers or writers"));
        }

        Ok(Self {
            name,
            proxy,
            browser,
            readers,
            writers,
            properties: Properties::new(),
        })
    }

    pub fn with_property(
        self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.set(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn proxy(&self) -> &Arc<dyn RepositoryProxy> {
        &self.proxy
    }

    pub fn browser(&self) -> &Arc<dyn Browser> {
        &self.browser
    }

    pub fn readers(&self) -> &[Arc<dyn Reader>] {
        &self.readers
    }

    pub fn writers(&self) -> &[Arc<dyn Writer>] {
        &self.writers
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The requested types this repository can disseminate; all readable types if `types` is empty.
    pub fn disseminated(&self, types: &[AssetType]) -> Vec<AssetType> {
        supported(&self.readers, types)
    }

    /// The requested types this repository can ingest; all writable types if `types` is empty.
    pub fn taken(&self, types: &[AssetType]) -> Vec<AssetType> {
        supported(&self.writers, types)
    }

    /// `true` if every given type can be disseminated.
    pub fn returns(&self, types: &[AssetType]) -> bool {
        types.len() == self.disseminated(types).len()
    }

    /// `true` if every given type can be ingested.
    pub fn takes(&self, types: &[AssetType]) -> bool {
        types.len() == self.taken(types).len()
    }

    /// Readers able to retrieve assets of `asset_type`, in declaration order.
    pub fn readers_for(&self, asset_type: &AssetType) -> Vec<Arc<dyn Reader>> {
        self.readers
            .iter()
            .filter(|r| ordered(asset_type, &r.bound_type()))
            .cloned()
            .collect()
    }

    /// Writers able to publish assets of `asset_type`, in declaration order.
    pub fn writers_for(&self, asset_type: &AssetType) -> Vec<Arc<dyn Writer>> {
        self.writers
            .iter()
            .filter(|w| ordered(asset_type, &w.bound_type()))
            .cloned()
            .collect()
    }

    pub fn shutdown(&self) {
        tracing::debug!(repository = %self.name, "shutting down repository proxy");
        self.proxy.shutdown();
    }
}

fn supported<A>(accessors: &[Arc<A>], types: &[AssetType]) -> Vec<AssetType>
where
    A: Accessor + ?Sized,
{
    if types.is_empty() {
        let mut all: Vec<AssetType> = Vec::new();
        for accessor in accessors {
            let bound = accessor.bound_type();
            if !all.contains(&bound) {
                all.push(bound);
            }
        }
        return all;
    }

    let mut matched: Vec<AssetType> = Vec::new();
    for requested in types {
        let served = accessors
            .iter()
            .any(|a| ordered(&a.bound_type(), requested));
        if served && !matched.contains(requested) {
            matched.push(requested.clone());
        }
    }
    matched
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("name", &self.name)
            .field("readers", &self.readers.len())
            .field("writers", &self.writers.len())
            .finish()
    }
}
