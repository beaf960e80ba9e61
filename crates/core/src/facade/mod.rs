use crate::asset::{AssetRegistry, RegistryStats, Repositories};
use crate::config::VrConfig;
use crate::discovery::DiscoveryEngine;
use crate::pool::WorkerPool;
use crate::transfer::{TransferExecutor, transfer_context};
use crate::transform::{AdaptedReader, AdaptedWriter, Extensions};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use vrepo_api::{ApiTag, AssetType, Content, Operation, VrError, VrResult};
use vrepo_plugin::{Asset, Repository};

mod builder;
mod clause;

pub use builder::VirtualRepositoryBuilder;
pub use clause::DiscoverClause;

/// A single logical repository federating many base repositories.
///
/// Blocking methods park the calling thread on the internal pool and must
/// not be called from within an async context; use the `async` variants there.
pub struct VirtualRepository {
    pub(crate) config: VrConfig,
    pub(crate) pool: Arc<WorkerPool>,
    pub(crate) registry: Arc<AssetRegistry>,
    pub(crate) repositories: Repositories,
    pub(crate) extensions: Extensions,
    pub(crate) discovery: DiscoveryEngine,
    pub(crate) executor: TransferExecutor,
    pub(crate) shut_down: AtomicBool,
}

impl VirtualRepository {
    pub fn builder() -> VirtualRepositoryBuilder {
        VirtualRepositoryBuilder::new()
    }

    pub fn config(&self) -> &VrConfig {
        &self.config
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn registry(&self) -> &Arc<AssetRegistry> {
        &self.registry
    }

    // ---- Registry ----

    pub fn size(&self) -> usize {
        self.registry.len()
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Asset>> {
        self.registry.get(id)
    }

    /// Assets whose type is ordered under `asset_type`.
    pub fn lookup_type(&self, asset_type: &AssetType) -> Vec<Arc<Asset>> {
        self.registry.lookup_type(asset_type)
    }

    /// One bucket per requested type, each asset under its own type only.
    pub fn lookup_types(&self, types: &[AssetType]) -> HashMap<AssetType, Vec<Arc<Asset>>> {
        self.registry.lookup_types(types)
    }

    pub fn snapshot(&self) -> Vec<Arc<Asset>> {
        self.registry.snapshot()
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    // ---- Discovery ----

    pub fn discover<I>(&self, types: I) -> DiscoverClause<'_>
    where
        I: IntoIterator<Item = AssetType>,
    {
        DiscoverClause::new(self, types.into_iter().collect())
    }

    // ---- Capability resolution ----

    fn bound_repository(asset: &Asset, operation: Operation) -> VrResult<&Arc<Repository>> {
        asset.repository().ok_or_else(|| VrError::Unbound {
            operation,
            asset_id: asset.id().to_string(),
        })
    }

    fn no_capability(asset: &Asset, repository: &Repository, operation: Operation, api: ApiTag) -> VrError {
        VrError::NoCapability {
            operation,
            asset_id: asset.id().to_string(),
            repository: repository.name().to_string(),
            api: api.name().to_string(),
        }
    }

    /// The reader, direct or adapted, that would serve `asset` in `api`.
    pub fn resolve_reader(&self, asset: &Asset, api: ApiTag) -> VrResult<AdaptedReader> {
        let repository = Self::bound_repository(asset, Operation::Retrieve)?;
        self.extensions
            .transforms()
            .resolve_reader(repository.readers(), asset.asset_type(), api)
            .ok_or_else(|| Self::no_capability(asset, repository, Operation::Retrieve, api))
    }

    /// The writer, direct or adapted, that would publish `asset` from content in `api`.
    pub fn resolve_writer(&self, asset: &Asset, api: ApiTag) -> VrResult<AdaptedWriter> {
        let repository = Self::bound_repository(asset, Operation::Publish)?;
        self.extensions
            .transforms()
            .resolve_writer(repository.writers(), asset.asset_type(), api)
            .ok_or_else(|| Self::no_capability(asset, repository, Operation::Publish, api))
    }

    pub fn can_retrieve(&self, asset: &Asset, api: ApiTag) -> VrResult<bool> {
        match self.resolve_reader(asset, api) {
            Ok(_) => Ok(true),
            Err(VrError::NoCapability { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn can_publish(&self, asset: &Asset, api: ApiTag) -> VrResult<bool> {
        match self.resolve_writer(asset, api) {
            Ok(_) => Ok(true),
            Err(VrError::NoCapability { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ---- Retrieval ----

    fn ensure_running(&self, operation: Operation, asset: &Asset) -> VrResult<()> {
        if self.pool.is_shut_down() {
            return Err(VrError::ShutDown {
                context: transfer_context(operation, asset),
            });
        }
        Ok(())
    }

    pub fn retrieve<T: Any + Send>(&self, asset: &Arc<Asset>) -> VrResult<T> {
        let content = self.retrieve_content(asset, ApiTag::of::<T>())?;
        downcast(asset, content)
    }

    pub fn retrieve_content(&self, asset: &Arc<Asset>, api: ApiTag) -> VrResult<Content> {
        let reader = self.resolve_reader(asset, api)?;
        self.ensure_running(Operation::Retrieve, asset)?;
        self.pool
            .block_on(self.executor.retrieve(Arc::clone(asset), reader))
    }

    pub async fn retrieve_async<T: Any + Send>(&self, asset: &Arc<Asset>) -> VrResult<T> {
        let content = self
            .retrieve_content_async(asset, ApiTag::of::<T>())
            .await?;
        downcast(asset, content)
    }

    pub async fn retrieve_content_async(
        &self,
        asset: &Arc<Asset>,
        api: ApiTag,
    ) -> VrResult<Content> {
        let reader = self.resolve_reader(asset, api)?;
        self.executor.retrieve(Arc::clone(asset), reader).await
    }

    // ---- Publication ----

    pub fn publish<T: Any + Send>(&self, asset: impl Into<Arc<Asset>>, value: T) -> VrResult<()> {
        self.publish_content(asset, Content::new(value))
    }

    /// Publish `content`; its own API selects the writer.
    pub fn publish_content(&self, asset: impl Into<Arc<Asset>>, content: Content) -> VrResult<()> {
        let asset = asset.into();
        let writer = self.resolve_writer(&asset, content.tag())?;
        self.ensure_running(Operation::Publish, &asset)?;
        self.pool
            .block_on(self.executor.publish(asset, writer, content))
    }

    pub async fn publish_async<T: Any + Send>(
        &self,
        asset: impl Into<Arc<Asset>>,
        value: T,
    ) -> VrResult<()> {
        self.publish_content_async(asset, Content::new(value)).await
    }

    pub async fn publish_content_async(
        &self,
        asset: impl Into<Arc<Asset>>,
        content: Content,
    ) -> VrResult<()> {
        let asset = asset.into();
        let writer = self.resolve_writer(&asset, content.tag())?;
        self.executor.publish(asset, writer, content).await
    }

    // ---- Lifecycle ----

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stop the pool, waiting at most the configured grace period, then
    /// release repositories and extensions. Only the first call has an effect.
    ///
    /// Must not be called from within an async context.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("virtual repository already shut down");
            return;
        }

        tracing::info!("shutting down virtual repository");
        if !self.pool.shutdown(self.config.shutdown_grace) {
            tracing::warn!("worker pool was already shut down");
        }
        self.repositories.shutdown();
        self.extensions.shutdown();
    }
}

fn downcast<T: Any>(asset: &Asset, content: Content) -> VrResult<T> {
    content.downcast::<T>().map_err(|content| VrError::Execution {
        context: transfer_context(Operation::Retrieve, asset),
        source: format!(
            "expected content of api {}, got {}",
            ApiTag::of::<T>(),
            content.tag()
        )
        .into(),
    })
}

impl<'a> IntoIterator for &'a VirtualRepository {
    type Item = Arc<Asset>;
    type IntoIter = std::vec::IntoIter<Arc<Asset>>;

    /// Iterates over a snapshot taken at call time.
    fn into_iter(self) -> Self::IntoIter {
        self.snapshot().into_iter()
    }
}
