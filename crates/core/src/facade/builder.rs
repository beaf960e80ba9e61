use super::VirtualRepository;
use crate::asset::{AssetRegistry, Repositories};
use crate::config::VrConfig;
use crate::discovery::DiscoveryEngine;
use crate::error::Result;
use crate::pool::WorkerPool;
use crate::transfer::TransferExecutor;
use crate::transform::{Extensions, TransformGraph};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use vrepo_api::VrResult;
use vrepo_plugin::{Plugin, Repository, Transform};

/// Builder for [`VirtualRepository`]
#[derive(Default)]
pub struct VirtualRepositoryBuilder {
    config: VrConfig,
    repositories: Vec<Arc<Repository>>,
    transforms: Vec<Arc<dyn Transform>>,
    pool: Option<Arc<WorkerPool>>,
}

impl VirtualRepositoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: VrConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_repository(mut self, repository: impl Into<Arc<Repository>>) -> Self {
        self.repositories.push(repository.into());
        self
    }

    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn with_shared_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Add the repositories and transforms exported by `plugin`.
    pub fn with_plugin(mut self, plugin: &dyn Plugin) -> VrResult<Self> {
        let info = plugin.info();
        let repositories = plugin.repositories()?;
        let transforms = plugin.transforms();
        tracing::info!(
            "loading plugin {} {}: {} repositories, {} transforms",
            info.id,
            info.version,
            repositories.len(),
            transforms.len()
        );
        self.repositories
            .extend(repositories.into_iter().map(Arc::new));
        self.transforms.extend(transforms);
        Ok(self)
    }

    /// Share an existing pool instead of creating one.
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> Result<VirtualRepository> {
        let pool = match self.pool {
            Some(pool) => pool,
            None => Arc::new(WorkerPool::new(&self.config)?),
        };
        let registry = Arc::new(AssetRegistry::new());
        let repositories: Repositories = self.repositories.into_iter().collect();
        let extensions = Extensions::new(TransformGraph::from_transforms(self.transforms));

        tracing::info!(
            "virtual repository ready: {} repositories, {} transforms",
            repositories.len(),
            extensions.transforms().len()
        );

        Ok(VirtualRepository {
            discovery: DiscoveryEngine::new(Arc::clone(&pool), Arc::clone(&registry)),
            executor: TransferExecutor::new(Arc::clone(&pool), self.config.transfer_timeout),
            config: self.config,
            pool,
            registry,
            repositories,
            extensions,
            shut_down: AtomicBool::new(false),
        })
    }
}
