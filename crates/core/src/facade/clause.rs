use super::VirtualRepository;
use crate::discovery::{DiscoveryEngine, DiscoveryObserver, DiscoveryReport, DiscoveryRequest};
use crate::pool::WorkerPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use vrepo_api::AssetType;
use vrepo_plugin::Repository;

/// A pending discovery round, configured fluently and run in one of several ways.
///
/// No type means every type the repositories can disseminate.
#[must_use = "a discovery clause does nothing until it is run"]
pub struct DiscoverClause<'a> {
    repository: &'a VirtualRepository,
    types: Vec<AssetType>,
    over: Option<Vec<Arc<Repository>>>,
    timeout: Duration,
}

impl<'a> DiscoverClause<'a> {
    pub(super) fn new(repository: &'a VirtualRepository, types: Vec<AssetType>) -> Self {
        Self {
            repository,
            types,
            over: None,
            timeout: repository.config().discovery_idle_timeout,
        }
    }

    /// Idle timeout: the longest wait for the next repository to answer.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restrict the round to the given repositories.
    pub fn over<I>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = Arc<Repository>>,
    {
        self.over = Some(repositories.into_iter().collect());
        self
    }

    fn split(self) -> (Arc<WorkerPool>, DiscoveryEngine, DiscoveryRequest) {
        let repositories = match self.over {
            Some(repositories) => repositories,
            None => self.repository.repositories().iter().cloned().collect(),
        };
        let request = DiscoveryRequest {
            types: self.types,
            repositories,
            idle_timeout: self.timeout,
        };
        (
            Arc::clone(&self.repository.pool),
            self.repository.discovery.clone(),
            request,
        )
    }

    /// Run the round on the calling thread; returns the number of new assets.
    ///
    /// Must not be called from within an async context.
    pub fn blocking(self) -> usize {
        self.report_blocking().news
    }

    pub fn report_blocking(self) -> DiscoveryReport {
        let (pool, engine, request) = self.split();
        if pool.is_shut_down() {
            tracing::warn!("discovery requested after shutdown, nothing submitted");
            return DiscoveryReport::default();
        }
        pool.block_on(engine.discover(request))
    }

    pub async fn run(self) -> usize {
        self.report().await.news
    }

    pub async fn report(self) -> DiscoveryReport {
        let (pool, engine, request) = self.split();
        let round = pool.spawn(async move { engine.discover(request).await });
        round.await.unwrap_or_else(|e| {
            tracing::warn!("discovery round did not complete: {}", e);
            DiscoveryReport::default()
        })
    }

    /// Start the round in the background.
    pub fn without_blocking(self) -> JoinHandle<usize> {
        let (pool, engine, request) = self.split();
        pool.spawn(async move { engine.discover(request).await.news })
    }

    /// Start the round in the background, reporting progress to `observer`.
    pub fn notifying(self, observer: Arc<dyn DiscoveryObserver>) -> JoinHandle<()> {
        let (pool, engine, request) = self.split();
        pool.spawn(async move {
            engine
                .discover_observed(request, Some(observer.as_ref()))
                .await;
        })
    }
}
