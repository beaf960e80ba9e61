//! Scatter/gather discovery across base repositories.
//!
//! One blocking task per eligible repository runs on the shared pool and
//! reports through a completion queue. The gather loop waits at most the idle
//! timeout for each next completion. Tasks still running when it gives up are
//! abandoned: they run to completion but their results are dropped with the
//! queue.

pub mod task;

use crate::asset::AssetRegistry;
use crate::pool::WorkerPool;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use task::TaskOutcome;
use tokio::sync::mpsc;
use vrepo_api::AssetType;
use vrepo_plugin::{Asset, Repository};

pub struct DiscoveryRequest {
    pub types: Vec<AssetType>,
    pub repositories: Vec<Arc<Repository>>,
    pub idle_timeout: Duration,
}

/// Outcome of a discovery round.
///
/// `news + refreshed == received`, where `received` counts the assets
/// handed back by completed tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Ids not in the registry before this round.
    pub news: usize,
    /// Ids that replaced an existing registry entry.
    pub refreshed: usize,
    pub received: usize,
    pub submitted: usize,
    pub completed: usize,
    /// Tasks still running when the gather loop stopped.
    pub abandoned: usize,
    /// Repositories that serve none of the requested types.
    pub skipped: usize,
    #[serde(with = "crate::config::serde_millis")]
    pub elapsed: Duration,
}

/// Callbacks for a discovery round, invoked from the gather loop.
pub trait DiscoveryObserver: Send + Sync {
    /// Once per completed task, in completion order, before the merge.
    fn on_next(&self, _repository: &str, _assets: &[Arc<Asset>]) {}

    /// Once, after the merge.
    fn on_completed(&self, _report: &DiscoveryReport) {}
}

#[derive(Clone)]
pub struct DiscoveryEngine {
    pool: Arc<WorkerPool>,
    registry: Arc<AssetRegistry>,
}

impl DiscoveryEngine {
    pub fn new(pool: Arc<WorkerPool>, registry: Arc<AssetRegistry>) -> Self {
        Self { pool, registry }
    }

    pub async fn discover(&self, request: DiscoveryRequest) -> DiscoveryReport {
        self.discover_observed(request, None).await
    }

    pub async fn discover_observed(
        &self,
        request: DiscoveryRequest,
        observer: Option<&dyn DiscoveryObserver>,
    ) -> DiscoveryReport {
        let started = Instant::now();
        let mut report = DiscoveryReport::default();

        if self.pool.is_shut_down() {
            tracing::warn!("discovery requested after shutdown, nothing submitted");
            report.elapsed = started.elapsed();
            return report;
        }

        tracing::info!(
            "discovering {} type(s) over {} repositories (idle timeout {:?})",
            request.types.len(),
            request.repositories.len(),
            request.idle_timeout
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<TaskOutcome>();

        for repository in request.repositories {
            let eligible = repository.disseminated(&request.types);
            if eligible.is_empty() {
                tracing::trace!("skipping repository {}: no requested type", repository.name());
                report.skipped += 1;
                continue;
            }

            let tx = tx.clone();
            let submitted = self.pool.spawn_blocking(move || {
                let outcome = task::run(repository, &eligible);
                // The receiver is gone once the round has been abandoned.
                let _ = tx.send(outcome);
            });
            if submitted.is_none() {
                tracing::warn!("worker pool shut down while submitting discovery tasks");
                break;
            }
            report.submitted += 1;
        }
        drop(tx);

        let cancel = self.pool.cancellation();
        let mut outcomes: Vec<TaskOutcome> = Vec::with_capacity(report.submitted);

        while outcomes.len() < report.submitted {
            if cancel.is_cancelled() {
                tracing::warn!("discovery interrupted, merging {} completed task(s)", outcomes.len());
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::warn!("discovery interrupted, merging {} completed task(s)", outcomes.len());
                    break;
                }
                next = tokio::time::timeout(request.idle_timeout, rx.recv()) => match next {
                    Ok(Some(outcome)) => {
                        if let Some(observer) = observer {
                            observer.on_next(outcome.repository.name(), &outcome.assets);
                        }
                        outcomes.push(outcome);
                    }
                    // Every task hung up, some without reporting.
                    Ok(None) => break,
                    Err(_) => {
                        tracing::warn!(
                            "no discovery task completed within {:?}, abandoning {} task(s)",
                            request.idle_timeout,
                            report.submitted - outcomes.len()
                        );
                        break;
                    }
                }
            }
        }
        drop(rx);

        report.completed = outcomes.len();
        report.abandoned = report.submitted - report.completed;
        report.received = outcomes.iter().map(|o| o.assets.len()).sum();

        let counts = self
            .registry
            .merge(outcomes.into_iter().flat_map(|o| o.assets));
        report.news = counts.news;
        report.refreshed = counts.refreshed;
        report.elapsed = started.elapsed();

        tracing::info!(
            "discovered {} new and {} refreshed asset(s) from {}/{} repositories in {:?}",
            report.news,
            report.refreshed,
            report.completed,
            report.submitted,
            report.elapsed
        );

        if let Some(observer) = observer {
            observer.on_completed(&report);
        }
        report
    }
}
