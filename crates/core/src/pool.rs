//! The worker pool shared by discovery, retrieval and publication.
//!
//! Collaborator calls are blocking and run on the runtime's blocking pool,
//! which grows on demand. The three kinds of work are not isolated from one
//! another: heavy retrieval traffic can delay discovery and vice versa.

use crate::config::VrConfig;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct WorkerPool {
    handle: Handle,
    runtime: Mutex<Option<Runtime>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new(config: &VrConfig) -> std::io::Result<Self> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.thread_name("vrepo-worker").enable_all();
        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads.max(1));
        }
        let runtime = builder.build()?;

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            cancel: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Fires when the pool shuts down; waits on pool work observe it as an interruption.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run blocking work on the pool; `None` once the pool is shut down.
    pub fn spawn_blocking<F, R>(&self, work: F) -> Option<JoinHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_shut_down() {
            return None;
        }
        Some(self.handle.spawn_blocking(work))
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Block the calling thread on `future`. Must not be called from an async context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }

    /// Stop accepting work and wait at most `grace` for in-flight work.
    ///
    /// Returns `false` if the pool was already shut down.
    pub fn shutdown(&self, grace: Duration) -> bool {
        self.cancel.cancel();
        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match runtime {
            Some(runtime) => {
                info!("shutting down worker pool (grace {:?})", grace);
                runtime.shutdown_timeout(grace);
                true
            }
            None => false,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.cancel.cancel();
        let runtime = self
            .runtime
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            warn!("worker pool dropped without shutdown, stopping in background");
            runtime.shutdown_background();
        }
    }
}
