//! Asynchronous execution of retrievals and publications.
//!
//! Each transfer is one blocking unit on the shared pool. The wait is bounded
//! by a fixed ceiling; a transfer that outlives it is not cancelled and may
//! keep running after the caller has been told it timed out.

use crate::pool::WorkerPool;
use crate::transform::{AdaptedReader, AdaptedWriter};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use vrepo_api::{BoxError, Content, Operation, TransferContext, VrError, VrResult};
use vrepo_plugin::{Asset, Reader, Writer};

pub fn transfer_context(operation: Operation, asset: &Asset) -> TransferContext {
    TransferContext {
        operation,
        asset_id: asset.id().to_string(),
        asset_name: asset.name().to_string(),
        repository: asset
            .repository()
            .map(|r| r.name().to_string())
            .unwrap_or_else(|| "unbound".to_string()),
    }
}

#[derive(Clone)]
pub struct TransferExecutor {
    pool: Arc<WorkerPool>,
    ceiling: Duration,
}

impl TransferExecutor {
    pub fn new(pool: Arc<WorkerPool>, ceiling: Duration) -> Self {
        Self { pool, ceiling }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub async fn retrieve(&self, asset: Arc<Asset>, reader: AdaptedReader) -> VrResult<Content> {
        let context = transfer_context(Operation::Retrieve, &asset);
        self.run(context, move || reader.retrieve(&asset)).await
    }

    pub async fn publish(
        &self,
        asset: Arc<Asset>,
        writer: AdaptedWriter,
        content: Content,
    ) -> VrResult<()> {
        let context = transfer_context(Operation::Publish, &asset);
        self.run(context, move || writer.publish(&asset, content)).await
    }

    /// Run `work` on the pool and classify how the wait for it ended.
    ///
    /// The wait itself is driven by the pool, so callers need no timer of their own.
    pub async fn run<T, F>(&self, context: TransferContext, work: F) -> VrResult<T>
    where
        F: FnOnce() -> Result<T, BoxError> + Send + 'static,
        T: Send + 'static,
    {
        let Some(handle) = self.pool.spawn_blocking(work) else {
            return Err(VrError::ShutDown { context });
        };

        let cancel = self.pool.cancellation();
        let ceiling = self.ceiling;
        let waiting_context = context.clone();

        let waiting = self.pool.spawn(async move {
            let context = waiting_context;
            tokio::select! {
                _ = cancel.cancelled() => Err(VrError::Interrupted { context }),
                joined = tokio::time::timeout(ceiling, handle) => match joined {
                    Ok(Ok(Ok(value))) => Ok(value),
                    Ok(Ok(Err(source))) => Err(VrError::Execution { context, source }),
                    Ok(Err(join_error)) => Err(VrError::Execution {
                        context,
                        source: join_failure(join_error),
                    }),
                    Err(_) => Err(VrError::Timeout { context, elapsed: ceiling }),
                }
            }
        });

        let result = match waiting.await {
            Ok(result) => result,
            // The pool went down under the waiter.
            Err(_) => Err(VrError::Interrupted { context }),
        };

        if let Err(e) = &result {
            tracing::warn!("{}", e);
        }
        result
    }
}

fn join_failure(error: JoinError) -> BoxError {
    if error.is_panic() {
        let message = panic_message(error.into_panic().as_ref());
        format!("panicked: {message}").into()
    } else {
        format!("task cancelled: {error}").into()
    }
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
