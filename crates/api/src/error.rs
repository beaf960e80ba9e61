use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Error type raised by collaborators (browsers, readers, writers, transforms).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The two content transfers a virtual repository performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    Retrieve,
    Publish,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Retrieve => f.write_str("retrieve"),
            Operation::Publish => f.write_str("publish"),
        }
    }
}

/// Where a transfer failed: the operation, the asset, and the repository it went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferContext {
    pub operation: Operation,
    pub asset_id: String,
    pub asset_name: String,
    pub repository: String,
}

impl fmt::Display for TransferContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of asset {} ({}) through repository {}",
            self.operation, self.asset_id, self.asset_name, self.repository
        )
    }
}

/// Discriminant of [`VrError`], for callers that branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unbound,
    NoCapability,
    InvalidRepository,
    Timeout,
    Interrupted,
    Execution,
    ShutDown,
}

#[derive(Debug, thiserror::Error)]
pub enum VrError {
    #[error("cannot {operation} asset {asset_id}: it is not bound to a repository")]
    Unbound {
        operation: Operation,
        asset_id: String,
    },
    #[error("cannot {operation} asset {asset_id} through repository {repository}: no capability for api {api}")]
    NoCapability {
        operation: Operation,
        asset_id: String,
        repository: String,
        api: String,
    },
    #[error("invalid repository '{name}': {reason}")]
    InvalidRepository { name: String, reason: String },
    #[error("timeout after {elapsed:?} waiting for {context}")]
    Timeout {
        context: TransferContext,
        elapsed: Duration,
    },
    #[error("interrupted while waiting for {context}")]
    Interrupted { context: TransferContext },
    #[error("error during {context}: {source}")]
    Execution {
        context: TransferContext,
        #[source]
        source: BoxError,
    },
    #[error("worker pool is shut down, cannot run {context}")]
    ShutDown { context: TransferContext },
}

impl VrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VrError::Unbound { .. } => ErrorKind::Unbound,
            VrError::NoCapability { .. } => ErrorKind::NoCapability,
            VrError::InvalidRepository { .. } => ErrorKind::InvalidRepository,
            VrError::Timeout { .. } => ErrorKind::Timeout,
            VrError::Interrupted { .. } => ErrorKind::Interrupted,
            VrError::Execution { .. } => ErrorKind::Execution,
            VrError::ShutDown { .. } => ErrorKind::ShutDown,
        }
    }

    /// `true` for malformed requests, raised before any work is scheduled.
    pub fn is_fail_fast(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unbound | ErrorKind::NoCapability | ErrorKind::InvalidRepository
        )
    }

    /// Transfer context, for the kinds raised by an asynchronous transfer.
    pub fn context(&self) -> Option<&TransferContext> {
        match self {
            VrError::Timeout { context, .. }
            | VrError::Interrupted { context }
            | VrError::Execution { context, .. }
            | VrError::ShutDown { context } => Some(context),
            _ => None,
        }
    }
}

pub type VrResult<T> = std::result::Result<T, VrError>;
