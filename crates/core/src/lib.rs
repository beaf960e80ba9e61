//! Core of the virtual repository: scatter/gather discovery, capability
//! resolution over the transform graph, and pooled retrieval/publication.

pub mod asset;
pub mod config;
pub mod discovery;
pub mod error;
pub mod facade;
pub mod logging;
pub mod pool;
pub mod transfer;
pub mod transform;

pub use asset::{AssetRegistry, RegistryStats, Repositories};
pub use config::VrConfig;
pub use discovery::{DiscoveryEngine, DiscoveryObserver, DiscoveryReport, DiscoveryRequest};
pub use error::{CoreError, Result};
pub use facade::{DiscoverClause, VirtualRepository, VirtualRepositoryBuilder};
pub use pool::WorkerPool;
pub use transfer::TransferExecutor;
pub use transform::{AdaptedReader, AdaptedWriter, Extensions, TransformGraph, TransformPath};
