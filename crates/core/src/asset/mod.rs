//! Asset layer: the shared registry of discovered assets and the collection
//! of base repositories they come from.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────┐    ┌───────────────────────┐
//! │   Repositories          │    │   DiscoveryEngine     │
//! │   (browsers, readers)   │───▶│   (scatter/gather)    │
//! └─────────────────────────┘    └───────────┬───────────┘
//!                                            │ merge
//!                                            ▼
//!                            ┌───────────────────────────┐
//!                            │   AssetRegistry           │
//!                            │   (id → asset)            │
//!                            └───────────────────────────┘
//! ```

pub mod registry;
pub mod repositories;

pub use registry::{AssetRegistry, MergeCounts, RegistryStats};
pub use repositories::Repositories;
