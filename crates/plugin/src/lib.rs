//! Collaborator contracts consumed by the virtual repository core.
//!
//! Base repositories plug in through a [`RepositoryProxy`] exposing a
//! [`Browser`] (the discovery entry point) and typed [`Reader`]s and
//! [`Writer`]s. Format conversions plug in as [`Transform`]s.

pub mod accessor;
pub mod asset;
pub mod plugin;
pub mod repository;
pub mod typed;

pub use accessor::{Accessor, Browser, Reader, Transform, Writer};
pub use asset::Asset;
pub use plugin::{Plugin, PluginInfo};
pub use repository::{Repository, RepositoryProxy, StaticProxy};
pub use typed::{FnBrowser, FnReader, FnTransform, FnWriter};

pub use vrepo_api::BoxError;
