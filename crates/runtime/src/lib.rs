use std::sync::Arc;
use vrepo_core::{VirtualRepository, VrConfig};
use vrepo_plugin::Plugin;

/// Bootstraps a virtual repository from explicitly registered plugins.
///
/// A plugin whose repositories fail validation is logged and left out; the
/// remaining plugins still load.
pub fn build_virtual_repository(
    plugins: &[Arc<dyn Plugin>],
    config: VrConfig,
) -> vrepo_core::Result<VirtualRepository> {
    let mut builder = VirtualRepository::builder().with_config(config);

    for plugin in plugins {
        let info = plugin.info();
        let repositories = match plugin.repositories() {
            Ok(repositories) => repositories,
            Err(e) => {
                tracing::error!("Failed to load plugin {}: {}", info.name, e);
                continue;
            }
        };
        for repository in repositories {
            builder = builder.with_repository(repository);
        }
        for transform in plugin.transforms() {
            builder = builder.with_shared_transform(transform);
        }
        tracing::info!("Loaded plugin {} {}", info.name, info.version);
    }

    builder.build()
}

/// Same as [`build_virtual_repository`], configured from the environment.
pub fn build_default_repository(
    plugins: &[Arc<dyn Plugin>],
) -> vrepo_core::Result<VirtualRepository> {
    build_virtual_repository(plugins, VrConfig::from_env())
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str) -> Option<impl Drop> {
    Some(vrepo_core::logging::init_logging(component, false))
}
