use crate::accessor::Transform;
use crate::repository::Repository;
use std::sync::Arc;
use vrepo_api::VrResult;

/// Metadata for a plugin (plugin's own information).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

/// Entry point of a library plugin: the base repositories it exports and the
/// format conversions it contributes.
pub trait Plugin: Send + Sync {
    fn info(&self) -> PluginInfo;

    /// Repositories exported by this plugin. Construction failures are
    /// reported per plugin so that one broken plugin does not hide the others.
    fn repositories(&self) -> VrResult<Vec<Repository>>;

    fn transforms(&self) -> Vec<Arc<dyn Transform>> {
        Vec::new()
    }
}
