//! A single repository's share of a discovery round.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use vrepo_api::AssetType;
use vrepo_plugin::{Asset, Repository};

/// What a task hands back through the completion queue.
pub struct TaskOutcome {
    pub repository: Arc<Repository>,
    pub assets: Vec<Arc<Asset>>,
}

impl TaskOutcome {
    fn empty(repository: Arc<Repository>) -> Self {
        Self {
            repository,
            assets: Vec::new(),
        }
    }
}

/// Query `repository` for `types` and stage the results privately.
///
/// Never fails: browser errors and panics are logged and yield no assets.
pub fn run(repository: Arc<Repository>, types: &[AssetType]) -> TaskOutcome {
    let browser = Arc::clone(repository.browser());
    let discovered = match catch_unwind(AssertUnwindSafe(|| browser.discover(types))) {
        Ok(Ok(assets)) => assets,
        Ok(Err(e)) => {
            tracing::warn!("error discovering assets in repository {}: {}", repository.name(), e);
            return TaskOutcome::empty(repository);
        }
        Err(_) => {
            tracing::warn!("browser of repository {} panicked during discovery", repository.name());
            return TaskOutcome::empty(repository);
        }
    };

    let mut staged: HashMap<String, Arc<Asset>> = HashMap::with_capacity(discovered.len());
    let mut duplicates = 0;

    for asset in discovered {
        let asset = Arc::new(asset);
        if !asset.bind(Arc::clone(&repository)) {
            tracing::debug!(
                "asset {} from {} was already bound elsewhere",
                asset.id(),
                repository.name()
            );
        }
        // A later duplicate replaces the staged one.
        if staged.insert(asset.id().to_string(), asset).is_some() {
            duplicates += 1;
        }
    }

    tracing::debug!(
        "staged {} asset(s) from repository {} ({} duplicate id(s) replaced)",
        staged.len(),
        repository.name(),
        duplicates
    );

    TaskOutcome {
        repository,
        assets: staged.into_values().collect(),
    }
}
