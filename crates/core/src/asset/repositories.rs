use std::sync::Arc;
use vrepo_plugin::Repository;

/// The base repositories federated by a virtual repository, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Repositories {
    repositories: Vec<Arc<Repository>>,
}

impl Repositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository. A repository with the same name replaces the earlier one in place.
    pub fn add(&mut self, repository: Arc<Repository>) {
        match self
            .repositories
            .iter_mut()
            .find(|r| r.name() == repository.name())
        {
            Some(existing) => {
                tracing::warn!("repository {} registered twice, keeping the last", repository.name());
                *existing = repository;
            }
            None => self.repositories.push(repository),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<Repository>> {
        self.repositories.iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Repository>> {
        self.repositories.iter()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn shutdown(&self) {
        for repository in &self.repositories {
            repository.shutdown();
        }
    }
}

impl FromIterator<Arc<Repository>> for Repositories {
    fn from_iter<T: IntoIterator<Item = Arc<Repository>>>(iter: T) -> Self {
        let mut repositories = Self::new();
        for repository in iter {
            repositories.add(repository);
        }
        repositories
    }
}

impl<'a> IntoIterator for &'a Repositories {
    type Item = &'a Arc<Repository>;
    type IntoIter = std::slice::Iter<'a, Arc<Repository>>;

    fn into_iter(self) -> Self::IntoIter {
        self.repositories.iter()
    }
}
