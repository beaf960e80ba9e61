use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Mutable property bag attached to assets and repositories.
///
/// Mutation goes through `&self`, so a bag reachable from a shared asset can
/// be updated in place by any holder.
#[derive(Debug, Default)]
pub struct Properties {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, returning the previous value if any.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.clone()
    }
}

impl Clone for Properties {
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.snapshot()),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let props = Properties::new();
        assert!(props.is_empty());

        assert_eq!(props.set("agency", "FAO"), None);
        assert_eq!(props.set("agency", "ISO"), Some(Value::from("FAO")));
        assert_eq!(props.get("agency"), Some(Value::from("ISO")));
        assert!(props.contains("agency"));

        assert_eq!(props.remove("agency"), Some(Value::from("ISO")));
        assert!(!props.contains("agency"));
    }

    #[test]
    fn test_clone_is_independent() {
        let props: Properties = [("version", 1)].into_iter().collect();
        let copy = props.clone();
        props.set("version", 2);

        assert_eq!(copy.get("version"), Some(Value::from(1)));
        assert_eq!(props.snapshot().len(), 1);
    }
}
