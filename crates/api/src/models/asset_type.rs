//! Asset types and the subtype lattice used for filtering and capability matching.

use serde::{Serialize, Serializer};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name of the distinguished top type.
pub const ANY_TYPE: &str = "any";

struct TypeNode {
    name: String,
    supertypes: Vec<AssetType>,
}

/// A node in the type lattice.
///
/// Supertypes are fixed when the type is created, so every lattice built from
/// `AssetType` values is acyclic. Identity (equality and hashing) is by name.
#[derive(Clone)]
pub struct AssetType {
    node: Arc<TypeNode>,
}

impl AssetType {
    /// A root type with no supertypes.
    pub fn new(name: impl Into<String>) -> Self {
        Self::specializing(name, [])
    }

    /// A type that specializes each of `supertypes`.
    pub fn specializing(
        name: impl Into<String>,
        supertypes: impl IntoIterator<Item = AssetType>,
    ) -> Self {
        Self {
            node: Arc::new(TypeNode {
                name: name.into(),
                supertypes: supertypes.into_iter().collect(),
            }),
        }
    }

    /// The top type, which every type is ordered under.
    pub fn any() -> Self {
        Self::new(ANY_TYPE)
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Direct supertypes, in declaration order.
    pub fn supertypes(&self) -> &[AssetType] {
        &self.node.supertypes
    }

    pub fn is_any(&self) -> bool {
        self.node.name == ANY_TYPE
    }

    /// `true` if this type equals `other`, `other` is the top type, or this
    /// type transitively specializes `other`.
    pub fn is_ordered_under(&self, other: &AssetType) -> bool {
        ordered(self, other)
    }
}

/// Lattice ordering: `sub` is `sup`, `sup` is the top type, or `sub`
/// transitively specializes `sup`.
pub fn ordered(sub: &AssetType, sup: &AssetType) -> bool {
    if sub == sup || sup.is_any() {
        return true;
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(sub);
    visited.insert(sub.name());

    while let Some(current) = queue.pop_front() {
        for parent in current.supertypes() {
            if parent == sup {
                return true;
            }
            if visited.insert(parent.name()) {
                queue.push_back(parent);
            }
        }
    }

    false
}

impl PartialEq for AssetType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node) || self.node.name == other.node.name
    }
}

impl Eq for AssetType {}

impl Hash for AssetType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.name.hash(state);
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.supertypes().is_empty() {
            return f.write_str(self.name());
        }
        let parents: Vec<&str> = self.supertypes().iter().map(AssetType::name).collect();
        write!(f, "{} <: {:?}", self.name(), parents)
    }
}

impl Serialize for AssetType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}
