//! Transform graph and capability resolution.
//!
//! Nodes are API tags, edges are registered transforms (weighted by their
//! index in the transform arena). Resolution is a pure decision: it returns
//! an adapted accessor that does no work until invoked.

use super::adapted::{AdaptedReader, AdaptedWriter};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use vrepo_api::{ApiTag, AssetType, ordered};
use vrepo_plugin::{Reader, Transform, Writer};

/// A resolved conversion: transform indices, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformPath {
    steps: Vec<usize>,
}

impl TransformPath {
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Default)]
pub struct TransformGraph {
    topology: StableDiGraph<ApiTag, usize>,
    nodes: HashMap<ApiTag, NodeIndex>,
    transforms: Vec<Arc<dyn Transform>>,
}

impl TransformGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transforms(transforms: impl IntoIterator<Item = Arc<dyn Transform>>) -> Self {
        let mut graph = Self::new();
        for transform in transforms {
            graph.register(transform);
        }
        graph
    }

    fn node(&mut self, tag: ApiTag) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&tag) {
            return idx;
        }
        let idx = self.topology.add_node(tag);
        self.nodes.insert(tag, idx);
        idx
    }

    /// Register a transform; returns its index in the arena.
    pub fn register(&mut self, transform: Arc<dyn Transform>) -> usize {
        let from = self.node(transform.input_api());
        let to = self.node(transform.output_api());
        let index = self.transforms.len();
        self.topology.add_edge(from, to, index);
        tracing::debug!(
            "registered transform #{} {} -> {}",
            index,
            transform.input_api(),
            transform.output_api()
        );
        self.transforms.push(transform);
        index
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn transform(&self, index: usize) -> Option<&Arc<dyn Transform>> {
        self.transforms.get(index)
    }

    /// Shortest chain of transforms converting `from` into `to`.
    ///
    /// Equal tags yield the empty path. Among equally short chains, the one
    /// using earlier-registered transforms at each hop wins.
    pub fn path(&self, from: ApiTag, to: ApiTag) -> Option<TransformPath> {
        if from == to {
            return Some(TransformPath::default());
        }
        let start = *self.nodes.get(&from)?;
        let goal = *self.nodes.get(&to)?;

        // node -> (predecessor, transform index)
        let mut came_from: HashMap<NodeIndex, (NodeIndex, usize)> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let mut edges: Vec<(usize, NodeIndex)> = self
                .topology
                .edges_directed(current, Direction::Outgoing)
                .map(|e| (*e.weight(), e.target()))
                .collect();
            edges.sort_unstable_by_key(|(index, _)| *index);

            for (index, next) in edges {
                if next == start || came_from.contains_key(&next) {
                    continue;
                }
                came_from.insert(next, (current, index));
                if next == goal {
                    return Some(Self::unwind(&came_from, start, goal));
                }
                queue.push_back(next);
            }
        }
        None
    }

    fn unwind(
        came_from: &HashMap<NodeIndex, (NodeIndex, usize)>,
        start: NodeIndex,
        goal: NodeIndex,
    ) -> TransformPath {
        let mut steps = Vec::new();
        let mut cursor = goal;
        while cursor != start {
            match came_from.get(&cursor) {
                Some(&(prev, index)) => {
                    steps.push(index);
                    cursor = prev;
                }
                None => break,
            }
        }
        steps.reverse();
        TransformPath { steps }
    }

    fn chain(&self, path: &TransformPath) -> Vec<Arc<dyn Transform>> {
        path.steps
            .iter()
            .filter_map(|&i| self.transforms.get(i).cloned())
            .collect()
    }

    /// Pick the reader serving `asset_type` in `api`.
    ///
    /// A reader already bound to `api` wins outright. Otherwise the shortest
    /// conversion wins, ties going to the earlier candidate.
    pub fn resolve_reader(
        &self,
        candidates: &[Arc<dyn Reader>],
        asset_type: &AssetType,
        api: ApiTag,
    ) -> Option<AdaptedReader> {
        let eligible: Vec<&Arc<dyn Reader>> = candidates
            .iter()
            .filter(|r| ordered(asset_type, &r.bound_type()))
            .collect();

        if let Some(direct) = eligible.iter().find(|r| r.bound_api() == api) {
            return Some(AdaptedReader::direct(Arc::clone(*direct)));
        }

        let (reader, path) = shortest(&eligible, |r| self.path(r.bound_api(), api))?;
        Some(AdaptedReader::new(Arc::clone(reader), self.chain(&path), api))
    }

    /// Pick the writer publishing `asset_type` from content in `api`.
    ///
    /// Same policy as [`resolve_reader`](Self::resolve_reader), searching
    /// from `api` towards each writer's bound API.
    pub fn resolve_writer(
        &self,
        candidates: &[Arc<dyn Writer>],
        asset_type: &AssetType,
        api: ApiTag,
    ) -> Option<AdaptedWriter> {
        let eligible: Vec<&Arc<dyn Writer>> = candidates
            .iter()
            .filter(|w| ordered(asset_type, &w.bound_type()))
            .collect();

        if let Some(direct) = eligible.iter().find(|w| w.bound_api() == api) {
            return Some(AdaptedWriter::direct(Arc::clone(*direct)));
        }

        let (writer, path) = shortest(&eligible, |w| self.path(api, w.bound_api()))?;
        Some(AdaptedWriter::new(Arc::clone(writer), self.chain(&path), api))
    }
}

fn shortest<'a, A: ?Sized>(
    eligible: &[&'a Arc<A>],
    path: impl Fn(&Arc<A>) -> Option<TransformPath>,
) -> Option<(&'a Arc<A>, TransformPath)> {
    let mut best: Option<(&'a Arc<A>, TransformPath)> = None;
    for &candidate in eligible {
        let Some(found) = path(candidate) else {
            continue;
        };
        match &best {
            Some((_, current)) if current.len() <= found.len() => {}
            _ => best = Some((candidate, found)),
        }
    }
    best
}
