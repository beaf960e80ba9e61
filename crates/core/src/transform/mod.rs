pub mod adapted;
pub mod graph;

pub use adapted::{AdaptedReader, AdaptedWriter};
pub use graph::{TransformGraph, TransformPath};

/// Capability extensions registered with a virtual repository.
///
/// Currently the format conversions; resolution goes through [`Extensions::transforms`].
#[derive(Default)]
pub struct Extensions {
    transforms: TransformGraph,
}

impl Extensions {
    pub fn new(transforms: TransformGraph) -> Self {
        Self { transforms }
    }

    pub fn transforms(&self) -> &TransformGraph {
        &self.transforms
    }

    pub fn shutdown(&self) {
        tracing::debug!(
            "releasing {} registered transforms",
            self.transforms.len()
        );
    }
}
