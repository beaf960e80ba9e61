//! Accessors composed with a chain of transforms.
//!
//! Composition is lazy: nothing runs until `retrieve`/`publish` is invoked.
//! A failing step aborts the chain and its error is returned unchanged.

use std::sync::Arc;
use vrepo_api::{ApiTag, AssetType, BoxError, Content};
use vrepo_plugin::{Accessor, Asset, Reader, Transform, Writer};

fn apply_chain(chain: &[Arc<dyn Transform>], mut value: Content) -> Result<Content, BoxError> {
    for step in chain {
        value = step.apply(value)?;
    }
    Ok(value)
}

/// A reader followed by the transforms converting its output to the requested API.
#[derive(Clone)]
pub struct AdaptedReader {
    inner: Arc<dyn Reader>,
    chain: Vec<Arc<dyn Transform>>,
    api: ApiTag,
}

impl AdaptedReader {
    pub fn direct(inner: Arc<dyn Reader>) -> Self {
        let api = inner.bound_api();
        Self {
            inner,
            chain: Vec::new(),
            api,
        }
    }

    pub fn new(inner: Arc<dyn Reader>, chain: Vec<Arc<dyn Transform>>, api: ApiTag) -> Self {
        Self { inner, chain, api }
    }

    /// `true` when no transform sits between the reader and the caller.
    pub fn is_direct(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn hops(&self) -> usize {
        self.chain.len()
    }

    pub fn inner(&self) -> &Arc<dyn Reader> {
        &self.inner
    }
}

impl Accessor for AdaptedReader {
    fn bound_type(&self) -> AssetType {
        self.inner.bound_type()
    }

    fn bound_api(&self) -> ApiTag {
        self.api
    }
}

impl Reader for AdaptedReader {
    fn retrieve(&self, asset: &Asset) -> Result<Content, BoxError> {
        let raw = self.inner.retrieve(asset)?;
        apply_chain(&self.chain, raw)
    }
}

/// Transforms converting published content to a writer's API, followed by the writer.
#[derive(Clone)]
pub struct AdaptedWriter {
    inner: Arc<dyn Writer>,
    chain: Vec<Arc<dyn Transform>>,
    api: ApiTag,
}

impl AdaptedWriter {
    pub fn direct(inner: Arc<dyn Writer>) -> Self {
        let api = inner.bound_api();
        Self {
            inner,
            chain: Vec::new(),
            api,
        }
    }

    pub fn new(inner: Arc<dyn Writer>, chain: Vec<Arc<dyn Transform>>, api: ApiTag) -> Self {
        Self { inner, chain, api }
    }

    pub fn is_direct(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn hops(&self) -> usize {
        self.chain.len()
    }

    pub fn inner(&self) -> &Arc<dyn Writer> {
        &self.inner
    }
}

impl Accessor for AdaptedWriter {
    fn bound_type(&self) -> AssetType {
        self.inner.bound_type()
    }

    fn bound_api(&self) -> ApiTag {
        self.api
    }
}

impl Writer for AdaptedWriter {
    fn publish(&self, asset: &Asset, content: Content) -> Result<(), BoxError> {
        let converted = apply_chain(&self.chain, content)?;
        self.inner.publish(asset, converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vrepo_plugin::{FnReader, FnTransform};

    #[test]
    fn test_composition_is_lazy_and_ordered() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);

        let table = AssetType::new("table");
        let reader: Arc<dyn Reader> = Arc::new(FnReader::new(table.clone(), |a: &Asset| {
            Ok(a.name().to_string())
        }));
        let chain: Vec<Arc<dyn Transform>> = vec![
            Arc::new(FnTransform::new(move |s: String| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(s.len())
            })),
            Arc::new(FnTransform::new(|n: usize| Ok(n as u64 * 10))),
        ];

        let adapted = AdaptedReader::new(reader, chain, ApiTag::of::<u64>());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(adapted.bound_api(), ApiTag::of::<u64>());
        assert_eq!(adapted.bound_type(), table);

        let asset = Asset::new(table, "t-1", "catches");
        let out = adapted.retrieve(&asset).unwrap();
        assert_eq!(out.downcast::<u64>().unwrap(), 70);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_step_propagates() {
        let table = AssetType::new("table");
        let reader: Arc<dyn Reader> = Arc::new(FnReader::new(table.clone(), |_| Ok(3u8)));
        let chain: Vec<Arc<dyn Transform>> = vec![Arc::new(FnTransform::new(|_: u8| {
            Err::<String, BoxError>("malformed header".into())
        }))];

        let adapted = AdaptedReader::new(reader, chain, ApiTag::of::<String>());
        let err = adapted
            .retrieve(&Asset::new(table, "t-1", "catches"))
            .unwrap_err();
        assert_eq!(err.to_string(), "malformed header");
    }
}
