//! Closure-backed implementations of the collaborator traits.
//!
//! These let plugins declare typed capabilities without hand-writing the
//! `Content` plumbing: the bound API is the closure's value type.

use crate::accessor::{Accessor, Browser, Reader, Transform, Writer};
use crate::asset::Asset;
use std::any::Any;
use std::marker::PhantomData;
use vrepo_api::{ApiTag, AssetType, BoxError, Content};

fn mismatch(expected: ApiTag, actual: &Content) -> BoxError {
    format!("expected content of api {expected}, got {}", actual.tag()).into()
}

pub struct FnBrowser<F> {
    discover: F,
}

impl<F> FnBrowser<F>
where
    F: Fn(&[AssetType]) -> Result<Vec<Asset>, BoxError> + Send + Sync,
{
    pub fn new(discover: F) -> Self {
        Self { discover }
    }
}

impl<F> Browser for FnBrowser<F>
where
    F: Fn(&[AssetType]) -> Result<Vec<Asset>, BoxError> + Send + Sync,
{
    fn discover(&self, types: &[AssetType]) -> Result<Vec<Asset>, BoxError> {
        (self.discover)(types)
    }
}

/// A reader bound to `asset_type` whose API is `A`.
pub struct FnReader<A, F> {
    asset_type: AssetType,
    retrieve: F,
    _api: PhantomData<fn() -> A>,
}

impl<A, F> FnReader<A, F>
where
    A: Any + Send,
    F: Fn(&Asset) -> Result<A, BoxError> + Send + Sync,
{
    pub fn new(asset_type: AssetType, retrieve: F) -> Self {
        Self {
            asset_type,
            retrieve,
            _api: PhantomData,
        }
    }
}

impl<A, F> Accessor for FnReader<A, F>
where
    A: Any + Send,
    F: Fn(&Asset) -> Result<A, BoxError> + Send + Sync,
{
    fn bound_type(&self) -> AssetType {
        self.asset_type.clone()
    }

    fn bound_api(&self) -> ApiTag {
        ApiTag::of::<A>()
    }
}

impl<A, F> Reader for FnReader<A, F>
where
    A: Any + Send,
    F: Fn(&Asset) -> Result<A, BoxError> + Send + Sync,
{
    fn retrieve(&self, asset: &Asset) -> Result<Content, BoxError> {
        (self.retrieve)(asset).map(Content::new)
    }
}

/// A writer bound to `asset_type` whose API is `A`.
pub struct FnWriter<A, F> {
    asset_type: AssetType,
    publish: F,
    _api: PhantomData<fn(A)>,
}

impl<A, F> FnWriter<A, F>
where
    A: Any + Send,
    F: Fn(&Asset, A) -> Result<(), BoxError> + Send + Sync,
{
    pub fn new(asset_type: AssetType, publish: F) -> Self {
        Self {
            asset_type,
            publish,
            _api: PhantomData,
        }
    }
}

impl<A, F> Accessor for FnWriter<A, F>
where
    A: Any + Send,
    F: Fn(&Asset, A) -> Result<(), BoxError> + Send + Sync,
{
    fn bound_type(&self) -> AssetType {
        self.asset_type.clone()
    }

    fn bound_api(&self) -> ApiTag {
        ApiTag::of::<A>()
    }
}

impl<A, F> Writer for FnWriter<A, F>
where
    A: Any + Send,
    F: Fn(&Asset, A) -> Result<(), BoxError> + Send + Sync,
{
    fn publish(&self, asset: &Asset, content: Content) -> Result<(), BoxError> {
        let value = content
            .downcast::<A>()
            .map_err(|c| mismatch(ApiTag::of::<A>(), &c))?;
        (self.publish)(asset, value)
    }
}

/// A transform from `I` to `O`.
pub struct FnTransform<I, O, F> {
    apply: F,
    _api: PhantomData<fn(I) -> O>,
}

impl<I, O, F> FnTransform<I, O, F>
where
    I: Any + Send,
    O: Any + Send,
    F: Fn(I) -> Result<O, BoxError> + Send + Sync,
{
    pub fn new(apply: F) -> Self {
        Self {
            apply,
            _api: PhantomData,
        }
    }
}

impl<I, O, F> Transform for FnTransform<I, O, F>
where
    I: Any + Send,
    O: Any + Send,
    F: Fn(I) -> Result<O, BoxError> + Send + Sync,
{
    fn input_api(&self) -> ApiTag {
        ApiTag::of::<I>()
    }

    fn output_api(&self) -> ApiTag {
        ApiTag::of::<O>()
    }

    fn apply(&self, value: Content) -> Result<Content, BoxError> {
        let input = value
            .downcast::<I>()
            .map_err(|c| mismatch(ApiTag::of::<I>(), &c))?;
        (self.apply)(input).map(Content::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_transform_checks_input_api() {
        let length = FnTransform::new(|s: String| Ok(s.len()));
        assert_eq!(length.input_api(), ApiTag::of::<String>());
        assert_eq!(length.output_api(), ApiTag::of::<usize>());

        let out = length.apply(Content::new("abcd".to_string())).unwrap();
        assert_eq!(out.downcast::<usize>().unwrap(), 4);

        let err = length.apply(Content::new(7u8)).unwrap_err();
        assert!(err.to_string().contains("expected content of api alloc::string::String"));
    }

    #[test]
    fn test_fn_writer_receives_typed_value() {
        let table = AssetType::new("table");
        let writer = FnWriter::new(table.clone(), |asset: &Asset, rows: Vec<String>| {
            if rows.is_empty() {
                return Err(format!("nothing to publish for {}", asset.id()).into());
            }
            Ok(())
        });
        let asset = Asset::new(table, "t-1", "catches");

        assert!(writer.publish(&asset, Content::new(vec!["a".to_string()])).is_ok());
        let err = writer.publish(&asset, Content::new(Vec::<String>::new())).unwrap_err();
        assert_eq!(err.to_string(), "nothing to publish for t-1");
    }
}
