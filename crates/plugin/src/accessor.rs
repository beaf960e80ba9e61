use crate::asset::Asset;
use vrepo_api::{ApiTag, AssetType, BoxError, Content};

/// Common interface of readers and writers: the asset type they handle and
/// the API their content is exchanged in.
pub trait Accessor: Send + Sync {
    fn bound_type(&self) -> AssetType;

    fn bound_api(&self) -> ApiTag;
}

/// Retrieves the content of assets of the bound type, in the bound API.
pub trait Reader: Accessor {
    fn retrieve(&self, asset: &Asset) -> Result<Content, BoxError>;
}

/// Publishes assets of the bound type, with content in the bound API.
pub trait Writer: Accessor {
    fn publish(&self, asset: &Asset, content: Content) -> Result<(), BoxError>;
}

/// Converts content from one API to another. Not assumed invertible.
pub trait Transform: Send + Sync {
    fn input_api(&self) -> ApiTag;

    fn output_api(&self) -> ApiTag;

    fn apply(&self, value: Content) -> Result<Content, BoxError>;
}

/// Discovery entry point of a base repository.
pub trait Browser: Send + Sync {
    /// Returns the assets of the given types available in the repository.
    ///
    /// Only invoked with types the repository declares a reader for;
    /// implementations serving a single type may ignore `types`. Repeated
    /// calls must report the same logical asset under the same id.
    fn discover(&self, types: &[AssetType]) -> Result<Vec<Asset>, BoxError>;
}
