pub mod asset_type;
pub mod properties;

pub use asset_type::*;
pub use properties::*;
