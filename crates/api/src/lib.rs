pub mod content;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use content::{ApiTag, Content};
pub use error::{BoxError, ErrorKind, Operation, TransferContext, VrError, VrResult};
pub use models::*;
