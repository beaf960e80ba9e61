use thiserror::Error;
use vrepo_api::VrError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Repository(#[from] VrError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
