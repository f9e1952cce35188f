use thiserror::Error;

/// Failures raised by the external collaborators (byte sources, clipboard)
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}
