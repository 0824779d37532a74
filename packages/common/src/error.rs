use thiserror::Error;

/// Errors shared by every folio crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommonError {
    #[error("Malformed bound: {0}")]
    MalformedBound(String),
}
