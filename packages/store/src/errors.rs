//! Error types for the block store

use crate::{BlockId, Flavour};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Parent not found: {0}")]
    ParentNotFound(BlockId),

    #[error("Block already exists: {0}")]
    DuplicateBlock(BlockId),

    #[error("{child} cannot be a child of {parent}")]
    SchemaViolation { parent: Flavour, child: Flavour },

    #[error("Document already has a root")]
    RootExists,

    #[error("Cannot delete the document root")]
    CannotDeleteRoot,

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
