//! Error types for the drag engine

use folio_store::{BlockId, StoreError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DragError {
    #[error("Invalid drop target: {0}")]
    InvalidTarget(String),

    #[error("Nothing to drag")]
    EmptySnapshot,

    #[error("Block cannot be dragged: {0}")]
    NotDraggable(BlockId),

    #[error("Materialization failed: {0}")]
    Materialization(#[from] StoreError),

    #[error("A drag is already in progress")]
    AlreadyDragging,

    #[error("No drag in progress")]
    NotDragging,
}

impl DragError {
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        DragError::InvalidTarget(reason.into())
    }
}

/// Result type for drag operations
pub type DragResult<T> = Result<T, DragError>;
