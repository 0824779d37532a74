//! Block id generation

use crate::BlockId;
use std::cell::Cell;

/// Source of fresh block ids
pub trait IdGenerator: std::fmt::Debug {
    fn next_id(&self) -> BlockId;
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> BlockId {
        BlockId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic `<prefix>-<n>` ids, handy for reproducible output
#[derive(Debug)]
pub struct SequentialGenerator {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(0),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_id(&self) -> BlockId {
        let n = self.next.get();
        self.next.set(n + 1);
        BlockId::new(format!("{}-{}", self.prefix, n))
    }
}
