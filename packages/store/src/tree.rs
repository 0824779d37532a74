//! # Document Tree Interface
//!
//! The drag engine talks to documents through two traits:
//!
//! - [`TreeRead`]: synchronous queries (lookup, parent, children, index).
//!   Object safe, so middleware and geometry code can take `&dyn TreeRead`.
//! - [`DocumentTree`]: the fallible, asynchronous write primitives
//!   (insert-child-at-index, delete-block, update-block-properties).
//!
//! [`crate::Document`] is the in-memory implementation; hosts backed by a
//! real store implement the same traits.

use crate::{Block, BlockId, DocId, Flavour, Props, StoreResult};
use serde::{Deserialize, Serialize};

/// A block about to be inserted (role and residency are derived on insert)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlock {
    pub id: BlockId,
    pub flavour: Flavour,
    #[serde(default)]
    pub props: Props,
}

impl NewBlock {
    pub fn new(id: impl Into<BlockId>, flavour: Flavour) -> Self {
        Self {
            id: id.into(),
            flavour,
            props: Props::new(),
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

/// Read-only queries over a document tree
pub trait TreeRead {
    fn doc_id(&self) -> &DocId;

    fn root_id(&self) -> Option<&BlockId>;

    fn block(&self, id: &BlockId) -> Option<&Block>;

    fn has_block(&self, id: &BlockId) -> bool {
        self.block(id).is_some()
    }

    fn parent_of(&self, id: &BlockId) -> Option<&Block> {
        let parent_id = self.block(id)?.parent.as_ref()?;
        self.block(parent_id)
    }

    fn children_of(&self, id: &BlockId) -> &[BlockId] {
        self.block(id)
            .map(|b| b.children.as_slice())
            .unwrap_or(&[])
    }

    /// Position of a block among its siblings
    fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.parent_of(id)?.children.iter().position(|c| c == id)
    }

    /// Number of ancestors between the block and the root
    fn depth_of(&self, id: &BlockId) -> usize {
        let mut depth = 0;
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent_of(&parent.id);
        }
        depth
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    fn is_ancestor(&self, ancestor: &BlockId, id: &BlockId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if &parent.id == ancestor {
                return true;
            }
            current = self.parent_of(&parent.id);
        }
        false
    }

    /// All block ids in document (pre-)order
    fn preorder(&self) -> Vec<BlockId> {
        let mut order = Vec::new();
        let mut stack: Vec<&BlockId> = self.root_id().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id.clone());
            stack.extend(self.children_of(id).iter().rev());
        }
        order
    }

    /// The canvas surface of this document, if it has one
    fn surface_id(&self) -> Option<&BlockId> {
        let root = self.root_id()?;
        self.children_of(root)
            .iter()
            .find(|id| self.block(id).map(|b| b.flavour == Flavour::Surface).unwrap_or(false))
    }
}

/// Fallible write primitives of a document tree
///
/// Writes may be served by an asynchronous backend and may fail; callers
/// treat each call as a black box.
#[allow(async_fn_in_trait)]
pub trait DocumentTree: TreeRead {
    /// Insert `block` as a child of `parent` at `index` (clamped to the end)
    async fn insert_block(
        &mut self,
        block: NewBlock,
        parent: &BlockId,
        index: usize,
    ) -> StoreResult<BlockId>;

    /// Delete a block and its whole subtree
    async fn delete_block(&mut self, id: &BlockId) -> StoreResult<()>;

    /// Merge `props` into the block's properties; a `null` value removes the key
    async fn update_props(&mut self, id: &BlockId, props: Props) -> StoreResult<()>;
}
