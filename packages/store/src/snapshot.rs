//! # Snapshots
//!
//! Portable, document-independent serialization of block subtrees.
//!
//! ```text
//! Snapshot      = { content: [BlockSnapshot] }
//! BlockSnapshot = { id, flavour, props, children: [BlockSnapshot] }
//! ```
//!
//! Content order always matches the source sibling order. The
//! [`SnapshotVisitor`] / [`SnapshotVisitorMut`] traits walk a snapshot the
//! same way for every consumer (id extraction, id rewriting, flavour
//! conversion).

use crate::{BlockId, Flavour, NewBlock, Props, TreeRead};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub content: Vec<BlockSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub flavour: Flavour,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub children: Vec<BlockSnapshot>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn first(&self) -> Option<&BlockSnapshot> {
        self.content.first()
    }

    /// Every id in the snapshot, in pre-order
    pub fn ids(&self) -> Vec<BlockId> {
        let mut collector = IdCollector::default();
        collector.visit_snapshot(self);
        collector.ids
    }

    /// Ids of the top-level blocks only
    pub fn top_level_ids(&self) -> Vec<BlockId> {
        self.content.iter().map(|b| b.id.clone()).collect()
    }
}

impl BlockSnapshot {
    /// The node itself, without children, ready for insertion
    pub fn to_new_block(&self) -> NewBlock {
        NewBlock::new(self.id.clone(), self.flavour.clone()).with_props(self.props.clone())
    }

    /// Same flavours, props and child structure, ignoring ids
    pub fn is_isomorphic(&self, other: &BlockSnapshot) -> bool {
        self.flavour == other.flavour
            && self.props == other.props
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.is_isomorphic(b))
    }
}

/// Serialize one block and its subtree
pub fn block_to_snapshot(tree: &dyn TreeRead, id: &BlockId) -> Option<BlockSnapshot> {
    let block = tree.block(id)?;
    Some(BlockSnapshot {
        id: block.id.clone(),
        flavour: block.flavour.clone(),
        props: block.props.clone(),
        children: block
            .children
            .iter()
            .filter_map(|child| block_to_snapshot(tree, child))
            .collect(),
    })
}

/// Serialize a slice of top-level blocks, keeping the given order
///
/// Ids that do not resolve are skipped.
pub fn slice_to_snapshot(tree: &dyn TreeRead, ids: &[BlockId]) -> Snapshot {
    Snapshot {
        content: ids
            .iter()
            .filter_map(|id| block_to_snapshot(tree, id))
            .collect(),
    }
}

/// Visitor for walking snapshots immutably
///
/// Default implementations walk the entire tree; override `visit_block`
/// to act on each node.
pub trait SnapshotVisitor: Sized {
    fn visit_snapshot(&mut self, snapshot: &Snapshot) {
        walk_snapshot(self, snapshot);
    }

    fn visit_block(&mut self, block: &BlockSnapshot) {
        walk_block(self, block);
    }
}

/// Visitor for rewriting snapshots in place
pub trait SnapshotVisitorMut: Sized {
    fn visit_snapshot_mut(&mut self, snapshot: &mut Snapshot) {
        walk_snapshot_mut(self, snapshot);
    }

    fn visit_block_mut(&mut self, block: &mut BlockSnapshot) {
        walk_block_mut(self, block);
    }
}

pub fn walk_snapshot<V: SnapshotVisitor>(visitor: &mut V, snapshot: &Snapshot) {
    for block in &snapshot.content {
        visitor.visit_block(block);
    }
}

pub fn walk_block<V: SnapshotVisitor>(visitor: &mut V, block: &BlockSnapshot) {
    for child in &block.children {
        visitor.visit_block(child);
    }
}

pub fn walk_snapshot_mut<V: SnapshotVisitorMut>(visitor: &mut V, snapshot: &mut Snapshot) {
    for block in &mut snapshot.content {
        visitor.visit_block_mut(block);
    }
}

pub fn walk_block_mut<V: SnapshotVisitorMut>(visitor: &mut V, block: &mut BlockSnapshot) {
    for child in &mut block.children {
        visitor.visit_block_mut(child);
    }
}

#[derive(Default)]
struct IdCollector {
    ids: Vec<BlockId>,
}

impl SnapshotVisitor for IdCollector {
    fn visit_block(&mut self, block: &BlockSnapshot) {
        self.ids.push(block.id.clone());
        walk_block(self, block);
    }
}
