//! # Document Handle
//!
//! In-memory block tree. A `Document` owns its blocks exclusively: every
//! block has at most one parent, and all writes go through [`Mutation`]
//! so they are validated against the schema first.
//!
//! ## Lifecycle
//!
//! ```text
//! with_root / from_snapshot → apply(Mutation)* → snapshot
//! ```

use crate::snapshot::{block_to_snapshot, BlockSnapshot};
use crate::{
    Block, BlockId, DocId, DocumentTree, Flavour, Mutation, NewBlock, Props, StoreError,
    StoreResult, TreeRead,
};
use std::collections::HashMap;

/// Editable block document
#[derive(Debug, Clone)]
pub struct Document {
    id: DocId,

    /// Current version number (increments on each mutation)
    pub version: u64,

    pub(crate) root: Option<BlockId>,
    pub(crate) blocks: HashMap<BlockId, Block>,
}

impl Document {
    /// Create an empty document (no root yet)
    pub fn new(id: impl Into<DocId>) -> Self {
        Self {
            id: id.into(),
            version: 0,
            root: None,
            blocks: HashMap::new(),
        }
    }

    /// Create a document with a root block
    pub fn with_root(id: impl Into<DocId>, root: NewBlock) -> StoreResult<Self> {
        let mut doc = Self::new(id);
        doc.set_root(root)?;
        Ok(doc)
    }

    /// Build a whole document from a snapshot of its root
    pub fn from_snapshot(id: impl Into<DocId>, root: &BlockSnapshot) -> StoreResult<Self> {
        let mut doc = Self::with_root(id, root.to_new_block())?;

        for (index, child) in root.children.iter().enumerate() {
            doc.insert_snapshot(child, &root.id, index)?;
        }

        Ok(doc)
    }

    fn insert_snapshot(
        &mut self,
        snapshot: &BlockSnapshot,
        parent: &BlockId,
        index: usize,
    ) -> StoreResult<()> {
        self.apply(Mutation::InsertBlock {
            parent_id: parent.clone(),
            index,
            block: snapshot.to_new_block(),
        })?;

        for (child_index, child) in snapshot.children.iter().enumerate() {
            self.insert_snapshot(child, &snapshot.id, child_index)?;
        }

        Ok(())
    }

    /// Install the root block of an empty document
    pub fn set_root(&mut self, root: NewBlock) -> StoreResult<()> {
        if self.root.is_some() {
            return Err(StoreError::RootExists);
        }

        self.blocks.insert(
            root.id.clone(),
            Block {
                id: root.id.clone(),
                role: root.flavour.default_role(),
                flavour: root.flavour,
                canvas_resident: false,
                props: root.props,
                children: Vec::new(),
                parent: None,
            },
        );
        self.root = Some(root.id);
        Ok(())
    }

    /// Apply a mutation
    pub fn apply(&mut self, mutation: Mutation) -> StoreResult<()> {
        self.version += 1;
        mutation.apply(self)
    }

    /// Snapshot of the whole tree
    pub fn snapshot(&self) -> Option<BlockSnapshot> {
        block_to_snapshot(self, self.root.as_ref()?)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Ids of all blocks with the given flavour, in document order
    pub fn blocks_of(&self, flavour: &Flavour) -> Vec<BlockId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.blocks.get(id).map(|b| &b.flavour == flavour).unwrap_or(false))
            .collect()
    }
}

impl TreeRead for Document {
    fn doc_id(&self) -> &DocId {
        &self.id
    }

    fn root_id(&self) -> Option<&BlockId> {
        self.root.as_ref()
    }

    fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }
}

impl DocumentTree for Document {
    async fn insert_block(
        &mut self,
        block: NewBlock,
        parent: &BlockId,
        index: usize,
    ) -> StoreResult<BlockId> {
        let id = block.id.clone();
        self.apply(Mutation::InsertBlock {
            parent_id: parent.clone(),
            index,
            block,
        })?;
        Ok(id)
    }

    async fn delete_block(&mut self, id: &BlockId) -> StoreResult<()> {
        self.apply(Mutation::DeleteBlock {
            block_id: id.clone(),
        })
    }

    async fn update_props(&mut self, id: &BlockId, props: Props) -> StoreResult<()> {
        self.apply(Mutation::UpdateProps {
            block_id: id.clone(),
            props,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        let root: BlockSnapshot = serde_json::from_value(json!({
            "id": "root",
            "flavour": "page",
            "children": [
                {
                    "id": "note",
                    "flavour": "note",
                    "children": [
                        { "id": "a", "flavour": "paragraph" },
                        { "id": "b", "flavour": "list", "children": [
                            { "id": "b1", "flavour": "paragraph" }
                        ]}
                    ]
                },
                { "id": "surface", "flavour": "surface", "children": [
                    { "id": "img", "flavour": "image" }
                ]}
            ]
        }))
        .unwrap();
        Document::from_snapshot("doc", &root).unwrap()
    }

    #[test]
    fn test_create_from_snapshot() {
        let doc = sample();
        assert_eq!(doc.len(), 7);
        assert_eq!(doc.root_id(), Some(&BlockId::from("root")));
        assert_eq!(doc.children_of(&BlockId::from("note")).len(), 2);
        assert_eq!(doc.index_of(&BlockId::from("b")), Some(1));
        assert_eq!(doc.depth_of(&BlockId::from("b1")), 3);
        assert!(doc.is_ancestor(&BlockId::from("note"), &BlockId::from("b1")));
        assert!(!doc.is_ancestor(&BlockId::from("b1"), &BlockId::from("note")));
    }

    #[test]
    fn test_preorder_and_surface_lookup() {
        let doc = sample();
        let order: Vec<String> = doc.preorder().iter().map(|id| id.to_string()).collect();
        assert_eq!(order, vec!["root", "note", "a", "b", "b1", "surface", "img"]);
        assert_eq!(doc.surface_id(), Some(&BlockId::from("surface")));
    }

    #[test]
    fn test_roles_and_canvas_residency() {
        let doc = sample();
        let surface = doc.block(&BlockId::from("surface")).unwrap();
        assert_eq!(surface.role, crate::Role::Hub);
        assert!(doc.block(&BlockId::from("img")).unwrap().canvas_resident);
        assert!(!doc.block(&BlockId::from("a")).unwrap().canvas_resident);
    }

    #[test]
    fn test_delete_removes_subtree() {
        let mut doc = sample();
        doc.apply(Mutation::DeleteBlock {
            block_id: BlockId::from("b"),
        })
        .unwrap();

        assert!(!doc.has_block(&BlockId::from("b")));
        assert!(!doc.has_block(&BlockId::from("b1")));
        assert_eq!(doc.children_of(&BlockId::from("note")), &[BlockId::from("a")]);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut doc = sample();
        let result = doc.apply(Mutation::InsertBlock {
            parent_id: BlockId::from("note"),
            index: 0,
            block: NewBlock::new("a", Flavour::Paragraph),
        });
        assert_eq!(result, Err(StoreError::DuplicateBlock(BlockId::from("a"))));
    }

    #[test]
    fn test_document_version_increments() {
        let mut doc = sample();
        let version = doc.version;

        // Fails validation but still counts as an attempted write
        let _ = doc.apply(Mutation::DeleteBlock {
            block_id: BlockId::from("missing"),
        });
        assert_eq!(doc.version, version + 1);
    }

    #[tokio::test]
    async fn test_async_primitives() {
        let mut doc = sample();
        let id = doc
            .insert_block(NewBlock::new("c", Flavour::Paragraph), &BlockId::from("note"), 99)
            .await
            .unwrap();
        assert_eq!(doc.index_of(&id), Some(2));

        let mut props = Props::new();
        props.insert("text".into(), json!("hello"));
        doc.update_props(&id, props).await.unwrap();
        assert_eq!(doc.block(&id).unwrap().prop_str("text"), Some("hello"));

        doc.delete_block(&id).await.unwrap();
        assert!(!doc.has_block(&id));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let doc = sample();
        let snapshot = doc.snapshot().unwrap();
        let rebuilt = Document::from_snapshot("copy", &snapshot).unwrap();
        assert_eq!(rebuilt.snapshot().unwrap(), snapshot);
    }
}
