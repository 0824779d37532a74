//! # Tree Mutations
//!
//! Primitive operations on an in-memory [`Document`].
//!
//! ## Mutation Semantics
//!
//! ### InsertBlock
//! - Parent must exist and accept the child's flavour (see [`crate::schema`])
//! - Fails on duplicate ids: a block never has two parents
//! - Index past the end appends
//!
//! ### DeleteBlock
//! - Removes the block and all descendants
//! - The root cannot be deleted
//!
//! ### UpdateProps
//! - Keys are merged into the existing props (last write wins per key)
//! - A `null` value removes the key

use crate::document::Document;
use crate::schema::can_contain;
use crate::{Block, BlockId, Flavour, NewBlock, Props, StoreError, StoreResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a new leaf block under a parent at index
    InsertBlock {
        parent_id: BlockId,
        index: usize,
        block: NewBlock,
    },

    /// Remove a block and its subtree
    DeleteBlock { block_id: BlockId },

    /// Merge properties into a block
    UpdateProps { block_id: BlockId, props: Props },
}

impl Mutation {
    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut Document) -> StoreResult<()> {
        self.validate(doc)?;

        match self {
            Mutation::InsertBlock {
                parent_id,
                index,
                block,
            } => Self::apply_insert(doc, parent_id, *index, block),

            Mutation::DeleteBlock { block_id } => Self::apply_delete(doc, block_id),

            Mutation::UpdateProps { block_id, props } => {
                Self::apply_update_props(doc, block_id, props)
            }
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> StoreResult<()> {
        match self {
            Mutation::InsertBlock {
                parent_id, block, ..
            } => {
                let parent = doc
                    .blocks
                    .get(parent_id)
                    .ok_or_else(|| StoreError::ParentNotFound(parent_id.clone()))?;

                if doc.blocks.contains_key(&block.id) {
                    return Err(StoreError::DuplicateBlock(block.id.clone()));
                }

                if !can_contain(&parent.flavour, &block.flavour) {
                    return Err(StoreError::SchemaViolation {
                        parent: parent.flavour.clone(),
                        child: block.flavour.clone(),
                    });
                }

                Ok(())
            }

            Mutation::DeleteBlock { block_id } => {
                if !doc.blocks.contains_key(block_id) {
                    return Err(StoreError::BlockNotFound(block_id.clone()));
                }
                if doc.root.as_ref() == Some(block_id) {
                    return Err(StoreError::CannotDeleteRoot);
                }
                Ok(())
            }

            Mutation::UpdateProps { block_id, .. } => {
                if !doc.blocks.contains_key(block_id) {
                    return Err(StoreError::BlockNotFound(block_id.clone()));
                }
                Ok(())
            }
        }
    }

    fn apply_insert(
        doc: &mut Document,
        parent_id: &BlockId,
        index: usize,
        new_block: &NewBlock,
    ) -> StoreResult<()> {
        let parent = doc
            .blocks
            .get_mut(parent_id)
            .ok_or_else(|| StoreError::ParentNotFound(parent_id.clone()))?;

        let canvas_resident = parent.flavour == Flavour::Surface
            || (new_block.flavour == Flavour::Note && new_block.props.contains_key("xywh"));

        let insert_index = index.min(parent.children.len());
        parent.children.insert(insert_index, new_block.id.clone());

        doc.blocks.insert(
            new_block.id.clone(),
            Block {
                id: new_block.id.clone(),
                flavour: new_block.flavour.clone(),
                role: new_block.flavour.default_role(),
                canvas_resident,
                props: new_block.props.clone(),
                children: Vec::new(),
                parent: Some(parent_id.clone()),
            },
        );

        Ok(())
    }

    fn apply_delete(doc: &mut Document, block_id: &BlockId) -> StoreResult<()> {
        let parent_id = doc
            .blocks
            .get(block_id)
            .and_then(|b| b.parent.clone())
            .ok_or(StoreError::CannotDeleteRoot)?;

        if let Some(parent) = doc.blocks.get_mut(&parent_id) {
            parent.children.retain(|c| c != block_id);
        }

        let mut pending = vec![block_id.clone()];
        while let Some(id) = pending.pop() {
            if let Some(removed) = doc.blocks.remove(&id) {
                pending.extend(removed.children);
            }
        }

        Ok(())
    }

    fn apply_update_props(doc: &mut Document, block_id: &BlockId, props: &Props) -> StoreResult<()> {
        let block = doc
            .blocks
            .get_mut(block_id)
            .ok_or_else(|| StoreError::BlockNotFound(block_id.clone()))?;

        for (key, value) in props {
            if value.is_null() {
                block.props.shift_remove(key);
            } else {
                block.props.insert(key.clone(), value.clone());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::DeleteBlock {
            block_id: BlockId::from("p-1"),
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_null_prop_removes_key() {
        use crate::TreeRead;

        let mut doc = Document::with_root("doc", NewBlock::new("root", Flavour::Page)).unwrap();
        let root = BlockId::from("root");

        let mut props = Props::new();
        props.insert("title".to_string(), serde_json::json!("Folio"));
        props.insert("order".to_string(), serde_json::json!(2));
        doc.apply(Mutation::UpdateProps { block_id: root.clone(), props }).unwrap();

        let mut props = Props::new();
        props.insert("order".to_string(), serde_json::Value::Null);
        doc.apply(Mutation::UpdateProps { block_id: root.clone(), props }).unwrap();

        let block = doc.block(&root).unwrap();
        assert_eq!(block.props.get("title"), Some(&serde_json::json!("Folio")));
        assert!(!block.props.contains_key("order"));
    }

    #[test]
    fn test_validation_rejects_unknown_ids() {
        let doc = Document::with_root("doc", NewBlock::new("root", Flavour::Page)).unwrap();

        let mutation = Mutation::UpdateProps {
            block_id: BlockId::from("missing"),
            props: Props::new(),
        };

        assert_eq!(
            mutation.validate(&doc),
            Err(StoreError::BlockNotFound(BlockId::from("missing")))
        );
    }

    #[test]
    fn test_validation_rejects_schema_violations() {
        let doc = Document::with_root("doc", NewBlock::new("root", Flavour::Page)).unwrap();

        let mutation = Mutation::InsertBlock {
            parent_id: BlockId::from("root"),
            index: 0,
            block: NewBlock::new("p", Flavour::Paragraph),
        };

        assert!(matches!(
            mutation.validate(&doc),
            Err(StoreError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_root_cannot_be_deleted() {
        let doc = Document::with_root("doc", NewBlock::new("root", Flavour::Page)).unwrap();

        let mutation = Mutation::DeleteBlock {
            block_id: BlockId::from("root"),
        };

        assert_eq!(mutation.validate(&doc), Err(StoreError::CannotDeleteRoot));
    }
}
