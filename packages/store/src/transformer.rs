//! # Transformer Job
//!
//! Moves content between trees and snapshots.
//!
//! - `slice_to_snapshot`: serialize top-level blocks of a document
//! - `snapshot_to_slice`: run the middleware pipeline and insert the
//!   snapshot under a parent, all or nothing
//!
//! ## Failure handling
//!
//! If any tree write fails, every top-level block inserted so far is deleted
//! again (taking its partial subtree with it) and property updates already
//! applied by middlewares are reverted. The original error is returned.

use crate::middleware::{ImportContext, MiddlewarePipeline, PropsUpdate};
use crate::snapshot::{slice_to_snapshot, walk_block, SnapshotVisitor};
use crate::{
    BlockId, BlockSnapshot, DocId, DocumentTree, Flavour, IdGenerator, Snapshot, StoreResult,
    TreeRead,
};

#[derive(Debug)]
pub struct Job<'a> {
    pipeline: &'a MiddlewarePipeline,
    id_generator: &'a dyn IdGenerator,
}

impl<'a> Job<'a> {
    pub fn new(pipeline: &'a MiddlewarePipeline, id_generator: &'a dyn IdGenerator) -> Self {
        Self {
            pipeline,
            id_generator,
        }
    }

    pub fn slice_to_snapshot(&self, tree: &dyn TreeRead, ids: &[BlockId]) -> Snapshot {
        slice_to_snapshot(tree, ids)
    }

    /// Insert `snapshot` under `parent` starting at `index`
    ///
    /// Returns the destination ids of the inserted top-level blocks.
    pub async fn snapshot_to_slice<T: DocumentTree>(
        &self,
        mut snapshot: Snapshot,
        source_doc: &DocId,
        dest: &mut T,
        parent: &BlockId,
        index: usize,
    ) -> StoreResult<Vec<BlockId>> {
        let mut ctx = ImportContext::new(
            source_doc.clone(),
            dest.doc_id().clone(),
            self.id_generator,
        );
        let linked_docs = if ctx.is_cross_doc() {
            new_linked_docs(&snapshot, &*dest)
        } else {
            Vec::new()
        };
        self.pipeline.before_import(&mut snapshot, &mut ctx, &*dest);

        let mut inserted = Vec::with_capacity(snapshot.content.len());
        for (offset, block) in snapshot.content.iter().enumerate() {
            if let Err(err) = insert_subtree(dest, block, parent, index + offset, &mut inserted).await
            {
                rollback(dest, &inserted, &[]).await;
                return Err(err);
            }
        }

        let updates = self.pipeline.after_import(&inserted, &ctx, &*dest);
        let mut reverts = Vec::with_capacity(updates.len());
        for update in updates {
            let previous = update.inverse(&*dest);
            if let Err(err) = dest.update_props(&update.block_id, update.props).await {
                rollback(dest, &inserted, &reverts).await;
                return Err(err);
            }
            reverts.push(previous);
        }

        for linked in &linked_docs {
            tracing::info!(
                target: "folio::telemetry",
                event = "linked_doc_created",
                block = %ctx.mapped_id(&linked.id),
                page_id = %linked.page_id,
                doc = %ctx.dest_doc,
                "linked doc created"
            );
        }

        Ok(inserted)
    }
}

/// Depth-first insertion of one block and its descendants
///
/// The block's id is pushed to `inserted` as soon as the block itself is in
/// the tree, so a failure further down still rolls back the partial subtree.
async fn insert_subtree<T: DocumentTree>(
    dest: &mut T,
    block: &BlockSnapshot,
    parent: &BlockId,
    index: usize,
    inserted: &mut Vec<BlockId>,
) -> StoreResult<()> {
    dest.insert_block(block.to_new_block(), parent, index).await?;
    inserted.push(block.id.clone());

    let mut pending: Vec<_> = block
        .children
        .iter()
        .enumerate()
        .rev()
        .map(|(i, child)| (child, block.id.clone(), i))
        .collect();

    while let Some((node, parent, index)) = pending.pop() {
        dest.insert_block(node.to_new_block(), &parent, index).await?;

        for (child_index, child) in node.children.iter().enumerate().rev() {
            pending.push((child, node.id.clone(), child_index));
        }
    }

    Ok(())
}

/// Undo an import: revert property updates, then delete inserted blocks
async fn rollback<T: DocumentTree>(dest: &mut T, inserted: &[BlockId], reverts: &[PropsUpdate]) {
    for revert in reverts.iter().rev() {
        if let Err(err) = dest.update_props(&revert.block_id, revert.props.clone()).await {
            tracing::warn!(block = %revert.block_id, error = %err, "failed to revert props");
        }
    }

    for id in inserted.iter().rev() {
        if let Err(err) = dest.delete_block(id).await {
            tracing::warn!(block = %id, error = %err, "failed to roll back inserted block");
        }
    }
}

/// A linked-doc embed carried by an incoming snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedDoc {
    pub id: BlockId,
    pub page_id: String,
}

struct LinkedDocCollector<'d> {
    dest: &'d dyn TreeRead,
    found: Vec<LinkedDoc>,
}

impl SnapshotVisitor for LinkedDocCollector<'_> {
    fn visit_block(&mut self, block: &BlockSnapshot) {
        let page_id = block.props.get("pageId").and_then(|v| v.as_str());

        if let (true, Some(page_id)) = (block.flavour == Flavour::linked_doc(), page_id) {
            if !self.dest.has_block(&block.id) {
                self.found.push(LinkedDoc {
                    id: block.id.clone(),
                    page_id: page_id.to_string(),
                });
            }
        }
        walk_block(self, block);
    }
}

/// Linked-doc embeds of `snapshot` that `dest` does not hold yet
///
/// Read before the middlewares run, so blocks they convert are not counted.
pub fn new_linked_docs(snapshot: &Snapshot, dest: &dyn TreeRead) -> Vec<LinkedDoc> {
    let mut collector = LinkedDocCollector {
        dest,
        found: Vec::new(),
    };
    collector.visit_snapshot(snapshot);
    collector.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Mutation, NewBlock, SequentialGenerator, StoreError};
    use serde_json::json;

    fn dest() -> Document {
        let root: BlockSnapshot = serde_json::from_value(json!({
            "id": "root",
            "flavour": "page",
            "children": [{ "id": "note", "flavour": "note", "children": [
                { "id": "x", "flavour": "paragraph" }
            ]}]
        }))
        .unwrap();
        Document::from_snapshot("dest", &root).unwrap()
    }

    fn incoming() -> Snapshot {
        serde_json::from_value(json!({
            "content": [
                { "id": "a", "flavour": "list", "children": [
                    { "id": "a1", "flavour": "paragraph" },
                    { "id": "a2", "flavour": "paragraph" }
                ]},
                { "id": "b", "flavour": "paragraph" }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_import_within_document_keeps_ids() {
        let pipeline = MiddlewarePipeline::default();
        let generator = SequentialGenerator::new("n");
        let job = Job::new(&pipeline, &generator);
        let mut doc = dest();

        let ids = job
            .snapshot_to_slice(incoming(), &DocId::from("dest"), &mut doc, &BlockId::from("note"), 0)
            .await
            .unwrap();

        assert_eq!(ids, vec![BlockId::from("a"), BlockId::from("b")]);
        assert_eq!(
            doc.children_of(&BlockId::from("note")),
            &[BlockId::from("a"), BlockId::from("b"), BlockId::from("x")]
        );
        assert_eq!(
            doc.children_of(&BlockId::from("a")),
            &[BlockId::from("a1"), BlockId::from("a2")]
        );
    }

    #[tokio::test]
    async fn test_cross_document_import_is_isomorphic() {
        let pipeline = MiddlewarePipeline::default();
        let generator = SequentialGenerator::new("n");
        let job = Job::new(&pipeline, &generator);
        let mut doc = dest();
        let snapshot = incoming();

        let ids = job
            .snapshot_to_slice(snapshot.clone(), &DocId::from("src"), &mut doc, &BlockId::from("note"), 1)
            .await
            .unwrap();

        assert_eq!(ids, vec![BlockId::from("n-0"), BlockId::from("n-3")]);
        let round_trip = job.slice_to_snapshot(&doc, &ids);
        for (original, copied) in snapshot.content.iter().zip(&round_trip.content) {
            assert!(original.is_isomorphic(copied));
        }
    }

    #[tokio::test]
    async fn test_failed_import_rolls_back() {
        let pipeline = MiddlewarePipeline::default();
        let generator = SequentialGenerator::new("n");
        let job = Job::new(&pipeline, &generator);
        let mut doc = dest();
        let before = doc.snapshot();

        // Second top-level block collides with an existing id
        let snapshot: Snapshot = serde_json::from_value(json!({
            "content": [
                { "id": "fresh", "flavour": "paragraph" },
                { "id": "x", "flavour": "paragraph" }
            ]
        }))
        .unwrap();

        let result = job
            .snapshot_to_slice(snapshot, &DocId::from("dest"), &mut doc, &BlockId::from("note"), 0)
            .await;

        assert_eq!(result, Err(StoreError::DuplicateBlock(BlockId::from("x"))));
        assert_eq!(doc.snapshot(), before);
    }

    #[tokio::test]
    async fn test_rollback_removes_props_the_block_lacked() {
        let root: BlockSnapshot = serde_json::from_value(json!({
            "id": "root",
            "flavour": "page",
            "children": [{ "id": "note", "flavour": "note", "children": [
                { "id": "x", "flavour": "list", "props": { "type": "numbered" } }
            ]}]
        }))
        .unwrap();
        let mut doc = Document::from_snapshot("dest", &root).unwrap();
        let before = doc.snapshot();

        let update = PropsUpdate::order(&BlockId::from("x"), 2);
        let revert = update.inverse(&doc);
        doc.update_props(&update.block_id, update.props).await.unwrap();
        rollback(&mut doc, &[], &[revert]).await;

        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_only_incoming_linked_docs_are_new() {
        let doc = dest();
        let snapshot: Snapshot = serde_json::from_value(json!({
            "content": [
                { "id": "l1", "flavour": "embed-linked-doc", "props": { "pageId": "p1" } },
                { "id": "x", "flavour": "embed-linked-doc", "props": { "pageId": "p2" } },
                { "id": "r", "flavour": "surface-ref", "props": { "reference": "frame-1" } }
            ]
        }))
        .unwrap();

        assert_eq!(
            new_linked_docs(&snapshot, &doc),
            vec![LinkedDoc {
                id: BlockId::from("l1"),
                page_id: "p1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_partial_subtree_is_removed() {
        let pipeline = MiddlewarePipeline::default();
        let generator = SequentialGenerator::new("n");
        let job = Job::new(&pipeline, &generator);
        let mut doc = dest();
        doc.apply(Mutation::InsertBlock {
            parent_id: BlockId::from("note"),
            index: 1,
            block: NewBlock::new("taken", Flavour::Paragraph),
        })
        .unwrap();
        let before = doc.snapshot();

        let snapshot: Snapshot = serde_json::from_value(json!({
            "content": [{ "id": "a", "flavour": "list", "children": [
                { "id": "a1", "flavour": "paragraph" },
                { "id": "taken", "flavour": "paragraph" }
            ]}]
        }))
        .unwrap();

        let result = job
            .snapshot_to_slice(snapshot, &DocId::from("dest"), &mut doc, &BlockId::from("note"), 0)
            .await;

        assert!(result.is_err());
        assert_eq!(doc.snapshot(), before);
    }
}
