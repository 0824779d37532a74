//! # Drop Materialization
//!
//! Turns a resolved drop into tree writes.
//!
//! ## Modes
//!
//! - **Same document**: a move. Sources are removed, the numbered runs they
//!   leave behind are renumbered, the insertion index is shifted for removed
//!   siblings that preceded it, and the content is re-inserted with its ids
//!   intact.
//! - **Cross document**: a copy through the middleware pipeline (fresh ids,
//!   list renumbering, surface-ref degradation). The source is untouched.
//! - **Note on note**: the children of a dragged note are spliced into the
//!   destination note and the emptied source note is deleted.
//!
//! ## Failure handling
//!
//! Every mode is all or nothing. A failed write rolls back partial
//! insertions and restores removed sources at their original positions.

use crate::canvas::CanvasPlan;
use crate::placement::{DropResult, Placement};
use crate::source::DragPayload;
use crate::{DragError, DragResult};
use folio_store::snapshot::{block_to_snapshot, slice_to_snapshot};
use folio_store::{
    renumber_run, BlockId, BlockSnapshot, DocId, DocumentTree, Flavour, IdGenerator, Job,
    MiddlewarePipeline, PropsUpdate, Snapshot, StoreResult, TreeRead,
};

/// Documents involved in a drop
pub enum DropContext<'a, T: DocumentTree> {
    /// Source and destination are the same document
    Same(&'a mut T),

    /// Drop into another document; `source` is where the payload came from
    Cross { source: &'a mut T, dest: &'a mut T },
}

impl<'a, T: DocumentTree> DropContext<'a, T> {
    pub fn dest(&self) -> &T {
        match self {
            DropContext::Same(doc) => &**doc,
            DropContext::Cross { dest, .. } => &**dest,
        }
    }

    pub fn dest_mut(&mut self) -> &mut T {
        match self {
            DropContext::Same(doc) => &mut **doc,
            DropContext::Cross { dest, .. } => &mut **dest,
        }
    }
}

/// Final parent and index of a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub parent: BlockId,
    pub index: usize,
}

/// What a committed drop did
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Dropped at the content's current position; nothing changed
    NoOp,
    Moved(Vec<BlockId>),
    Copied(Vec<BlockId>),
    /// Note children spliced into another note
    Merged(Vec<BlockId>),
    /// Placed on the canvas
    Placed(Vec<BlockId>),
}

impl DropOutcome {
    pub fn inserted(&self) -> &[BlockId] {
        match self {
            DropOutcome::NoOp => &[],
            DropOutcome::Moved(ids)
            | DropOutcome::Copied(ids)
            | DropOutcome::Merged(ids)
            | DropOutcome::Placed(ids) => ids,
        }
    }
}

/// `In` → (target, 0); `Before` → (parent, index); `After` → (parent, index + 1)
pub fn resolve_insertion(tree: &dyn TreeRead, result: &DropResult) -> DragResult<Insertion> {
    let target = &result.target_block;

    if result.placement == Placement::In {
        if !tree.has_block(target) {
            return Err(DragError::invalid_target(format!("{} is gone", target)));
        }
        return Ok(Insertion {
            parent: target.clone(),
            index: 0,
        });
    }

    let parent = tree
        .parent_of(target)
        .ok_or_else(|| DragError::invalid_target(format!("{} has no parent", target)))?;
    let index = tree
        .index_of(target)
        .ok_or_else(|| DragError::invalid_target(format!("{} has no parent", target)))?;

    Ok(Insertion {
        parent: parent.id.clone(),
        index: if result.placement == Placement::After {
            index + 1
        } else {
            index
        },
    })
}

/// Whether dropping `payload` at `insertion` leaves the tree unchanged
///
/// True when the dragged top-level blocks already sit contiguously under
/// the insertion parent and the insertion index touches that run.
pub fn is_noop(tree: &dyn TreeRead, payload: &DragPayload, insertion: &Insertion) -> bool {
    if !payload.is_from(tree.doc_id()) {
        return false;
    }

    let mut positions = Vec::new();
    for id in payload.top_level_ids() {
        let Some(block) = tree.block(&id) else {
            return false;
        };
        if block.parent.as_ref() != Some(&insertion.parent) {
            return false;
        }
        match tree.index_of(&id) {
            Some(index) => positions.push(index),
            None => return false,
        }
    }

    positions.sort_unstable();
    let Some(&start) = positions.first() else {
        return false;
    };
    let contiguous = positions.iter().enumerate().all(|(i, p)| *p == start + i);
    let end = start + positions.len();

    contiguous && (start..=end).contains(&insertion.index)
}

/// Original location of a block removed by a move
#[derive(Debug, Clone)]
struct Removed {
    parent: BlockId,
    index: usize,
    snapshot: BlockSnapshot,
}

#[derive(Debug)]
pub struct ContentTransformer<'a> {
    pipeline: &'a MiddlewarePipeline,
    ids: &'a dyn IdGenerator,
    restore_pipeline: MiddlewarePipeline,
}

impl<'a> ContentTransformer<'a> {
    pub fn new(pipeline: &'a MiddlewarePipeline, ids: &'a dyn IdGenerator) -> Self {
        Self {
            pipeline,
            ids,
            restore_pipeline: MiddlewarePipeline::empty(),
        }
    }

    fn job(&self) -> Job<'_> {
        Job::new(self.pipeline, self.ids)
    }

    /// Commit a tree drop
    pub async fn commit<T: DocumentTree>(
        &self,
        mut ctx: DropContext<'_, T>,
        payload: &DragPayload,
        insertion: Insertion,
    ) -> DragResult<DropOutcome> {
        let same_doc = payload.is_from(ctx.dest().doc_id());

        if is_noop(ctx.dest(), payload, &insertion) {
            tracing::debug!(parent = %insertion.parent, index = insertion.index, "drop at current position");
            return Ok(DropOutcome::NoOp);
        }

        let parent_flavour = ctx
            .dest()
            .block(&insertion.parent)
            .map(|b| b.flavour.clone())
            .ok_or_else(|| DragError::invalid_target(format!("{} is gone", insertion.parent)))?;

        let leading = payload.snapshot.first().ok_or(DragError::EmptySnapshot)?;
        if parent_flavour == Flavour::Note && leading.flavour == Flavour::Note {
            if payload.snapshot.content.len() != 1 {
                return Err(DragError::invalid_target("only a single note can be merged"));
            }
            if same_doc && leading.id == insertion.parent {
                return Ok(DropOutcome::NoOp);
            }
            return self.merge_note(ctx, payload, insertion).await;
        }

        let top_level = payload.top_level_ids();
        let ids = if same_doc {
            let snapshot = slice_to_snapshot(ctx.dest(), &top_level);
            self.relocate(&mut ctx, payload, snapshot, &insertion, &top_level)
                .await?
        } else {
            self.relocate(&mut ctx, payload, payload.snapshot.clone(), &insertion, &[])
                .await?
        };

        tracing::info!(
            parent = %insertion.parent,
            index = insertion.index,
            blocks = ids.len(),
            same_doc,
            "drop committed"
        );

        Ok(if same_doc {
            DropOutcome::Moved(ids)
        } else {
            DropOutcome::Copied(ids)
        })
    }

    /// Commit a canvas drop
    pub async fn commit_canvas<T: DocumentTree>(
        &self,
        mut ctx: DropContext<'_, T>,
        payload: &DragPayload,
        plan: CanvasPlan,
    ) -> DragResult<DropOutcome> {
        let same_doc = payload.is_from(ctx.dest().doc_id());
        let remove = if same_doc {
            payload.top_level_ids()
        } else {
            Vec::new()
        };

        let ids = match plan {
            CanvasPlan::Surface { surface, snapshot } => {
                let index = ctx.dest().children_of(&surface).len();
                let insertion = Insertion {
                    parent: surface,
                    index,
                };
                self.relocate(&mut ctx, payload, snapshot, &insertion, &remove)
                    .await?
            }

            CanvasPlan::Note {
                root,
                note,
                snapshot,
            } => {
                let index = ctx.dest().children_of(&root).len();
                let note_id = ctx.dest_mut().insert_block(note, &root, index).await?;

                let insertion = Insertion {
                    parent: note_id.clone(),
                    index: 0,
                };
                match self
                    .relocate(&mut ctx, payload, snapshot, &insertion, &remove)
                    .await
                {
                    Ok(ids) => ids,
                    Err(err) => {
                        if let Err(cleanup) = ctx.dest_mut().delete_block(&note_id).await {
                            tracing::warn!(note = %note_id, error = %cleanup, "failed to remove synthesized note");
                        }
                        return Err(err);
                    }
                }
            }
        };

        tracing::info!(blocks = ids.len(), same_doc, "canvas drop committed");
        Ok(DropOutcome::Placed(ids))
    }

    async fn merge_note<T: DocumentTree>(
        &self,
        mut ctx: DropContext<'_, T>,
        payload: &DragPayload,
        insertion: Insertion,
    ) -> DragResult<DropOutcome> {
        let same_doc = payload.is_from(ctx.dest().doc_id());
        let note_id = payload
            .snapshot
            .first()
            .map(|note| note.id.clone())
            .ok_or(DragError::EmptySnapshot)?;

        let children = if same_doc {
            let children = ctx.dest().children_of(&note_id).to_vec();
            slice_to_snapshot(ctx.dest(), &children)
        } else {
            Snapshot {
                content: payload
                    .snapshot
                    .first()
                    .map(|note| note.children.clone())
                    .unwrap_or_default(),
            }
        };

        let ids = self
            .relocate(&mut ctx, payload, children, &insertion, &[note_id.clone()])
            .await?;

        tracing::info!(note = %note_id, into = %insertion.parent, blocks = ids.len(), "notes merged");
        Ok(DropOutcome::Merged(ids))
    }

    /// Insert `snapshot` at `insertion`, removing `remove` from the source
    ///
    /// Within one document the removal happens first (a move); across
    /// documents the copy happens first and the removal, if any, last.
    async fn relocate<T: DocumentTree>(
        &self,
        ctx: &mut DropContext<'_, T>,
        payload: &DragPayload,
        snapshot: Snapshot,
        insertion: &Insertion,
        remove: &[BlockId],
    ) -> DragResult<Vec<BlockId>> {
        match ctx {
            DropContext::Same(doc) if payload.is_from(doc.doc_id()) => {
                self.move_within(&mut **doc, &payload.from, snapshot, insertion, remove)
                    .await
            }

            DropContext::Same(doc) => {
                if !remove.is_empty() {
                    tracing::warn!(from = %payload.from, "source document unavailable, copying instead");
                }
                Ok(self
                    .job()
                    .snapshot_to_slice(snapshot, &payload.from, &mut **doc, &insertion.parent, insertion.index)
                    .await?)
            }

            DropContext::Cross { source, dest } => {
                if !payload.is_from(source.doc_id()) {
                    return Err(DragError::invalid_target(format!(
                        "payload comes from {}, not {}",
                        payload.from,
                        source.doc_id()
                    )));
                }

                let inserted = self
                    .job()
                    .snapshot_to_slice(snapshot, &payload.from, &mut **dest, &insertion.parent, insertion.index)
                    .await?;

                for id in remove {
                    if let Err(err) = source.delete_block(id).await {
                        for added in inserted.iter().rev() {
                            if let Err(cleanup) = dest.delete_block(added).await {
                                tracing::warn!(block = %added, error = %cleanup, "failed to roll back copy");
                            }
                        }
                        return Err(err.into());
                    }
                }

                Ok(inserted)
            }
        }
    }

    async fn move_within<T: DocumentTree>(
        &self,
        doc: &mut T,
        from: &DocId,
        snapshot: Snapshot,
        insertion: &Insertion,
        remove: &[BlockId],
    ) -> DragResult<Vec<BlockId>> {
        for id in remove {
            if id == &insertion.parent || doc.is_ancestor(id, &insertion.parent) {
                return Err(DragError::invalid_target(format!(
                    "cannot drop {} into itself",
                    id
                )));
            }
        }

        let removed = record_positions(&*doc, remove)?;
        let shift = removed
            .iter()
            .filter(|r| r.parent == insertion.parent && r.index < insertion.index)
            .count();

        for id in remove.iter().rev() {
            if let Err(err) = doc.delete_block(id).await {
                self.restore(doc, from, &removed).await;
                return Err(err.into());
            }
        }

        let mut renumbered = Vec::new();
        if let Err(err) = close_gaps(doc, &removed, &mut renumbered).await {
            revert_props(doc, &renumbered).await;
            self.restore(doc, from, &removed).await;
            return Err(err.into());
        }

        match self
            .job()
            .snapshot_to_slice(snapshot, from, doc, &insertion.parent, insertion.index - shift)
            .await
        {
            Ok(ids) => Ok(ids),
            Err(err) => {
                revert_props(doc, &renumbered).await;
                self.restore(doc, from, &removed).await;
                Err(err.into())
            }
        }
    }

    /// Put removed blocks back where they were
    async fn restore<T: DocumentTree>(&self, doc: &mut T, from: &DocId, removed: &[Removed]) {
        let job = Job::new(&self.restore_pipeline, self.ids);

        let mut ordered: Vec<&Removed> = removed.iter().collect();
        ordered.sort_by_key(|r| r.index);

        for entry in ordered {
            if doc.has_block(&entry.snapshot.id) {
                continue;
            }

            let snapshot = Snapshot {
                content: vec![entry.snapshot.clone()],
            };
            if let Err(err) = job
                .snapshot_to_slice(snapshot, from, doc, &entry.parent, entry.index)
                .await
            {
                tracing::error!(block = %entry.snapshot.id, error = %err, "failed to restore block");
            }
        }
    }
}

/// Renumber the numbered runs the removed blocks were taken out of
///
/// `reverts` collects the inverse of every applied update.
async fn close_gaps<T: DocumentTree>(
    doc: &mut T,
    removed: &[Removed],
    reverts: &mut Vec<PropsUpdate>,
) -> StoreResult<()> {
    let mut anchors: Vec<BlockId> = Vec::new();
    for entry in removed {
        let earlier = removed
            .iter()
            .filter(|r| r.parent == entry.parent && r.index < entry.index)
            .count();
        if let Some(anchor) = doc.children_of(&entry.parent).get(entry.index - earlier) {
            if !anchors.contains(anchor) {
                anchors.push(anchor.clone());
            }
        }
    }

    // One run at a time, so each sees the orders written before it
    for anchor in &anchors {
        for update in renumber_run(&*doc, anchor) {
            let revert = update.inverse(&*doc);
            doc.update_props(&update.block_id, update.props).await?;
            reverts.push(revert);
        }
    }

    Ok(())
}

async fn revert_props<T: DocumentTree>(doc: &mut T, reverts: &[PropsUpdate]) {
    for revert in reverts.iter().rev() {
        if let Err(err) = doc.update_props(&revert.block_id, revert.props.clone()).await {
            tracing::warn!(block = %revert.block_id, error = %err, "failed to revert props");
        }
    }
}

fn record_positions(tree: &dyn TreeRead, ids: &[BlockId]) -> DragResult<Vec<Removed>> {
    ids.iter()
        .map(|id| {
            let missing = || DragError::from(folio_store::StoreError::BlockNotFound(id.clone()));
            let parent = tree.parent_of(id).ok_or_else(missing)?;
            let index = tree.index_of(id).ok_or_else(missing)?;
            let snapshot = block_to_snapshot(tree, id).ok_or_else(missing)?;
            Ok(Removed {
                parent: parent.id.clone(),
                index,
                snapshot,
            })
        })
        .collect()
}
