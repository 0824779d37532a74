//! # Drag Source Resolution
//!
//! Decides which blocks a drag picks up and packages them as a portable
//! [`DragPayload`].
//!
//! ## Rules
//!
//! 1. Hovering a block that is part of a multi-block selection drags the
//!    whole selection; otherwise the hovered block alone is dragged.
//! 2. A collapsed heading brings its hidden sibling run along.
//! 3. Descendants of other dragged blocks are dropped (topmost only).
//! 4. Canvas-resident blocks are dragged alone and leave the selection alone.

use crate::{DragError, DragResult};
use folio_store::snapshot::slice_to_snapshot;
use folio_store::{BlockId, DocId, Flavour, Snapshot, TreeRead};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the drag was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    /// Through the block drag handle
    Handle,
    /// By grabbing an attachment or bookmark card directly
    Card,
}

/// Portable description of a drag in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    #[serde(rename = "type")]
    pub kind: String,
    /// Every id in the snapshot, in document order
    pub model_ids: Vec<BlockId>,
    pub snapshot: Snapshot,
    /// Document the blocks were picked up from
    pub from: DocId,
}

impl DragPayload {
    pub fn new(snapshot: Snapshot, from: DocId) -> DragResult<Self> {
        if snapshot.is_empty() {
            return Err(DragError::EmptySnapshot);
        }

        Ok(Self {
            kind: "blocks".to_string(),
            model_ids: snapshot.ids(),
            snapshot,
            from,
        })
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.model_ids.contains(id)
    }

    pub fn top_level_ids(&self) -> Vec<BlockId> {
        self.snapshot.top_level_ids()
    }

    pub fn leading_flavour(&self) -> Option<&Flavour> {
        self.snapshot.first().map(|b| &b.flavour)
    }

    pub fn is_from(&self, doc: &DocId) -> bool {
        &self.from == doc
    }
}

/// Result of resolving a drag start
#[derive(Debug, Clone, PartialEq)]
pub struct SourceResolution {
    pub payload: DragPayload,
    /// New selection to apply, if the drag changes it
    pub select: Option<Vec<BlockId>>,
}

pub fn resolve_drag_source(
    tree: &dyn TreeRead,
    hovered: &BlockId,
    selection: &[BlockId],
    source: DragSource,
) -> DragResult<SourceResolution> {
    let block = tree.block(hovered).ok_or(DragError::EmptySnapshot)?;

    if source == DragSource::Card {
        let is_card = matches!(block.flavour, Flavour::Attachment | Flavour::Bookmark);
        if !is_card || block.canvas_resident {
            return Err(DragError::NotDraggable(hovered.clone()));
        }
    }

    if block.canvas_resident {
        let payload = build_payload(tree, &[hovered.clone()])?;
        return Ok(SourceResolution {
            payload,
            select: None,
        });
    }

    let mut ids = if source == DragSource::Handle
        && selection.len() > 1
        && selection.contains(hovered)
    {
        selection.to_vec()
    } else {
        vec![hovered.clone()]
    };

    let headings: Vec<BlockId> = ids
        .iter()
        .filter(|id| tree.block(id).map(|b| b.is_collapsed_heading()).unwrap_or(false))
        .cloned()
        .collect();
    for heading in &headings {
        for id in collapsed_run(tree, heading) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }

    let top_level = reduce_to_topmost(tree, &ids);
    let payload = build_payload(tree, &top_level)?;

    tracing::debug!(
        blocks = top_level.len(),
        total = payload.model_ids.len(),
        "resolved drag source"
    );

    Ok(SourceResolution {
        payload,
        select: Some(top_level),
    })
}

/// Siblings hidden under a collapsed heading
///
/// Runs up to, but not including, the next heading of the same or a higher
/// level.
pub fn collapsed_run(tree: &dyn TreeRead, heading: &BlockId) -> Vec<BlockId> {
    let Some(level) = tree.block(heading).and_then(|b| b.heading_level()) else {
        return Vec::new();
    };
    let Some(parent) = tree.parent_of(heading) else {
        return Vec::new();
    };
    let Some(start) = tree.index_of(heading) else {
        return Vec::new();
    };

    parent.children[start + 1..]
        .iter()
        .take_while(|id| {
            tree.block(id)
                .and_then(|b| b.heading_level())
                .map(|other| other > level)
                .unwrap_or(true)
        })
        .cloned()
        .collect()
}

/// Keep only blocks with no dragged ancestor, in document order
pub fn reduce_to_topmost(tree: &dyn TreeRead, ids: &[BlockId]) -> Vec<BlockId> {
    let order: HashMap<BlockId, usize> = tree
        .preorder()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();

    let mut top: Vec<BlockId> = ids
        .iter()
        .filter(|id| order.contains_key(*id))
        .filter(|id| !ids.iter().any(|other| tree.is_ancestor(other, id)))
        .cloned()
        .collect();

    top.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    top.dedup();
    top
}

pub fn build_payload(tree: &dyn TreeRead, top_level: &[BlockId]) -> DragResult<DragPayload> {
    let snapshot = slice_to_snapshot(tree, top_level);
    DragPayload::new(snapshot, tree.doc_id().clone())
}
