//! # Import Middleware
//!
//! Snapshots are normalized on their way into a destination document.
//!
//! ## Design
//!
//! A middleware gets two hooks around a [`crate::Job`] import:
//! - `before_import`: rewrite the snapshot (ids, flavours) before any
//!   tree write happens
//! - `after_import`: inspect the destination and return secondary property
//!   updates, which the job applies
//!
//! The default pipeline runs, in order:
//! 1. [`NewIdCrossDoc`]: fresh ids for every block of a cross-document import
//! 2. [`ReorderList`]: renumber the numbered-list run around the insertion
//! 3. [`SurfaceRefToEmbed`]: degrade unresolvable canvas references to
//!    linked-doc embeds

use crate::snapshot::{walk_block_mut, SnapshotVisitorMut};
use crate::{BlockId, BlockSnapshot, DocId, Flavour, IdGenerator, Props, Snapshot, TreeRead};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Per-import state shared by all middlewares
#[derive(Debug)]
pub struct ImportContext<'a> {
    pub source_doc: DocId,
    pub dest_doc: DocId,
    pub id_generator: &'a dyn IdGenerator,
    /// Snapshot id → id used in the destination
    pub id_map: HashMap<BlockId, BlockId>,
}

impl<'a> ImportContext<'a> {
    pub fn new(source_doc: DocId, dest_doc: DocId, id_generator: &'a dyn IdGenerator) -> Self {
        Self {
            source_doc,
            dest_doc,
            id_generator,
            id_map: HashMap::new(),
        }
    }

    pub fn is_cross_doc(&self) -> bool {
        self.source_doc != self.dest_doc
    }

    /// Destination id of a snapshot id
    pub fn mapped_id(&self, id: &BlockId) -> BlockId {
        self.id_map.get(id).cloned().unwrap_or_else(|| id.clone())
    }
}

/// Secondary write produced after an import
#[derive(Debug, Clone, PartialEq)]
pub struct PropsUpdate {
    pub block_id: BlockId,
    pub props: Props,
}

impl PropsUpdate {
    pub fn order(block_id: &BlockId, order: i64) -> Self {
        let mut props = Props::new();
        props.insert("order".to_string(), json!(order));
        Self {
            block_id: block_id.clone(),
            props,
        }
    }

    /// Update restoring the block's current values for the same keys
    ///
    /// Keys the block does not carry yet map to `null`, which removes them.
    pub fn inverse(&self, tree: &dyn TreeRead) -> PropsUpdate {
        let mut props = Props::new();
        if let Some(block) = tree.block(&self.block_id) {
            for key in self.props.keys() {
                let value = block.props.get(key).cloned().unwrap_or(Value::Null);
                props.insert(key.clone(), value);
            }
        }
        PropsUpdate {
            block_id: self.block_id.clone(),
            props,
        }
    }
}

/// Renumber the numbered-list run starting at `first`
///
/// The run continues the numbered sibling before it, or restarts at 1, and
/// ends at the first sibling that is not a numbered item.
pub fn renumber_run(tree: &dyn TreeRead, first: &BlockId) -> Vec<PropsUpdate> {
    let Some(parent) = tree.parent_of(first) else {
        return Vec::new();
    };
    let siblings = &parent.children;
    let Some(start) = siblings.iter().position(|id| id == first) else {
        return Vec::new();
    };

    let mut previous = start
        .checked_sub(1)
        .and_then(|i| tree.block(&siblings[i]))
        .filter(|b| b.is_numbered_list())
        .map(|b| b.list_order().unwrap_or(1));

    let mut updates = Vec::new();
    for id in &siblings[start..] {
        let Some(block) = tree.block(id).filter(|b| b.is_numbered_list()) else {
            break;
        };
        let order = previous.map(|o| o + 1).unwrap_or(1);
        if block.list_order() != Some(order) {
            updates.push(PropsUpdate::order(id, order));
        }
        previous = Some(order);
    }

    updates
}

pub trait Middleware: std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn before_import(
        &self,
        _snapshot: &mut Snapshot,
        _ctx: &mut ImportContext<'_>,
        _dest: &dyn TreeRead,
    ) {
    }

    /// `imported` holds the destination ids of the top-level blocks, in order
    fn after_import(
        &self,
        _imported: &[BlockId],
        _ctx: &ImportContext<'_>,
        _dest: &dyn TreeRead,
    ) -> Vec<PropsUpdate> {
        Vec::new()
    }
}

/// Replace every id with a fresh one when crossing documents
#[derive(Debug, Default)]
pub struct NewIdCrossDoc;

struct IdRewriter<'c, 'a> {
    ctx: &'c mut ImportContext<'a>,
}

impl SnapshotVisitorMut for IdRewriter<'_, '_> {
    fn visit_block_mut(&mut self, block: &mut BlockSnapshot) {
        let fresh = self.ctx.id_generator.next_id();
        self.ctx.id_map.insert(block.id.clone(), fresh.clone());
        block.id = fresh;
        walk_block_mut(self, block);
    }
}

impl Middleware for NewIdCrossDoc {
    fn name(&self) -> &'static str {
        "new-id-cross-doc"
    }

    fn before_import(
        &self,
        snapshot: &mut Snapshot,
        ctx: &mut ImportContext<'_>,
        _dest: &dyn TreeRead,
    ) {
        if !ctx.is_cross_doc() {
            return;
        }
        IdRewriter { ctx }.visit_snapshot_mut(snapshot);
    }
}

/// Keep numbered list items consecutive around the insertion point
///
/// Each imported numbered item continues the numbering of the sibling before
/// it (or restarts at 1), and the contiguous numbered siblings that follow
/// the import are renumbered after it. A run split by a plain block restarts
/// at 1.
#[derive(Debug, Default)]
pub struct ReorderList;

impl Middleware for ReorderList {
    fn name(&self) -> &'static str {
        "reorder-list"
    }

    fn after_import(
        &self,
        imported: &[BlockId],
        _ctx: &ImportContext<'_>,
        dest: &dyn TreeRead,
    ) -> Vec<PropsUpdate> {
        let Some(first) = imported.first() else {
            return Vec::new();
        };
        let Some(parent) = dest.parent_of(first) else {
            return Vec::new();
        };

        let siblings = &parent.children;
        let Some(start) = siblings.iter().position(|id| id == first) else {
            return Vec::new();
        };
        let last = imported
            .iter()
            .filter_map(|id| siblings.iter().position(|s| s == id))
            .max()
            .unwrap_or(start);

        let mut previous = start
            .checked_sub(1)
            .and_then(|i| dest.block(&siblings[i]))
            .filter(|b| b.is_numbered_list())
            .map(|b| b.list_order().unwrap_or(1));

        let mut updates = Vec::new();
        for (position, id) in siblings.iter().enumerate().skip(start) {
            let Some(block) = dest.block(id) else {
                continue;
            };

            if !block.is_numbered_list() {
                if position > last {
                    break;
                }
                previous = None;
                continue;
            }

            let order = previous.map(|o| o + 1).unwrap_or(1);
            if block.list_order() != Some(order) {
                updates.push(PropsUpdate::order(id, order));
            }
            previous = Some(order);
        }

        updates
    }
}

/// Turn cross-document `surface-ref` blocks into linked-doc embeds
///
/// A surface reference points at a canvas element of its own document; once
/// copied elsewhere the element is gone, so the block becomes an
/// `embed-linked-doc` pointing back at the source.
#[derive(Debug, Default)]
pub struct SurfaceRefToEmbed;

struct SurfaceRefRewriter<'d> {
    source_doc: DocId,
    dest: &'d dyn TreeRead,
    converted: usize,
}

impl SnapshotVisitorMut for SurfaceRefRewriter<'_> {
    fn visit_block_mut(&mut self, block: &mut BlockSnapshot) {
        if block.flavour == Flavour::SurfaceRef {
            let reference = block
                .props
                .get("reference")
                .and_then(|v| v.as_str())
                .map(BlockId::from);

            let resolvable = reference
                .as_ref()
                .map(|r| self.dest.has_block(r))
                .unwrap_or(false);

            if !resolvable {
                let mut props = Props::new();
                props.insert("pageId".to_string(), json!(self.source_doc.as_str()));
                if let Some(reference) = reference {
                    props.insert("blockId".to_string(), json!(reference.as_str()));
                }
                block.flavour = Flavour::linked_doc();
                block.props = props;
                self.converted += 1;
            }
        }
        walk_block_mut(self, block);
    }
}

impl Middleware for SurfaceRefToEmbed {
    fn name(&self) -> &'static str {
        "surface-ref-to-embed"
    }

    fn before_import(
        &self,
        snapshot: &mut Snapshot,
        ctx: &mut ImportContext<'_>,
        dest: &dyn TreeRead,
    ) {
        if !ctx.is_cross_doc() {
            return;
        }

        let mut rewriter = SurfaceRefRewriter {
            source_doc: ctx.source_doc.clone(),
            dest,
            converted: 0,
        };
        rewriter.visit_snapshot_mut(snapshot);

        if rewriter.converted > 0 {
            tracing::debug!(
                count = rewriter.converted,
                "converted surface references to linked-doc embeds"
            );
        }
    }
}

/// Ordered list of middlewares run by every import
#[derive(Debug)]
pub struct MiddlewarePipeline {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewarePipeline {
    /// Pipeline with the default middlewares
    pub fn new() -> Self {
        Self {
            middlewares: vec![
                Box::new(NewIdCrossDoc),
                Box::new(ReorderList),
                Box::new(SurfaceRefToEmbed),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    pub fn before_import(
        &self,
        snapshot: &mut Snapshot,
        ctx: &mut ImportContext<'_>,
        dest: &dyn TreeRead,
    ) {
        for middleware in &self.middlewares {
            middleware.before_import(snapshot, ctx, dest);
        }
    }

    pub fn after_import(
        &self,
        imported: &[BlockId],
        ctx: &ImportContext<'_>,
        dest: &dyn TreeRead,
    ) -> Vec<PropsUpdate> {
        let mut updates = Vec::new();

        for middleware in &self.middlewares {
            let mut middleware_updates = middleware.after_import(imported, ctx, dest);
            updates.append(&mut middleware_updates);
        }

        updates
    }
}

impl Default for MiddlewarePipeline {
    fn default() -> Self {
        Self::new()
    }
}
