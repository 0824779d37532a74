//! # Drop Target Registry
//!
//! Block views register themselves as drop-capable regions while they are
//! mounted. Only content and hub blocks are accepted; container-only
//! blocks (the page) are never drop targets.
//!
//! Hit-testing picks the single topmost view under the pointer: highest
//! stacking layer first, then the deepest block in the tree, then the most
//! recently attached view.

use folio_common::{Point, Rect};
use folio_store::{BlockId, Flavour, Role, TreeRead};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    pub block_id: BlockId,
    pub flavour: Flavour,
    pub role: Role,
    #[serde(default)]
    pub canvas_resident: bool,
    pub rect: Rect,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub depth: usize,
}

impl BlockView {
    /// View of a mounted block, with role and depth taken from the tree
    pub fn from_block(tree: &dyn TreeRead, id: &BlockId, rect: Rect, layer: i32) -> Option<Self> {
        let block = tree.block(id)?;
        Some(Self {
            block_id: block.id.clone(),
            flavour: block.flavour.clone(),
            role: block.role,
            canvas_resident: block.canvas_resident,
            rect,
            layer,
            depth: tree.depth_of(id),
        })
    }

    pub fn accepts_drops(&self) -> bool {
        matches!(self.role, Role::Content | Role::Hub)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    view: BlockView,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct ViewRegistry {
    entries: IndexMap<BlockId, Entry>,
    next_seq: u64,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view; returns false if the view cannot receive drops
    ///
    /// Re-attaching an id replaces the previous view and counts as the most
    /// recent attachment.
    pub fn attach(&mut self, view: BlockView) -> bool {
        if !view.accepts_drops() {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.shift_remove(&view.block_id);
        self.entries.insert(view.block_id.clone(), Entry { view, seq });
        true
    }

    pub fn detach(&mut self, id: &BlockId) -> Option<BlockView> {
        self.entries.shift_remove(id).map(|entry| entry.view)
    }

    pub fn update_rect(&mut self, id: &BlockId, rect: Rect) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.view.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &BlockId) -> Option<&BlockView> {
        self.entries.get(id).map(|entry| &entry.view)
    }

    pub fn views(&self) -> impl Iterator<Item = &BlockView> {
        self.entries.values().map(|entry| &entry.view)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Topmost view containing `point`
    pub fn hit_test(&self, point: Point) -> Option<&BlockView> {
        self.entries
            .values()
            .filter(|entry| entry.view.rect.contains(point))
            .max_by_key(|entry| (entry.view.layer, entry.view.depth, entry.seq))
            .map(|entry| &entry.view)
    }
}
