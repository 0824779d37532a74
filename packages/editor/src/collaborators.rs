//! # Host Collaborators
//!
//! Interfaces the drag engine consumes from the editor host, plus simple
//! in-memory implementations used by the CLI and tests.
//!
//! - [`Selection`]: ordered set of selected block ids
//! - [`CanvasViewport`]: zoom/pan and client→model transform of the canvas
//! - [`ScrollContainer`]: the scrollable area driven by auto-scroll
//! - [`PreviewRenderer`]: turns the dragged ids into an opaque preview

use folio_common::{Point, Rect};
use folio_store::BlockId;
use serde::{Deserialize, Serialize};

pub trait Selection: std::fmt::Debug {
    fn selected_blocks(&self) -> Vec<BlockId>;

    fn set_selection(&mut self, ids: Vec<BlockId>);

    fn clear_selection(&mut self);
}

/// Plain list of selected blocks
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlockSelection {
    ids: Vec<BlockId>,
}

impl BlockSelection {
    pub fn new(ids: Vec<BlockId>) -> Self {
        Self { ids }
    }
}

impl Selection for BlockSelection {
    fn selected_blocks(&self) -> Vec<BlockId> {
        self.ids.clone()
    }

    fn set_selection(&mut self, ids: Vec<BlockId>) {
        self.ids = ids;
    }

    fn clear_selection(&mut self) {
        self.ids.clear();
    }
}

pub trait CanvasViewport: std::fmt::Debug {
    fn zoom(&self) -> f64;

    /// Model-space position shown at the viewport origin
    fn pan(&self) -> Point;

    /// Client-space position of the viewport's top-left corner
    fn origin(&self) -> Point;

    /// Scale applied to notes and their content on the canvas
    fn note_scale(&self) -> f64;

    fn to_model(&self, client: Point) -> Point {
        let zoom = self.zoom();
        let origin = self.origin();
        let pan = self.pan();
        Point::new(
            (client.x - origin.x) / zoom + pan.x,
            (client.y - origin.y) / zoom + pan.y,
        )
    }
}

/// Fixed viewport state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Point,
    pub origin: Point,
    pub note_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::default(),
            origin: Point::default(),
            note_scale: 1.0,
        }
    }
}

impl CanvasViewport for Viewport {
    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn pan(&self) -> Point {
        self.pan
    }

    fn origin(&self) -> Point {
        self.origin
    }

    fn note_scale(&self) -> f64 {
        self.note_scale
    }
}

pub trait ScrollContainer: std::fmt::Debug {
    /// Visible area in client coordinates
    fn viewport_rect(&self) -> Rect;

    fn scroll_offset(&self) -> f64;

    fn scroll_by(&mut self, dy: f64);
}

/// Scroll container with a fixed client rectangle and unbounded content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrollRegion {
    rect: Rect,
    offset: f64,
}

impl ScrollRegion {
    pub fn new(rect: Rect) -> Self {
        Self { rect, offset: 0.0 }
    }
}

impl ScrollContainer for ScrollRegion {
    fn viewport_rect(&self) -> Rect {
        self.rect
    }

    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn scroll_by(&mut self, dy: f64) {
        self.offset = (self.offset + dy).max(0.0);
    }
}

/// Opaque drag preview handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub label: String,
    pub block_ids: Vec<BlockId>,
}

pub trait PreviewRenderer: std::fmt::Debug {
    fn render(&self, ids: &[BlockId]) -> Preview;
}

/// Labels the preview with the number of dragged blocks
#[derive(Debug, Default, Clone, Copy)]
pub struct CountPreview;

impl PreviewRenderer for CountPreview {
    fn render(&self, ids: &[BlockId]) -> Preview {
        let label = match ids.len() {
            1 => "1 block".to_string(),
            n => format!("{} blocks", n),
        };
        Preview {
            label,
            block_ids: ids.to_vec(),
        }
    }
}
