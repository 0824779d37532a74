//! # Folio Editor
//!
//! Drag-and-drop block relocation for Folio documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: pointer events, rendered block rects  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DragEngine                          │
//! │  - Resolve what is dragged (source)         │
//! │  - Find the drop target (registry/tracker)  │
//! │  - Classify placement + indicator           │
//! │  - Auto-scroll near container edges         │
//! │  - Commit through the content transformer   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: snapshots, middlewares, block tree   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are the payload**: a drag carries a serialized copy of the
//!    blocks, never live references
//! 2. **Recompute on every move**: target and placement have no memory
//! 3. **Topmost wins**: the innermost view under the pointer is the only
//!    candidate target
//! 4. **All or nothing**: a failed commit leaves documents and selection as
//!    they were before the drop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{DragConfig, DragEngine, DropContext};
//!
//! let mut engine = DragEngine::new(DragConfig::default());
//! engine.attach_view(view);
//!
//! engine.start(&doc, &hovered)?;
//! engine.drag_move(&doc, pointer)?;
//! let outcome = engine.drop(DropContext::Same(&mut doc)).await?;
//! ```

mod autoscroll;
mod canvas;
mod collaborators;
mod commit;
mod config;
mod errors;
mod events;
mod placement;
mod registry;
mod session;
mod source;
mod tracker;

pub use autoscroll::{AutoScroll, AutoScrollSubscription};
pub use canvas::{card_size, CanvasPlacementResolver, CanvasPlan, DEFAULT_CARD_STYLE};
pub use collaborators::{
    BlockSelection, CanvasViewport, CountPreview, Preview, PreviewRenderer, ScrollContainer,
    ScrollRegion, Selection, Viewport,
};
pub use commit::{
    is_noop, resolve_insertion, ContentTransformer, DropContext, DropOutcome, Insertion,
};
pub use config::DragConfig;
pub use errors::{DragError, DragResult};
pub use events::{DragEvent, EventBus, SubscriptionId};
pub use placement::{closest_edge, DropResult, Edge, Placement, PlacementClassifier};
pub use registry::{BlockView, ViewRegistry};
pub use session::{DragEngine, DragState};
pub use source::{
    build_payload, collapsed_run, reduce_to_topmost, resolve_drag_source, DragPayload, DragSource,
    SourceResolution,
};
pub use tracker::{can_drop, find_target};

// Re-export store types for convenience
pub use folio_store::{BlockId, DocId, Document, DocumentTree, TreeRead};
