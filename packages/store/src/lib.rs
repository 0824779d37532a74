//! # Folio Store
//!
//! Block model and document tree for Folio.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ store: blocks, schema, documents            │
//! │  - Block tree with roles + canvas residency │
//! │  - Validated mutations                      │
//! │  - Snapshots (portable subtrees)            │
//! │  - Import jobs + middleware pipeline        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: drag engine (hit-test, placement,   │
//! │         commit)                             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Single parent**: a block is owned by exactly one parent
//! 2. **Schema first**: every insertion is validated before it touches the tree
//! 3. **Snapshots are portable**: no document references survive serialization
//! 4. **All or nothing imports**: a failed job leaves the destination unchanged
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_store::{Document, Job, MiddlewarePipeline, UuidGenerator};
//!
//! let pipeline = MiddlewarePipeline::default();
//! let job = Job::new(&pipeline, &UuidGenerator);
//!
//! let snapshot = job.slice_to_snapshot(&source, &ids);
//! let inserted = job
//!     .snapshot_to_slice(snapshot, source.doc_id(), &mut dest, &note_id, 0)
//!     .await?;
//! ```

mod block;
mod document;
mod errors;
mod ids;
pub mod middleware;
mod mutations;
pub mod schema;
pub mod snapshot;
mod transformer;
mod tree;
mod workspace;

pub use block::{Block, BlockId, DocId, Flavour, Props, Role};
pub use document::Document;
pub use errors::{StoreError, StoreResult};
pub use ids::{IdGenerator, SequentialGenerator, UuidGenerator};
pub use middleware::{
    renumber_run, ImportContext, Middleware, MiddlewarePipeline, NewIdCrossDoc, PropsUpdate,
    ReorderList, SurfaceRefToEmbed,
};
pub use mutations::Mutation;
pub use snapshot::{BlockSnapshot, Snapshot};
pub use transformer::Job;
pub use tree::{DocumentTree, NewBlock, TreeRead};
pub use workspace::Workspace;
