//! # Drag Session Management
//!
//! One [`DragEngine`] per editing surface. It owns the drop-target
//! registry, the event bus and the host collaborators, and runs at most one
//! drag session at a time.
//!
//! ## States
//!
//! ```text
//! Idle → Dragging → (TargetHover)* → Committing → Idle
//!            └──────── cancel ────────────────────┘
//! ```
//!
//! Every drag-move recomputes target and placement from scratch. Only the
//! commit awaits; hover, indicator and auto-scroll are torn down before it
//! starts, and the engine is back to `Idle` whatever the commit returns.

use crate::autoscroll::{AutoScroll, AutoScrollSubscription};
use crate::canvas::CanvasPlacementResolver;
use crate::collaborators::{
    BlockSelection, CanvasViewport, CountPreview, PreviewRenderer, ScrollContainer, Selection,
    Viewport,
};
use crate::commit::{is_noop, resolve_insertion, ContentTransformer, DropContext, DropOutcome};
use crate::events::{DragEvent, EventBus, SubscriptionId};
use crate::placement::{DropResult, PlacementClassifier};
use crate::registry::{BlockView, ViewRegistry};
use crate::source::{resolve_drag_source, DragPayload, DragSource};
use crate::tracker::find_target;
use crate::{DragConfig, DragError, DragResult};
use folio_common::{Point, Rect};
use folio_store::{
    BlockId, DocumentTree, Flavour, IdGenerator, MiddlewarePipeline, TreeRead, UuidGenerator,
};
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
    TargetHover,
    Committing,
}

/// State of the drag in flight
#[derive(Debug)]
struct DragSession {
    payload: DragPayload,
    /// Selection before the drag touched it, restored if the drop fails
    pre_drag_selection: Vec<BlockId>,
    pointer: Option<Point>,
    drop: Option<DropResult>,
    auto_scroll: Option<AutoScrollSubscription>,
}

#[derive(Debug)]
pub struct DragEngine {
    config: DragConfig,
    registry: ViewRegistry,
    events: EventBus,
    selection: Box<dyn Selection>,
    viewport: Box<dyn CanvasViewport>,
    scroll: Option<Box<dyn ScrollContainer>>,
    preview: Box<dyn PreviewRenderer>,
    pipeline: MiddlewarePipeline,
    ids: Box<dyn IdGenerator>,
    session: Option<DragSession>,
    committing: bool,
}

impl DragEngine {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            registry: ViewRegistry::new(),
            events: EventBus::new(),
            selection: Box::new(BlockSelection::default()),
            viewport: Box::new(Viewport::default()),
            scroll: None,
            preview: Box::new(CountPreview),
            pipeline: MiddlewarePipeline::default(),
            ids: Box::new(UuidGenerator),
            session: None,
            committing: false,
        }
    }

    pub fn with_selection(mut self, selection: impl Selection + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    pub fn with_viewport(mut self, viewport: impl CanvasViewport + 'static) -> Self {
        self.viewport = Box::new(viewport);
        self
    }

    pub fn with_scroll_container(mut self, container: impl ScrollContainer + 'static) -> Self {
        self.scroll = Some(Box::new(container));
        self
    }

    pub fn with_preview_renderer(mut self, renderer: impl PreviewRenderer + 'static) -> Self {
        self.preview = Box::new(renderer);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_pipeline(mut self, pipeline: MiddlewarePipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn state(&self) -> DragState {
        match &self.session {
            _ if self.committing => DragState::Committing,
            None => DragState::Idle,
            Some(session) if session.drop.is_some() => DragState::TargetHover,
            Some(_) => DragState::Dragging,
        }
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        self.session.as_ref().map(|s| &s.payload)
    }

    pub fn drop_result(&self) -> Option<&DropResult> {
        self.session.as_ref().and_then(|s| s.drop.as_ref())
    }

    pub fn selection(&self) -> &dyn Selection {
        self.selection.as_ref()
    }

    pub fn selection_mut(&mut self) -> &mut dyn Selection {
        self.selection.as_mut()
    }

    pub fn scroll_container(&self) -> Option<&dyn ScrollContainer> {
        self.scroll.as_deref()
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    // Rendering layer

    pub fn subscribe(&mut self) -> (SubscriptionId, UnboundedReceiver<DragEvent>) {
        self.events.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // View lifecycle

    pub fn attach_view(&mut self, view: BlockView) -> bool {
        self.registry.attach(view)
    }

    pub fn detach_view(&mut self, id: &BlockId) -> Option<BlockView> {
        self.registry.detach(id)
    }

    pub fn update_view_rect(&mut self, id: &BlockId, rect: Rect) -> bool {
        self.registry.update_rect(id, rect)
    }

    // Drag lifecycle

    /// Start dragging from the block handle of `hovered`
    pub fn start(&mut self, tree: &dyn TreeRead, hovered: &BlockId) -> DragResult<&DragPayload> {
        self.start_from(tree, hovered, DragSource::Handle)
    }

    /// Start dragging an attachment or bookmark card directly
    pub fn start_card(&mut self, tree: &dyn TreeRead, card: &BlockId) -> DragResult<&DragPayload> {
        self.start_from(tree, card, DragSource::Card)
    }

    fn start_from(
        &mut self,
        tree: &dyn TreeRead,
        hovered: &BlockId,
        source: DragSource,
    ) -> DragResult<&DragPayload> {
        self.ensure_idle()?;

        let pre_drag_selection = self.selection.selected_blocks();
        let resolution = resolve_drag_source(tree, hovered, &pre_drag_selection, source)?;
        if let Some(ids) = resolution.select {
            self.selection.set_selection(ids);
        }

        Ok(self.open_session(resolution.payload, pre_drag_selection))
    }

    /// Accept a drag that started in another editor
    pub fn begin_incoming(&mut self, payload: DragPayload) -> DragResult<&DragPayload> {
        self.ensure_idle()?;
        if payload.snapshot.is_empty() {
            return Err(DragError::EmptySnapshot);
        }

        let pre_drag_selection = self.selection.selected_blocks();
        Ok(self.open_session(payload, pre_drag_selection))
    }

    fn ensure_idle(&self) -> DragResult<()> {
        if self.session.is_some() || self.committing {
            return Err(DragError::AlreadyDragging);
        }
        Ok(())
    }

    fn open_session(&mut self, payload: DragPayload, pre_drag_selection: Vec<BlockId>) -> &DragPayload {
        let top_level = payload.top_level_ids();
        let preview = self.preview.render(&top_level);

        let auto_scroll = self
            .scroll
            .as_ref()
            .map(|_| AutoScrollSubscription::new(AutoScroll::from_config(&self.config)));

        tracing::info!(from = %payload.from, blocks = top_level.len(), "drag started");
        self.events.publish(DragEvent::Started {
            block_ids: top_level,
            preview,
        });

        &self
            .session
            .insert(DragSession {
                payload,
                pre_drag_selection,
                pointer: None,
                drop: None,
                auto_scroll,
            })
            .payload
    }

    /// Recompute target, placement and indicator for a pointer position
    pub fn drag_move(&mut self, tree: &dyn TreeRead, point: Point) -> DragResult<Option<&DropResult>> {
        let scale = self.viewport.zoom();
        let session = self.session.as_mut().ok_or(DragError::NotDragging)?;
        session.pointer = Some(point);
        if let Some(auto_scroll) = session.auto_scroll.as_mut() {
            auto_scroll.update_pointer(point);
        }

        let dest = tree.doc_id();
        let result = find_target(&self.registry, point, &session.payload, dest).map(|target| {
            let mut result = PlacementClassifier::new(&self.config).classify(
                target,
                point,
                session.payload.leading_flavour(),
                scale,
            );

            let at_current_position = resolve_insertion(tree, &result)
                .map(|insertion| is_noop(tree, &session.payload, &insertion))
                .unwrap_or(false);
            if at_current_position {
                result.rect = None;
            }
            result
        });

        let previous = session.drop.take();
        let hover_changed =
            previous.as_ref().map(|r| &r.target_block) != result.as_ref().map(|r| &r.target_block);
        let indicator_changed =
            previous.as_ref().and_then(|r| r.rect) != result.as_ref().and_then(|r| r.rect);

        if hover_changed {
            self.events.publish(DragEvent::HoverChanged {
                target: result.as_ref().map(|r| r.target_block.clone()),
            });
        }
        if indicator_changed {
            self.events.publish(DragEvent::Indicator {
                rect: result.as_ref().and_then(|r| r.rect),
            });
        }

        if let Some(result) = &result {
            tracing::debug!(
                target = %result.target_block,
                placement = ?result.placement,
                indicator = result.rect.is_some(),
                "drop target"
            );
        }

        session.drop = result;
        Ok(session.drop.as_ref())
    }

    /// Advance auto-scroll by one tick; returns the distance scrolled
    pub fn tick_auto_scroll(&mut self) -> DragResult<f64> {
        let session = self.session.as_ref().ok_or(DragError::NotDragging)?;

        match (session.auto_scroll.as_ref(), self.scroll.as_deref_mut()) {
            (Some(auto_scroll), Some(container)) => Ok(auto_scroll.tick(container)),
            _ => Ok(0.0),
        }
    }

    /// Commit the drag at its current drop target
    pub async fn drop<T: DocumentTree>(&mut self, ctx: DropContext<'_, T>) -> DragResult<DropOutcome> {
        let session = self.teardown()?;
        self.committing = true;

        let outcome = self.commit(ctx, &session).await;

        self.committing = false;
        match &outcome {
            Ok(outcome) => {
                if !outcome.inserted().is_empty() {
                    self.selection.set_selection(outcome.inserted().to_vec());
                }
            }
            Err(DragError::Materialization(err)) => {
                tracing::error!(error = %err, "drop failed, rolled back");
                self.selection.set_selection(session.pre_drag_selection.clone());
            }
            Err(err) => {
                tracing::warn!(error = %err, "drop rejected");
            }
        }

        self.events.publish(DragEvent::Ended {
            dropped: matches!(&outcome, Ok(o) if *o != DropOutcome::NoOp),
        });
        outcome
    }

    async fn commit<T: DocumentTree>(
        &self,
        ctx: DropContext<'_, T>,
        session: &DragSession,
    ) -> DragResult<DropOutcome> {
        let result = session
            .drop
            .as_ref()
            .ok_or_else(|| DragError::invalid_target("no drop target"))?;
        let payload = &session.payload;
        let transformer = ContentTransformer::new(&self.pipeline, self.ids.as_ref());

        let dest = ctx.dest();
        let insertion = resolve_insertion(dest, result)?;
        let on_canvas = dest
            .block(&insertion.parent)
            .map(|b| b.flavour == Flavour::Surface)
            .unwrap_or(false);

        if on_canvas {
            let pointer = session.pointer.unwrap_or_default();
            let plan = CanvasPlacementResolver::new(&self.config).plan(
                dest,
                payload,
                pointer,
                self.viewport.as_ref(),
                self.ids.as_ref(),
            )?;
            return transformer.commit_canvas(ctx, payload, plan).await;
        }

        transformer.commit(ctx, payload, insertion).await
    }

    /// Abandon the drag without touching any document
    pub fn cancel(&mut self) -> DragResult<()> {
        self.teardown()?;
        tracing::info!("drag cancelled");
        self.events.publish(DragEvent::Ended { dropped: false });
        Ok(())
    }

    /// End the session: hide indicator and hover, stop auto-scroll
    fn teardown(&mut self) -> DragResult<DragSession> {
        let session = self.session.take().ok_or(DragError::NotDragging)?;

        if let Some(drop) = &session.drop {
            if drop.rect.is_some() {
                self.events.publish(DragEvent::Indicator { rect: None });
            }
            self.events.publish(DragEvent::HoverChanged { target: None });
        }

        Ok(session)
    }
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}
