//! Replay a drag-and-drop scenario against in-memory documents
//!
//! A scenario is a JSON file:
//!
//! ```json
//! {
//!   "documents": [{ "id": "d1", "root": { "id": "root", "flavour": "page", "children": [] } }],
//!   "views": [{ "doc": "d1", "block": "a", "rect": { "left": 0, "top": 0, "width": 400, "height": 30 } }],
//!   "steps": [
//!     { "action": "start", "doc": "d1", "block": "b" },
//!     { "action": "move", "doc": "d1", "x": 20, "y": 5 },
//!     { "action": "drop", "doc": "d1" }
//!   ]
//! }
//! ```
//!
//! Each document gets its own engine. A `move` on an idle engine while
//! another engine is dragging hands the payload over, like a drag crossing
//! from one editor into another.

use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_common::{Point, Rect};
use folio_editor::{
    BlockSelection, BlockView, DragEngine, DragError, DragEvent, DropContext, DropOutcome,
    ScrollRegion,
};
use folio_store::{BlockId, BlockSnapshot, DocId, Document, SequentialGenerator, TreeRead, Workspace};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Scenario file
    pub scenario: PathBuf,

    /// Print the events published to the rendering layer
    #[arg(long)]
    pub events: bool,

    /// Prefix for generated block ids (overrides config)
    #[arg(long)]
    pub id_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub documents: Vec<ScenarioDocument>,
    #[serde(default)]
    pub views: Vec<ScenarioView>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDocument {
    pub id: DocId,
    pub root: BlockSnapshot,
    /// Selection before the first drag
    #[serde(default)]
    pub selection: Vec<BlockId>,
    /// Client rectangle of the scroll container, enables auto-scroll
    #[serde(default)]
    pub scroll: Option<Rect>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioView {
    pub doc: DocId,
    pub block: BlockId,
    pub rect: Rect,
    #[serde(default)]
    pub layer: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    Start { doc: DocId, block: BlockId },
    StartCard { doc: DocId, block: BlockId },
    Move { doc: DocId, x: f64, y: f64 },
    Tick { doc: DocId },
    Drop { doc: DocId },
    Cancel { doc: DocId },
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Unknown document: {0}")]
    UnknownDocument(DocId),

    #[error("Duplicate document: {0}")]
    DuplicateDocument(DocId),

    #[error("Block {block} not found in {doc}")]
    UnknownBlock { doc: DocId, block: BlockId },

    #[error("Invalid document {doc}: {reason}")]
    InvalidDocument { doc: DocId, reason: String },
}

/// What one step did
#[derive(Debug, Clone, PartialEq)]
pub enum StepReport {
    Done(String),
    /// The engine refused the step; the scenario goes on
    Rejected(DragError),
}

#[derive(Debug)]
pub struct Simulation {
    workspace: Workspace,
    engines: HashMap<DocId, DragEngine>,
    events: HashMap<DocId, UnboundedReceiver<DragEvent>>,
}

impl Simulation {
    pub fn new(scenario: &Scenario, config: &Config) -> Result<Self, ScenarioError> {
        let mut workspace = Workspace::new();
        let mut engines = HashMap::new();
        let mut events = HashMap::new();

        for entry in &scenario.documents {
            if workspace.contains(&entry.id) {
                return Err(ScenarioError::DuplicateDocument(entry.id.clone()));
            }
            let doc = Document::from_snapshot(entry.id.clone(), &entry.root).map_err(|e| {
                ScenarioError::InvalidDocument {
                    doc: entry.id.clone(),
                    reason: e.to_string(),
                }
            })?;

            let mut engine = DragEngine::new(config.drag.clone())
                .with_viewport(config.viewport)
                .with_selection(BlockSelection::new(entry.selection.clone()));
            if let Some(rect) = entry.scroll {
                engine = engine.with_scroll_container(ScrollRegion::new(rect));
            }
            if let Some(prefix) = &config.id_prefix {
                engine = engine
                    .with_id_generator(SequentialGenerator::new(format!("{}-{}", prefix, entry.id)));
            }

            let (_, receiver) = engine.subscribe();
            events.insert(entry.id.clone(), receiver);
            engines.insert(entry.id.clone(), engine);
            workspace.insert(doc);
        }

        for view in &scenario.views {
            let doc = workspace
                .get(&view.doc)
                .ok_or_else(|| ScenarioError::UnknownDocument(view.doc.clone()))?;
            let block_view = BlockView::from_block(doc, &view.block, view.rect, view.layer)
                .ok_or_else(|| ScenarioError::UnknownBlock {
                    doc: view.doc.clone(),
                    block: view.block.clone(),
                })?;

            if let Some(engine) = engines.get_mut(&view.doc) {
                if !engine.attach_view(block_view) {
                    tracing::debug!(block = %view.block, "view does not accept drops, skipped");
                }
            }
        }

        Ok(Self {
            workspace,
            engines,
            events,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn engine(&self, doc: &DocId) -> Option<&DragEngine> {
        self.engines.get(doc)
    }

    pub async fn run_step(&mut self, step: &Step) -> Result<StepReport, ScenarioError> {
        let result = match step {
            Step::Start { doc, block } | Step::StartCard { doc, block } => {
                let tree = self
                    .workspace
                    .get(doc)
                    .ok_or_else(|| ScenarioError::UnknownDocument(doc.clone()))?;
                let engine = engine_mut(&mut self.engines, doc)?;
                let started = if matches!(step, Step::StartCard { .. }) {
                    engine.start_card(tree, block)
                } else {
                    engine.start(tree, block)
                };
                started.map(|payload| {
                    format!(
                        "dragging {} from {}",
                        join(&payload.top_level_ids()),
                        payload.from
                    )
                })
            }

            Step::Move { doc, x, y } => {
                if let Err(err) = self.hand_over(doc) {
                    return Ok(StepReport::Rejected(err));
                }
                let tree = self
                    .workspace
                    .get(doc)
                    .ok_or_else(|| ScenarioError::UnknownDocument(doc.clone()))?;
                let engine = engine_mut(&mut self.engines, doc)?;
                engine.drag_move(tree, Point::new(*x, *y)).map(|result| match result {
                    Some(result) => format!(
                        "over {} ({:?}{})",
                        result.target_block,
                        result.placement,
                        if result.rect.is_some() { "" } else { ", no indicator" }
                    ),
                    None => "no drop target".to_string(),
                })
            }

            Step::Tick { doc } => engine_mut(&mut self.engines, doc)?
                .tick_auto_scroll()
                .map(|distance| format!("auto-scrolled {}", distance)),

            Step::Drop { doc } => self.drop(doc).await?,

            Step::Cancel { doc } => engine_mut(&mut self.engines, doc)?
                .cancel()
                .map(|()| "cancelled".to_string()),
        };

        Ok(match result {
            Ok(message) => StepReport::Done(message),
            Err(err) => StepReport::Rejected(err),
        })
    }

    /// Move a payload from whichever engine is dragging to `doc`'s engine
    fn hand_over(&mut self, doc: &DocId) -> Result<(), DragError> {
        let idle = self
            .engines
            .get(doc)
            .map(|engine| engine.payload().is_none())
            .unwrap_or(false);
        if !idle {
            return Ok(());
        }

        let source = self
            .engines
            .iter()
            .find(|(id, engine)| *id != doc && engine.payload().is_some())
            .map(|(id, _)| id.clone());
        let Some(source) = source else {
            return Ok(());
        };

        let Some(source_engine) = self.engines.get_mut(&source) else {
            return Ok(());
        };
        let payload = source_engine.payload().cloned().ok_or(DragError::NotDragging)?;
        source_engine.cancel()?;

        tracing::debug!(from = %source, to = %doc, "drag entered another editor");
        if let Some(engine) = self.engines.get_mut(doc) {
            engine.begin_incoming(payload)?;
        }
        Ok(())
    }

    async fn drop(&mut self, doc: &DocId) -> Result<Result<String, DragError>, ScenarioError> {
        let engine = self
            .engines
            .get_mut(doc)
            .ok_or_else(|| ScenarioError::UnknownDocument(doc.clone()))?;
        let from = engine.payload().map(|payload| payload.from.clone());

        let outcome = match from {
            Some(from) if &from != doc && self.workspace.contains(&from) => {
                let (source, dest) = self
                    .workspace
                    .pair_mut(&from, doc)
                    .ok_or_else(|| ScenarioError::UnknownDocument(doc.clone()))?;
                engine.drop(DropContext::Cross { source, dest }).await
            }
            _ => {
                let dest = self
                    .workspace
                    .get_mut(doc)
                    .ok_or_else(|| ScenarioError::UnknownDocument(doc.clone()))?;
                engine.drop(DropContext::Same(dest)).await
            }
        };

        Ok(outcome.map(|outcome| match outcome {
            DropOutcome::NoOp => "dropped in place, nothing changed".to_string(),
            DropOutcome::Moved(ids) => format!("moved {}", join(&ids)),
            DropOutcome::Copied(ids) => format!("copied as {}", join(&ids)),
            DropOutcome::Merged(ids) => format!("merged {}", join(&ids)),
            DropOutcome::Placed(ids) => format!("placed {} on the canvas", join(&ids)),
        }))
    }

    /// Events published since the last call, per document
    pub fn drain_events(&mut self) -> Vec<(DocId, DragEvent)> {
        let mut drained = Vec::new();
        let mut docs: Vec<DocId> = self.events.keys().cloned().collect();
        docs.sort();
        for doc in docs {
            if let Some(receiver) = self.events.get_mut(&doc) {
                while let Ok(event) = receiver.try_recv() {
                    drained.push((doc.clone(), event));
                }
            }
        }
        drained
    }
}

fn engine_mut<'e>(
    engines: &'e mut HashMap<DocId, DragEngine>,
    doc: &DocId,
) -> Result<&'e mut DragEngine, ScenarioError> {
    engines
        .get_mut(doc)
        .ok_or_else(|| ScenarioError::UnknownDocument(doc.clone()))
}

fn join(ids: &[BlockId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn simulate(args: SimulateArgs, cwd: &Path) -> Result<()> {
    let mut config = Config::load(cwd)?;
    if args.id_prefix.is_some() {
        config.id_prefix = args.id_prefix.clone();
    }

    let path = cwd.join(&args.scenario);
    let content = fs::read_to_string(&path)
        .map_err(|e| anyhow!("Cannot read {}: {}", path.display(), e))?;
    let scenario: Scenario = serde_json::from_str(&content)?;

    println!("{}", "🖱️  Simulating drag scenario...".bright_blue().bold());

    let mut simulation = Simulation::new(&scenario, &config)?;
    for (i, step) in scenario.steps.iter().enumerate() {
        let report = simulation.run_step(step).await?;
        match report {
            StepReport::Done(message) => println!("  {} {:>2}. {}", "✓".green(), i + 1, message),
            StepReport::Rejected(err) => {
                println!("  {} {:>2}. {}", "✗".yellow(), i + 1, err.to_string().yellow())
            }
        }

        let events = simulation.drain_events();
        if args.events {
            for (doc, event) in events {
                println!("       {}", format!("[{}] {:?}", doc, event).dimmed());
            }
        }
    }

    println!();
    for id in simulation.workspace().ids() {
        if let Some(doc) = simulation.workspace().get(&id) {
            print_document(doc);
        }
    }

    Ok(())
}

fn print_document(doc: &Document) {
    println!("{} {}", "Document".bold(), doc.doc_id().to_string().bright_white());
    if let Some(root) = doc.root_id() {
        print_block(doc, root, 1);
    }
    println!();
}

fn print_block(doc: &Document, id: &BlockId, depth: usize) {
    let Some(block) = doc.block(id) else {
        return;
    };

    let mut details = Vec::new();
    for key in ["type", "order", "xywh", "text"] {
        if let Some(value) = block.props.get(key) {
            details.push(format!("{}={}", key, value));
        }
    }

    println!(
        "{}{} {}{}",
        "  ".repeat(depth),
        block.id.as_str().bold(),
        format!("({})", block.flavour).cyan(),
        if details.is_empty() {
            String::new()
        } else {
            format!(" {}", details.join(" ").dimmed())
        }
    );

    for child in &block.children {
        print_block(doc, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(json: serde_json::Value) -> Scenario {
        serde_json::from_value(json).unwrap()
    }

    fn config() -> Config {
        Config {
            id_prefix: Some("sim".to_string()),
            ..Config::default()
        }
    }

    fn children(simulation: &Simulation, doc: &str, parent: &str) -> Vec<String> {
        simulation
            .workspace()
            .get(&DocId::from(doc))
            .unwrap()
            .children_of(&BlockId::from(parent))
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    fn row(i: usize) -> serde_json::Value {
        serde_json::json!({ "left": 0, "top": 40 * i, "width": 400, "height": 30 })
    }

    #[tokio::test]
    async fn test_reorder_within_document() {
        let scenario = scenario(serde_json::json!({
            "documents": [{
                "id": "d1",
                "root": { "id": "root", "flavour": "page", "children": [
                    { "id": "A", "flavour": "note" },
                    { "id": "B", "flavour": "note" }
                ]}
            }],
            "views": [
                { "doc": "d1", "block": "A", "rect": row(0) },
                { "doc": "d1", "block": "B", "rect": row(1) }
            ],
            "steps": [
                { "action": "start", "doc": "d1", "block": "B" },
                { "action": "move", "doc": "d1", "x": 20, "y": 2 },
                { "action": "drop", "doc": "d1" }
            ]
        }));

        let mut simulation = Simulation::new(&scenario, &config()).unwrap();
        for step in &scenario.steps {
            let report = simulation.run_step(step).await.unwrap();
            assert!(matches!(report, StepReport::Done(_)), "{:?}", report);
        }

        assert_eq!(children(&simulation, "d1", "root"), vec!["B", "A"]);
        assert!(!simulation.drain_events().is_empty());
    }

    #[tokio::test]
    async fn test_drag_hands_over_between_documents() {
        let scenario = scenario(serde_json::json!({
            "documents": [
                { "id": "d1", "root": { "id": "r1", "flavour": "page", "children": [
                    { "id": "n1", "flavour": "note", "children": [{ "id": "x1", "flavour": "paragraph" }] }
                ]}},
                { "id": "d2", "root": { "id": "r2", "flavour": "page", "children": [
                    { "id": "n2", "flavour": "note", "children": [{ "id": "e", "flavour": "paragraph" }] }
                ]}}
            ],
            "views": [
                { "doc": "d1", "block": "x1", "rect": row(0) },
                { "doc": "d2", "block": "e", "rect": row(0) }
            ],
            "steps": [
                { "action": "start", "doc": "d1", "block": "x1" },
                { "action": "move", "doc": "d2", "x": 20, "y": 28 },
                { "action": "drop", "doc": "d2" }
            ]
        }));

        let mut simulation = Simulation::new(&scenario, &config()).unwrap();
        let mut reports = Vec::new();
        for step in &scenario.steps {
            reports.push(simulation.run_step(step).await.unwrap());
        }

        assert_eq!(
            reports.last(),
            Some(&StepReport::Done("copied as sim-d2-0".to_string()))
        );
        assert_eq!(children(&simulation, "d1", "n1"), vec!["x1"]);
        assert_eq!(children(&simulation, "d2", "n2"), vec!["e", "sim-d2-0"]);
        assert!(simulation.engine(&DocId::from("d1")).unwrap().payload().is_none());
    }

    #[tokio::test]
    async fn test_rejected_steps_do_not_stop_the_scenario() {
        let scenario = scenario(serde_json::json!({
            "documents": [{
                "id": "d1",
                "root": { "id": "root", "flavour": "page", "children": [
                    { "id": "n", "flavour": "note", "children": [{ "id": "a", "flavour": "paragraph" }] }
                ]}
            }],
            "steps": [
                { "action": "drop", "doc": "d1" },
                { "action": "startCard", "doc": "d1", "block": "a" },
                { "action": "tick", "doc": "d1" }
            ]
        }));

        let mut simulation = Simulation::new(&scenario, &config()).unwrap();
        for step in &scenario.steps {
            let report = simulation.run_step(step).await.unwrap();
            assert!(matches!(report, StepReport::Rejected(_)), "{:?}", report);
        }
    }

    #[tokio::test]
    async fn test_unknown_document_is_fatal() {
        let scenario = scenario(serde_json::json!({
            "documents": [],
            "steps": [{ "action": "cancel", "doc": "ghost" }]
        }));

        let mut simulation = Simulation::new(&scenario, &config()).unwrap();
        let err = simulation.run_step(&scenario.steps[0]).await.unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownDocument(_)));
    }

    #[test]
    fn test_view_for_missing_block() {
        let scenario = scenario(serde_json::json!({
            "documents": [{ "id": "d1", "root": { "id": "root", "flavour": "page" } }],
            "views": [{ "doc": "d1", "block": "nope", "rect": row(0) }],
            "steps": []
        }));

        let err = Simulation::new(&scenario, &config()).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownBlock { .. }));
    }
}
