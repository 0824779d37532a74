//! # Canvas Placement
//!
//! Drops whose destination is the freeform canvas are placed by
//! coordinates instead of tree position.
//!
//! - A single card (attachment, bookmark, embed) is sized from the card
//!   table by its `style` prop and goes straight onto the surface
//! - A single image keeps its intrinsic size
//! - Anything else is wrapped in a freshly created note at the drop point
//!
//! Notes themselves cannot be dropped onto the canvas.

use crate::collaborators::CanvasViewport;
use crate::source::DragPayload;
use crate::{DragConfig, DragError, DragResult};
use folio_common::{Bound, Point};
use folio_store::{BlockId, Flavour, IdGenerator, NewBlock, Props, Snapshot, TreeRead};
use serde_json::json;

pub const DEFAULT_CARD_STYLE: &str = "horizontal";

/// Card size (width, height) for an embed card style
pub fn card_size(style: &str) -> (f64, f64) {
    match style {
        "list" => (752.0, 46.0),
        "vertical" => (364.0, 390.0),
        "cube" => (170.0, 114.0),
        "cubeThick" => (170.0, 132.0),
        "video" | "figma" | "html" => (752.0, 544.0),
        "syncedDoc" => (752.0, 455.0),
        "pdf" => (537.0, 759.0),
        _ => (752.0, 116.0),
    }
}

/// Where and what a canvas drop inserts
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasPlan {
    /// Place the (re-propped) snapshot directly on the surface
    Surface { surface: BlockId, snapshot: Snapshot },

    /// Create `note` under `root`, then insert the snapshot into it
    Note {
        root: BlockId,
        note: NewBlock,
        snapshot: Snapshot,
    },
}

impl CanvasPlan {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            CanvasPlan::Surface { snapshot, .. } | CanvasPlan::Note { snapshot, .. } => snapshot,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CanvasPlacementResolver<'c> {
    config: &'c DragConfig,
}

impl<'c> CanvasPlacementResolver<'c> {
    pub fn new(config: &'c DragConfig) -> Self {
        Self { config }
    }

    pub fn plan(
        &self,
        dest: &dyn TreeRead,
        payload: &DragPayload,
        client: Point,
        viewport: &dyn CanvasViewport,
        ids: &dyn IdGenerator,
    ) -> DragResult<CanvasPlan> {
        let first = payload.snapshot.first().ok_or(DragError::EmptySnapshot)?;
        if first.flavour == Flavour::Note {
            return Err(DragError::invalid_target("notes cannot be dropped on the canvas"));
        }

        let model = viewport.to_model(client);
        let scale = viewport.note_scale();

        if payload.snapshot.content.len() == 1 {
            let size = if first.flavour.is_card() {
                let style = first
                    .props
                    .get("style")
                    .and_then(|v| v.as_str())
                    .unwrap_or(DEFAULT_CARD_STYLE);
                Some(card_size(style))
            } else if first.flavour == Flavour::Image {
                let fallback = self.config.image_fallback_size;
                Some((
                    number_prop(&first.props, "width").unwrap_or(fallback),
                    number_prop(&first.props, "height").unwrap_or(fallback),
                ))
            } else {
                None
            };

            if let Some((width, height)) = size {
                let surface = dest
                    .surface_id()
                    .cloned()
                    .ok_or_else(|| DragError::invalid_target("document has no canvas surface"))?;

                let (width, height) = (width * scale, height * scale);
                let bound = Bound::new(model.x, model.y, width, height);

                let mut snapshot = payload.snapshot.clone();
                if let Some(block) = snapshot.content.first_mut() {
                    block.props.insert("xywh".to_string(), json!(bound.serialize()));
                    block.props.insert("width".to_string(), json!(width));
                    block.props.insert("height".to_string(), json!(height));
                }

                tracing::debug!(flavour = %first.flavour, %bound, "placing block on canvas");
                return Ok(CanvasPlan::Surface { surface, snapshot });
            }
        }

        let root = dest
            .root_id()
            .cloned()
            .ok_or_else(|| DragError::invalid_target("document has no root"))?;

        let bound = Bound::new(
            model.x - self.config.drop_offset_x * scale,
            model.y - self.config.drop_offset_y * scale,
            self.config.note_width * scale,
            self.config.note_height * scale,
        );

        let mut props = Props::new();
        props.insert("xywh".to_string(), json!(bound.serialize()));
        props.insert("edgeless".to_string(), json!({ "scale": scale }));

        tracing::debug!(%bound, "wrapping canvas drop in a new note");
        Ok(CanvasPlan::Note {
            root,
            note: NewBlock::new(ids.next_id(), Flavour::Note).with_props(props),
            snapshot: payload.snapshot.clone(),
        })
    }
}

fn number_prop(props: &Props, key: &str) -> Option<f64> {
    props
        .get(key)
        .and_then(|v| v.as_f64())
        .filter(|n| *n > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Viewport;
    use folio_store::{BlockSnapshot, DocId, Document, SequentialGenerator};

    fn doc() -> Document {
        let root: BlockSnapshot = serde_json::from_value(json!({
            "id": "root",
            "flavour": "page",
            "children": [
                { "id": "note", "flavour": "note" },
                { "id": "surface", "flavour": "surface" }
            ]
        }))
        .unwrap();
        Document::from_snapshot("doc", &root).unwrap()
    }

    fn payload(content: serde_json::Value) -> DragPayload {
        let snapshot: Snapshot = serde_json::from_value(json!({ "content": content })).unwrap();
        DragPayload::new(snapshot, DocId::from("src")).unwrap()
    }

    fn viewport(scale: f64) -> Viewport {
        Viewport {
            zoom: 2.0,
            pan: Point::new(1000.0, 500.0),
            origin: Point::new(0.0, 0.0),
            note_scale: scale,
        }
    }

    #[test]
    fn test_card_table() {
        assert_eq!(card_size("horizontal"), (752.0, 116.0));
        assert_eq!(card_size("cubeThick"), (170.0, 132.0));
        assert_eq!(card_size("figma"), (752.0, 544.0));
        assert_eq!(card_size("pdf"), (537.0, 759.0));
        assert_eq!(card_size("unknown"), (752.0, 116.0));
    }

    #[test]
    fn test_card_is_sized_by_style() {
        let config = DragConfig::default();
        let generator = SequentialGenerator::new("n");
        let plan = CanvasPlacementResolver::new(&config)
            .plan(
                &doc(),
                &payload(json!([{ "id": "b", "flavour": "bookmark", "props": { "style": "vertical" } }])),
                Point::new(100.0, 40.0),
                &viewport(0.5),
                &generator,
            )
            .unwrap();

        let CanvasPlan::Surface { surface, snapshot } = plan else {
            panic!("expected a surface placement");
        };
        assert_eq!(surface, BlockId::from("surface"));
        let props = &snapshot.content[0].props;
        assert_eq!(props.get("xywh"), Some(&json!("[1050,520,182,195]")));
        assert_eq!(props.get("width"), Some(&json!(182.0)));
        assert_eq!(props.get("height"), Some(&json!(195.0)));
    }

    #[test]
    fn test_image_uses_intrinsic_size_or_fallback() {
        let config = DragConfig::default();
        let generator = SequentialGenerator::new("n");
        let resolver = CanvasPlacementResolver::new(&config);

        let plan = resolver
            .plan(
                &doc(),
                &payload(json!([{ "id": "i", "flavour": "image", "props": { "width": 300 } }])),
                Point::new(0.0, 0.0),
                &viewport(1.0),
                &generator,
            )
            .unwrap();
        let props = &plan.snapshot().content[0].props;
        assert_eq!(props.get("width"), Some(&json!(300.0)));
        assert_eq!(props.get("height"), Some(&json!(100.0)));
    }

    #[test]
    fn test_other_content_gets_a_new_note() {
        let config = DragConfig::default();
        let generator = SequentialGenerator::new("n");
        let plan = CanvasPlacementResolver::new(&config)
            .plan(
                &doc(),
                &payload(json!([{ "id": "p", "flavour": "paragraph" }])),
                Point::new(200.0, 100.0),
                &viewport(2.0),
                &generator,
            )
            .unwrap();

        let CanvasPlan::Note { root, note, snapshot } = plan else {
            panic!("expected a note placement");
        };
        assert_eq!(root, BlockId::from("root"));
        assert_eq!(note.id, BlockId::from("n-0"));
        assert_eq!(note.props.get("xywh"), Some(&json!("[1040,470,1600,184]")));
        assert_eq!(note.props.get("edgeless"), Some(&json!({ "scale": 2.0 })));
        assert_eq!(snapshot.content[0].id, BlockId::from("p"));
    }

    #[test]
    fn test_notes_are_rejected() {
        let config = DragConfig::default();
        let generator = SequentialGenerator::new("n");
        let result = CanvasPlacementResolver::new(&config).plan(
            &doc(),
            &payload(json!([{ "id": "other-note", "flavour": "note" }])),
            Point::new(0.0, 0.0),
            &viewport(1.0),
            &generator,
        );
        assert!(matches!(result, Err(DragError::InvalidTarget(_))));
    }
}
