//! # Placement Classification
//!
//! Turns (target view, pointer, dragged content) into a [`DropResult`]:
//! where the content lands relative to the target and where the drop
//! indicator is drawn.
//!
//! ## Rules
//!
//! The closest edge is picked among the target's allowed edges (top and
//! bottom, plus right for list items):
//!
//! 1. List item, right edge → `In` (nest), indicator inset by the nest indent
//! 2. Note target with note-compatible content → `In`
//! 3. Otherwise `Before` for the top edge, `After` for the bottom edge
//!
//! Canvas targets get a result but no indicator; the drop is placed by
//! coordinates.

use crate::registry::BlockView;
use crate::DragConfig;
use folio_common::{Point, Rect};
use folio_store::schema::can_contain;
use folio_store::{BlockId, Flavour};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    After,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropResult {
    pub placement: Placement,
    /// Indicator rectangle; `None` hides the indicator
    pub rect: Option<Rect>,
    pub target_block: BlockId,
    pub target_rect: Rect,
}

/// Edge of `rect` nearest to `point`, among `allowed`
pub fn closest_edge(rect: Rect, point: Point, allowed: &[Edge]) -> Edge {
    allowed
        .iter()
        .copied()
        .map(|edge| {
            let distance = match edge {
                Edge::Top => (point.y - rect.top).abs(),
                Edge::Bottom => (point.y - rect.bottom()).abs(),
                Edge::Right => (point.x - rect.right()).abs(),
            };
            (edge, distance)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(edge, _)| edge)
        .unwrap_or(Edge::Bottom)
}

#[derive(Debug, Clone, Copy)]
pub struct PlacementClassifier<'c> {
    config: &'c DragConfig,
}

impl<'c> PlacementClassifier<'c> {
    pub fn new(config: &'c DragConfig) -> Self {
        Self { config }
    }

    pub fn classify(
        &self,
        target: &BlockView,
        point: Point,
        leading: Option<&Flavour>,
        scale: f64,
    ) -> DropResult {
        let rect = target.rect;
        let thickness = self.config.indicator_thickness * scale;

        let result = |placement, indicator| DropResult {
            placement,
            rect: indicator,
            target_block: target.block_id.clone(),
            target_rect: rect,
        };

        if target.flavour == Flavour::Surface {
            return result(Placement::In, None);
        }

        let edges: &[Edge] = if target.flavour == Flavour::List {
            &[Edge::Top, Edge::Bottom, Edge::Right]
        } else {
            &[Edge::Top, Edge::Bottom]
        };
        let edge = closest_edge(rect, point, edges);

        if edge == Edge::Right {
            let indent = self.config.nest_indent;
            let indicator = Rect::from_lwth(
                rect.left + indent,
                rect.width - indent,
                rect.bottom(),
                thickness,
            );
            return result(Placement::In, self.visible(target, indicator));
        }

        let into_note = target.flavour == Flavour::Note
            && leading
                .map(|flavour| can_contain(&Flavour::Note, flavour))
                .unwrap_or(false);

        let placement = if into_note {
            Placement::In
        } else if edge == Edge::Top {
            Placement::Before
        } else {
            Placement::After
        };

        let y = if edge == Edge::Top {
            rect.top - thickness
        } else {
            rect.bottom()
        };
        let indicator = Rect::from_lwth(rect.left, rect.width, y, thickness);

        result(placement, self.visible(target, indicator))
    }

    fn visible(&self, target: &BlockView, indicator: Rect) -> Option<Rect> {
        (!target.canvas_resident).then_some(indicator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::Role;

    fn view(flavour: Flavour) -> BlockView {
        BlockView {
            block_id: BlockId::from("target"),
            role: flavour.default_role(),
            flavour,
            canvas_resident: false,
            rect: Rect::from_lwth(100.0, 400.0, 100.0, 40.0),
            layer: 0,
            depth: 2,
        }
    }

    #[test]
    fn test_closest_edge() {
        let rect = Rect::from_lwth(0.0, 100.0, 0.0, 40.0);
        assert_eq!(closest_edge(rect, Point::new(10.0, 5.0), &[Edge::Top, Edge::Bottom]), Edge::Top);
        assert_eq!(closest_edge(rect, Point::new(10.0, 30.0), &[Edge::Top, Edge::Bottom]), Edge::Bottom);
        assert_eq!(
            closest_edge(rect, Point::new(98.0, 20.0), &[Edge::Top, Edge::Bottom, Edge::Right]),
            Edge::Right
        );
    }

    #[test]
    fn test_before_and_after_indicators() {
        let config = DragConfig::default();
        let classifier = PlacementClassifier::new(&config);
        let target = view(Flavour::Paragraph);

        let before = classifier.classify(&target, Point::new(200.0, 105.0), Some(&Flavour::Paragraph), 1.0);
        assert_eq!(before.placement, Placement::Before);
        assert_eq!(before.rect, Some(Rect::from_lwth(100.0, 400.0, 97.0, 3.0)));

        let after = classifier.classify(&target, Point::new(200.0, 135.0), Some(&Flavour::Paragraph), 2.0);
        assert_eq!(after.placement, Placement::After);
        assert_eq!(after.rect, Some(Rect::from_lwth(100.0, 400.0, 140.0, 6.0)));
        assert_eq!(after.target_rect, target.rect);
    }

    #[test]
    fn test_list_right_edge_nests() {
        let config = DragConfig::default();
        let classifier = PlacementClassifier::new(&config);

        let result = classifier.classify(&view(Flavour::List), Point::new(495.0, 120.0), Some(&Flavour::Paragraph), 1.0);
        assert_eq!(result.placement, Placement::In);
        assert_eq!(result.rect, Some(Rect::from_lwth(126.0, 374.0, 140.0, 3.0)));
    }

    #[test]
    fn test_note_accepts_content_but_not_notes() {
        let config = DragConfig::default();
        let classifier = PlacementClassifier::new(&config);
        let note = view(Flavour::Note);

        let content = classifier.classify(&note, Point::new(200.0, 135.0), Some(&Flavour::List), 1.0);
        assert_eq!(content.placement, Placement::In);
        assert_eq!(content.rect, Some(Rect::from_lwth(100.0, 400.0, 140.0, 3.0)));

        let other_note = classifier.classify(&note, Point::new(200.0, 105.0), Some(&Flavour::Note), 1.0);
        assert_eq!(other_note.placement, Placement::Before);
        assert_eq!(note.role, Role::Hub);
    }

    #[test]
    fn test_canvas_targets_have_no_indicator() {
        let config = DragConfig::default();
        let classifier = PlacementClassifier::new(&config);

        let surface = classifier.classify(&view(Flavour::Surface), Point::new(200.0, 120.0), Some(&Flavour::Image), 1.0);
        assert_eq!(surface.placement, Placement::In);
        assert_eq!(surface.rect, None);

        let mut image = view(Flavour::Image);
        image.canvas_resident = true;
        let result = classifier.classify(&image, Point::new(200.0, 135.0), Some(&Flavour::Image), 1.0);
        assert_eq!(result.placement, Placement::After);
        assert_eq!(result.rect, None);
    }
}
