//! Drop target resolution for a pointer position

use crate::registry::{BlockView, ViewRegistry};
use crate::source::DragPayload;
use crate::{DragError, DragResult};
use folio_common::Point;
use folio_store::DocId;

/// Whether `view` may receive `payload` in document `dest`
///
/// Rejects dropping a dragged block (or any of its descendants) onto itself
/// within the same document, and structurally closed containers.
pub fn can_drop(view: &BlockView, payload: &DragPayload, dest: &DocId) -> DragResult<()> {
    if payload.is_from(dest) && payload.contains(&view.block_id) {
        return Err(DragError::invalid_target(format!(
            "{} is part of the dragged content",
            view.block_id
        )));
    }

    if view.flavour.is_closed_container() {
        return Err(DragError::invalid_target(format!(
            "{} does not accept dropped blocks",
            view.flavour
        )));
    }

    Ok(())
}

/// The drop target under `point`, if any
///
/// Only the topmost view is considered; when it is rejected there is no
/// target at all.
pub fn find_target<'r>(
    registry: &'r ViewRegistry,
    point: Point,
    payload: &DragPayload,
    dest: &DocId,
) -> Option<&'r BlockView> {
    let view = registry.hit_test(point)?;

    match can_drop(view, payload, dest) {
        Ok(()) => Some(view),
        Err(err) => {
            tracing::debug!(target = %view.block_id, reason = %err, "drop target rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::Rect;
    use folio_store::{BlockId, BlockSnapshot, Flavour, Snapshot};

    fn payload(from: &str) -> DragPayload {
        DragPayload::new(
            Snapshot {
                content: vec![BlockSnapshot {
                    id: BlockId::from("list"),
                    flavour: Flavour::List,
                    props: Default::default(),
                    children: vec![BlockSnapshot {
                        id: BlockId::from("child"),
                        flavour: Flavour::Paragraph,
                        props: Default::default(),
                        children: vec![],
                    }],
                }],
            },
            DocId::from(from),
        )
        .unwrap()
    }

    fn registry(views: &[(&str, Flavour, usize)]) -> ViewRegistry {
        let mut registry = ViewRegistry::new();
        for (id, flavour, depth) in views {
            registry.attach(BlockView {
                block_id: BlockId::from(*id),
                role: flavour.default_role(),
                flavour: flavour.clone(),
                canvas_resident: false,
                rect: Rect::from_lwth(0.0, 100.0, 0.0, 100.0),
                layer: 0,
                depth: *depth,
            });
        }
        registry
    }

    #[test]
    fn test_self_drop_is_rejected_within_document() {
        let registry = registry(&[("note", Flavour::Note, 1), ("child", Flavour::Paragraph, 3)]);
        let point = Point::new(50.0, 50.0);

        assert!(find_target(&registry, point, &payload("doc"), &DocId::from("doc")).is_none());

        // Same ids in another document are unrelated blocks
        let target = find_target(&registry, point, &payload("other"), &DocId::from("doc"));
        assert_eq!(target.unwrap().block_id, BlockId::from("child"));
    }

    #[test]
    fn test_closed_container_is_rejected_without_fall_through() {
        let registry = registry(&[("note", Flavour::Note, 1), ("db", Flavour::Database, 2)]);
        assert!(find_target(&registry, Point::new(50.0, 50.0), &payload("doc"), &DocId::from("doc")).is_none());
    }
}
