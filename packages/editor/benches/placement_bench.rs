use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_common::{Point, Rect};
use folio_editor::{build_payload, find_target, BlockView, DragConfig, PlacementClassifier, ViewRegistry};
use folio_store::{BlockId, BlockSnapshot, Document, TreeRead};
use serde_json::json;

fn long_note(blocks: usize) -> Document {
    let children: Vec<_> = (0..blocks)
        .map(|i| json!({ "id": format!("p{}", i), "flavour": "paragraph" }))
        .collect();
    let root: BlockSnapshot = serde_json::from_value(json!({
        "id": "root",
        "flavour": "page",
        "children": [{ "id": "note", "flavour": "note", "children": children }]
    }))
    .unwrap();
    Document::from_snapshot("bench", &root).unwrap()
}

fn registry_for(doc: &Document) -> ViewRegistry {
    let mut registry = ViewRegistry::new();
    let note = BlockId::from("note");
    let height = 30.0 * doc.children_of(&note).len() as f64;
    registry.attach(BlockView::from_block(doc, &note, Rect::from_lwth(0.0, 800.0, 0.0, height), 0).unwrap());

    for (i, id) in doc.children_of(&note).iter().enumerate() {
        let rect = Rect::from_lwth(10.0, 780.0, 30.0 * i as f64, 28.0);
        registry.attach(BlockView::from_block(doc, id, rect, 0).unwrap());
    }
    registry
}

fn drag_move_hot_path(c: &mut Criterion) {
    let doc = long_note(500);
    let registry = registry_for(&doc);
    let payload = build_payload(&doc, &[BlockId::from("p0")]).unwrap();
    let config = DragConfig::default();
    let classifier = PlacementClassifier::new(&config);

    c.bench_function("drag_move_500_blocks", |b| {
        b.iter(|| {
            let point = black_box(Point::new(200.0, 7_512.0));
            find_target(&registry, point, &payload, doc.doc_id())
                .map(|target| classifier.classify(target, point, payload.leading_flavour(), 1.0))
        })
    });
}

fn hit_test_only(c: &mut Criterion) {
    let doc = long_note(2_000);
    let registry = registry_for(&doc);

    c.bench_function("hit_test_2000_views", |b| {
        b.iter(|| registry.hit_test(black_box(Point::new(200.0, 45_010.0))))
    });
}

criterion_group!(benches, drag_move_hot_path, hit_test_only);
criterion_main!(benches);
