use lopdf::{Dictionary, Document, Object, Stream};
use pdf_collate::{
    CollateError, PageId, ResultSequence, SourceId, SourceRegistry, compose, export,
    probe_page_count,
};

fn create_test_pdf(num_pages: usize, width: f32, height: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

/// Register each byte buffer as a fully loaded source.
fn registry_with(documents: Vec<(&str, Vec<u8>)>) -> (SourceRegistry, Vec<SourceId>) {
    let mut registry = SourceRegistry::new();
    let mut ids = Vec::new();
    for (name, bytes) in documents {
        let page_count = probe_page_count(&bytes).unwrap();
        let id = registry.add_source(name, bytes);
        registry.set_page_count(id, page_count);
        registry.finish_loading(id);
        ids.push(id);
    }
    (registry, ids)
}

fn output_pages(bytes: &[u8]) -> Vec<(f32, f32, bool)> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let dict = doc.get_dictionary(page_id).unwrap();
            let mb = dict.get(b"MediaBox").unwrap().as_array().unwrap();
            let width = as_f32(&mb[2]);
            let height = as_f32(&mb[3]);

            let has_xobject = dict
                .get(b"Resources")
                .ok()
                .and_then(|r| resolve_dict(&doc, r))
                .and_then(|res| res.get(b"XObject").ok().cloned())
                .map(|x| match x {
                    Object::Dictionary(d) => !d.is_empty(),
                    _ => false,
                })
                .unwrap_or(false);

            (width, height, has_xobject)
        })
        .collect()
}

fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(id) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok().cloned()),
        _ => None,
    }
}

fn as_f32(obj: &Object) -> f32 {
    match obj {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r,
        other => panic!("not a number: {other:?}"),
    }
}

#[tokio::test]
async fn export_empty_sequence_errors() {
    let (registry, _) = registry_with(vec![("a.pdf", create_test_pdf(1, 612.0, 792.0))]);
    let sequence = ResultSequence::new();

    match export(&sequence, &registry).await {
        Err(CollateError::EmptySequence) => {}
        other => panic!("expected EmptySequence, got {other:?}"),
    }
}

#[tokio::test]
async fn uniform_sources_are_copied_verbatim() {
    let (registry, ids) = registry_with(vec![
        ("a.pdf", create_test_pdf(2, 612.0, 792.0)),
        ("b.pdf", create_test_pdf(1, 612.0, 792.0)),
    ]);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[
        PageId::new(ids[0], 1),
        PageId::new(ids[1], 1),
        PageId::new(ids[0], 2),
    ]);

    let exported = export(&sequence, &registry).await.unwrap();
    assert_eq!(exported.stats.pages_written, 3);
    assert_eq!(exported.stats.pages_skipped, 0);

    let pages = output_pages(&exported.bytes);
    assert_eq!(pages.len(), 3);
    for (width, height, has_xobject) in pages {
        assert!((width - 612.0).abs() < 0.01);
        assert!((height - 792.0).abs() < 0.01);
        // Identical geometry means the fidelity path: no embedded XObject.
        assert!(!has_xobject);
    }
}

#[tokio::test]
async fn mismatched_pages_are_scaled_to_first_page_geometry() {
    let (registry, ids) = registry_with(vec![
        ("a.pdf", create_test_pdf(1, 600.0, 800.0)),
        ("b.pdf", create_test_pdf(1, 300.0, 500.0)),
    ]);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[PageId::new(ids[0], 1), PageId::new(ids[1], 1)]);

    let exported = export(&sequence, &registry).await.unwrap();
    let pages = output_pages(&exported.bytes);
    assert_eq!(pages.len(), 2);

    // Both output pages carry the target geometry from the first entry.
    for (width, height, _) in &pages {
        assert!((width - 600.0).abs() < 0.01);
        assert!((height - 800.0).abs() < 0.01);
    }
    // First page verbatim, second re-placed through an XObject.
    assert!(!pages[0].2);
    assert!(pages[1].2);
}

#[tokio::test]
async fn duplicate_entries_produce_duplicate_pages() {
    let (registry, ids) = registry_with(vec![("a.pdf", create_test_pdf(1, 200.0, 200.0))]);
    let page = PageId::new(ids[0], 1);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[page, page]);

    let exported = export(&sequence, &registry).await.unwrap();
    assert_eq!(exported.stats.pages_written, 2);
    assert_eq!(output_pages(&exported.bytes).len(), 2);
}

#[tokio::test]
async fn dangling_references_are_skipped_not_fatal() {
    let (mut registry, ids) = registry_with(vec![
        ("a.pdf", create_test_pdf(2, 612.0, 792.0)),
        ("b.pdf", create_test_pdf(1, 612.0, 792.0)),
    ]);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[
        PageId::new(ids[0], 1),
        PageId::new(ids[1], 1),
        PageId::new(ids[0], 2),
    ]);

    // Removing a referenced source must not break a later export.
    registry.remove_source(ids[1]);

    let exported = export(&sequence, &registry).await.unwrap();
    assert_eq!(exported.stats.pages_written, 2);
    assert_eq!(exported.stats.pages_skipped, 1);
    assert_eq!(output_pages(&exported.bytes).len(), 2);
}

#[tokio::test]
async fn invalid_page_numbers_are_skipped() {
    let (registry, ids) = registry_with(vec![("a.pdf", create_test_pdf(2, 612.0, 792.0))]);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[PageId::new(ids[0], 1), PageId::new(ids[0], 99)]);

    let exported = export(&sequence, &registry).await.unwrap();
    assert_eq!(exported.stats.pages_written, 1);
    assert_eq!(exported.stats.pages_skipped, 1);
}

#[tokio::test]
async fn export_fails_when_every_entry_dangles() {
    let (mut registry, ids) = registry_with(vec![("a.pdf", create_test_pdf(1, 612.0, 792.0))]);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[PageId::new(ids[0], 1)]);
    registry.remove_source(ids[0]);

    match export(&sequence, &registry).await {
        Err(CollateError::EmptySequence) => {}
        other => panic!("expected EmptySequence, got {other:?}"),
    }
}

#[tokio::test]
async fn target_geometry_comes_from_first_resolvable_entry() {
    let (mut registry, ids) = registry_with(vec![
        ("a.pdf", create_test_pdf(1, 600.0, 800.0)),
        ("b.pdf", create_test_pdf(1, 300.0, 500.0)),
    ]);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[PageId::new(ids[0], 1), PageId::new(ids[1], 1)]);

    // The first entry dangles; the target must come from B, not default to A.
    registry.remove_source(ids[0]);

    let exported = export(&sequence, &registry).await.unwrap();
    assert_eq!(exported.stats.pages_written, 1);
    assert_eq!(exported.stats.pages_skipped, 1);

    let pages = output_pages(&exported.bytes);
    assert!((pages[0].0 - 300.0).abs() < 0.01);
    assert!((pages[0].1 - 500.0).abs() < 0.01);
    assert!(!pages[0].2);
}

#[tokio::test]
async fn errored_sources_dangle_instead_of_failing_export() {
    let (mut registry, ids) = registry_with(vec![("a.pdf", create_test_pdf(1, 612.0, 792.0))]);
    let bad = registry.add_source("bad.pdf", b"not a pdf".to_vec());
    registry.set_error(bad, "decode failed");

    let mut sequence = ResultSequence::new();
    sequence.append_all(&[PageId::new(ids[0], 1), PageId::new(bad, 1)]);

    let exported = export(&sequence, &registry).await.unwrap();
    assert_eq!(exported.stats.pages_written, 1);
    assert_eq!(exported.stats.pages_skipped, 1);
}

#[tokio::test]
async fn drag_scenario_exports_in_result_order() {
    use pdf_collate::{DragTransfer, DropRole, DropTarget, apply_transfer};

    let (registry, ids) = registry_with(vec![
        ("a.pdf", create_test_pdf(3, 600.0, 800.0)),
        ("b.pdf", create_test_pdf(2, 300.0, 500.0)),
    ]);
    let a2 = PageId::new(ids[0], 2);
    let b1 = PageId::new(ids[1], 1);
    let mut sequence = ResultSequence::new();

    for (origin_index, destination, page) in [(1, 0, a2), (0, 0, b1)] {
        apply_transfer(
            &mut sequence,
            &DragTransfer {
                origin: DropRole::Source,
                origin_index,
                destination: Some(DropTarget {
                    role: DropRole::Result,
                    index: destination,
                }),
                page,
            },
        );
    }
    assert_eq!(sequence.as_slice(), &[b1, a2]);

    // Move A2 to the front, then export.
    apply_transfer(
        &mut sequence,
        &DragTransfer {
            origin: DropRole::Result,
            origin_index: 1,
            destination: Some(DropTarget {
                role: DropRole::Result,
                index: 0,
            }),
            page: a2,
        },
    );
    assert_eq!(sequence.as_slice(), &[a2, b1]);

    let exported = export(&sequence, &registry).await.unwrap();
    let pages = output_pages(&exported.bytes);
    assert_eq!(pages.len(), 2);

    // A2 fixes the target; B1 is fitted into it.
    assert!((pages[0].0 - 600.0).abs() < 0.01);
    assert!(!pages[0].2);
    assert!((pages[1].0 - 600.0).abs() < 0.01);
    assert!(pages[1].2);
}

#[tokio::test]
async fn exported_bytes_round_trip_through_disk() {
    use tempfile::TempDir;

    let (registry, ids) = registry_with(vec![("a.pdf", create_test_pdf(2, 612.0, 792.0))]);
    let mut sequence = ResultSequence::new();
    sequence.append_all(&[PageId::new(ids[0], 2), PageId::new(ids[0], 1)]);

    let exported = export(&sequence, &registry).await.unwrap();

    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("combined.pdf");
    compose::save_exported(exported.bytes, &output_path)
        .await
        .unwrap();

    let loaded = Document::load(&output_path).unwrap();
    assert_eq!(loaded.get_pages().len(), 2);
}
