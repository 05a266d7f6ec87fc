//! Export composition: merge the result sequence into one output document.
//!
//! The composer snapshots the sequence and the referenced sources' bytes,
//! then assembles the output on a blocking task:
//! 1. Decode each distinct referenced source (order-independent).
//! 2. Fix the target page size from the first entry that resolves.
//! 3. Copy size-matching pages verbatim; embed and fit-center the rest.
//! 4. Serialize the assembled document.
//!
//! Entries whose source or page no longer exists are skipped and counted,
//! never a hard failure. Any decode or serialization error aborts the whole
//! export with no partial output.

mod io;
mod xobject;

pub use io::{decode_source, read_source_file, save_exported, serialize};
pub use xobject::{copy_object_deep, native_page_sizes, page_dimensions};

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::registry::SourceRegistry;
use crate::sequence::ResultSequence;
use crate::types::{CollateError, ExportStats, ExportedPdf, PageId, Result, SourceId};

use xobject::{copy_page_verbatim, create_page_xobject};

/// Pages within this distance of the target size on both axes are copied
/// verbatim instead of re-placed.
pub const SIZE_TOLERANCE_PT: f32 = 1.0;

/// Uniform scale and centering offsets that fit a source page inside the
/// target page without cropping or distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Compute the fit-and-center placement of `source` within `target`
/// (both (width, height) in points).
pub fn fit_transform(target: (f32, f32), source: (f32, f32)) -> FitTransform {
    let scale = (target.0 / source.0).min(target.1 / source.1);
    let scaled_width = source.0 * scale;
    let scaled_height = source.1 * scale;
    FitTransform {
        scale,
        offset_x: (target.0 - scaled_width) / 2.0,
        offset_y: (target.1 - scaled_height) / 2.0,
    }
}

/// Compose the sequence against the registry's current state.
///
/// The sequence is snapshotted up front: mutations made while the export is
/// in flight affect only the next export. Sources that errored, never got
/// their bytes, or were removed leave their entries dangling (skipped).
pub async fn export(
    sequence: &ResultSequence,
    registry: &SourceRegistry,
) -> Result<ExportedPdf> {
    if sequence.is_empty() {
        return Err(CollateError::EmptySequence);
    }

    let entries = sequence.snapshot();

    let mut source_bytes: HashMap<SourceId, Vec<u8>> = HashMap::new();
    for entry in &entries {
        if source_bytes.contains_key(&entry.source) {
            continue;
        }
        if let Some(source) = registry.get(entry.source) {
            if source.error.is_none() && !source.bytes.is_empty() {
                source_bytes.insert(entry.source, source.bytes.clone());
            }
        }
    }

    tokio::task::spawn_blocking(move || compose_sync(&entries, &source_bytes)).await?
}

fn compose_sync(
    entries: &[PageId],
    source_bytes: &HashMap<SourceId, Vec<u8>>,
) -> Result<ExportedPdf> {
    // Decode every referenced source once.
    let mut documents: HashMap<SourceId, Document> = HashMap::new();
    let mut page_maps: HashMap<SourceId, Vec<ObjectId>> = HashMap::new();
    for (&id, bytes) in source_bytes {
        let doc = decode_source(bytes)?;
        // get_pages is keyed by 1-based page number in ascending order.
        page_maps.insert(id, doc.get_pages().values().copied().collect());
        documents.insert(id, doc);
    }

    let mut output = Document::with_version("1.7");
    let pages_tree_id = output.new_object_id();
    let mut page_refs: Vec<Object> = Vec::new();
    let mut caches: HashMap<SourceId, HashMap<ObjectId, ObjectId>> = HashMap::new();
    let mut stats = ExportStats::default();

    // Fixed once the first entry resolves; later pages conform to it.
    let mut target: Option<(f32, f32)> = None;

    for entry in entries {
        let resolved = page_maps.get(&entry.source).and_then(|pages| {
            let index = (entry.page_number as usize).checked_sub(1)?;
            pages.get(index).copied()
        });
        let Some(page_id) = resolved else {
            stats.pages_skipped += 1;
            continue;
        };

        let source = &documents[&entry.source];
        let (width, height) = page_dimensions(source, page_id)?;
        let (target_width, target_height) = *target.get_or_insert((width, height));
        let cache = caches.entry(entry.source).or_default();

        let matches_target = (width - target_width).abs() <= SIZE_TOLERANCE_PT
            && (height - target_height).abs() <= SIZE_TOLERANCE_PT;

        let out_page_id = if matches_target {
            copy_page_verbatim(&mut output, source, page_id, pages_tree_id, cache)?
        } else {
            let fit = fit_transform((target_width, target_height), (width, height));
            render_fitted_page(
                &mut output,
                source,
                page_id,
                (target_width, target_height),
                fit,
                pages_tree_id,
                cache,
            )?
        };
        page_refs.push(Object::Reference(out_page_id));
        stats.pages_written += 1;
    }

    if page_refs.is_empty() {
        // Every entry dangled; there is no output to build.
        return Err(CollateError::EmptySequence);
    }

    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    let bytes = serialize(output)?;
    Ok(ExportedPdf { bytes, stats })
}

/// Create a blank page at the target size and draw the source page onto it,
/// scaled and centered.
fn render_fitted_page(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    target: (f32, f32),
    fit: FitTransform,
    parent_pages_id: ObjectId,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let xobject_id = create_page_xobject(output, source, page_id, cache)?;

    let mut xobjects = Dictionary::new();
    xobjects.set("Pg", Object::Reference(xobject_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = format!(
        "q {} 0 0 {} {} {} cm /Pg Do Q\n",
        fit.scale, fit.scale, fit.offset_x, fit.offset_y
    );
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(target.0),
            Object::Real(target.1),
        ]),
    );
    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(output.add_object(page_dict))
}
