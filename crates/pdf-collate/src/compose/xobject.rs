//! Page copying primitives for export composition.
//!
//! Two ways of getting a source page into the output document: a verbatim
//! deep copy of the page object (used when no rescaling is needed), and a
//! Form XObject wrapping the page's content stream (used when the page must
//! be placed with a transformation).

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

use crate::types::Result;

/// Fallback page size (US Letter, points) when a page has no usable MediaBox.
pub(crate) const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (612.0, 792.0);

/// Copy a source page into the output document unchanged.
///
/// The page dictionary and everything it references (contents, resources,
/// annotations) are deep-copied; only the Parent link is rewritten to the
/// output's pages tree. Duplicate copies of the same page share their copied
/// dependencies through `cache`.
pub fn copy_page_verbatim(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    parent_pages_id: ObjectId,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page_dict = source.get_dictionary(page_id)?;

    let mut new_dict = Dictionary::new();
    for (key, value) in page_dict.iter() {
        if key.as_slice() == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    new_dict.set("Parent", Object::Reference(parent_pages_id));

    Ok(output.add_object(new_dict))
}

/// Create a Form XObject from a source page.
///
/// The XObject can then be placed on output pages with arbitrary
/// transformations. Results for shared dependencies are cached so duplicate
/// placements of the same page do not duplicate objects.
pub fn create_page_xobject(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page_dict = source.get_dictionary(page_id)?;

    let media_box = page_dict
        .get(b"MediaBox")
        .and_then(|obj| obj.as_array())
        .ok()
        .cloned()
        .unwrap_or_else(default_media_box);

    let content_data = get_page_content(source, page_dict)?;

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("BBox", Object::Array(media_box));
    xobject_dict.set("FormType", Object::Integer(1));

    if let Ok(resources) = page_dict.get(b"Resources") {
        xobject_dict.set(
            "Resources",
            copy_object_deep(output, source, resources, cache)?,
        );
    }

    Ok(output.add_object(Stream::new(xobject_dict, content_data)))
}

fn default_media_box() -> Vec<Object> {
    vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(DEFAULT_PAGE_DIMENSIONS.0 as i64),
        Object::Integer(DEFAULT_PAGE_DIMENSIONS.1 as i64),
    ]
}

/// Get the content stream data from a page.
fn get_page_content(doc: &Document, page_dict: &Dictionary) -> Result<Vec<u8>> {
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()), // No content = blank page
    };

    match contents {
        Object::Reference(id) => get_single_content_stream(doc, *id),
        Object::Array(arr) => get_concatenated_content_streams(doc, arr),
        _ => Ok(Vec::new()),
    }
}

fn get_single_content_stream(doc: &Document, id: ObjectId) -> Result<Vec<u8>> {
    if let Ok(stream) = doc.get_object(id)?.as_stream() {
        Ok(stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()))
    } else {
        Ok(Vec::new())
    }
}

fn get_concatenated_content_streams(doc: &Document, refs: &[Object]) -> Result<Vec<u8>> {
    let mut result = Vec::new();

    for obj in refs {
        if let Object::Reference(id) = obj {
            if let Ok(stream) = doc.get_object(*id)?.as_stream() {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                result.extend_from_slice(&content);
                result.push(b'\n');
            }
        }
    }

    Ok(result)
}

/// Deep copy an object from source to output document, following references.
///
/// References are registered in `cache` before their referents are copied,
/// so reference cycles (page ↔ annotation back-links) terminate.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            // Reserve the output id up front; a cycle back to this id then
            // resolves through the cache instead of recursing forever.
            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let referenced = source.get_object(*id)?;
            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Stream(Stream {
                dict: new_dict,
                content: stream.content.clone(),
                allows_compression: stream.allows_compression,
                start_position: None,
            }))
        }
        // Primitive types: just clone
        _ => Ok(obj.clone()),
    }
}

/// Get a page's native dimensions (width, height) in points.
pub fn page_dimensions(doc: &Document, page_id: ObjectId) -> Result<(f32, f32)> {
    let page_dict = doc.get_dictionary(page_id)?;

    if let Ok(mb) = page_dict.get(b"MediaBox").and_then(|obj| obj.as_array()) {
        if mb.len() >= 4 {
            let width = extract_number(&mb[2]).unwrap_or(DEFAULT_PAGE_DIMENSIONS.0);
            let height = extract_number(&mb[3]).unwrap_or(DEFAULT_PAGE_DIMENSIONS.1);
            return Ok((width, height));
        }
    }
    Ok(DEFAULT_PAGE_DIMENSIONS)
}

/// Native sizes of every page, in page order.
pub fn native_page_sizes(doc: &Document) -> Result<Vec<(f32, f32)>> {
    doc.get_pages()
        .values()
        .map(|&page_id| page_dimensions(doc, page_id))
        .collect()
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
