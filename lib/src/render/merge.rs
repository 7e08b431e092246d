// lib/src/render/merge.rs
//! Concatenates single-page PDFs into one document, preserving order.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::errors::RenderError;
use crate::render::PageArtifact;

/// Merges `pages` in the order given. Fails without output on empty input or
/// any page that does not parse.
pub fn merge_pages(pages: &[PageArtifact]) -> Result<Vec<u8>, RenderError> {
    if pages.is_empty() {
        return Err(RenderError::Merge("no pages to merge".to_string()));
    }

    // Renumbering with an increasing offset keeps object ids, and so page
    // order in the BTreeMap, aligned with input order.
    let mut max_id: u32 = 1;
    let mut page_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut other_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for artifact in pages {
        let mut doc = Document::load_mem(&artifact.bytes).map_err(|e| {
            RenderError::Merge(format!("page {} is not a readable PDF: {}", artifact.page, e))
        })?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            let page = doc.get_object(page_id)?;
            page_objects.insert(page_id, page.clone());
        }
        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                _ => {
                    other_objects.insert(object_id, object);
                }
            }
        }
    }

    let mut merged = Document::with_version("1.5");
    merged.max_id = max_id;
    merged.objects.extend(other_objects);

    let pages_id = merged.new_object_id();
    for (page_id, page) in &page_objects {
        if let Object::Dictionary(dict) = page {
            let mut dict = dict.clone();
            dict.set("Parent", Object::Reference(pages_id));
            merged.objects.insert(*page_id, Object::Dictionary(dict));
        }
    }

    let kids: Vec<Object> = page_objects.keys().map(|&id| Object::Reference(id)).collect();
    let count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );
    let catalog_id = merged.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.renumber_objects();
    merged.compress();

    let mut output = Vec::new();
    merged
        .save_to(&mut output)
        .map_err(|e| RenderError::Merge(format!("failed to write merged document: {}", e)))?;
    Ok(output)
}

/// Page count of a PDF byte stream.
pub fn page_count(bytes: &[u8]) -> Result<usize, RenderError> {
    Ok(Document::load_mem(bytes)?.get_pages().len())
}
