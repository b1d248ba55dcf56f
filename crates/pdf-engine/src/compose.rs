//! Page-tree surgery: building empty documents and grafting pages from one
//! document onto another.

use crate::PageSize;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn empty_document() -> Document {
    let mut document = Document::with_version("1.7");
    let pages_id = document.new_object_id();
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document
}

pub(crate) fn page_size(document: &Document, page_id: ObjectId) -> PageSize {
    inherited(document, page_id, b"MediaBox")
        .and_then(|media_box| rect_size(document, &media_box))
        .unwrap_or(PageSize::LETTER)
}

fn rect_size(document: &Document, object: &Object) -> Option<PageSize> {
    let rect = resolve(document, object).as_array().ok()?;
    if rect.len() < 4 {
        return None;
    }
    let coord = |i: usize| resolve(document, &rect[i]).as_float().ok();
    let (x1, y1, x2, y2) = (coord(0)?, coord(1)?, coord(2)?, coord(3)?);
    Some(PageSize { width_pt: (x2 - x1).abs(), height_pt: (y2 - y1).abs() })
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Looks `key` up on the page, then on each ancestor.
fn inherited(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

fn pages_root(document: &Document) -> Result<ObjectId, lopdf::Error> {
    document.catalog()?.get(b"Pages")?.as_reference()
}

/// Copies inherited attributes onto the page so it survives reparenting.
fn flatten_inherited(document: &mut Document, page_id: ObjectId) -> Result<(), lopdf::Error> {
    let missing: Vec<(&[u8], Object)> = {
        let page = document.get_dictionary(page_id)?;
        INHERITABLE
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|key| inherited(document, page_id, key).map(|value| (*key, value)))
            .collect()
    };

    let page = document.get_dictionary_mut(page_id)?;
    for (key, value) in missing {
        page.set(key, value);
    }
    Ok(())
}

/// Appends the pages at `indices` of `donor` to the end of `target`'s page
/// tree, in the given order. Repeated indices get their own page object.
pub(crate) fn append_pages(
    target: &mut Document,
    mut donor: Document,
    indices: &[usize],
) -> Result<(), lopdf::Error> {
    if indices.is_empty() {
        return Ok(());
    }

    donor.renumber_objects_with(target.max_id + 1);
    let donor_pages: Vec<ObjectId> = donor.get_pages().values().copied().collect();
    for &index in indices {
        if let Some(&page_id) = donor_pages.get(index) {
            flatten_inherited(&mut donor, page_id)?;
        }
    }

    target.max_id = target.max_id.max(donor.max_id);
    target.objects.extend(donor.objects);

    let root_id = pages_root(target)?;
    let mut grafted = HashSet::new();
    let mut kids = Vec::with_capacity(indices.len());
    for &index in indices {
        let Some(&page_id) = donor_pages.get(index) else {
            continue;
        };
        let page_id = if grafted.insert(page_id) {
            page_id
        } else {
            let copy: Dictionary = target.get_dictionary(page_id)?.clone();
            target.add_object(copy)
        };
        target.get_dictionary_mut(page_id)?.set("Parent", root_id);
        kids.push(Object::Reference(page_id));
    }

    let root = target.get_dictionary_mut(root_id)?;
    let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0) + kids.len() as i64;
    let mut all_kids = match root.get(b"Kids") {
        Ok(Object::Array(existing)) => existing.clone(),
        _ => Vec::new(),
    };
    all_kids.extend(kids);
    root.set("Kids", all_kids);
    root.set("Count", count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_pdf;

    #[test]
    fn empty_document_has_no_pages() {
        let document = empty_document();
        assert!(document.get_pages().is_empty());
    }

    #[test]
    fn appended_pages_carry_inherited_attributes() {
        let mut target = empty_document();
        let donor = Document::load_mem(&sample_pdf(2)).unwrap();

        append_pages(&mut target, donor, &[1]).unwrap();

        let pages: Vec<ObjectId> = target.get_pages().values().copied().collect();
        assert_eq!(pages.len(), 1);
        let page = target.get_dictionary(pages[0]).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
        assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), pages_root(&target).unwrap());
    }

    #[test]
    fn renumbered_donor_does_not_collide_with_target() {
        let mut target = Document::load_mem(&sample_pdf(1)).unwrap();
        let before = target.objects.len();
        let donor = Document::load_mem(&sample_pdf(1)).unwrap();
        let donor_objects = donor.objects.len();

        append_pages(&mut target, donor, &[0]).unwrap();

        assert_eq!(target.objects.len(), before + donor_objects);
        assert_eq!(target.get_pages().len(), 2);
    }

    #[test]
    fn page_size_falls_back_to_letter_without_media_box() {
        let mut document = empty_document();
        let root = pages_root(&document).unwrap();
        let page_id = document.add_object(dictionary! { "Type" => "Page", "Parent" => root });

        assert_eq!(page_size(&document, page_id), PageSize::LETTER);
    }
}
