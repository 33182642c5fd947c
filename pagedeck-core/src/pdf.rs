//! Low-level helpers over the `lopdf` object model

use crate::error::{PageDeckError, Result};
use crate::rotation::RotationAngle;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Page attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// US Letter, used when a page has no MediaBox anywhere in its tree.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Guard against malformed page trees with Parent cycles.
const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn load(bytes: &[u8]) -> Result<Document> {
    Ok(Document::load_mem(bytes)?)
}

pub(crate) fn save(doc: &mut Document) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Number of pages in a PDF held in memory.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    Ok(load(bytes)?.get_pages().len())
}

/// Object id of the page at a zero-based index.
pub(crate) fn page_object_id(doc: &Document, index: usize) -> Result<ObjectId> {
    let pages = doc.get_pages();
    pages
        .values()
        .nth(index)
        .copied()
        .ok_or(PageDeckError::PageIndexOutOfBounds(index, pages.len()))
}

/// Follow a reference to the object it points at.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Look up a page attribute, walking up the page tree when the page itself
/// does not carry it.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// MediaBox as `[llx, lly, urx, ury]`.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let Some(object) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return Ok(DEFAULT_MEDIA_BOX);
    };
    let values = resolve(doc, &object)?
        .as_array()?
        .iter()
        .map(|item| resolve(doc, item).ok().and_then(number))
        .collect::<Option<Vec<f32>>>();

    match values.as_deref() {
        Some([llx, lly, urx, ury]) => Ok([*llx, *lly, *urx, *ury]),
        _ => Err(PageDeckError::InvalidStructure(format!(
            "malformed MediaBox on page object {} {}",
            page_id.0, page_id.1
        ))),
    }
}

/// Width and height of the MediaBox in points.
pub(crate) fn page_dimensions(doc: &Document, page_id: ObjectId) -> Result<(f32, f32)> {
    let [llx, lly, urx, ury] = media_box(doc, page_id)?;
    Ok(((urx - llx).abs(), (ury - lly).abs()))
}

/// The rotation a page carries in the file itself.
pub(crate) fn intrinsic_rotation(doc: &Document, page_id: ObjectId) -> RotationAngle {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|object| resolve(doc, &object).ok().and_then(|o| o.as_i64().ok()))
        .and_then(|degrees| RotationAngle::from_degrees(degrees).ok())
        .unwrap_or_default()
}

/// Set an absolute `/Rotate` on a page.
pub(crate) fn set_rotation(doc: &mut Document, page_id: ObjectId, angle: RotationAngle) -> Result<()> {
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Rotate", angle.to_degrees());
    Ok(())
}

/// Copy an object graph from `source` into `output`, renumbering references.
///
/// References to `Page` and `Pages` nodes become `null` so that copying one
/// page never drags the rest of the source page tree along (annotation `/P`
/// entries, link destinations). `cache` maps source ids to output ids and
/// must be reused for every page copied from the same source.
pub(crate) fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    object: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            // Dangling references read as null.
            let Ok(referenced) = source.get_object(*id) else {
                return Ok(Object::Null);
            };
            if matches!(referenced.type_name().ok(), Some(b"Page") | Some(b"Pages")) {
                return Ok(Object::Null);
            }

            // Reserve the id first; object graphs may be cyclic.
            let new_id = output.new_object_id();
            cache.insert(*id, new_id);
            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            output, source, dict, cache,
        )?)),
        Object::Array(items) => {
            let copied: Result<Vec<_>> = items
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(copied?))
        }
        Object::Stream(stream) => Ok(Object::Stream(lopdf::Stream {
            dict: copy_dictionary(output, source, &stream.dict, cache)?,
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: None,
        })),
        _ => Ok(object.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut copied = Dictionary::new();
    for (key, value) in dict.iter() {
        copied.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(copied)
}

/// Builds a fresh document one page at a time.
pub(crate) struct PdfBuilder {
    pub(crate) doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl PdfBuilder {
    pub(crate) fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Append a page dictionary; `Type` and `Parent` are filled in.
    pub(crate) fn add_page(&mut self, mut page: Dictionary) -> ObjectId {
        page.set("Type", "Page");
        page.set("Parent", Object::Reference(self.pages_id));
        let id = self.doc.add_object(Object::Dictionary(page));
        self.kids.push(id);
        id
    }

    pub(crate) fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Write the page tree and catalog and serialize the document.
    pub(crate) fn finish(mut self) -> Result<Vec<u8>> {
        let mut pages = Dictionary::new();
        pages.set("Type", "Pages");
        pages.set(
            "Kids",
            self.kids
                .iter()
                .map(|id| Object::Reference(*id))
                .collect::<Vec<_>>(),
        );
        pages.set("Count", self.kids.len() as i64);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", "Catalog");
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        save(&mut self.doc)
    }
}

/// Rectangle helper for MediaBox arrays.
pub(crate) fn rect(width: f32, height: f32) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width),
        Object::Real(height),
    ])
}
